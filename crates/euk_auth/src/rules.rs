use euk_constants::{
    ADMIN_HOME_ROUTE, ADMIN_ROUTE_PREFIX, DASHBOARD_ROUTE, EUK_ROUTE_PREFIX,
    REPORTS_ROUTE_PREFIX, SETTINGS_ROUTE_PREFIX, USER_HOME_ROUTE,
};
use euk_types::{EukAction, EukSection, PermissionSet, RequiredPermission, Role};
use std::fmt;

/// Route families known to the access rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRule {
    Admin,
    Euk,
    Reports,
    Settings,
    Dashboard,
}

impl fmt::Display for RouteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouteRule::Admin => "admin",
            RouteRule::Euk => "euk",
            RouteRule::Reports => "reports",
            RouteRule::Settings => "settings",
            RouteRule::Dashboard => "dashboard",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    Prefix,
    Exact,
}

/// One row of the route table
#[derive(Debug, Clone, Copy)]
pub struct RouteRuleEntry {
    pub rule: RouteRule,
    pub pattern: &'static str,
    pub matching: RouteMatch,
    pub requirement: &'static str,
}

impl RouteRuleEntry {
    fn matches(&self, route_name: &str) -> bool {
        match self.matching {
            RouteMatch::Prefix => route_name.starts_with(self.pattern),
            RouteMatch::Exact => route_name == self.pattern,
        }
    }
}

// evaluated top to bottom, the first match decides
const ROUTE_RULES: [RouteRuleEntry; 5] = [
    RouteRuleEntry {
        rule: RouteRule::Admin,
        pattern: ADMIN_ROUTE_PREFIX,
        matching: RouteMatch::Prefix,
        requirement: "routes.admin && canManageUsers",
    },
    RouteRuleEntry {
        rule: RouteRule::Euk,
        pattern: EUK_ROUTE_PREFIX,
        matching: RouteMatch::Prefix,
        requirement: "routes.euk && section grant",
    },
    RouteRuleEntry {
        rule: RouteRule::Reports,
        pattern: REPORTS_ROUTE_PREFIX,
        matching: RouteMatch::Prefix,
        requirement: "routes.reports && canViewAnalytics",
    },
    RouteRuleEntry {
        rule: RouteRule::Settings,
        pattern: SETTINGS_ROUTE_PREFIX,
        matching: RouteMatch::Prefix,
        requirement: "routes.settings",
    },
    RouteRuleEntry {
        rule: RouteRule::Dashboard,
        pattern: DASHBOARD_ROUTE,
        matching: RouteMatch::Exact,
        requirement: "authenticated",
    },
];

pub fn rule_table() -> &'static [RouteRuleEntry] {
    &ROUTE_RULES
}

pub fn match_rule(route_name: &str) -> Option<RouteRule> {
    ROUTE_RULES
        .iter()
        .find(|entry| entry.matches(route_name))
        .map(|entry| entry.rule)
}

/// Outcome of evaluating a route against a permission set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allowed(RouteRule),
    Forbidden(RouteRule),
    Unrecognized,
}

impl RouteDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RouteDecision::Allowed(_))
    }
}

fn euk_section_of(route_name: &str) -> Option<EukSection> {
    EukSection::ALL
        .into_iter()
        .find(|section| route_name.contains(&format!("/{}", section.as_str())))
}

/// Grant for a single EUK section. Printing only ever needs read access.
fn section_grant(section: EukSection, is_read: bool, permissions: &PermissionSet) -> bool {
    match section {
        EukSection::Stampanje => permissions.euk.read,
        _ if !is_read => permissions.euk.create,
        EukSection::Kategorije => permissions.euk.kategorije,
        EukSection::Predmeti => permissions.euk.predmeti,
        EukSection::UgrozenaLica => permissions.euk.ugrozena_lica,
    }
}

fn rule_allows(
    rule: RouteRule,
    route_name: &str,
    permission: RequiredPermission,
    permissions: &PermissionSet,
) -> bool {
    match rule {
        RouteRule::Admin => permissions.routes.admin && permissions.can_manage_users,
        RouteRule::Euk => {
            if !permissions.routes.euk {
                return false;
            }
            match euk_section_of(route_name) {
                Some(section) => section_grant(section, permission.is_read(), permissions),
                None => permissions.euk.read,
            }
        }
        RouteRule::Reports => permissions.routes.reports && permissions.can_view_analytics,
        RouteRule::Settings => permissions.routes.settings,
        RouteRule::Dashboard => true,
    }
}

/// Evaluate a route and report which rule decided it
pub fn evaluate_route(
    route_name: &str,
    permission: RequiredPermission,
    permissions: &PermissionSet,
) -> RouteDecision {
    match match_rule(route_name) {
        Some(rule) if rule_allows(rule, route_name, permission, permissions) => {
            RouteDecision::Allowed(rule)
        }
        Some(rule) => RouteDecision::Forbidden(rule),
        None => RouteDecision::Unrecognized,
    }
}

/// Check whether `permissions` grants `permission` on `route_name`.
/// Routes that match no rule are denied.
pub fn resolve_access(
    route_name: &str,
    permission: RequiredPermission,
    permissions: &PermissionSet,
) -> bool {
    evaluate_route(route_name, permission, permissions).is_allowed()
}

/// Section based check used by EUK page toolbars
pub fn check_euk_access(
    section: EukSection,
    action: EukAction,
    permissions: &PermissionSet,
) -> bool {
    permissions.routes.euk && section_grant(section, action == EukAction::Read, permissions)
}

/// Home route a signed in user is sent to
pub fn landing_route(role: Role) -> &'static str {
    match role {
        Role::Admin => ADMIN_HOME_ROUTE,
        Role::Korisnik | Role::Other => USER_HOME_ROUTE,
    }
}
