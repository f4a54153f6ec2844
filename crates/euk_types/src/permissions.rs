use crate::user::Role;
use euk_error::PermissionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top level route categories a user may be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteCategory {
    Admin,
    Users,
    Euk,
    Reports,
    Settings,
    Analytics,
}

impl RouteCategory {
    pub fn from_str(s: &str) -> Option<RouteCategory> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(RouteCategory::Admin),
            "users" => Some(RouteCategory::Users),
            "euk" => Some(RouteCategory::Euk),
            "reports" => Some(RouteCategory::Reports),
            "settings" => Some(RouteCategory::Settings),
            "analytics" => Some(RouteCategory::Analytics),
            _ => None,
        }
    }
}

/// Named actions checked by toolbar buttons and row menus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Delete,
    ManageUsers,
    ViewAnalytics,
    Create,
    Read,
    Update,
}

impl Action {
    pub fn from_str(s: &str) -> Option<Action> {
        match s.trim() {
            "delete" => Some(Action::Delete),
            "manageUsers" => Some(Action::ManageUsers),
            "viewAnalytics" => Some(Action::ViewAnalytics),
            "create" => Some(Action::Create),
            "read" => Some(Action::Read),
            "update" => Some(Action::Update),
            _ => None,
        }
    }
}

/// Permission level requested by a route or permission guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredPermission {
    #[default]
    Read,
    Write,
    Delete,
    Execute,
}

impl RequiredPermission {
    pub fn from_str(s: &str) -> Result<RequiredPermission, PermissionError> {
        match s.trim().to_lowercase().as_str() {
            "read" => Ok(RequiredPermission::Read),
            "write" => Ok(RequiredPermission::Write),
            "delete" => Ok(RequiredPermission::Delete),
            "execute" => Ok(RequiredPermission::Execute),
            _ => Err(PermissionError::UnsupportedPermission(s.to_string())),
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, RequiredPermission::Read)
    }
}

impl fmt::Display for RequiredPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let permission = match self {
            RequiredPermission::Read => "read",
            RequiredPermission::Write => "write",
            RequiredPermission::Delete => "delete",
            RequiredPermission::Execute => "execute",
        };
        write!(f, "{}", permission)
    }
}

/// Subsections under `/euk`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EukSection {
    Kategorije,
    Predmeti,
    UgrozenaLica,
    Stampanje,
}

impl EukSection {
    pub const ALL: [EukSection; 4] = [
        EukSection::Kategorije,
        EukSection::Predmeti,
        EukSection::UgrozenaLica,
        EukSection::Stampanje,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EukSection::Kategorije => "kategorije",
            EukSection::Predmeti => "predmeti",
            EukSection::UgrozenaLica => "ugrozena-lica",
            EukSection::Stampanje => "stampanje",
        }
    }

    pub fn from_str(s: &str) -> Option<EukSection> {
        EukSection::ALL
            .into_iter()
            .find(|section| section.as_str() == s.trim().to_lowercase())
    }
}

impl fmt::Display for EukSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action requested inside an EUK section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EukAction {
    Read,
    Write,
    Delete,
}

impl EukAction {
    pub fn from_str(s: &str) -> Option<EukAction> {
        match s.trim().to_lowercase().as_str() {
            "read" => Some(EukAction::Read),
            "write" => Some(EukAction::Write),
            "delete" => Some(EukAction::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for EukAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EukAction::Read => write!(f, "read"),
            EukAction::Write => write!(f, "write"),
            EukAction::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePermissions {
    pub admin: bool,
    pub users: bool,
    pub euk: bool,
    pub reports: bool,
    pub settings: bool,
    pub analytics: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EukPermissions {
    pub kategorije: bool,
    pub predmeti: bool,
    #[serde(rename = "ugrozena-lica")]
    pub ugrozena_lica: bool,
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
}

/// Point in time snapshot of everything a user may do.
///
/// Serialized in camelCase so persisted cache entries keep the layout the
/// browser client writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    pub user_id: i64,
    #[serde(default)]
    pub username: String,
    pub role: String,
    pub is_active: bool,
    pub routes: RoutePermissions,
    pub euk: EukPermissions,
    pub can_delete: bool,
    pub can_manage_users: bool,
    pub can_view_analytics: bool,
}

impl PermissionSet {
    pub fn normalized_role(&self) -> Role {
        Role::from_role_str(&self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.is_active && self.normalized_role().is_admin()
    }

    pub fn can_access_route(&self, category: RouteCategory) -> bool {
        match category {
            RouteCategory::Admin => self.routes.admin,
            RouteCategory::Users => self.routes.users,
            RouteCategory::Euk => self.routes.euk,
            RouteCategory::Reports => self.routes.reports,
            RouteCategory::Settings => self.routes.settings,
            RouteCategory::Analytics => self.routes.analytics,
        }
    }

    pub fn has_action_permission(&self, action: Action) -> bool {
        match action {
            Action::Delete => self.can_delete,
            Action::ManageUsers => self.can_manage_users,
            Action::ViewAnalytics => self.can_view_analytics,
            Action::Create => self.euk.create,
            Action::Read => self.euk.read,
            Action::Update => self.euk.update,
        }
    }

    /// Every boolean in the set, used to assert the all-false inactive invariant
    pub fn grants(&self) -> [bool; 16] {
        [
            self.routes.admin,
            self.routes.users,
            self.routes.euk,
            self.routes.reports,
            self.routes.settings,
            self.routes.analytics,
            self.euk.kategorije,
            self.euk.predmeti,
            self.euk.ugrozena_lica,
            self.euk.create,
            self.euk.read,
            self.euk.update,
            self.euk.delete,
            self.can_delete,
            self.can_manage_users,
            self.can_view_analytics,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_permission_from_str() {
        assert_eq!(
            RequiredPermission::from_str("WRITE").unwrap(),
            RequiredPermission::Write
        );
        assert!(RequiredPermission::from_str("approve").is_err());
        assert_eq!(RequiredPermission::default(), RequiredPermission::Read);
    }

    #[test]
    fn test_euk_section_from_str() {
        assert_eq!(
            EukSection::from_str("ugrozena-lica"),
            Some(EukSection::UgrozenaLica)
        );
        assert_eq!(EukSection::from_str("arhiva"), None);
    }

    #[test]
    fn test_permission_set_json_layout() {
        let set = PermissionSet {
            user_id: 7,
            role: "KORISNIK".to_string(),
            is_active: true,
            euk: EukPermissions {
                ugrozena_lica: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["userId"], 7);
        assert_eq!(value["isActive"], true);
        assert_eq!(value["euk"]["ugrozena-lica"], true);
        assert_eq!(value["canManageUsers"], false);
    }

    #[test]
    fn test_helpers_read_the_right_fields() {
        let set = PermissionSet {
            role: "admin".to_string(),
            is_active: true,
            routes: RoutePermissions {
                reports: true,
                ..Default::default()
            },
            can_view_analytics: true,
            ..Default::default()
        };

        assert!(set.can_access_route(RouteCategory::Reports));
        assert!(!set.can_access_route(RouteCategory::Settings));
        assert!(set.has_action_permission(Action::ViewAnalytics));
        assert!(!set.has_action_permission(Action::Delete));
        assert_eq!(Action::from_str("manageUsers"), Some(Action::ManageUsers));
        assert!(set.is_admin());
    }
}
