use crate::cache::PermissionCache;
use crate::permission::derive_permissions;
use crate::rules::{check_euk_access, evaluate_route, RouteDecision};
use crate::session::SessionProvider;
use euk_error::{CacheError, PermissionError};
use euk_types::{EukAction, EukSection, PermissionSet, RequiredPermission, User};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};

/// What a denied screen offers the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    Login,
    GoBack,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    Unauthenticated,
    InactiveAccount,
    Forbidden {
        route: String,
        permission: RequiredPermission,
    },
    UnrecognizedRoute {
        route: String,
        permission: RequiredPermission,
    },
    SectionForbidden {
        section: EukSection,
        action: EukAction,
    },
    AdminRequired,
    RoleNotAllowed {
        allowed: Vec<String>,
        actual: String,
    },
    DerivationFailure(String),
}

impl DenialReason {
    pub fn affordance(&self) -> Affordance {
        match self {
            DenialReason::Unauthenticated => Affordance::Login,
            DenialReason::AdminRequired | DenialReason::RoleNotAllowed { .. } => Affordance::GoBack,
            _ => Affordance::None,
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::Unauthenticated => write!(
                f,
                "Morate biti prijavljeni da biste pristupili ovoj stranici."
            ),
            DenialReason::InactiveAccount => {
                write!(f, "Pristup odbijen: korisnički nalog nije aktivan.")
            }
            DenialReason::Forbidden { route, permission } => {
                write!(f, "Nemate dozvolu za pristup: {} ({})", route, permission)
            }
            DenialReason::UnrecognizedRoute { route, permission } => {
                write!(f, "Nepoznata ruta, pristup odbijen: {} ({})", route, permission)
            }
            DenialReason::SectionForbidden { section, action } => {
                write!(f, "Nemate dozvolu za {} u EUK sekciji: {}", action, section)
            }
            DenialReason::AdminRequired => {
                write!(f, "Nemate dozvolu za pristup admin funkcionalnostima")
            }
            DenialReason::RoleNotAllowed { allowed, actual } => write!(
                f,
                "Samo {} imaju pristup ovoj stranici. Vaša uloga: {}",
                allowed.join(", "),
                actual
            ),
            DenialReason::DerivationFailure(message) => {
                write!(f, "Greška pri proveri privilegija: {}", message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Allowed,
    Denied(DenialReason),
}

/// What a guarded slot shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    Loading,
    Children(T),
    Fallback(T),
    Denied {
        message: String,
        affordance: Affordance,
    },
}

impl GuardState {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardState::Allowed)
    }

    pub fn denial(&self) -> Option<&DenialReason> {
        match self {
            GuardState::Denied(reason) => Some(reason),
            _ => None,
        }
    }

    /// Build the protected content only when access is allowed.
    /// A caller supplied fallback replaces the default denial message.
    pub fn render<T>(&self, children: impl FnOnce() -> T, fallback: Option<T>) -> Rendered<T> {
        match self {
            GuardState::Loading => Rendered::Loading,
            GuardState::Allowed => Rendered::Children(children()),
            GuardState::Denied(reason) => match fallback {
                Some(fallback) => Rendered::Fallback(fallback),
                None => Rendered::Denied {
                    message: reason.to_string(),
                    affordance: reason.affordance(),
                },
            },
        }
    }
}

pub trait Guard: Send + Sync {
    /// Decide access for an already resolved session user
    fn check(&self, user: Option<&User>) -> GuardState;
}

/// Looks up or derives permission sets on behalf of the guards
#[derive(Clone)]
pub struct PermissionResolver {
    cache: Arc<PermissionCache>,
}

impl PermissionResolver {
    pub fn new(cache: Arc<PermissionCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    /// Permission set for `target_user_id`, defaulting to the session user.
    ///
    /// Only the session user can be derived. Another user's set is served from
    /// the cache or not at all.
    pub fn resolve(
        &self,
        user: &User,
        target_user_id: Option<i64>,
    ) -> Result<PermissionSet, PermissionError> {
        let key = target_user_id.unwrap_or(user.id);

        if let Some(cached) = self.cache.get(key) {
            if cached.user_id == key {
                debug!("Using cached permissions for user: {}", key);
                return Ok(cached);
            }
            warn!(
                "Cached permissions under user {} belong to user {}, ignoring",
                key, cached.user_id
            );
        }

        if key != user.id {
            return Err(PermissionError::Error(format!(
                "No permission snapshot available for user {}",
                key
            )));
        }

        debug!("Generating role-based permissions for user: {}", key);
        let permissions = derive_permissions(Some(user))?.ok_or_else(|| {
            PermissionError::Error(format!("No permissions derived for user {}", key))
        })?;

        // a failed write only costs a recomputation next time
        if let Err(e) = self.cache.put(key, &permissions) {
            warn!("Failed to cache permissions for user {}: {}", key, e);
        }

        Ok(permissions)
    }

    /// Drop cached permissions, e.g. on sign out
    pub fn invalidate(&self, user_id: Option<i64>) -> Result<(), CacheError> {
        self.cache.clear(user_id)
    }

    fn guard_with(
        &self,
        user: Option<&User>,
        target_user_id: Option<i64>,
        decide: impl FnOnce(&PermissionSet) -> GuardState,
    ) -> GuardState {
        let Some(user) = user else {
            return GuardState::Denied(DenialReason::Unauthenticated);
        };

        if !user.is_active {
            return GuardState::Denied(DenialReason::InactiveAccount);
        }

        match self.resolve(user, target_user_id) {
            Ok(permissions) if !permissions.is_active => {
                GuardState::Denied(DenialReason::InactiveAccount)
            }
            Ok(permissions) => decide(&permissions),
            Err(e) => {
                error!("Error generating permissions: {}", e);
                GuardState::Denied(DenialReason::DerivationFailure(e.to_string()))
            }
        }
    }
}

// delete is only ever granted to accounts that may delete, whatever the route rule says
fn delete_allowed(permission: RequiredPermission, permissions: &PermissionSet) -> bool {
    permission != RequiredPermission::Delete || permissions.can_delete
}

fn route_state(
    route_name: &str,
    permission: RequiredPermission,
    permissions: &PermissionSet,
) -> GuardState {
    let forbidden = || {
        GuardState::Denied(DenialReason::Forbidden {
            route: route_name.to_string(),
            permission,
        })
    };

    match evaluate_route(route_name, permission, permissions) {
        RouteDecision::Allowed(_) if delete_allowed(permission, permissions) => {
            GuardState::Allowed
        }
        RouteDecision::Allowed(_) | RouteDecision::Forbidden(_) => forbidden(),
        RouteDecision::Unrecognized => GuardState::Denied(DenialReason::UnrecognizedRoute {
            route: route_name.to_string(),
            permission,
        }),
    }
}

/// Guards a route at a given permission level
#[derive(Clone)]
pub struct PermissionGuard {
    resolver: PermissionResolver,
    route_name: String,
    permission: RequiredPermission,
    user_id: Option<i64>,
}

impl PermissionGuard {
    pub fn new(resolver: PermissionResolver, route_name: &str, permission: RequiredPermission) -> Self {
        Self {
            resolver,
            route_name: route_name.to_string(),
            permission,
            user_id: None,
        }
    }

    pub fn for_user(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }
}

impl Guard for PermissionGuard {
    fn check(&self, user: Option<&User>) -> GuardState {
        self.resolver.guard_with(user, self.user_id, |permissions| {
            route_state(&self.route_name, self.permission, permissions)
        })
    }
}

/// Guards a route for reading
#[derive(Clone)]
pub struct RouteGuard {
    inner: PermissionGuard,
}

impl RouteGuard {
    pub fn new(resolver: PermissionResolver, route_name: &str) -> Self {
        Self {
            inner: PermissionGuard::new(resolver, route_name, RequiredPermission::Read),
        }
    }

    pub fn for_user(self, user_id: Option<i64>) -> Self {
        Self {
            inner: self.inner.for_user(user_id),
        }
    }
}

impl Guard for RouteGuard {
    fn check(&self, user: Option<&User>) -> GuardState {
        self.inner.check(user)
    }
}

/// Guards an action inside one EUK section
#[derive(Clone)]
pub struct EukGuard {
    resolver: PermissionResolver,
    section: EukSection,
    action: EukAction,
    user_id: Option<i64>,
}

impl EukGuard {
    pub fn new(resolver: PermissionResolver, section: EukSection, action: EukAction) -> Self {
        Self {
            resolver,
            section,
            action,
            user_id: None,
        }
    }

    pub fn for_user(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }
}

impl Guard for EukGuard {
    fn check(&self, user: Option<&User>) -> GuardState {
        self.resolver.guard_with(user, self.user_id, |permissions| {
            let delete_ok = self.action != EukAction::Delete || permissions.can_delete;
            if delete_ok && check_euk_access(self.section, self.action, permissions) {
                GuardState::Allowed
            } else {
                GuardState::Denied(DenialReason::SectionForbidden {
                    section: self.section,
                    action: self.action,
                })
            }
        })
    }
}

/// Allows active admins only, straight from the session user
#[derive(Debug, Clone, Default)]
pub struct AdminGuard;

impl Guard for AdminGuard {
    fn check(&self, user: Option<&User>) -> GuardState {
        match user {
            None => GuardState::Denied(DenialReason::Unauthenticated),
            Some(user) if !user.is_active => GuardState::Denied(DenialReason::InactiveAccount),
            Some(user) if user.normalized_role().is_admin() => GuardState::Allowed,
            Some(_) => GuardState::Denied(DenialReason::AdminRequired),
        }
    }
}

/// Allows users whose role is on the list, compared case-insensitively
#[derive(Debug, Clone)]
pub struct RoleGuard {
    allowed_roles: Vec<String>,
}

impl RoleGuard {
    pub fn new(allowed_roles: &[&str]) -> Self {
        Self {
            allowed_roles: allowed_roles.iter().map(|role| role.to_string()).collect(),
        }
    }

    pub fn admin_only() -> Self {
        Self::new(&["admin"])
    }

    pub fn users_only() -> Self {
        Self::new(&["korisnik", "user"])
    }

    pub fn allowed_roles(&self) -> &[String] {
        &self.allowed_roles
    }
}

impl Guard for RoleGuard {
    fn check(&self, user: Option<&User>) -> GuardState {
        let Some(user) = user else {
            return GuardState::Denied(DenialReason::Unauthenticated);
        };

        if !user.is_active {
            return GuardState::Denied(DenialReason::InactiveAccount);
        }

        let actual = user.role.trim().to_uppercase();
        let is_allowed = self
            .allowed_roles
            .iter()
            .any(|role| role.trim().to_uppercase() == actual);

        if is_allowed {
            GuardState::Allowed
        } else {
            GuardState::Denied(DenialReason::RoleNotAllowed {
                allowed: self.allowed_roles.clone(),
                actual,
            })
        }
    }
}

/// Ticket for one user fetch, see [`GuardSession::begin`]
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket(u64);

/// Tracks a guard across user fetches. Only the most recently started fetch may
/// update the state, results of superseded fetches are dropped.
pub struct GuardSession<G: Guard> {
    guard: G,
    issued: AtomicU64,
    state: Mutex<GuardState>,
}

impl<G: Guard> GuardSession<G> {
    pub fn new(guard: G) -> Self {
        Self {
            guard,
            issued: AtomicU64::new(0),
            state: Mutex::new(GuardState::Loading),
        }
    }

    pub fn guard(&self) -> &G {
        &self.guard
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> GuardState {
        self.lock_state().clone()
    }

    /// Start resolving a new user snapshot, moving the guard back to `Loading`
    pub fn begin(&self) -> Ticket {
        // ticket and state change together, or a late begin could reset a newer result
        let mut state = self.lock_state();
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        *state = GuardState::Loading;
        Ticket(ticket)
    }

    /// Apply the user resolved for `ticket`.
    /// Returns `None` without touching the state if a newer fetch has started.
    pub fn complete(&self, ticket: Ticket, user: Option<&User>) -> Option<GuardState> {
        let mut state = self.lock_state();
        if ticket.0 != self.issued.load(Ordering::SeqCst) {
            debug!("Discarding stale guard result for ticket {}", ticket.0);
            return None;
        }

        let next = self.guard.check(user);
        *state = next.clone();
        Some(next)
    }

    /// Fetch the current user and apply it. A failed fetch counts as signed out.
    pub async fn resolve(&self, provider: &dyn SessionProvider) -> Option<GuardState> {
        let ticket = self.begin();
        match provider.current_user().await {
            Ok(user) => self.complete(ticket, user.as_ref()),
            Err(e) => {
                error!("Failed to fetch session user: {}", e);
                self.complete(ticket, None)
            }
        }
    }
}
