pub mod cache;
pub mod guard;
pub mod permission;
pub mod rules;
pub mod session;

pub use cache::{
    CacheEntry, Clock, LocalStore, ManualClock, MemoryStore, PermissionCache, PermissionStore,
    SystemClock,
};
pub use guard::*;
pub use permission::derive_permissions;
pub use rules::{
    check_euk_access, evaluate_route, landing_route, resolve_access, rule_table, RouteDecision,
    RouteRule,
};
pub use session::{SessionProvider, StaticSession};
