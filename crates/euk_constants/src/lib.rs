/// Permission sets older than this are recomputed
pub const PERMISSION_CACHE_TTL_MS: i64 = 5 * 60 * 1000;

/// Namespace for persisted permission cache keys (`permissions_<userId>`)
pub const PERMISSION_CACHE_PREFIX: &str = "permissions_";

pub const DEFAULT_CACHE_DIR: &str = "./euk_permissions";

pub const LOGIN_ROUTE: &str = "/login";
pub const ADMIN_HOME_ROUTE: &str = "/admin";
pub const USER_HOME_ROUTE: &str = "/dashboard";

pub const ADMIN_ROUTE_PREFIX: &str = "/admin";
pub const EUK_ROUTE_PREFIX: &str = "/euk";
pub const REPORTS_ROUTE_PREFIX: &str = "/reports";
pub const SETTINGS_ROUTE_PREFIX: &str = "/settings";
pub const DASHBOARD_ROUTE: &str = "/dashboard";
