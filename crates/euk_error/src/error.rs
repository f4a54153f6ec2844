use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings Error: {0}")]
    Error(String),
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Logging Error: {0}")]
    Error(String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Auth Error: {0}")]
    Error(String),

    #[error("Session is not available")]
    SessionUnavailable,
}

#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("Permission Error: {0}")]
    Error(String),

    #[error("Malformed user record: {0}")]
    MalformedUser(String),

    #[error("Unsupported permission: {0}")]
    UnsupportedPermission(String),
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache Error: {0}")]
    Error(String),

    #[error("Failed to serialize cache entry: {0}")]
    Serialization(String),

    #[error("Cache storage failure: {0}")]
    Io(#[from] std::io::Error),
}
