use euk_constants::DEFAULT_CACHE_DIR;
use euk_error::SettingsError;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Where permission cache entries are persisted
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum CacheBackend {
    Memory,
    Local,
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Local => write!(f, "local"),
        }
    }
}

impl CacheBackend {
    pub fn from_str(s: &str) -> Result<CacheBackend, SettingsError> {
        let trimmed_lowercase = s.trim().trim_matches('"').to_lowercase();
        match trimmed_lowercase.as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "local" => Ok(CacheBackend::Local),
            _ => Err(SettingsError::Error(format!(
                "Unsupported cache backend: {}",
                s
            ))),
        }
    }
}

/// Settings for the permission cache
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub cache_dir: PathBuf,
}

/// EukConfig is the primary configuration struct for the access control layer.
/// Values are read from env variables with development defaults.
#[derive(Debug, Clone)]
pub struct EukConfig {
    pub app_name: String,
    pub app_env: String,
    pub app_version: String,
    pub cache_backend: CacheBackend,
    pub cache_dir: String,
    pub log_json: bool,
}

impl Default for EukConfig {
    fn default() -> Self {
        EukConfig {
            app_name: "euk".to_string(),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            cache_backend: env::var("EUK_CACHE_BACKEND")
                .ok()
                .and_then(|backend| CacheBackend::from_str(&backend).ok())
                .unwrap_or(CacheBackend::Local),
            cache_dir: env::var("EUK_CACHE_DIR").unwrap_or_else(|_| DEFAULT_CACHE_DIR.to_string()),
            log_json: env::var("EUK_LOG_JSON")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }
}

impl EukConfig {
    pub fn new() -> Self {
        EukConfig::default()
    }

    pub fn is_production(&self) -> bool {
        matches!(
            self.app_env.trim().to_lowercase().as_str(),
            "production" | "prod"
        )
    }

    /// Production logs are always structured
    pub fn json_logs(&self) -> bool {
        self.log_json || self.is_production()
    }

    /// Get the cache settings for the EukConfig
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            backend: self.cache_backend.clone(),
            cache_dir: PathBuf::from(&self.cache_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_backend_from_str() {
        assert_eq!(
            CacheBackend::from_str("local").unwrap(),
            CacheBackend::Local
        );
        assert_eq!(
            CacheBackend::from_str(" \"MEMORY\" ").unwrap(),
            CacheBackend::Memory
        );
        assert!(CacheBackend::from_str("redis").is_err());
    }

    #[test]
    fn test_cache_backend_to_string() {
        assert_eq!(CacheBackend::Local.to_string(), "local");
        assert_eq!(CacheBackend::Memory.to_string(), "memory");
    }

    #[test]
    fn test_is_production() {
        let config = EukConfig {
            app_env: "Production".to_string(),
            ..Default::default()
        };
        assert!(config.is_production());

        let config = EukConfig {
            app_env: "development".to_string(),
            ..Default::default()
        };
        assert!(!config.is_production());
    }

    #[test]
    fn test_json_logs() {
        let config = EukConfig {
            app_env: "prod".to_string(),
            log_json: false,
            ..Default::default()
        };
        assert!(config.json_logs());

        let config = EukConfig {
            app_env: "development".to_string(),
            log_json: false,
            ..Default::default()
        };
        assert!(!config.json_logs());
    }

    #[test]
    fn test_cache_settings() {
        let config = EukConfig {
            cache_backend: CacheBackend::Memory,
            cache_dir: "./test-cache".to_string(),
            ..Default::default()
        };
        let settings = config.cache_settings();
        assert_eq!(settings.backend, CacheBackend::Memory);
        assert_eq!(settings.cache_dir, PathBuf::from("./test-cache"));
    }

    #[test]
    fn test_default() {
        let config = EukConfig::default();
        assert_eq!(config.app_name, "euk");
        assert_eq!(config.app_version, env!("CARGO_PKG_VERSION"));
    }
}
