use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated account as delivered by the session provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub is_active: bool,
}

impl User {
    pub fn new(id: i64, role: &str, is_active: bool) -> Self {
        Self {
            id,
            username: String::new(),
            role: role.to_string(),
            is_active,
        }
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    pub fn normalized_role(&self) -> Role {
        Role::from_role_str(&self.role)
    }
}

/// Coarse role of an account after normalization.
///
/// `Other` covers every unrecognized role string. It receives the same base
/// access as `Korisnik` and never admin access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Korisnik,
    Other,
}

impl Role {
    pub fn from_role_str(s: &str) -> Role {
        let trimmed_lowercase = s.trim().to_lowercase();
        match trimmed_lowercase.as_str() {
            "admin" | "administrator" => Role::Admin,
            // obradjivac and potpisnik are legacy role names still issued by older accounts
            "korisnik" | "user" | "obradjivac" | "potpisnik" => Role::Korisnik,
            _ => Role::Other,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Korisnik => write!(f, "KORISNIK"),
            Role::Other => write!(f, "OTHER"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_normalization() {
        assert_eq!(Role::from_role_str("admin"), Role::Admin);
        assert_eq!(Role::from_role_str(" ADMIN "), Role::Admin);
        assert_eq!(Role::from_role_str("KORISNIK"), Role::Korisnik);
        assert_eq!(Role::from_role_str("User"), Role::Korisnik);
        assert_eq!(Role::from_role_str("OBRADJIVAC"), Role::Korisnik);
        assert_eq!(Role::from_role_str("potpisnik"), Role::Korisnik);
        assert_eq!(Role::from_role_str("superuser"), Role::Other);
        assert_eq!(Role::from_role_str(""), Role::Other);
    }

    #[test]
    fn test_user_deserialize_camel_case() {
        let json = r#"{"id": 7, "username": "marko", "role": "KORISNIK", "isActive": true}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 7);
        assert!(user.is_active);
        assert_eq!(user.normalized_role(), Role::Korisnik);
    }

    #[test]
    fn test_user_missing_fields_default_to_inactive() {
        let user: User = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert!(!user.is_active);
        assert_eq!(user.role, "");
        assert_eq!(user.normalized_role(), Role::Other);
    }
}
