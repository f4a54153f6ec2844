use euk_error::PermissionError;
use euk_types::{EukPermissions, PermissionSet, RoutePermissions, User};
use tracing::debug;

fn validate_user(user: &User) -> Result<(), PermissionError> {
    if user.id <= 0 {
        return Err(PermissionError::MalformedUser(format!(
            "user id must be positive, got {}",
            user.id
        )));
    }
    Ok(())
}

/// Derive the permission set of a user.
///
/// # Arguments
///
/// * `user` - the session user, `None` when nobody is signed in
///
/// # Returns
///
/// * `Ok(None)` for an unauthenticated caller, which must be denied
/// * `Ok(Some(set))` otherwise. An inactive user gets a set where every grant is false.
/// * `Err` if the user record is malformed
pub fn derive_permissions(user: Option<&User>) -> Result<Option<PermissionSet>, PermissionError> {
    let Some(user) = user else {
        return Ok(None);
    };

    validate_user(user)?;

    let role = user.normalized_role();
    let admin = user.is_active && role.is_admin();
    // every role, recognized or not, gets base access
    let base = user.is_active;

    debug!("Deriving permissions for user {} with role {}", user.id, role);

    Ok(Some(PermissionSet {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role.clone(),
        is_active: user.is_active,
        routes: RoutePermissions {
            admin,
            users: admin,
            euk: base,
            reports: admin,
            settings: admin,
            analytics: admin,
        },
        euk: EukPermissions {
            kategorije: base,
            predmeti: base,
            ugrozena_lica: base,
            create: base,
            read: base,
            update: base,
            delete: admin,
        },
        can_delete: admin,
        can_manage_users: admin,
        can_view_analytics: admin,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [&str; 8] = [
        "admin", "ADMIN", "korisnik", "KORISNIK", "user", "potpisnik", "gost", "",
    ];

    fn derive(id: i64, role: &str, active: bool) -> PermissionSet {
        derive_permissions(Some(&User::new(id, role, active)))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_unauthenticated_yields_none() {
        assert!(derive_permissions(None).unwrap().is_none());
    }

    #[test]
    fn test_malformed_user_is_rejected() {
        let result = derive_permissions(Some(&User::new(0, "admin", true)));
        assert!(matches!(result, Err(PermissionError::MalformedUser(_))));
    }

    #[test]
    fn test_inactive_user_has_no_permissions() {
        for role in ROLES {
            let set = derive(1, role, false);
            assert!(
                set.grants().iter().all(|granted| !granted),
                "inactive {} should have nothing",
                role
            );
        }
    }

    #[test]
    fn test_admin_permissions() {
        for role in ["admin", "Admin", " ADMIN "] {
            let set = derive(1, role, true);
            assert!(set.routes.admin);
            assert!(set.routes.users);
            assert!(set.routes.reports);
            assert!(set.routes.settings);
            assert!(set.routes.analytics);
            assert!(set.routes.euk);
            assert!(set.euk.delete);
            assert!(set.can_delete);
            assert!(set.can_manage_users);
            assert!(set.can_view_analytics);
        }
    }

    #[test]
    fn test_base_user_permissions() {
        // unrecognized roles fall back to base access
        for role in ["korisnik", "KORISNIK", "user", "obradjivac", "gost", ""] {
            let set = derive(7, role, true);
            assert!(set.routes.euk);
            assert!(set.euk.kategorije);
            assert!(set.euk.predmeti);
            assert!(set.euk.ugrozena_lica);
            assert!(set.euk.create);
            assert!(set.euk.read);
            assert!(set.euk.update);
            assert!(!set.euk.delete);
            assert!(!set.routes.admin);
            assert!(!set.routes.users);
            assert!(!set.routes.reports);
            assert!(!set.can_delete);
            assert!(!set.can_manage_users);
            assert!(!set.can_view_analytics);
        }
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let user = User::new(7, "KORISNIK", true).with_username("marko");
        let first = derive_permissions(Some(&user)).unwrap().unwrap();
        let second = derive_permissions(Some(&user)).unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first.username, "marko");
        assert_eq!(first.role, "KORISNIK");
    }
}
