//! Well-known role name constants.
//!
//! These must match the `CHECK` constraint on `users.role`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MODEL: &str = "model";
pub const ROLE_CLIENT: &str = "client";

/// Roles a user may pick for themselves at registration.
pub const SELF_ASSIGNABLE_ROLES: &[&str] = &[ROLE_CLIENT, ROLE_MODEL];

/// Whether `role` may be chosen at registration (admins are provisioned out of band).
pub fn is_self_assignable(role: &str) -> bool {
    SELF_ASSIGNABLE_ROLES.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_not_self_assignable() {
        assert!(!is_self_assignable(ROLE_ADMIN));
        assert!(is_self_assignable(ROLE_CLIENT));
        assert!(is_self_assignable(ROLE_MODEL));
        assert!(!is_self_assignable("superuser"));
    }
}
