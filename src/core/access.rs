//! Identity and access checks.
//!
//! An [`Actor`] is the current user as the rest of the core sees it: an id, an email for
//! attribution, and a role for authorization. Session handling lives outside the crate;
//! callers obtain an `Actor` from [`crate::core::user::authenticate`] or build one from a
//! stored user.

use crate::{
    entities::{Role, user},
    errors::{Error, Result},
};
use sha2::{Digest, Sha256};

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// User id
    pub id: i64,
    /// Email, recorded as `performed_by` / `sold_by`
    pub email: String,
    /// Access role
    pub role: Role,
}

impl From<&user::Model> for Actor {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email.clone(),
            role: model.role,
        }
    }
}

impl From<user::Model> for Actor {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            role: model.role,
        }
    }
}

impl Role {
    /// Higher ranks include the permissions of lower ones.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Admin => 3,
            Self::Manager => 2,
            Self::Staff => 1,
        }
    }

    /// Whether this role may perform an action requiring `required`.
    #[must_use]
    pub const fn satisfies(self, required: Self) -> bool {
        self.rank() >= required.rank()
    }
}

/// Fails with [`Error::Forbidden`] unless `actor` holds `required` or a higher role.
pub fn require_role(actor: &Actor, required: Role) -> Result<()> {
    if actor.role.satisfies(required) {
        Ok(())
    } else {
        tracing::warn!(
            actor = %actor.email,
            role = %actor.role,
            required = %required,
            "Access denied"
        );
        Err(Error::Forbidden {
            actual: actor.role.to_string(),
            required: required.to_string(),
        })
    }
}

/// Hex SHA-256 digest of a password.
///
/// Unsalted and single-round, so this is a stand-in and not a password KDF.
// TODO: move to a salted KDF once accounts are reachable from outside the local machine.
#[must_use]
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Whether `password` matches a stored digest.
#[must_use]
pub fn verify_password(password: &str, digest: &str) -> bool {
    hash_password(password) == digest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            id: 1,
            email: "someone@sweetshop.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_admin_satisfies_everything() {
        let admin = actor(Role::Admin);
        assert!(require_role(&admin, Role::Admin).is_ok());
        assert!(require_role(&admin, Role::Manager).is_ok());
        assert!(require_role(&admin, Role::Staff).is_ok());
    }

    #[test]
    fn test_staff_is_denied_admin() {
        let staff = actor(Role::Staff);
        let result = require_role(&staff, Role::Admin);
        assert!(matches!(
            result,
            Err(Error::Forbidden { ref actual, ref required })
                if actual == "staff" && required == "admin"
        ));
        assert!(require_role(&staff, Role::Staff).is_ok());
    }

    #[test]
    fn test_manager_between_admin_and_staff() {
        let manager = actor(Role::Manager);
        assert!(require_role(&manager, Role::Admin).is_err());
        assert!(require_role(&manager, Role::Manager).is_ok());
        assert!(require_role(&manager, Role::Staff).is_ok());
    }

    #[test]
    fn test_password_digest() {
        let digest = hash_password("admin123");
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, "admin123");
        assert!(verify_password("admin123", &digest));
        assert!(!verify_password("admin124", &digest));
    }
}
