// Session context - who is operating the shop
// The original kept the current user in process-wide globals; here the
// session is an explicit value passed to every permission-gated call,
// so authorization is testable without setup/teardown.

use serde::{Deserialize, Serialize};

use crate::error::{ShopError, ShopResult};

// ============================================================================
// ROLE
// ============================================================================

/// User role. Stored in the database as an integer: 0 = admin, 1 = regular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Regular,
}

impl Role {
    pub fn from_i64(value: i64) -> Option<Role> {
        match value {
            0 => Some(Role::Admin),
            1 => Some(Role::Regular),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Role::Admin => 0,
            Role::Regular => 1,
        }
    }

    /// Human-readable label used by whoami and user listings.
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Regular => "user",
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// The authenticated identity for the current process run.
/// Produced by `account::authenticate`; read by every permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Session {
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Gate for admin-only mutations.
    pub fn require_admin(&self) -> ShopResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ShopError::PermissionDenied)
        }
    }

    /// "username : You are an admin user." style summary.
    pub fn whoami(&self) -> String {
        match self.role {
            Role::Admin => format!("{} : You are an admin user.", self.username),
            Role::Regular => format!("{} : You are a user.", self.username),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::from_i64(0), Some(Role::Admin));
        assert_eq!(Role::from_i64(1), Some(Role::Regular));
        assert_eq!(Role::from_i64(7), None);
        assert_eq!(Role::Admin.as_i64(), 0);
        assert_eq!(Role::Regular.as_i64(), 1);
    }

    #[test]
    fn test_require_admin() {
        let admin = Session::new("root", Role::Admin);
        let clerk = Session::new("clerk", Role::Regular);

        assert!(admin.require_admin().is_ok());
        assert!(matches!(
            clerk.require_admin(),
            Err(ShopError::PermissionDenied)
        ));
    }

    #[test]
    fn test_whoami_labels() {
        let admin = Session::new("root", Role::Admin);
        assert_eq!(admin.whoami(), "root : You are an admin user.");

        let clerk = Session::new("clerk", Role::Regular);
        assert_eq!(clerk.whoami(), "clerk : You are a user.");
    }
}
