// User accounts - password hashing, authentication, admin management
// Passwords are stored as hex-encoded SHA-256 digests, never plaintext,
// and never leave this module: listings expose username/email/role only.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{ShopError, ShopResult, ValidationError};
use crate::session::{Role, Session};
use crate::validate;

// ============================================================================
// PASSWORD HASHING
// ============================================================================

/// SHA-256 digest of the plaintext, lowercase hex. Deterministic and
/// one-way; authentication compares digests, never plaintext.
pub fn hash_password(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// USER VIEW
// ============================================================================

/// What user listings expose. The password hash stays in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    pub email: String,
    pub role: Role,
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Creates a user account. Admin only. The password and its
/// confirmation must match; only the hash is stored.
pub fn add_user(
    conn: &Connection,
    session: &Session,
    username: &str,
    password: &str,
    confirm_password: &str,
    email: &str,
    role: i64,
) -> ShopResult<()> {
    session.require_admin()?;

    validate::validate_username(username)?;
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch.into());
    }
    validate::validate_password(password)?;
    validate::validate_email(email)?;
    validate::validate_role(role)?;

    conn.execute(
        "INSERT INTO users (username, password, email, role) VALUES (?1, ?2, ?3, ?4)",
        params![username, hash_password(password), email, role],
    )?;

    debug!(username, "user added");
    Ok(())
}

/// Checks credentials and returns the session for this process run.
///
/// A single failure mode on purpose: the caller cannot tell an unknown
/// username from a wrong password.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> ShopResult<Session> {
    let digest = hash_password(password);

    let role: Option<i64> = conn
        .query_row(
            "SELECT role FROM users WHERE username = ?1 AND password = ?2",
            params![username, digest],
            |row| row.get(0),
        )
        .optional()?;

    match role.and_then(Role::from_i64) {
        Some(role) => {
            debug!(username, "authentication successful");
            Ok(Session::new(username, role))
        }
        None => Err(ShopError::AuthenticationFailed),
    }
}

/// Replaces username, email and role of the user named `old_username`.
/// The password is untouched. Admin only.
pub fn update_user(
    conn: &Connection,
    session: &Session,
    old_username: &str,
    new_username: &str,
    new_email: &str,
    new_role: i64,
) -> ShopResult<()> {
    session.require_admin()?;

    validate::validate_username(new_username)?;
    validate::validate_email(new_email)?;
    validate::validate_role(new_role)?;

    let changed = conn.execute(
        "UPDATE users SET username = ?1, email = ?2, role = ?3 WHERE username = ?4",
        params![new_username, new_email, new_role, old_username],
    )?;

    if changed == 0 {
        return Err(ShopError::not_found("user", old_username));
    }

    debug!(old_username, new_username, "user updated");
    Ok(())
}

/// Deletes a user account. Admin only.
pub fn delete_user(conn: &Connection, session: &Session, username: &str) -> ShopResult<()> {
    session.require_admin()?;
    validate::validate_username(username)?;

    let deleted = conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
    if deleted == 0 {
        return Err(ShopError::not_found("user", username));
    }

    debug!(username, "user deleted");
    Ok(())
}

/// Lists all accounts without password material. Admin only.
pub fn list_users(conn: &Connection, session: &Session) -> ShopResult<Vec<UserInfo>> {
    session.require_admin()?;

    let mut stmt = conn.prepare("SELECT username, email, role FROM users ORDER BY id")?;
    let users = stmt
        .query_map([], |row| {
            let role_value: i64 = row.get(2)?;
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, role_value))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(users
        .into_iter()
        .map(|(username, email, role_value)| UserInfo {
            username,
            email,
            // Unknown role values are treated as regular users.
            role: Role::from_i64(role_value).unwrap_or(Role::Regular),
        })
        .collect())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn admin() -> Session {
        Session::new("root", Role::Admin)
    }

    fn with_admin_user() -> Connection {
        let conn = open_in_memory().unwrap();
        add_user(
            &conn,
            &admin(),
            "root",
            "sekret",
            "sekret",
            "root@shop.example",
            0,
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_hash_password_is_sha256_hex() {
        let digest = hash_password("sekret");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_password("sekret"));
        assert_ne!(digest, hash_password("Sekret"));
        // Known vector.
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_stored_password_is_hashed() {
        let conn = with_admin_user();

        let stored: String = conn
            .query_row(
                "SELECT password FROM users WHERE username = 'root'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_ne!(stored, "sekret");
        assert_eq!(stored, hash_password("sekret"));
    }

    #[test]
    fn test_add_user_rejects_mismatched_passwords() {
        let conn = open_in_memory().unwrap();
        let err = add_user(
            &conn,
            &admin(),
            "alice",
            "sekret",
            "sekre7",
            "a@b.com",
            1,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ShopError::Validation(ValidationError::PasswordMismatch)
        ));
    }

    #[test]
    fn test_authenticate() {
        let conn = with_admin_user();

        let session = authenticate(&conn, "root", "sekret").unwrap();
        assert_eq!(session.username, "root");
        assert_eq!(session.role, Role::Admin);

        assert!(matches!(
            authenticate(&conn, "root", "wrong"),
            Err(ShopError::AuthenticationFailed)
        ));
        assert!(matches!(
            authenticate(&conn, "ghost", "sekret"),
            Err(ShopError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_list_users_never_exposes_passwords() {
        let conn = with_admin_user();
        add_user(
            &conn,
            &admin(),
            "alice",
            "hunter2x",
            "hunter2x",
            "alice@shop.example",
            1,
        )
        .unwrap();

        let users = list_users(&conn, &admin()).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].username, "alice");
        assert_eq!(users[1].role, Role::Regular);
        // UserInfo has no password field; double-check the plaintext and
        // hash never leak through the visible fields.
        for user in &users {
            assert!(!user.email.contains("hunter2x"));
            assert_ne!(user.username, hash_password("hunter2x"));
        }
    }

    #[test]
    fn test_user_mutations_require_admin() {
        let conn = with_admin_user();
        let clerk = Session::new("clerk", Role::Regular);

        assert!(matches!(
            add_user(&conn, &clerk, "eve", "sekret", "sekret", "e@b.com", 0),
            Err(ShopError::PermissionDenied)
        ));
        assert!(matches!(
            update_user(&conn, &clerk, "root", "root2", "r@b.com", 0),
            Err(ShopError::PermissionDenied)
        ));
        assert!(matches!(
            delete_user(&conn, &clerk, "root"),
            Err(ShopError::PermissionDenied)
        ));
        assert!(matches!(
            list_users(&conn, &clerk),
            Err(ShopError::PermissionDenied)
        ));

        // No mutation happened.
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_update_and_delete_user() {
        let conn = with_admin_user();
        add_user(
            &conn,
            &admin(),
            "alice",
            "hunter2x",
            "hunter2x",
            "alice@shop.example",
            1,
        )
        .unwrap();

        update_user(&conn, &admin(), "alice", "alicia", "alicia@shop.example", 0).unwrap();
        let session = authenticate(&conn, "alicia", "hunter2x").unwrap();
        assert_eq!(session.role, Role::Admin);

        delete_user(&conn, &admin(), "alicia").unwrap();
        assert!(matches!(
            authenticate(&conn, "alicia", "hunter2x"),
            Err(ShopError::AuthenticationFailed)
        ));

        assert!(matches!(
            delete_user(&conn, &admin(), "nobody"),
            Err(ShopError::NotFound { .. })
        ));
    }
}
