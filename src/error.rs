// Error types for the bookshop core
// Every service operation returns a typed result; the shell decides how
// to render failures. Only the initial database open is fatal.

use thiserror::Error;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

/// Field-level input validation failures.
///
/// Always recoverable: the caller may re-prompt and retry the single
/// call. The core never loops on input itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} cannot be empty")]
    Required { field: &'static str },

    /// Field value exceeds the column maximum.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Field value is below the minimum length.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    /// Numeric value must be non-negative.
    #[error("{field} must be non-negative")]
    Negative { field: &'static str },

    /// Numeric value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: &'static str },

    /// Value is not in the allowed set (e.g. role must be 0 or 1).
    #[error("{field} must be one of: {allowed}")]
    NotAllowed {
        field: &'static str,
        allowed: &'static str,
    },

    /// Malformed value (email, phone).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// Password and confirmation do not match.
    #[error("passwords do not match")]
    PasswordMismatch,
}

// ============================================================================
// SHOP ERROR
// ============================================================================

/// Top-level error taxonomy for all service operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Malformed field input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced title, username or rent id does not exist.
    #[error("{entity} not found: {name}")]
    NotFound { entity: &'static str, name: String },

    /// Sell or rent requested beyond available stock.
    #[error("insufficient stock for '{title}': available {available}, requested {requested}")]
    InsufficientStock {
        title: String,
        available: i64,
        requested: i64,
    },

    /// A non-admin session attempted an admin-only mutation.
    #[error("you don't have permission for this action")]
    PermissionDenied,

    /// Login credential mismatch. Deliberately does not distinguish
    /// unknown user from wrong password.
    #[error("incorrect username or password")]
    AuthenticationFailed,

    /// A destructive bulk operation was called without an explicit
    /// affirmative confirmation.
    #[error("operation requires explicit confirmation")]
    NotConfirmed,

    /// Underlying database failure, wrapping the engine's error text.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl ShopError {
    pub fn not_found(entity: &'static str, name: impl Into<String>) -> Self {
        ShopError::NotFound {
            entity,
            name: name.into(),
        }
    }
}

/// Convenience alias used by every service operation.
pub type ShopResult<T> = Result<T, ShopError>;

// ============================================================================
// TESTS
// ============================================================================
