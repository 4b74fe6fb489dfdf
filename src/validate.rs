// Field validators - pure predicates over raw input
// Each validator checks one field and reports the reason on rejection.
// Re-prompting on failure is the shell's job, not ours.

use crate::error::ValidationError;

/// Result type for validators.
pub type ValidateResult = Result<(), ValidationError>;

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_AUTHOR_LENGTH: usize = 100;
pub const MAX_GENRE_LENGTH: usize = 50;
pub const MIN_USERNAME_LENGTH: usize = 4;
pub const MIN_PASSWORD_LENGTH: usize = 5;

// ============================================================================
// STRING FIELDS
// ============================================================================

fn non_empty_max(value: &str, field: &'static str, max: usize) -> ValidateResult {
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Book title: non-empty, at most 100 characters.
pub fn validate_title(title: &str) -> ValidateResult {
    non_empty_max(title, "title", MAX_TITLE_LENGTH)
}

/// Author name: non-empty, at most 100 characters.
pub fn validate_author(author: &str) -> ValidateResult {
    non_empty_max(author, "author", MAX_AUTHOR_LENGTH)
}

/// Genre: non-empty, at most 50 characters.
pub fn validate_genre(genre: &str) -> ValidateResult {
    non_empty_max(genre, "genre", MAX_GENRE_LENGTH)
}

/// Customer name on a rent: same shape as an author name.
pub fn validate_customer_name(name: &str) -> ValidateResult {
    non_empty_max(name, "name", MAX_AUTHOR_LENGTH)
}

/// Username: at least 4 characters.
pub fn validate_username(username: &str) -> ValidateResult {
    if username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort {
            field: "username",
            min: MIN_USERNAME_LENGTH,
        });
    }
    Ok(())
}

/// Password: at least 5 characters. No further policy by design.
pub fn validate_password(password: &str) -> ValidateResult {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password",
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Email: exactly one '@' and at least one '.' anywhere.
/// Deliberately weak; strengthening it is a non-goal.
pub fn validate_email(email: &str) -> ValidateResult {
    let at_count = email.chars().filter(|c| *c == '@').count();
    let dot_count = email.chars().filter(|c| *c == '.').count();
    if at_count != 1 || dot_count == 0 {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            reason: "expected exactly one '@' and at least one '.'",
        });
    }
    Ok(())
}

/// Customer phone: optional leading '+', then 7 to 15 digits.
/// The exact rule is our choice; the checks documented in the tests
/// below are the contract.
pub fn validate_phone(phone: &str) -> ValidateResult {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone",
            reason: "digits only, with an optional leading '+'",
        });
    }
    if !(7..=15).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone",
            reason: "expected 7 to 15 digits",
        });
    }
    Ok(())
}

// ============================================================================
// NUMERIC FIELDS
// ============================================================================

/// Price: non-negative. Zero is allowed (giveaways).
pub fn validate_price(price: f64) -> ValidateResult {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::Negative { field: "price" });
    }
    Ok(())
}

/// Quantity: non-negative.
pub fn validate_quantity(quantity: i64) -> ValidateResult {
    if quantity < 0 {
        return Err(ValidationError::Negative { field: "quantity" });
    }
    Ok(())
}

/// Rental day count: strictly positive. A zero-day rental would be
/// immediately late-checkable and carries no meaning.
pub fn validate_days(days: i64) -> ValidateResult {
    if days <= 0 {
        return Err(ValidationError::MustBePositive { field: "days" });
    }
    Ok(())
}

/// Numeric id: non-negative.
pub fn validate_id(id: i64) -> ValidateResult {
    if id < 0 {
        return Err(ValidationError::Negative { field: "id" });
    }
    Ok(())
}

/// Role: 0 (admin) or 1 (regular user).
pub fn validate_role(role: i64) -> ValidateResult {
    if role != 0 && role != 1 {
        return Err(ValidationError::NotAllowed {
            field: "role",
            allowed: "0 (admin), 1 (regular user)",
        });
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_rules() {
        assert!(validate_title("The Hobbit").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title(&"x".repeat(100)).is_ok());
        assert!(validate_title(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_genre_max_length() {
        assert!(validate_genre("Fantasy").is_ok());
        assert!(validate_genre(&"g".repeat(50)).is_ok());
        assert!(validate_genre(&"g".repeat(51)).is_err());
    }

    #[test]
    fn test_username_and_password_minimums() {
        assert!(validate_username("bob").is_err());
        assert!(validate_username("bobby").is_ok());
        assert!(validate_password("1234").is_err());
        assert!(validate_password("12345").is_ok());
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("a.b@c").is_ok()); // dot anywhere counts
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("abc.com").is_err());
        assert!(validate_email("a@bcom").is_err());
    }

    #[test]
    fn test_phone_rule() {
        // The documented contract: optional '+', 7-15 digits, nothing else.
        assert!(validate_phone("5551234567").is_ok());
        assert!(validate_phone("+358401234567").is_ok());
        assert!(validate_phone("1234567").is_ok());
        assert!(validate_phone("123456").is_err()); // too short
        assert!(validate_phone("1234567890123456").is_err()); // too long
        assert!(validate_phone("555-123-4567").is_err()); // separators rejected
        assert!(validate_phone("").is_err());
        assert!(validate_phone("+").is_err());
    }

    #[test]
    fn test_numeric_rules() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(19.99).is_ok());
        assert!(validate_price(-0.01).is_err());
        assert!(validate_price(f64::NAN).is_err());

        assert!(validate_quantity(0).is_ok());
        assert!(validate_quantity(-1).is_err());

        assert!(validate_days(1).is_ok());
        assert!(validate_days(0).is_err());

        assert!(validate_id(0).is_ok());
        assert!(validate_id(-5).is_err());

        assert!(validate_role(0).is_ok());
        assert!(validate_role(1).is_ok());
        assert!(validate_role(2).is_err());
        assert!(validate_role(-1).is_err());
    }
}
