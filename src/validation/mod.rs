/// Registration input validation
///
/// Primary credential verification lives with the identity provider; these
/// checks only reject obviously unusable input before it crosses the wire.
use crate::error::{GatewayError, GatewayResult};

const SPECIAL_CHARS: &str = "@$!%*?&#^()-_=+";

/// Validate email shape
pub fn validate_email(email: &str) -> GatewayResult<()> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(GatewayError::Validation("Email cannot be empty".to_string()));
    }

    if trimmed.len() > 254 {
        return Err(GatewayError::Validation("Email too long".to_string()));
    }

    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(GatewayError::Validation("Invalid email format".to_string()));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(GatewayError::Validation("Invalid email format".to_string()));
    }

    Ok(())
}

/// Validate password strength
///
/// At least 8 characters with an uppercase letter, a lowercase letter, a
/// digit, and a special character.
pub fn validate_password(password: &str) -> GatewayResult<()> {
    if password.len() < 8 {
        return Err(GatewayError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| SPECIAL_CHARS.contains(c));

    if !(has_lower && has_upper && has_digit && has_special) {
        return Err(GatewayError::Validation(
            "Password must contain an uppercase letter, a lowercase letter, a number, and a special character"
                .to_string(),
        ));
    }

    Ok(())
}
