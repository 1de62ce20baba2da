//! Validation helpers for DTOs.

use validator::ValidationError;

/// Rejects empty or whitespace-only strings.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a user-typed invite code before normalisation.
///
/// Codes are 4 to 12 ASCII alphanumeric characters once surrounding whitespace is removed. Case
/// is not checked here: lookups upper-case the input.
///
/// ```ignore
/// validate_invite_code_input("abc123")  // Ok
/// validate_invite_code_input(" K7QP2M ") // Ok
/// validate_invite_code_input("ab-12")   // Err - punctuation
/// ```
pub fn validate_invite_code_input(code: &str) -> Result<(), ValidationError> {
    let code = code.trim();
    if !(4..=12).contains(&code.len()) {
        let mut err = ValidationError::new("invite_code_length");
        err.message = Some(
            format!(
                "Invite code must be between 4 and 12 characters (got {})",
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("invite_code_format");
        err.message = Some("Invite code must contain only letters and digits".into());
        return Err(err);
    }

    Ok(())
}
