//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted player identifier.
pub const MAX_PLAYER_ID_LEN: usize = 64;

/// Validates an opaque player identifier: 1 to 64 characters, no control characters.
///
/// # Examples
///
/// ```ignore
/// validate_player_id("3f2a9c")   // Ok
/// validate_player_id("")         // Err - empty
/// validate_player_id("a\nb")     // Err - control character
/// ```
pub fn validate_player_id(id: &str) -> Result<(), ValidationError> {
    let len = id.chars().count();
    if len == 0 || len > MAX_PLAYER_ID_LEN {
        let mut err = ValidationError::new("player_id_length");
        err.message = Some(
            format!("Player ID must be 1 to {MAX_PLAYER_ID_LEN} characters (got {len})").into(),
        );
        return Err(err);
    }

    if id.chars().any(char::is_control) {
        let mut err = ValidationError::new("player_id_format");
        err.message = Some("Player ID must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}
