//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted player name, in characters.
pub const MAX_PLAYER_NAME_CHARS: usize = 32;

/// Characters the realtime store does not accept in a key.
const FORBIDDEN_NAME_CHARS: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// Validates a player name, ignoring surrounding whitespace.
///
/// Names become keys of the `scores` map, so they must be non-blank, at most
/// [`MAX_PLAYER_NAME_CHARS`] long and free of store path characters.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Alice")     // Ok
/// validate_player_name("   ")       // Err - blank
/// validate_player_name("a.b")       // Err - path character
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();

    if name.is_empty() {
        let mut err = ValidationError::new("player_name_empty");
        err.message = Some("Player name must not be empty".into());
        return Err(err);
    }

    let length = name.chars().count();
    if length > MAX_PLAYER_NAME_CHARS {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!("Player name must be at most {MAX_PLAYER_NAME_CHARS} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    if name
        .chars()
        .any(|c| FORBIDDEN_NAME_CHARS.contains(&c) || c.is_control())
    {
        let mut err = ValidationError::new("player_name_format");
        err.message = Some("Player name must not contain . $ # [ ] / or control characters".into());
        return Err(err);
    }

    Ok(())
}
