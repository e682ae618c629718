//! Room name validation
//!
//! Room names are free-form display strings. Leading/trailing whitespace is
//! not significant; the directory stores the trimmed form.

/// Maximum length for room names in characters (after trimming)
pub const MAX_ROOM_NAME_LENGTH: usize = 50;

/// Validation error for room names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomNameError {
    /// Name is empty or trims to empty
    Empty,
    /// Name exceeds maximum length
    TooLong,
    /// Name contains control characters
    InvalidCharacters,
}

/// Validate a room name
///
/// Checks the trimmed form:
/// - Not empty (a name of only whitespace is rejected)
/// - Does not exceed [`MAX_ROOM_NAME_LENGTH`] characters
/// - Contains no control characters
///
/// # Errors
///
/// Returns a `RoomNameError` variant describing the validation failure.
///
/// # Examples
///
/// ```
/// use parlor_common::validators::{validate_room_name, RoomNameError};
///
/// assert!(validate_room_name("Rust Talk").is_ok());
/// assert!(validate_room_name("  General  ").is_ok());
///
/// assert_eq!(validate_room_name(""), Err(RoomNameError::Empty));
/// assert_eq!(validate_room_name("   "), Err(RoomNameError::Empty));
/// ```
pub fn validate_room_name(name: &str) -> Result<(), RoomNameError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(RoomNameError::Empty);
    }

    if trimmed.chars().count() > MAX_ROOM_NAME_LENGTH {
        return Err(RoomNameError::TooLong);
    }

    // Control characters would corrupt rendered lists
    if trimmed.chars().any(char::is_control) {
        return Err(RoomNameError::InvalidCharacters);
    }

    Ok(())
}
