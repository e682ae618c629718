//! User-facing error messages for handlers
//!
//! Functions are organized alphabetically for easy lookup.

use parlor_common::validators::{
    MAX_MESSAGE_LENGTH, MAX_NICKNAME_LENGTH, MAX_ROOM_DESCRIPTION_LENGTH, MAX_ROOM_NAME_LENGTH,
    MIN_NICKNAME_LENGTH, MessageError, NicknameError, RoomDescriptionError, RoomNameError,
};

/// "description too long" error
pub fn err_description_too_long() -> String {
    format!(
        "Room description must be at most {} characters",
        MAX_ROOM_DESCRIPTION_LENGTH
    )
}

/// "id space exhausted" error
pub fn err_id_space_exhausted() -> String {
    "Could not allocate a room id, try again".to_string()
}

/// "message empty" error
pub fn err_message_empty() -> String {
    "Message cannot be empty".to_string()
}

/// "message too long" error
pub fn err_message_too_long() -> String {
    format!("Message must be at most {} characters", MAX_MESSAGE_LENGTH)
}

/// "not room owner" error
pub fn err_not_room_owner() -> String {
    "Only the room owner can delete a room".to_string()
}

/// "not signed in" error
pub fn err_not_signed_in() -> String {
    "You are not signed in".to_string()
}

/// "room name empty" error
pub fn err_room_name_empty() -> String {
    "Room name cannot be empty".to_string()
}

/// "room name invalid" error
pub fn err_room_name_invalid() -> String {
    "Room name contains invalid characters".to_string()
}

/// "room name too long" error
pub fn err_room_name_too_long() -> String {
    format!(
        "Room name must be at most {} characters",
        MAX_ROOM_NAME_LENGTH
    )
}

/// "room not found" error
pub fn err_room_not_found(room_id: &str) -> String {
    format!("Room {} does not exist", room_id)
}

/// Map a message validation error to its user-facing text
pub fn message_error_to_message(error: MessageError) -> String {
    match error {
        MessageError::Empty => err_message_empty(),
        MessageError::TooLong => err_message_too_long(),
    }
}

/// Map a nickname validation error to its user-facing text
pub fn nickname_error_to_message(error: NicknameError) -> String {
    match error {
        NicknameError::TooShort => format!(
            "Nickname must be at least {} characters",
            MIN_NICKNAME_LENGTH
        ),
        NicknameError::TooLong => format!(
            "Nickname must be at most {} characters",
            MAX_NICKNAME_LENGTH
        ),
        NicknameError::InvalidCharacters => {
            "Nickname contains invalid characters".to_string()
        }
    }
}

/// Map a room description validation error to its user-facing text
pub fn room_description_error_to_message(error: RoomDescriptionError) -> String {
    match error {
        RoomDescriptionError::TooLong => err_description_too_long(),
    }
}

/// Map a room name validation error to its user-facing text
pub fn room_name_error_to_message(error: RoomNameError) -> String {
    match error {
        RoomNameError::Empty => err_room_name_empty(),
        RoomNameError::TooLong => err_room_name_too_long(),
        RoomNameError::InvalidCharacters => err_room_name_invalid(),
    }
}
