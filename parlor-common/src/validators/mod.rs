//! Input validation functions
//!
//! Reusable validators for inputs arriving over the event surface. The
//! server uses them for enforcement; a client can use the same rules for
//! pre-validation.

mod message;
mod nickname;
mod room_description;
mod room_name;

pub use message::{MAX_MESSAGE_LENGTH, MessageError, validate_message};
pub use nickname::{
    MAX_NICKNAME_LENGTH, MIN_NICKNAME_LENGTH, NicknameError, validate_nickname,
};
pub use room_description::{
    MAX_ROOM_DESCRIPTION_LENGTH, RoomDescriptionError, validate_room_description,
};
pub use room_name::{MAX_ROOM_NAME_LENGTH, RoomNameError, validate_room_name};
