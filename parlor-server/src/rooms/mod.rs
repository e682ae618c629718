//! Room directory and membership coordination

mod directory;
mod types;

pub use directory::Directory;
pub use types::{
    CreateError, DeleteError, DeleteOutcome, Departed, JoinError, JoinOutcome, LeaveOutcome, Room,
};
