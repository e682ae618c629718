//! Machine-readable error kinds for request acknowledgments
//!
//! These error kinds are serialized to strings in protocol messages,
//! allowing clients to make decisions based on the error type
//! (e.g., refreshing the room list on a "not_found" join failure).

use std::fmt;

/// Error kinds returned in request acknowledgments
///
/// These are carried in the `kind` field of `*Response` events to help
/// clients decide how to handle the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input (e.g., room name that trims to empty)
    Validation,

    /// The referenced room does not exist or was deleted
    NotFound,

    /// Requester is not the room owner
    Forbidden,

    /// Operation requires an identified connection
    NotLoggedIn,

    /// Operation requires the connection to be in a room
    NotInRoom,

    /// Room id generation could not find a free id
    ///
    /// Only possible when the numeric id space is saturated; fatal to
    /// the single create request, not to the server.
    IdSpaceExhausted,
}

impl ErrorKind {
    /// Convert to the string representation used in protocol messages
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::NotLoggedIn => "not_logged_in",
            Self::NotInRoom => "not_in_room",
            Self::IdSpaceExhausted => "id_space_exhausted",
        }
    }

    /// Parse from string (for client-side handling)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "validation" => Some(Self::Validation),
            "not_found" => Some(Self::NotFound),
            "forbidden" => Some(Self::Forbidden),
            "not_logged_in" => Some(Self::NotLoggedIn),
            "not_in_room" => Some(Self::NotInRoom),
            "id_space_exhausted" => Some(Self::IdSpaceExhausted),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ErrorKind> for String {
    fn from(kind: ErrorKind) -> Self {
        kind.as_str().to_string()
    }
}
