//! Failure classes surfaced to whoever presents the session.

use thiserror::Error;

/// Fieldless discriminant of [`ClientError`], for callers that branch on the
/// class only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotOpen,
    LostConnection,
    ServerClosed,
    GameExited,
    UnsupportedEnvironment,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A send was attempted before the socket finished opening.
    #[error("You need an open connection before messaging")]
    NotOpen,

    /// Transport error, abrupt close, or a send after the socket went away.
    #[error("Connection to server lost")]
    LostConnection,

    /// The server closed the socket cleanly.
    #[error("Server closed connection: {reason}")]
    ServerClosed { reason: String },

    /// The server ended the match; `reason` is meant for the player.
    #[error("{reason}")]
    GameExited { reason: String },

    #[error("Your environment cannot draw the game: {detail}")]
    UnsupportedEnvironment { detail: String },
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::NotOpen => ErrorKind::NotOpen,
            ClientError::LostConnection => ErrorKind::LostConnection,
            ClientError::ServerClosed { .. } => ErrorKind::ServerClosed,
            ClientError::GameExited { .. } => ErrorKind::GameExited,
            ClientError::UnsupportedEnvironment { .. } => ErrorKind::UnsupportedEnvironment,
        }
    }

    /// Whether the session cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::LostConnection | ErrorKind::ServerClosed | ErrorKind::UnsupportedEnvironment
        )
    }

    /// Whether presentation should offer a way back to the menu. Retrying in
    /// an environment that cannot draw is pointless.
    pub fn offers_menu_return(&self) -> bool {
        self.kind() != ErrorKind::UnsupportedEnvironment
    }
}
