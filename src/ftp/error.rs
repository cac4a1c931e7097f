// ABOUTME: FTP-specific error types.
// ABOUTME: Covers connection, authentication, rejected commands, and protocol failures.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A parsed server reply: three-digit code plus text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

impl Reply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    /// 1xx: the server accepted the command and will send another reply.
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// 2xx replies.
    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.text)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("not connected")]
    NotConnected,

    #[error("authentication failed for user {user}: {reply}")]
    AuthenticationFailed { user: String, reply: Reply },

    #[error("{command} failed: {reply}")]
    Rejected { command: String, reply: Reply },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Reply code of a rejected command, if any.
    pub fn reply_code(&self) -> Option<u16> {
        match self {
            Error::Rejected { reply, .. } | Error::AuthenticationFailed { reply, .. } => {
                Some(reply.code)
            }
            _ => None,
        }
    }

    /// Whether the server reported the target as unavailable (450/550).
    pub fn is_not_found(&self) -> bool {
        matches!(self.reply_code(), Some(450) | Some(550))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
