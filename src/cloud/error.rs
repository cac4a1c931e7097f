// ABOUTME: Error types for management API calls and publishing profile parsing.
// ABOUTME: Wraps HTTP transport failures and unexpected API responses.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("management API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid publishing profile: {0}")]
    InvalidProfile(String),

    #[error("credential {0} has no access token")]
    MissingToken(String),
}

pub type Result<T> = std::result::Result<T, Error>;
