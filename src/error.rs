//! PromptGuard error types

use thiserror::Error;

/// PromptGuard error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (invalid rule table, bad config file).
    ///
    /// Raised while building the pattern registry or loading config;
    /// callers are expected to abort startup on it.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport or API failure talking to the rewrite service
    #[error("Remote rewrite error: {0}")]
    Remote(String),

    /// The rewrite service did not answer within the configured bound
    #[error("Remote rewrite timed out after {0} ms")]
    RemoteTimeout(u64),

    /// The rewrite service returned text that still carries original values
    #[error("Remote rewrite leaked sensitive data: {0}")]
    Leakage(String),

    /// Local redaction left original values in the text bound for the
    /// rewrite service, so it was not sent
    #[error("Refusing remote rewrite, redacted text still carries: {0}")]
    UnsafeRequest(String),
}

/// Result type alias for PromptGuard operations
pub type Result<T> = std::result::Result<T, Error>;
