//! Error types for mail operations.

/// Result type alias for mail operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Mail error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The mailbox backend returned a non-success response.
    #[error("Mailbox upstream error ({status}): {message}")]
    Upstream {
        /// HTTP-ish status code reported by the backend.
        status: u16,
        /// Backend-supplied error detail.
        message: String,
    },

    /// The stored refresh token was rejected while resolving an access token.
    #[error("Token refresh rejected: {0}")]
    TokenRefresh(String),
}
