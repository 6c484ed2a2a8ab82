//! Client-side error type

use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// Errors surfaced by [`CredentClient`](crate::CredentClient) calls
#[derive(Debug, Error)]
pub enum SdkError {
    /// The daemon answered with a JSON-RPC error object
    #[error("server error {code}: {message}")]
    Server { code: i32, message: String },

    #[error("transport failure: {0}")]
    Transport(String),

    /// The underlying client is unusable and must be rebuilt
    #[error("connection lost")]
    ConnectionLost,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl SdkError {
    /// True for the daemon's NOT_FOUND code
    pub fn is_not_found(&self) -> bool {
        matches!(self, SdkError::Server { code: 4001, .. })
    }

    /// True for the daemon's CONFLICT code (e.g. a pass already running)
    pub fn is_conflict(&self) -> bool {
        matches!(self, SdkError::Server { code: 4002, .. })
    }

    /// True when the daemon throttled the request
    pub fn is_throttled(&self) -> bool {
        matches!(self, SdkError::Server { code: 4003, .. })
    }
}

impl From<jsonrpsee::core::ClientError> for SdkError {
    fn from(e: jsonrpsee::core::ClientError) -> Self {
        use jsonrpsee::core::ClientError;
        match e {
            ClientError::Call(err) => SdkError::Server {
                code: err.code(),
                message: err.message().to_string(),
            },
            ClientError::Transport(err) => SdkError::Transport(err.to_string()),
            ClientError::RestartNeeded(_) => SdkError::ConnectionLost,
            ClientError::ParseError(err) => SdkError::Decode(err.to_string()),
            other => SdkError::Transport(other.to_string()),
        }
    }
}
