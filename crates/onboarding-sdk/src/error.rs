//! Error types for the Onboarding SDK

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    /// The server rejected the request body or parameters
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Any other non-success response
    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// Connection error (remote mode)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Pipeline failure (embedded mode)
    #[error(transparent)]
    Rag(#[from] onboarding_buddy::RagError),

    /// Graph failure (embedded mode)
    #[error(transparent)]
    Graph(#[from] onboarding_buddy::GraphError),
}

pub type SdkResult<T> = Result<T, SdkError>;
