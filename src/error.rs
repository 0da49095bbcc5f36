//! Error types for DVID volume operations

use crate::types::DataType;
use thiserror::Error;

/// Main error type for volume client operations
#[derive(Error, Debug)]
pub enum DvidError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{}", describe_error_response(.action, .status, .reason, .body))]
    ErrorResponse {
        /// What the client was trying to do, e.g. "subvolume query"
        action: String,
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("The server has no type for {channels} channel(s) of element type {data_type}")]
    UnsupportedType { data_type: DataType, channels: usize },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Decode error: stream ended after {received} of {expected} bytes")]
    Decode { expected: usize, received: usize },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Element type mismatch: volume holds {expected}, caller used {actual}")]
    DataTypeMismatch { expected: DataType, actual: DataType },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized Result type for volume client operations
pub type Result<T> = std::result::Result<T, DvidError>;

impl DvidError {
    /// HTTP status carried by an [`DvidError::ErrorResponse`]
    pub fn status(&self) -> Option<u16> {
        match self {
            DvidError::ErrorResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for faults that leave the shared connection in an unknown state
    pub fn is_protocol_fault(&self) -> bool {
        matches!(self, DvidError::Protocol(_))
    }
}

fn describe_error_response(action: &str, status: &u16, reason: &str, body: &str) -> String {
    let mut caption = format!(
        "While attempting \"{}\" the server returned an error: {}, \"{}\"",
        action, status, reason
    );
    if *status == 500 {
        caption.push_str("\nServer response body:\n");
        caption.push_str(body);
    }
    caption
}

impl From<serde_json::Error> for DvidError {
    fn from(err: serde_json::Error) -> Self {
        DvidError::Parse(err.to_string())
    }
}

#[cfg(feature = "http-client")]
impl From<reqwest::Error> for DvidError {
    fn from(err: reqwest::Error) -> Self {
        DvidError::Connection(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DvidError {
    fn from(err: ndarray::ShapeError) -> Self {
        DvidError::Encode(err.to_string())
    }
}
