//! Unified client error model.
//! Every public operation returns `ClientResult<T>`; the variants separate protocol
//! failures reported by the service from caller mistakes caught before any request.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Response status differed from the status the call expects.
    #[error("{code}: {summary} - {detail}")]
    ApiCall { status: u16, code: String, summary: String, detail: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{value} not found (known: {})", .known.join(", "))]
    NotFound { value: String, known: Vec<String> },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("malformed XML document: {0}")]
    Xml(String),

    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self { ClientError::InvalidArgument(msg.into()) }

    pub fn missing_attribute<S: Into<String>>(element: S, attribute: S) -> Self {
        ClientError::MissingAttribute { element: element.into(), attribute: attribute.into() }
    }

    pub fn not_found<I, S>(value: &str, known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ClientError::NotFound { value: value.to_string(), known: known.into_iter().map(Into::into).collect() }
    }

    /// HTTP status of a protocol error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::ApiCall { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Service error code (e.g. "404004") of a protocol error.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            ClientError::ApiCall { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}
