/// Failures of the typed value codec.
///
/// Every variant is a local, synchronous rejection: the gateway turns them
/// into a 4xx response before anything reaches the broker, and the worker
/// turns them into a `FAILURE` record.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CodecError {
    /// The runtime value is outside the closed set of encodable kinds.
    #[error("Unsupported kind: {0}")]
    UnsupportedKind(String),

    /// Array byte length does not agree with its shape and dtype.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The image payload is not a decodable image container.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// The payload of a recognized kind does not have the expected form.
    #[error("Malformed {kind} payload: {reason}")]
    MalformedPayload { kind: &'static str, reason: String },
}

impl CodecError {
    /// Build a [`CodecError::MalformedPayload`] for the given kind tag.
    pub fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            kind,
            reason: reason.into(),
        }
    }

    /// Numeric status code reported to clients.
    pub fn code(&self) -> u16 {
        match self {
            Self::UnsupportedKind(_) => 4010,
            Self::ShapeMismatch(_) => 4011,
            Self::ImageDecode(_) => 4012,
            Self::MalformedPayload { .. } => 4013,
        }
    }
}

/// Violations of the request envelope shape, in the order they are checked.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    InvalidBody,

    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("Missing operation: a non-empty operation name is required")]
    MissingOperation,

    #[error("Invalid parameters: expected an object")]
    InvalidParameters,

    #[error("Invalid args: expected an array")]
    InvalidArgs,

    #[error("Invalid kwargs: expected an object with string keys")]
    InvalidKwargs,

    #[error("Malformed argument {position}: {reason}")]
    MalformedArgument { position: String, reason: String },
}

impl ValidationError {
    /// Numeric status code reported to clients. Distinct per constraint.
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidBody => 4000,
            Self::MissingOperation => 4001,
            Self::UnknownDomain(_) => 4002,
            Self::InvalidParameters => 4003,
            Self::InvalidArgs => 4004,
            Self::InvalidKwargs => 4005,
            Self::MalformedArgument { .. } => 4006,
        }
    }
}
