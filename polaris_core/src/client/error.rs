//! Error types for proposal tool backend calls.
//!
//! Every failure is decoded exactly once, at the HTTP boundary, into a
//! [`ClientError`]. Services never inspect raw bodies or status codes; they
//! turn errors into notifications through [`ClientError::user_message`].

use std::fmt;

use crate::api::ErrorPayload;

/// Result type for backend calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Structured context describing which call failed and on what.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "save_configuration").
    pub operation: Option<String>,
    /// The entity type involved (e.g., "telescope", "allocated_block").
    pub entity: Option<String>,
    /// The entity ID if applicable.
    pub entity_id: Option<String>,
    /// Additional details about the error.
    pub details: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref id) = self.entity_id {
            parts.push(format!("id={}", id));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for backend calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (connection refused, timeout).
    #[error("Network error ({message}) {context}")]
    Network {
        message: String,
        context: ErrorContext,
    },

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {} {context}", .payload.display_message())]
    Http {
        status: u16,
        payload: ErrorPayload,
        context: ErrorContext,
    },

    /// Input rejected before anything was sent.
    #[error("Validation error: {message} {context}")]
    Validation {
        message: String,
        context: ErrorContext,
    },

    /// A response arrived but its body could not be decoded.
    #[error("Decode error: {message} {context}")]
    Decode {
        message: String,
        context: ErrorContext,
    },

    /// The owning view was disposed before the call completed.
    #[error("Cancelled {context}")]
    Cancelled { context: ErrorContext },

    #[error("Configuration error: {message} {context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Not found: {message} {context}")]
    NotFound {
        message: String,
        context: ErrorContext,
    },
}

impl ClientError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn http(status: u16, payload: ErrorPayload) -> Self {
        Self::Http {
            status,
            payload,
            context: ErrorContext::default(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn validation_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Validation {
            message: message.into(),
            context,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn cancelled() -> Self {
        Self::Cancelled {
            context: ErrorContext::default(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn not_found_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Network { context, .. }
            | Self::Http { context, .. }
            | Self::Validation { context, .. }
            | Self::Decode { context, .. }
            | Self::Cancelled { context }
            | Self::Configuration { context, .. }
            | Self::NotFound { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Network { context, .. }
            | Self::Http { context, .. }
            | Self::Validation { context, .. }
            | Self::Decode { context, .. }
            | Self::Cancelled { context }
            | Self::Configuration { context, .. }
            | Self::NotFound { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>, id: impl ToString) -> Self {
        let context = self.context_mut();
        context.entity = Some(entity.into());
        context.entity_id = Some(id.to_string());
        self
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// HTTP status, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for an end-user notification body.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { message, .. } => format!("Network error ({})", message),
            Self::Http { status: 401, .. } => "401, unauthorized".to_string(),
            Self::Http { payload, .. } => payload.display_message(),
            Self::Validation { message, .. }
            | Self::Configuration { message, .. }
            | Self::NotFound { message, .. } => message.clone(),
            Self::Decode { message, .. } => format!("Unexpected error ({})", message),
            Self::Cancelled { .. } => "Request cancelled".to_string(),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::decode(err.to_string())
    }
}

#[cfg(feature = "http-client")]
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::decode(err.to_string())
        } else if err.is_builder() {
            ClientError::configuration(err.to_string())
        } else {
            ClientError::network(err.to_string())
        }
    }
}
