use crate::document::host::HostError;

/// Convenience result type used across colorswap.
pub type ColorSwapResult<T> = Result<T, ColorSwapError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Per-node capability failures never reach this type during a walk; they are
/// absorbed as "contributes nothing". Only structural problems surface here.
#[derive(thiserror::Error, Debug)]
pub enum ColorSwapError {
    /// Invalid user-provided or document data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A caller payload (swap request, undo history) could not be interpreted.
    #[error("payload error: {0}")]
    Payload(String),

    /// A host capability failed where the caller required it to succeed.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ColorSwapError {
    /// Build a [`ColorSwapError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ColorSwapError::Payload`] value.
    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }

    /// Build a [`ColorSwapError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
