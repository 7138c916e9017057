/// Convenience result type used across flipbook.
pub type FlipbookResult<T> = Result<T, FlipbookError>;

/// Top-level error taxonomy used by codec, capture, and playback APIs.
///
/// Storage-budget overruns are not errors: capture reports them through
/// [`CaptureReport`](crate::CaptureReport) and keeps the frames captured so far.
#[derive(thiserror::Error, Debug)]
pub enum FlipbookError {
    /// An edit script references positions outside its base frame.
    #[error("corrupt patch: {0}")]
    CorruptPatch(String),

    /// An element reported as changed was never seen during base capture.
    #[error("unrecognized element: {element} (not seen during base capture)")]
    UnrecognizedElement {
        /// Debug rendering of the offending element handle or identity.
        element: String,
    },

    /// Invalid user-provided configuration, arguments, or artifact data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A base document or element fragment is not well-formed markup.
    #[error("markup error: {0}")]
    Markup(String),

    /// Errors when serializing or deserializing artifacts.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlipbookError {
    /// Build a [`FlipbookError::CorruptPatch`] value.
    pub fn corrupt_patch(msg: impl Into<String>) -> Self {
        Self::CorruptPatch(msg.into())
    }

    /// Build a [`FlipbookError::UnrecognizedElement`] value.
    pub fn unrecognized(element: impl Into<String>) -> Self {
        Self::UnrecognizedElement {
            element: element.into(),
        }
    }

    /// Build a [`FlipbookError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FlipbookError::Markup`] value.
    pub fn markup(msg: impl Into<String>) -> Self {
        Self::Markup(msg.into())
    }

    /// Build a [`FlipbookError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for FlipbookError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

impl From<roxmltree::Error> for FlipbookError {
    fn from(err: roxmltree::Error) -> Self {
        Self::Markup(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
