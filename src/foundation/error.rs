/// Convenience result type used across the crate.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy for timeline building, compositing, capture and finalization.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// A render was requested for a timeline with no scenes.
    #[error("empty timeline: nothing to render")]
    EmptyTimeline,

    /// An image or audio asset could not be decoded.
    #[error("asset decode error: {0}")]
    AssetDecode(String),

    /// No codec/container combination is available on the capture host.
    #[error("capture unsupported: {0}")]
    CaptureUnsupported(String),

    /// Stopping or flushing the recorder produced an empty or unusable artifact.
    #[error("finalize error: {0}")]
    Finalize(String),

    /// Invalid user-provided options or data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The render was cancelled before it completed.
    #[error("render aborted")]
    Aborted,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Copyable error kind reported with a terminal `Failed` signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`ReelError::EmptyTimeline`].
    EmptyTimeline,
    /// See [`ReelError::AssetDecode`].
    AssetDecode,
    /// See [`ReelError::CaptureUnsupported`].
    CaptureUnsupported,
    /// See [`ReelError::Finalize`].
    Finalize,
    /// See [`ReelError::Validation`].
    Validation,
    /// See [`ReelError::Aborted`].
    Aborted,
    /// See [`ReelError::Other`].
    Other,
}

impl ReelError {
    /// Build a [`ReelError::AssetDecode`] value.
    pub fn asset_decode(msg: impl Into<String>) -> Self {
        Self::AssetDecode(msg.into())
    }

    /// Build a [`ReelError::CaptureUnsupported`] value.
    pub fn capture_unsupported(msg: impl Into<String>) -> Self {
        Self::CaptureUnsupported(msg.into())
    }

    /// Build a [`ReelError::Finalize`] value.
    pub fn finalize(msg: impl Into<String>) -> Self {
        Self::Finalize(msg.into())
    }

    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Return the copyable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyTimeline => ErrorKind::EmptyTimeline,
            Self::AssetDecode(_) => ErrorKind::AssetDecode,
            Self::CaptureUnsupported(_) => ErrorKind::CaptureUnsupported,
            Self::Finalize(_) => ErrorKind::Finalize,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Aborted => ErrorKind::Aborted,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
