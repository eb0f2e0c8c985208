use crate::foundation::error::ErrorKind;

/// Render orchestrator states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// No render in flight.
    Idle,
    /// Session allocated, waiting for the first image.
    Priming,
    /// Walking the scenes.
    Scening,
    /// Tail hold and recorder stop.
    Finalizing,
    /// Artifact produced.
    Complete,
    /// Terminal failure; teardown already ran.
    Failed,
}

/// Progress notifications for UIs.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum RenderEvent {
    /// State transition.
    State {
        /// New state.
        state: RenderState,
    },
    /// Progress percent, non-decreasing within a session.
    Progress {
        /// 0..=100.
        percent: u8,
    },
    /// A scene became current.
    SceneStarted {
        /// Scene index.
        index: usize,
        /// Scene count.
        total: usize,
    },
    /// A scene kept the previous frame's image.
    ImageSubstituted {
        /// Scene index.
        index: usize,
        /// Why the scene's own image was not used.
        reason: String,
    },
    /// An encoded chunk was appended.
    Chunk {
        /// Chunk position in the artifact.
        index: usize,
        /// Chunk size in bytes.
        bytes: usize,
    },
    /// Terminal error.
    Failed {
        /// Error kind.
        kind: ErrorKind,
        /// Error message.
        message: String,
    },
}
