//! One render pass: session resources, orchestration and progress events.

/// Progress and state events.
pub mod events;
/// Render orchestration.
pub mod orchestrator;
/// Per-render resources and teardown.
pub mod render_session;

pub use events::{RenderEvent, RenderState};
pub use orchestrator::{
    RenderOrchestrator, RenderOutput, RenderReport, SceneAudio, SceneImage, SceneReport,
};
pub use render_session::RenderSession;
