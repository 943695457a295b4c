//! Rendering boundary: a renderer-agnostic backend trait, per-frame draw
//! lists and the frame driver that sequences one simulation frame.
//!
//! # Invariants
//! - Backends never mutate simulation state.
//! - Scope calls nest: frame, then 3D inside the frame.
//! - The termination query is checked once per frame boundary.

mod driver;
mod pacing;
mod recorder;
mod renderer;

pub use driver::{FrameDriver, RunSummary, TITLE_FONT_SIZE, TITLE_POSITION};
pub use pacing::{FixedStep, TARGET_FPS};
pub use recorder::{DrawCommand, DrawList, FrameRecorder};
pub use renderer::{RenderBackend, Scope, TextRenderer};

use actorloop_kernel::KernelError;

/// Errors from the rendering boundary.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render scope mismatch: `{call}` needs {expected:?}, currently in {found:?}")]
    ScopeMismatch {
        call: &'static str,
        expected: Scope,
        found: Scope,
    },
    #[error("{0} draw call(s) issued outside their scope this frame")]
    OutOfScopeDraws(usize),
    #[error("simulation error: {0}")]
    Kernel(#[from] KernelError),
}

pub fn crate_info() -> &'static str {
    "actorloop-render v0.1.0"
}
