//! Shared value types for the actorloop workspace.
//!
//! Everything here is plain data: identifiers, colors, axis-aligned boxes and
//! the camera description. No crate-specific behavior lives here.

mod bounds;
mod camera;
mod types;

pub use bounds::Aabb;
pub use camera::Camera;
pub use types::{Color, EntityId};
