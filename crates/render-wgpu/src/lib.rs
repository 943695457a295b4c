//! wgpu render backend for recorded frames.
//!
//! Draws a grid floor, instanced meshes taken from the asset store, and the
//! wireframe debug primitives of a [`actorloop_render::DrawList`]. Text is
//! left to the host's UI layer.
//!
//! # Invariants
//! - The renderer never touches simulation state; it only reads draw lists.
//! - Geometry is uploaded once per distinct mesh and dropped after the
//!   store releases it.

mod camera;
mod geometry;
mod gpu;
mod shaders;

pub use camera::Projection;
pub use gpu::{RenderStats, WgpuRenderer};
