//! Renderable asset boundary: load/unload pairs, owned handles, local bounds.
//!
//! Every `load` hands out a fresh [`AssetHandle`]. Handles are not `Clone`;
//! [`AssetStore::unload`] consumes them, so a handle is released at most once
//! and never used afterwards. Geometry is content-addressed: handles loaded
//! from identical data share one [`Mesh`], which is dropped together with
//! its last handle.
//!
//! # Sources
//! - `builtin:cube` is the unit cube centred on the origin.
//! - Any other path is read as a Wavefront OBJ file.

mod mesh;
mod obj;
mod store;

pub use mesh::{Mesh, MeshId};
pub use obj::parse_obj;
pub use store::{AssetHandle, AssetId, AssetStats, AssetStore, BUILTIN_CUBE};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OBJ parse error on line {line}: {message}")]
    ObjParse { line: usize, message: String },
    #[error("mesh `{0}` has no vertices")]
    EmptyMesh(String),
    #[error("asset not loaded: {0:?}")]
    NotLoaded(AssetId),
}

pub fn crate_info() -> &'static str {
    "actorloop-assets v0.1.0"
}
