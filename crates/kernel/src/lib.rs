//! Simulation kernel: entity registry, bounding volumes, pairwise collision
//! detection and per-entity behavior hooks.
//!
//! # Invariants
//! - Registry topology changes only through `insert_end`; there is no removal.
//! - Traversal order is insertion order, and every traversal visits each
//!   entity exactly once.
//! - An entity's position and tag are mutated only by its own behavior.
//! - Every asset handle owned by the registry is released exactly once, at
//!   teardown.
//! - Frame phases run strictly in sequence: bounding volumes, collisions,
//!   render traversal.

pub mod behavior;
pub mod collision;
pub mod debug;
pub mod entity;
pub mod registry;
pub mod scene;
pub mod simulation;

pub use behavior::{Behavior, BehaviorKind, Oscillator};
pub use collision::Contact;
pub use debug::{DebugOverlay, DebugPrimitive};
pub use entity::{Entity, EntityState, Neighbor, Tag};
pub use registry::EntityRegistry;
pub use scene::{SceneConfig, SpawnConfig};
pub use simulation::{DEFAULT_EVENT_CAPACITY, FrameReport, SimEvent, Simulation, TagCause};

use actorloop_assets::AssetError;

/// Errors from kernel operations.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("scene YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("scene JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported scene format `{0}` (expected .yaml, .yml or .json)")]
    UnsupportedScene(String),
    #[error("entity registry full: slot {0} has no 32-bit id")]
    RegistryFull(usize),
}

pub fn crate_info() -> &'static str {
    "actorloop-kernel v0.1.0"
}
