//! Scene configuration: what to spawn, with which model and behavior.
//!
//! Scenes are YAML (`.yaml`/`.yml`) or JSON (`.json`). Every field has a
//! default; an empty document yields the three-entity demo scene.
//!
//! ```yaml
//! title: Two patrols
//! model: resources/model1.obj   # relative to this file; or builtin:cube
//! entities:
//!   - position: [0.0, 0.0, 0.0]
//!   - position: [-2.0, 0.0, 0.0]
//!     behavior: { kind: oscillator, speed: 0.05 }
//!   - position: [4.0, 0.0, 0.0]
//!     behavior: { kind: stationary }
//! ```

use crate::KernelError;
use crate::behavior::BehaviorKind;
use crate::simulation::Simulation;
use actorloop_assets::{AssetStore, BUILTIN_CUBE};
use actorloop_common::{Camera, EntityId};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One entity to spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub position: Vec3,
    #[serde(default)]
    pub behavior: BehaviorKind,
    /// Overrides the scene-wide model for this entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl SpawnConfig {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            behavior: BehaviorKind::default(),
            model: None,
        }
    }
}

/// A whole scene: window title, camera, model and spawn list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub title: String,
    pub camera: Camera,
    /// Model path, relative to the scene file, or `builtin:cube`.
    pub model: String,
    pub entities: Vec<SpawnConfig>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            title: "Entity Component System (ECS) with Collision Detection".into(),
            camera: Camera::default(),
            model: BUILTIN_CUBE.into(),
            entities: vec![
                SpawnConfig::at(0.0, 0.0, 0.0),
                SpawnConfig::at(2.0, 0.0, 0.0),
                SpawnConfig::at(-2.0, 0.0, 0.0),
            ],
            base_dir: None,
        }
    }
}

impl SceneConfig {
    /// Read a scene file. The format follows the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KernelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let mut scene: Self = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&text)?,
            "json" => serde_json::from_str(&text)?,
            other => return Err(KernelError::UnsupportedScene(other.to_string())),
        };
        scene.base_dir = path.parent().map(Path::to_path_buf);
        tracing::info!(path = %path.display(), entities = scene.entities.len(), "scene loaded");
        Ok(scene)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, KernelError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, KernelError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Replace the scene-wide model path. A relative path is taken as-is,
    /// not relative to the scene file.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.entities.iter_mut().for_each(|s| s.model = None);
        self.base_dir = None;
        self
    }

    /// Where the model for `spawn` is loaded from.
    pub fn model_path(&self, spawn: &SpawnConfig) -> PathBuf {
        let model = spawn.model.as_deref().unwrap_or(&self.model);
        match &self.base_dir {
            Some(dir) if model != BUILTIN_CUBE && Path::new(model).is_relative() => dir.join(model),
            _ => PathBuf::from(model),
        }
    }

    /// Load one asset per entity and spawn the entities in list order.
    pub fn populate(
        &self,
        sim: &mut Simulation,
        assets: &mut AssetStore,
    ) -> Result<Vec<EntityId>, KernelError> {
        let mut ids = Vec::with_capacity(self.entities.len());
        for spawn in &self.entities {
            let handle = assets.load(self.model_path(spawn))?;
            ids.push(sim.spawn(assets, handle, spawn.position, spawn.behavior)?);
        }
        Ok(ids)
    }
}
