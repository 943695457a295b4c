use crate::{AssetError, Mesh, MeshId, parse_obj};
use actorloop_common::Aabb;
use std::collections::BTreeMap;
use std::path::Path;

/// Source name for the built-in unit cube.
pub const BUILTIN_CUBE: &str = "builtin:cube";

/// Identifies one loaded asset. Copyable so draw lists can refer to it; the
/// owning [`AssetHandle`] is what keeps the asset alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u64);

/// Exclusive ownership of one loaded asset.
///
/// Only [`AssetStore`] creates handles, and [`AssetStore::unload`] consumes
/// them.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an asset handle must be unloaded through its AssetStore"]
pub struct AssetHandle {
    id: AssetId,
    mesh: MeshId,
}

impl AssetHandle {
    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn mesh_id(&self) -> MeshId {
        self.mesh
    }
}

#[derive(Debug)]
struct Loaded {
    mesh: MeshId,
    source: String,
}

#[derive(Debug)]
struct MeshEntry {
    mesh: Mesh,
    refs: usize,
}

/// Load/unload counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetStats {
    pub loaded: u64,
    pub released: u64,
}

impl AssetStats {
    pub fn live(&self) -> u64 {
        self.loaded - self.released
    }
}

/// Owner of all loaded geometry.
#[derive(Debug, Default)]
pub struct AssetStore {
    loaded: BTreeMap<AssetId, Loaded>,
    meshes: BTreeMap<MeshId, MeshEntry>,
    next_id: u64,
    stats: AssetStats,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an asset from `path`, or the built-in cube for [`BUILTIN_CUBE`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<AssetHandle, AssetError> {
        let path = path.as_ref();
        let source = path.to_string_lossy().into_owned();
        if source == BUILTIN_CUBE {
            return Ok(self.insert(Mesh::cube(0.5), source));
        }
        let text = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.clone());
        let mesh = parse_obj(&name, &text)?;
        Ok(self.insert(mesh, source))
    }

    /// Register an in-memory mesh as a new asset.
    pub fn load_mesh(&mut self, mesh: Mesh) -> AssetHandle {
        let source = format!("memory:{}", mesh.name);
        self.insert(mesh, source)
    }

    /// Release an asset. Its geometry is dropped when no other handle shares it.
    pub fn unload(&mut self, handle: AssetHandle) -> Result<(), AssetError> {
        let loaded = self
            .loaded
            .remove(&handle.id)
            .ok_or(AssetError::NotLoaded(handle.id))?;
        if let Some(entry) = self.meshes.get_mut(&loaded.mesh) {
            entry.refs -= 1;
            if entry.refs == 0 {
                self.meshes.remove(&loaded.mesh);
                tracing::debug!(mesh = loaded.mesh.0, "geometry released");
            }
        }
        self.stats.released += 1;
        tracing::debug!(asset = handle.id.0, source = %loaded.source, "asset unloaded");
        Ok(())
    }

    /// Model-local bounds of a loaded asset.
    pub fn local_bounds(&self, id: AssetId) -> Result<Aabb, AssetError> {
        self.mesh(id)
            .map(Mesh::bounds)
            .ok_or(AssetError::NotLoaded(id))
    }

    /// Geometry behind a loaded asset.
    pub fn mesh(&self, id: AssetId) -> Option<&Mesh> {
        let loaded = self.loaded.get(&id)?;
        self.meshes.get(&loaded.mesh).map(|e| &e.mesh)
    }

    /// Geometry by content id.
    pub fn mesh_by_id(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(&id).map(|e| &e.mesh)
    }

    /// Content id of a loaded asset's geometry.
    pub fn mesh_id(&self, id: AssetId) -> Option<MeshId> {
        self.loaded.get(&id).map(|l| l.mesh)
    }

    pub fn is_loaded(&self, id: AssetId) -> bool {
        self.loaded.contains_key(&id)
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Number of distinct geometries held.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn stats(&self) -> AssetStats {
        self.stats
    }

    fn insert(&mut self, mesh: Mesh, source: String) -> AssetHandle {
        let mesh_id = mesh.content_id();
        self.meshes
            .entry(mesh_id)
            .or_insert(MeshEntry { mesh, refs: 0 })
            .refs += 1;

        let id = AssetId(self.next_id);
        self.next_id += 1;
        self.stats.loaded += 1;
        tracing::debug!(asset = id.0, mesh = mesh_id.0, %source, "asset loaded");
        self.loaded.insert(
            id,
            Loaded {
                mesh: mesh_id,
                source,
            },
        );
        AssetHandle { id, mesh: mesh_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::io::Write;

    #[test]
    fn builtin_cube_has_unit_bounds() {
        let mut store = AssetStore::new();
        let handle = store.load(BUILTIN_CUBE).unwrap();
        let bounds = store.local_bounds(handle.id()).unwrap();
        assert_eq!(bounds.min, Vec3::splat(-0.5));
        assert_eq!(bounds.max, Vec3::splat(0.5));
        store.unload(handle).unwrap();
    }

    #[test]
    fn each_load_gets_its_own_handle() {
        let mut store = AssetStore::new();
        let a = store.load(BUILTIN_CUBE).unwrap();
        let b = store.load(BUILTIN_CUBE).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.mesh_id(), b.mesh_id());
        assert_eq!(store.len(), 2);
        assert_eq!(store.mesh_count(), 1);
        store.unload(a).unwrap();
        store.unload(b).unwrap();
    }

    #[test]
    fn shared_geometry_outlives_first_unload() {
        let mut store = AssetStore::new();
        let a = store.load(BUILTIN_CUBE).unwrap();
        let b = store.load(BUILTIN_CUBE).unwrap();
        let b_id = b.id();

        store.unload(a).unwrap();
        assert_eq!(store.mesh_count(), 1);
        assert!(store.local_bounds(b_id).is_ok());

        store.unload(b).unwrap();
        assert_eq!(store.mesh_count(), 0);
        assert!(store.is_empty());
        assert!(matches!(
            store.local_bounds(b_id),
            Err(AssetError::NotLoaded(_))
        ));
    }

    #[test]
    fn stats_count_loads_and_releases() {
        let mut store = AssetStore::new();
        let a = store.load(BUILTIN_CUBE).unwrap();
        let _b = store.load_mesh(Mesh::cube(2.0));
        store.unload(a).unwrap();
        let stats = store.stats();
        assert_eq!(stats.loaded, 2);
        assert_eq!(stats.released, 1);
        assert_eq!(stats.live(), 1);
    }

    #[test]
    fn handle_from_another_store_is_rejected() {
        let mut first = AssetStore::new();
        let mut second = AssetStore::new();
        let _keep = second.load(BUILTIN_CUBE).unwrap();
        let _skip = second.load(BUILTIN_CUBE).unwrap();
        let stray = second.load(BUILTIN_CUBE).unwrap();
        let err = first.unload(stray).unwrap_err();
        assert!(matches!(err, AssetError::NotLoaded(AssetId(2))));
    }

    #[test]
    fn loads_obj_from_disk() {
        let mut tmp = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        writeln!(tmp, "v 0 0 0\nv 2 0 0\nv 0 3 0\nv 0 0 4\nf 1 2 3\nf 1 3 4").unwrap();

        let mut store = AssetStore::new();
        let handle = store.load(tmp.path()).unwrap();
        let bounds = store.local_bounds(handle.id()).unwrap();
        assert_eq!(bounds.max, Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(store.mesh(handle.id()).unwrap().triangle_count(), 2);
        store.unload(handle).unwrap();
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AssetStore::new();
        let err = store.load(dir.path().join("missing.obj")).unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
        assert!(store.is_empty());
    }
}
