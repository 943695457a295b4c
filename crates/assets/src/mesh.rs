use actorloop_common::Aabb;
use glam::Vec3;
use sha2::{Digest, Sha256};

/// Content hash of a mesh's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u64);

/// Triangle mesh in model-local space.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Triangle list indexing into `positions`.
    pub indices: Vec<u32>,
    bounds: Aabb,
}

impl Mesh {
    /// Build a mesh and compute its local bounds. Returns `None` when there
    /// are no vertices to bound.
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Option<Self> {
        let bounds = Aabb::from_points(&positions)?;
        Some(Self {
            name: name.into(),
            positions,
            indices,
            bounds,
        })
    }

    /// Axis-aligned cube centred on the origin.
    pub fn cube(half_extent: f32) -> Self {
        let p = half_extent;
        let positions = vec![
            Vec3::new(-p, -p, -p),
            Vec3::new(p, -p, -p),
            Vec3::new(p, p, -p),
            Vec3::new(-p, p, -p),
            Vec3::new(-p, -p, p),
            Vec3::new(p, -p, p),
            Vec3::new(p, p, p),
            Vec3::new(-p, p, p),
        ];
        #[rustfmt::skip]
        let indices = vec![
            4,5,6, 6,7,4, // +Z
            1,0,3, 3,2,1, // -Z
            5,1,2, 2,6,5, // +X
            0,4,7, 7,3,0, // -X
            7,6,2, 2,3,7, // +Y
            0,1,5, 5,4,0, // -Y
        ];
        Self {
            name: "cube".into(),
            positions,
            indices,
            bounds: Aabb::new(Vec3::splat(-p), Vec3::splat(p)),
        }
    }

    /// Model-local bounding box.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Content hash over vertex and index data. The name does not take part,
    /// so the same geometry under two file names is stored once.
    pub fn content_id(&self) -> MeshId {
        let mut hasher = Sha256::new();
        hasher.update((self.positions.len() as u64).to_le_bytes());
        for p in &self.positions {
            hasher.update(p.x.to_le_bytes());
            hasher.update(p.y.to_le_bytes());
            hasher.update(p.z.to_le_bytes());
        }
        for i in &self.indices {
            hasher.update(i.to_le_bytes());
        }
        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        MeshId(u64::from_le_bytes(bytes))
    }
}
