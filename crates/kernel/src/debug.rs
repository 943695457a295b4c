use actorloop_common::{Aabb, Color};
use glam::Vec3;

/// A wireframe primitive requested during the update phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugPrimitive {
    WireBox { bounds: Aabb, color: Color },
    WireSphere { center: Vec3, radius: f32, color: Color },
}

/// Per-frame queue of debug primitives.
///
/// Collision reactions push here instead of drawing; the frame driver draws
/// the queue inside the 3D scope of the same frame. The queue is cleared at
/// the start of every collision pass.
#[derive(Debug, Clone, Default)]
pub struct DebugOverlay {
    primitives: Vec<DebugPrimitive>,
}

impl DebugOverlay {
    pub fn wire_box(&mut self, bounds: Aabb, color: Color) {
        self.primitives.push(DebugPrimitive::WireBox { bounds, color });
    }

    pub fn wire_sphere(&mut self, center: Vec3, radius: f32, color: Color) {
        self.primitives.push(DebugPrimitive::WireSphere {
            center,
            radius,
            color,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &DebugPrimitive> {
        self.primitives.iter()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
    }
}
