//! CPU-side vertex generation for meshes, the grid floor and wireframes.

use actorloop_assets::Mesh;
use actorloop_common::{Aabb, Color};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Segments per wire-sphere ring.
pub(crate) const SPHERE_SEGMENTS: usize = 24;

const GRID_COLOR: [f32; 4] = [0.75, 0.75, 0.75, 1.0];

/// Unindexed triangle list with one face normal per triangle.
///
/// OBJ files carry no reliable normals, so every triangle is shaded flat.
/// Out-of-range indices drop the triangle.
pub(crate) fn flat_shaded(mesh: &Mesh) -> Vec<MeshVertex> {
    let mut out = Vec::with_capacity(mesh.indices.len());
    for tri in mesh.indices.chunks_exact(3) {
        let corners: Option<Vec<Vec3>> = tri
            .iter()
            .map(|&i| mesh.positions.get(i as usize).copied())
            .collect();
        let Some(p) = corners else { continue };
        let normal = (p[1] - p[0]).cross(p[2] - p[0]).normalize_or_zero();
        out.extend(p.iter().map(|v| MeshVertex {
            position: v.to_array(),
            normal: normal.to_array(),
        }));
    }
    out
}

/// Line list for a square grid on the XZ plane, centred on the origin.
pub(crate) fn grid_lines(half_extent: i32, spacing: f32) -> Vec<LineVertex> {
    let mut verts = Vec::new();
    let extent = half_extent as f32 * spacing;
    let line = |a: [f32; 3], b: [f32; 3]| {
        [
            LineVertex {
                position: a,
                color: GRID_COLOR,
            },
            LineVertex {
                position: b,
                color: GRID_COLOR,
            },
        ]
    };

    for i in -half_extent..=half_extent {
        let offset = i as f32 * spacing;
        verts.extend(line([-extent, 0.0, offset], [extent, 0.0, offset]));
        verts.extend(line([offset, 0.0, -extent], [offset, 0.0, extent]));
    }
    verts
}

/// The twelve edges of a box.
pub(crate) fn wire_box_lines(bounds: &Aabb, tint: Color, out: &mut Vec<LineVertex>) {
    // Bottom ring, top ring, then the verticals joining them.
    #[rustfmt::skip]
    const EDGES: [(usize, usize); 12] = [
        (0, 1), (1, 2), (2, 3), (3, 0),
        (4, 5), (5, 6), (6, 7), (7, 4),
        (0, 4), (1, 5), (2, 6), (3, 7),
    ];
    let corners = bounds.corners();
    let color = tint.to_array();
    for (a, b) in EDGES {
        out.push(LineVertex {
            position: corners[a].to_array(),
            color,
        });
        out.push(LineVertex {
            position: corners[b].to_array(),
            color,
        });
    }
}

/// Three great circles, one per axis plane.
pub(crate) fn wire_sphere_lines(center: Vec3, radius: f32, tint: Color, out: &mut Vec<LineVertex>) {
    let color = tint.to_array();
    let step = std::f32::consts::TAU / SPHERE_SEGMENTS as f32;
    let rings: [fn(f32, f32) -> Vec3; 3] = [
        |c, s| Vec3::new(c, s, 0.0),
        |c, s| Vec3::new(c, 0.0, s),
        |c, s| Vec3::new(0.0, c, s),
    ];
    for ring in rings {
        for k in 0..SPHERE_SEGMENTS {
            let (a, b) = (k as f32 * step, (k + 1) as f32 * step);
            for angle in [a, b] {
                let p = center + ring(angle.cos(), angle.sin()) * radius;
                out.push(LineVertex {
                    position: p.to_array(),
                    color,
                });
            }
        }
    }
}
