//! Minimal Wavefront OBJ reader.
//!
//! Only geometry is read: `v` records become positions and `f` records become
//! triangles (polygons are fan-triangulated). Texture coordinates, normals,
//! groups and materials are skipped.

use crate::{AssetError, Mesh};
use glam::Vec3;

/// Parse OBJ source text into a mesh.
pub fn parse_obj(name: &str, source: &str) -> Result<Mesh, AssetError> {
    let mut positions = Vec::new();
    let mut indices = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => {
                let mut coords = [0.0f32; 3];
                for c in &mut coords {
                    let field = fields.next().ok_or_else(|| AssetError::ObjParse {
                        line: line_no,
                        message: "vertex needs three coordinates".into(),
                    })?;
                    *c = field.parse().map_err(|_| AssetError::ObjParse {
                        line: line_no,
                        message: format!("invalid coordinate `{field}`"),
                    })?;
                }
                positions.push(Vec3::from_array(coords));
            }
            Some("f") => {
                let corners = fields
                    .map(|f| resolve_index(f, positions.len(), line_no))
                    .collect::<Result<Vec<u32>, _>>()?;
                if corners.len() < 3 {
                    return Err(AssetError::ObjParse {
                        line: line_no,
                        message: format!("face has {} vertices, need at least 3", corners.len()),
                    });
                }
                for i in 1..corners.len() - 1 {
                    indices.extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
                }
            }
            _ => {}
        }
    }

    tracing::debug!(
        name,
        vertices = positions.len(),
        triangles = indices.len() / 3,
        "parsed OBJ"
    );
    Mesh::new(name, positions, indices).ok_or_else(|| AssetError::EmptyMesh(name.to_string()))
}

/// Resolve a face corner (`7`, `7/2`, `7//3`, `-1`) to a zero-based index.
fn resolve_index(field: &str, vertex_count: usize, line: usize) -> Result<u32, AssetError> {
    let head = field.split('/').next().unwrap_or("");
    let value: i64 = head.parse().map_err(|_| AssetError::ObjParse {
        line,
        message: format!("invalid face index `{field}`"),
    })?;
    let resolved = match value {
        v if v > 0 => v - 1,
        v if v < 0 => vertex_count as i64 + v,
        _ => -1,
    };
    if resolved < 0 || resolved >= vertex_count as i64 {
        return Err(AssetError::ObjParse {
            line,
            message: format!("face index {value} out of range ({vertex_count} vertices)"),
        });
    }
    Ok(resolved as u32)
}
