//! Polygonal mesh data as the authoring tool hands it over
//!
//! The layout mirrors the authoring tool's face-corner ("loop") model: every
//! polygon owns a contiguous run of loops, and per-corner attributes (split
//! normals, UVs) are parallel to the flat loop array. Positions are object
//! space; the object's world transform lives on the owning [`SceneObject`].
//!
//! [`SceneObject`]: crate::object::SceneObject

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use starforge_core::{Error, Result, Vec2, Vec3};

/// A polygon: a contiguous run of loops plus a material slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub loop_start: u32,
    pub loop_total: u32,
    #[serde(default)]
    pub material_index: u32,
}

/// One named per-loop UV channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvLayer {
    pub name: String,
    pub data: Vec<Vec2>,
}

/// A named vertex group with its declared index
///
/// The declared index is the join key to the external skeleton; it is not
/// required to match the group's position in the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexGroup {
    pub name: String,
    pub index: u32,
}

/// One group membership of a vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupWeight {
    pub group: u32,
    pub weight: f32,
}

/// One block of the shape-key stack; the first block is the basis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBlock {
    pub name: String,
    pub data: Vec<Vec3>,
}

/// Per-vertex group memberships
pub type VertexWeights = SmallVec<[GroupWeight; 4]>;

/// A polygonal mesh as authored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyMesh {
    /// Object-space vertex positions
    pub positions: Vec<Vec3>,
    /// Per-loop source vertex indices
    pub loops: Vec<u32>,
    /// Polygons, each owning a contiguous loop run
    pub polygons: Vec<Polygon>,
    /// Per-loop split normals, parallel to `loops`
    pub loop_normals: Vec<Vec3>,
    /// Named UV channels, each parallel to `loops`
    #[serde(default)]
    pub uv_layers: Vec<UvLayer>,
    /// Index of the active UV channel
    #[serde(default)]
    pub active_uv: usize,
    /// Material slot names, indexed by `Polygon::material_index`
    #[serde(default)]
    pub materials: Vec<String>,
    /// Named vertex groups (bones)
    #[serde(default)]
    pub vertex_groups: Vec<VertexGroup>,
    /// Per-vertex group memberships, parallel to `positions`
    #[serde(default)]
    pub vertex_weights: Vec<VertexWeights>,
    /// Ordered shape-key stack; empty when the mesh has no shape keys
    #[serde(default)]
    pub shape_keys: Vec<KeyBlock>,
}

impl PolyMesh {
    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get loop count (face corners across all polygons)
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// The loop run of a polygon
    pub fn polygon_loops(&self, poly: &Polygon) -> &[u32] {
        let start = poly.loop_start as usize;
        &self.loops[start..start + poly.loop_total as usize]
    }

    /// The active UV layer, if any
    pub fn active_uv_layer(&self) -> Option<&UvLayer> {
        self.uv_layers.get(self.active_uv)
    }

    /// Check structural consistency of the parallel arrays
    pub fn validate(&self) -> Result<()> {
        if self.loop_normals.len() != self.loops.len() {
            return Err(Error::invalid_scene(format!(
                "split normal count {} does not match loop count {}",
                self.loop_normals.len(),
                self.loops.len()
            )));
        }
        for layer in &self.uv_layers {
            if layer.data.len() != self.loops.len() {
                return Err(Error::invalid_scene(format!(
                    "UV layer '{}' has {} entries for {} loops",
                    layer.name,
                    layer.data.len(),
                    self.loops.len()
                )));
            }
        }
        if !self.vertex_weights.is_empty() && self.vertex_weights.len() != self.positions.len() {
            return Err(Error::invalid_scene(format!(
                "vertex weight table covers {} of {} vertices",
                self.vertex_weights.len(),
                self.positions.len()
            )));
        }
        for key in &self.shape_keys {
            if key.data.len() != self.positions.len() {
                return Err(Error::invalid_scene(format!(
                    "shape key '{}' has {} points for {} vertices",
                    key.name,
                    key.data.len(),
                    self.positions.len()
                )));
            }
        }
        for (pi, poly) in self.polygons.iter().enumerate() {
            let end = poly.loop_start as usize + poly.loop_total as usize;
            if poly.loop_total < 3 || end > self.loops.len() {
                return Err(Error::invalid_scene(format!(
                    "polygon {} has a malformed loop run ({}..{})",
                    pi, poly.loop_start, end
                )));
            }
        }
        for (li, &v) in self.loops.iter().enumerate() {
            if v as usize >= self.positions.len() {
                return Err(Error::invalid_scene(format!(
                    "loop {} references missing vertex {}",
                    li, v
                )));
            }
        }
        Ok(())
    }

    /// Per-vertex memberships, tolerating a missing weight table
    pub fn weights_of(&self, vertex: usize) -> &[GroupWeight] {
        self.vertex_weights
            .get(vertex)
            .map(|w| w.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> PolyMesh {
        PolyMesh {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            loops: vec![0, 1, 2, 3],
            polygons: vec![Polygon {
                loop_start: 0,
                loop_total: 4,
                material_index: 0,
            }],
            loop_normals: vec![Vec3::new(0.0, 0.0, 1.0); 4],
            ..Default::default()
        }
    }

    #[test]
    fn test_polygon_loops() {
        let mesh = quad_mesh();
        assert_eq!(mesh.polygon_loops(&mesh.polygons[0]), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_validate_ok() {
        assert!(quad_mesh().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_normals() {
        let mut mesh = quad_mesh();
        mesh.loop_normals.pop();
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_loop_vertex() {
        let mut mesh = quad_mesh();
        mesh.loops[2] = 9;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_weights_of_without_table() {
        let mesh = quad_mesh();
        assert!(mesh.weights_of(0).is_empty());
    }
}
