//! Skin-weight and blend-shape packaging
//!
//! Vertex groups map to bones through each group's *declared* index, which
//! is the join key to the external skeleton and must be preserved exactly.
//! Blend shapes are per-vertex position deltas against the first key block
//! of the shape-key stack; deltas are emitted unconditionally, zero vectors
//! included, and normal/tangent deltas are always zero in this pipeline.

use std::collections::BTreeMap;

use serde::Serialize;
use smallvec::SmallVec;

use starforge_core::{Error, Result, Vec3};
use starforge_scene::PolyMesh;

/// One bone influence on a vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoneWeight {
    /// Declared vertex-group index; indexes the bone-name list
    pub bone: u32,
    pub weight: f32,
}

/// All influences of one vertex, in bone-scan order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VertexWeightEntry {
    pub vertex: u32,
    pub weights: SmallVec<[BoneWeight; 4]>,
}

/// The packaged skin: bone names plus the per-vertex weight table
///
/// Entries are sorted by vertex index ascending; vertices with no group
/// membership have no entry, which the writer tolerates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkinTable {
    pub bone_names: Vec<String>,
    pub entries: Vec<VertexWeightEntry>,
}

impl SkinTable {
    /// Total membership count across all vertices
    pub fn membership_count(&self) -> usize {
        self.entries.iter().map(|e| e.weights.len()).sum()
    }
}

/// Package vertex-group weights into the skin table.
///
/// Bones are scanned in group-list order; within a vertex the influences
/// land in that same scan order, merging groups that share the vertex. A
/// group whose declared index falls outside the bone-name table cannot be
/// joined to the skeleton and is a data-integrity error.
pub fn package_weights(mesh: &PolyMesh) -> Result<SkinTable> {
    let bone_names: Vec<String> = mesh.vertex_groups.iter().map(|g| g.name.clone()).collect();

    let mut by_vertex: BTreeMap<u32, SmallVec<[BoneWeight; 4]>> = BTreeMap::new();
    for group in &mesh.vertex_groups {
        if group.index as usize >= bone_names.len() {
            return Err(Error::BoneIndexOutOfRange {
                bone: group.index,
                bone_count: bone_names.len(),
            });
        }
        for vertex in 0..mesh.vertex_count() {
            for membership in mesh.weights_of(vertex) {
                if membership.group == group.index {
                    by_vertex.entry(vertex as u32).or_default().push(BoneWeight {
                        bone: group.index,
                        weight: membership.weight,
                    });
                }
            }
        }
    }

    Ok(SkinTable {
        bone_names,
        entries: by_vertex
            .into_iter()
            .map(|(vertex, weights)| VertexWeightEntry { vertex, weights })
            .collect(),
    })
}

/// A named deformation as sparse per-vertex deltas from the basis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlendShape {
    pub name: String,
    /// `(vertex, position delta)`, game axes, one entry per vertex
    pub positions: Vec<(u32, Vec3)>,
    /// Always zero deltas; carried for the writer's layout
    pub normals: Vec<(u32, Vec3)>,
    /// Zero tangent deltas, present only when tangents were requested
    pub tangents: Option<Vec<(u32, Vec3)>>,
}

/// Package the shape-key stack into blend shapes.
///
/// The first key block is the basis; every later block becomes one shape.
/// Deltas are emitted for every vertex, zero or not; callers that want
/// sparsity filter afterwards.
pub fn package_blend_shapes(mesh: &PolyMesh, do_tangents: bool) -> Vec<BlendShape> {
    let Some((basis, targets)) = mesh.shape_keys.split_first() else {
        return Vec::new();
    };

    targets
        .iter()
        .map(|key| {
            let mut shape = BlendShape {
                name: key.name.clone(),
                positions: Vec::with_capacity(key.data.len()),
                normals: Vec::with_capacity(key.data.len()),
                tangents: do_tangents.then(|| Vec::with_capacity(key.data.len())),
            };
            for (j, (&target, &base)) in key.data.iter().zip(basis.data.iter()).enumerate() {
                let delta = (target - base).to_game_axes();
                shape.positions.push((j as u32, delta));
                shape.normals.push((j as u32, Vec3::ZERO));
                if let Some(tangents) = shape.tangents.as_mut() {
                    tangents.push((j as u32, Vec3::ZERO));
                }
            }
            shape
        })
        .collect()
}
