//! Per-material primitive batching
//!
//! Partitions a normalized mesh's triangles by material slot and builds the
//! per-shader streams the mesh writer consumes. No vertex deduplication
//! happens here: a vertex shared by several faces is repeated once per
//! visited loop, and primitive indices count loops, not vertices.
//!
//! Batching only accepts [`TriMesh`] input; the triangle precondition the
//! index generation depends on is carried by that type, not re-checked.

use starforge_core::{Result, Vec2};

use crate::normalize::TriMesh;

/// Geometry emitted for one material slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerShaderBatch {
    /// Material name from the source slot
    pub name: String,
    /// Per-loop source vertex indices (position stream)
    pub position_indices: Vec<u32>,
    /// Per-loop loop ids (normal stream)
    pub normal_indices: Vec<u32>,
    /// Per-loop UVs from the active channel
    pub uvs: Vec<Vec2>,
    /// Per-loop loop ids into the tangent layer, when tangents exist
    pub tangent_indices: Option<Vec<u32>>,
    /// Flat triangle index triples over this batch's loop sequence
    pub primitives: Vec<u32>,
}

impl PerShaderBatch {
    pub fn triangle_count(&self) -> usize {
        self.primitives.len() / 3
    }
}

/// Partition triangles by material slot, in order of first appearance.
///
/// Unused slots emit no batch. Within a batch, faces keep mesh order; each
/// face contributes its three loops to the parallel streams and one index
/// triple, emitted reversed (`t3, t2, t1`) from the running loop counter to
/// reproduce the client's winding convention.
pub fn batch_by_material(mesh: &TriMesh, do_tangents: bool) -> Result<Vec<PerShaderBatch>> {
    // (material slot, triangle indices) in first-appearance order.
    let mut groups: Vec<(u32, Vec<usize>)> = Vec::new();
    for (ti, tri) in mesh.triangles.iter().enumerate() {
        match groups.iter_mut().find(|(m, _)| *m == tri.material_index) {
            Some((_, tris)) => tris.push(ti),
            None => groups.push((tri.material_index, vec![ti])),
        }
    }

    let active_uv = mesh.active_uv_layer();
    let has_tangents = do_tangents && mesh.tangents().is_some();

    let mut batches = Vec::with_capacity(groups.len());
    for (material_index, tris) in groups {
        let mut batch = PerShaderBatch {
            name: mesh
                .materials
                .get(material_index as usize)
                .cloned()
                .unwrap_or_else(|| format!("material_{material_index}")),
            tangent_indices: has_tangents.then(Vec::new),
            ..Default::default()
        };

        let mut running_loop = 0u32;
        for ti in tris {
            for &loop_id in &mesh.triangles[ti].loops {
                batch.position_indices.push(mesh.loop_vertices[loop_id as usize]);
                batch.normal_indices.push(loop_id);
                batch.uvs.push(
                    active_uv
                        .map(|layer| layer.data[loop_id as usize])
                        .unwrap_or(Vec2::ZERO),
                );
                if let Some(tangent_indices) = batch.tangent_indices.as_mut() {
                    tangent_indices.push(loop_id);
                }
            }

            // Reversed triple over the three loops just visited.
            batch
                .primitives
                .extend([running_loop + 2, running_loop + 1, running_loop]);
            running_loop += 3;
        }

        batches.push(batch);
    }

    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use starforge_core::Vec3;
    use starforge_scene::{PolyMesh, Polygon, UvLayer};

    /// Two quads with different material slots, authored interleaved
    fn two_material_mesh() -> PolyMesh {
        PolyMesh {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 1.0, 0.0),
            ],
            loops: vec![0, 1, 2, 3, 1, 4, 5, 2],
            polygons: vec![
                Polygon {
                    loop_start: 0,
                    loop_total: 4,
                    material_index: 1,
                },
                Polygon {
                    loop_start: 4,
                    loop_total: 4,
                    material_index: 0,
                },
            ],
            loop_normals: vec![Vec3::new(0.0, 0.0, 1.0); 8],
            uv_layers: vec![UvLayer {
                name: "UVMap".into(),
                data: vec![Vec2::ZERO; 8],
            }],
            materials: vec!["stone".into(), "wood".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_batches_in_first_appearance_order() {
        let tri = normalize(&two_material_mesh(), false).unwrap();
        let batches = batch_by_material(&tri, false).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].name, "wood");
        assert_eq!(batches[1].name, "stone");
    }

    #[test]
    fn test_triple_count_matches_triangle_count() {
        let tri = normalize(&two_material_mesh(), false).unwrap();
        for batch in batch_by_material(&tri, false).unwrap() {
            assert_eq!(batch.triangle_count(), 2);
            assert_eq!(batch.primitives.len(), 6);
            assert_eq!(batch.position_indices.len(), 6);
            assert_eq!(batch.normal_indices.len(), 6);
            assert_eq!(batch.uvs.len(), 6);
        }
    }

    #[test]
    fn test_primitive_triples_reversed() {
        let tri = normalize(&two_material_mesh(), false).unwrap();
        let batches = batch_by_material(&tri, false).unwrap();
        assert_eq!(batches[0].primitives, vec![2, 1, 0, 5, 4, 3]);
    }

    #[test]
    fn test_no_vertex_deduplication() {
        let tri = normalize(&two_material_mesh(), false).unwrap();
        let batches = batch_by_material(&tri, false).unwrap();
        // Quad 0 fans into (0,1,2) (0,2,3): vertex 0 and 2 repeat.
        assert_eq!(batches[0].position_indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_unused_slot_emits_no_batch() {
        let mut mesh = two_material_mesh();
        mesh.materials.push("unused".into());
        let tri = normalize(&mesh, false).unwrap();
        assert_eq!(batch_by_material(&tri, false).unwrap().len(), 2);
    }

    #[test]
    fn test_tangent_indices_present_when_requested() {
        let tri = normalize(&two_material_mesh(), true).unwrap();
        let batches = batch_by_material(&tri, true).unwrap();
        let tangent_indices = batches[0].tangent_indices.as_ref().unwrap();
        assert_eq!(tangent_indices, &batches[0].normal_indices);
    }
}
