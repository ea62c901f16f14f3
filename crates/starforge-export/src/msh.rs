//! Static mesh and LOD child export
//!
//! A cell's appearance geometry goes out as plain static meshes: the same
//! normalizer and batcher as the skinned pipeline, minus skinning and
//! blends. An appearance authored as a collection becomes a LOD wrapper
//! whose detail levels are the collection's mesh objects in authored order.

use tracing::warn;

use starforge_core::{Error, Result, Vec3};
use starforge_scene::{Collection, Scene, SceneObject};

use crate::batch::{batch_by_material, PerShaderBatch};
use crate::normalize::normalize;

/// A static mesh ready for the writer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MshModel {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub batches: Vec<PerShaderBatch>,
}

/// A LOD wrapper: client reference paths of its detail levels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LodModel {
    pub name: String,
    pub children: Vec<String>,
}

/// Build a static mesh from one appearance object.
///
/// `flip_uv` mirrors the V coordinate for clients that address textures
/// top-down.
pub fn build_msh(obj: &SceneObject, flip_uv: bool) -> Result<MshModel> {
    let mesh = obj.as_mesh().ok_or_else(|| {
        Error::invalid_scene(format!("appearance object '{}' is not a mesh", obj.name))
    })?;

    let tri = normalize(mesh, false)?;
    let mut batches = batch_by_material(&tri, false)?;
    if flip_uv {
        for batch in &mut batches {
            for uv in &mut batch.uvs {
                *uv = uv.flipped_v();
            }
        }
    }

    Ok(MshModel {
        name: obj.name.clone(),
        positions: tri.positions,
        normals: tri.loop_normals,
        batches,
    })
}

/// Build the detail-level meshes of an appearance collection, highest
/// detail first in authored order. Non-mesh members are skipped with a
/// warning.
pub fn build_lod_children(
    scene: &Scene,
    collection: &Collection,
    flip_uv: bool,
) -> Result<Vec<MshModel>> {
    let mut children = Vec::new();
    for &id in &collection.objects {
        let obj = scene.object(id)?;
        if !obj.is_mesh() {
            warn!(object = %obj.name, collection = %collection.name, "non-mesh in appearance collection, skipping");
            continue;
        }
        children.push(build_msh(obj, flip_uv)?);
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use starforge_core::{Transform, Vec2};
    use starforge_scene::{ObjectData, PolyMesh, Polygon, UvLayer};

    fn appearance_object() -> SceneObject {
        SceneObject {
            name: "Appearance_room".into(),
            data: ObjectData::Mesh(PolyMesh {
                positions: vec![
                    Vec3::ZERO,
                    Vec3::new(1.0, 0.0, 0.0),
                    Vec3::new(1.0, 1.0, 0.0),
                ],
                loops: vec![0, 1, 2],
                polygons: vec![Polygon {
                    loop_start: 0,
                    loop_total: 3,
                    material_index: 0,
                }],
                loop_normals: vec![Vec3::new(0.0, 0.0, 1.0); 3],
                uv_layers: vec![UvLayer {
                    name: "UVMap".into(),
                    data: vec![
                        Vec2::new(0.0, 0.25),
                        Vec2::new(1.0, 0.25),
                        Vec2::new(1.0, 1.0),
                    ],
                }],
                materials: vec!["wall".into()],
                ..Default::default()
            }),
            matrix_world: Transform::IDENTITY,
            properties: Default::default(),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_msh_from_object() {
        let msh = build_msh(&appearance_object(), false).unwrap();
        assert_eq!(msh.positions.len(), 3);
        assert_eq!(msh.batches.len(), 1);
        assert_eq!(msh.batches[0].name, "wall");
    }

    #[test]
    fn test_flip_uv_mirrors_v() {
        let msh = build_msh(&appearance_object(), true).unwrap();
        assert_eq!(msh.batches[0].uvs[0], Vec2::new(0.0, 0.75));
        assert_eq!(msh.batches[0].uvs[2], Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_non_mesh_appearance_rejected() {
        let obj = SceneObject {
            name: "Appearance_broken".into(),
            data: ObjectData::Empty {
                display: starforge_scene::EmptyDisplay::PlainAxes,
            },
            matrix_world: Transform::IDENTITY,
            properties: Default::default(),
            children: Vec::new(),
        };
        assert!(build_msh(&obj, false).is_err());
    }
}
