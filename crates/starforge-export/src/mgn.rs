//! Skinned-mesh export orchestration
//!
//! Composes the normalizer, batcher, and skin packager into the MGN data
//! model, folds in the custom-property metadata from the selected object
//! (skeleton references, occlusion data, binary hardpoint/TRT blobs), and
//! hands the populated model to the writer.

use std::path::Path;

use tracing::info;

use starforge_core::{Error, Result, Vec3};
use starforge_scene::{PropertyValue, Scene, SceneObject};

use crate::batch::{batch_by_material, PerShaderBatch};
use crate::iff;
use crate::normalize::normalize;
use crate::skin::{package_blend_shapes, package_weights, BlendShape, VertexWeightEntry};

/// Custom-property key prefix for skeleton references
const SKELETON_PREFIX: &str = "SKTM_";
/// Occlusion layer key
const OCC_LAYER_KEY: &str = "OCC_LAYER";
/// Binary hardpoint blob key
const HARDPOINTS_KEY: &str = "HPTS";
/// Binary TRT blob key
const TRTS_KEY: &str = "TRTS";

/// A named occlusion flag, indexed densely in authored order
#[derive(Debug, Clone, PartialEq)]
pub struct Occlusion {
    pub name: String,
    pub index: u32,
    pub value: i64,
}

/// Options for a skinned-mesh export
#[derive(Debug, Clone)]
pub struct MgnOptions {
    /// Generate tangent data (on by default)
    pub tangents: bool,
}

impl Default for MgnOptions {
    fn default() -> Self {
        Self { tangents: true }
    }
}

/// The populated skinned-mesh model handed to the writer
#[derive(Debug, Clone, Default)]
pub struct MgnModel {
    pub skeletons: Vec<String>,
    pub occlusion_layer: Option<i64>,
    pub binary_hardpoints: Option<Vec<u8>>,
    pub binary_trts: Option<Vec<u8>>,
    pub occlusions: Vec<Occlusion>,
    /// Axis-converted vertex positions, source order
    pub positions: Vec<Vec3>,
    /// Axis-converted per-loop split normals
    pub normals: Vec<Vec3>,
    /// Per-loop tangent + bitangent-sign, when tangents were generated
    pub dot3: Option<Vec<[f32; 4]>>,
    pub blends: Vec<BlendShape>,
    pub psdts: Vec<PerShaderBatch>,
    pub bone_names: Vec<String>,
    pub weights: Vec<VertexWeightEntry>,
}

/// Build the MGN model from the scene's single selected mesh object.
pub fn build_mgn(scene: &Scene, options: &MgnOptions) -> Result<MgnModel> {
    let selected = scene.selected_objects()?;
    if selected.len() != 1 {
        return Err(Error::SelectionCount {
            selected: selected.len(),
        });
    }
    let (_, obj) = selected[0];
    let mesh = obj.as_mesh().ok_or_else(|| Error::NotAMesh {
        object: obj.name.clone(),
    })?;

    let mut model = MgnModel::default();
    collect_properties(obj, &mut model);

    let tri = normalize(mesh, options.tangents)?;
    model.positions = tri.positions.clone();
    model.normals = tri.loop_normals.clone();
    model.dot3 = tri.tangents().map(|t| t.to_vec());
    model.psdts = batch_by_material(&tri, options.tangents)?;

    let skin = package_weights(mesh)?;
    model.bone_names = skin.bone_names;
    model.weights = skin.entries;
    model.blends = package_blend_shapes(mesh, options.tangents);

    info!(
        object = %obj.name,
        positions = model.positions.len(),
        batches = model.psdts.len(),
        bones = model.bone_names.len(),
        blends = model.blends.len(),
        "built MGN model"
    );
    Ok(model)
}

/// Export the selected mesh as MGN: build, then hand to the writer.
pub fn export_mgn(scene: &Scene, path: &Path, options: &MgnOptions) -> Result<()> {
    let model = build_mgn(scene, options)?;
    iff::write_mgn(&model, path)?;
    info!(path = %path.display(), "wrote MGN");
    Ok(())
}

/// Partition the root object's custom properties into the recognized keys
/// and the named-occlusion-flag catch-all.
fn collect_properties(obj: &SceneObject, model: &mut MgnModel) {
    let mut occlusion_index = 0u32;
    for (key, value) in obj.properties.iter() {
        if key.starts_with(SKELETON_PREFIX) {
            if let Some(path) = value.as_str() {
                model.skeletons.push(path.to_string());
            }
        } else if key == OCC_LAYER_KEY {
            model.occlusion_layer = value.as_int();
        } else if key == HARDPOINTS_KEY {
            model.binary_hardpoints = value.as_bytes().map(<[u8]>::to_vec);
        } else if key == TRTS_KEY {
            model.binary_trts = value.as_bytes().map(<[u8]>::to_vec);
        } else {
            model.occlusions.push(Occlusion {
                name: key.to_string(),
                index: occlusion_index,
                value: match value {
                    PropertyValue::Int(i) => *i,
                    PropertyValue::Bool(b) => *b as i64,
                    _ => 0,
                },
            });
            occlusion_index += 1;
        }
    }
}
