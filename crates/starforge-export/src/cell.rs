//! Cell collection
//!
//! One cell is one authored collection under the building collection. Its
//! sub-collections are classified by name prefix: appearance geometry
//! (delegated to LOD/MSH export), collision (extents), lights, and portals
//! (recorded into the export context). The floor object is mandatory; its
//! export yields the path-node set whose centroid anchors the cell in the
//! building path graph.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use starforge_core::{Error, Result, Vec3};
use starforge_scene::{Collection, Scene};

use crate::extents::{extents_from_collection, Extents};
use crate::floor::build_floor;
use crate::iff;
use crate::lights::{light_from_object, LightDescriptor};
use crate::msh::{build_lod_children, build_msh, LodModel};
use crate::portal::{ExportContext, PortalData, PORTALS_PREFIX};

const APPEARANCE_PREFIX: &str = "Appearance_";
const COLLISION_PREFIX: &str = "Collision_";
const LIGHTS_PREFIX: &str = "Lights_";
const FLOOR_PREFIX: &str = "Floor_";

/// One room of the building model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    /// Authored collection name
    pub name: String,
    pub portals: Vec<PortalData>,
    /// Client reference path of the appearance geometry, if any
    pub appearance_path: Option<String>,
    /// Client reference path of the floor collision file
    pub floor_path: String,
    pub collision: Extents,
    pub lights: Vec<LightDescriptor>,
    /// Navigation anchor: centroid of the floor's path-node set
    pub anchor: Vec3,
}

/// Options threaded from the building export into each cell
#[derive(Debug, Clone)]
pub struct CellOptions<'a> {
    pub building_name: &'a str,
    /// Directory the client reference paths are rooted at
    pub out_root: &'a Path,
    pub export_children: bool,
    pub flip_uv: bool,
}

/// Collect one cell: classify its children, record its portals, export its
/// floor, and derive its navigation anchor.
pub fn collect_cell(
    scene: &Scene,
    ctx: &mut ExportContext,
    cell_id: usize,
    cell_col: &Collection,
    opts: &CellOptions<'_>,
) -> Result<Cell> {
    // Cells are canonically named r<id>; an authored name is kept as a
    // suffix so exported file names stay readable.
    let canonical = format!("r{cell_id}");
    let file_name = if cell_col.name == canonical {
        canonical
    } else {
        format!("r{cell_id}_{}", cell_col.name)
    };

    let mut appearance_path = None;
    let mut collision = Extents::Null;
    let mut lights = Vec::new();
    let mut portals: Vec<PortalData> = Vec::new();

    for sub in &cell_col.children {
        if sub.name.starts_with(APPEARANCE_PREFIX) {
            let reference = format!(
                "appearance/lod/{}_{}.lod",
                opts.building_name, file_name
            );
            if opts.export_children {
                export_lod_collection(scene, sub, &reference, opts)?;
            }
            appearance_path = Some(reference);
        } else if sub.name.starts_with(COLLISION_PREFIX) {
            collision = extents_from_collection(scene, sub)?;
        } else if sub.name.starts_with(LIGHTS_PREFIX) {
            for &id in &sub.objects {
                let obj = scene.object(id)?;
                if obj.as_light().is_some() {
                    if let Some(descriptor) = light_from_object(obj) {
                        lights.push(descriptor);
                    }
                } else {
                    warn!(cell = %cell_col.name, object = %obj.name, "non-light in lights collection");
                }
            }
        } else if sub.name.starts_with(PORTALS_PREFIX) {
            // Door hardpoint empties share this collection; only meshes
            // are portals.
            for &id in &sub.objects {
                if !scene.object(id)?.is_mesh() {
                    continue;
                }
                portals.push(ctx.record_cell_portal(scene, cell_id, &cell_col.name, id)?);
            }
        } else {
            warn!(cell = %cell_col.name, child = %sub.name, "unhandled sub-collection for cell");
        }
    }

    let mut floor_obj = None;
    for &id in &cell_col.objects {
        let obj = scene.object(id)?;
        if obj.name.starts_with(APPEARANCE_PREFIX) {
            let reference = format!(
                "appearance/mesh/{}_{}_mesh_r{}.msh",
                opts.building_name, file_name, cell_id
            );
            if opts.export_children {
                let msh = build_msh(obj, opts.flip_uv)?;
                iff::write_msh(&msh, &opts.out_root.join(&reference))?;
            }
            appearance_path = Some(reference);
        } else if obj.name.starts_with(FLOOR_PREFIX) {
            floor_obj = Some(obj);
        }
    }

    let floor_obj = floor_obj.ok_or_else(|| Error::MissingFloor {
        cell_id,
        cell: cell_col.name.clone(),
    })?;

    let floor_path = format!(
        "appearance/collision/{}_{}_collision_floor0.flr",
        opts.building_name, file_name
    );
    let passable: Vec<(usize, &crate::portal::Portal)> = portals
        .iter()
        .enumerate()
        .filter(|(_, pd)| pd.passable)
        .map(|(local, pd)| (local, &ctx.portals[pd.portal]))
        .collect();
    let floor = build_floor(floor_obj, &passable)?;

    // The floor is written regardless of export_children; its node set is
    // what the building path graph anchors on.
    iff::write_flr(&floor, &opts.out_root.join(&floor_path))?;
    info!(cell = %cell_col.name, nodes = floor.path_nodes.len(), "exported cell floor");

    Ok(Cell {
        name: cell_col.name.clone(),
        portals,
        appearance_path,
        floor_path,
        collision,
        lights,
        anchor: floor.node_centroid(),
    })
}

/// Export an appearance collection as a LOD wrapper plus its child meshes.
fn export_lod_collection(
    scene: &Scene,
    collection: &Collection,
    lod_reference: &str,
    opts: &CellOptions<'_>,
) -> Result<()> {
    let children = build_lod_children(scene, collection, opts.flip_uv)?;
    let mut lod = LodModel {
        name: collection.name.clone(),
        children: Vec::with_capacity(children.len()),
    };

    let stem = lod_reference
        .strip_prefix("appearance/lod/")
        .and_then(|r| r.strip_suffix(".lod"))
        .unwrap_or(lod_reference);
    for (level, msh) in children.iter().enumerate() {
        let reference = format!("appearance/mesh/{stem}_l{level}.msh");
        iff::write_msh(msh, &opts.out_root.join(&reference))?;
        lod.children.push(reference);
    }

    iff::write_lod(&lod, &opts.out_root.join(lod_reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use starforge_core::Transform;
    use starforge_scene::{ObjectData, ObjectId, PolyMesh, Polygon, SceneObject};

    fn floor_object(name: &str) -> SceneObject {
        SceneObject {
            name: name.into(),
            data: ObjectData::Mesh(PolyMesh {
                positions: vec![
                    Vec3::ZERO,
                    Vec3::new(2.0, 0.0, 0.0),
                    Vec3::new(2.0, 2.0, 0.0),
                    Vec3::new(0.0, 2.0, 0.0),
                ],
                loops: vec![0, 1, 2, 3],
                polygons: vec![Polygon {
                    loop_start: 0,
                    loop_total: 4,
                    material_index: 0,
                }],
                loop_normals: vec![Vec3::new(0.0, 0.0, 1.0); 4],
                ..Default::default()
            }),
            matrix_world: Transform::IDENTITY,
            properties: Default::default(),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_missing_floor_is_hard_error() {
        let scene = Scene::default();
        let cell_col = Collection {
            name: "kitchen".into(),
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let opts = CellOptions {
            building_name: "house",
            out_root: dir.path(),
            export_children: false,
            flip_uv: false,
        };

        let mut ctx = ExportContext::new();
        let err = collect_cell(&scene, &mut ctx, 1, &cell_col, &opts).unwrap_err();
        assert!(matches!(err, Error::MissingFloor { cell_id: 1, .. }));
        assert!(err.is_data_integrity());
    }

    #[test]
    fn test_cell_with_floor_gets_anchor_and_floor_file() {
        let scene = Scene {
            objects: vec![floor_object("Floor_main")],
            ..Default::default()
        };
        let cell_col = Collection {
            name: "r0".into(),
            objects: vec![ObjectId(0)],
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let opts = CellOptions {
            building_name: "house",
            out_root: dir.path(),
            export_children: false,
            flip_uv: false,
        };

        let mut ctx = ExportContext::new();
        let cell = collect_cell(&scene, &mut ctx, 0, &cell_col, &opts).unwrap();

        assert_eq!(
            cell.floor_path,
            "appearance/collision/house_r0_collision_floor0.flr"
        );
        assert!(dir.path().join(&cell.floor_path).exists());
        assert!(cell.appearance_path.is_none());
        // Quad floor spans game x [-2,0], z [-2,0]; anchor at its middle.
        assert!((cell.anchor.x - (-1.0)).abs() < 1e-5);
        assert!((cell.anchor.z - (-1.0)).abs() < 1e-5);
    }

    #[test]
    fn test_authored_name_kept_in_file_name() {
        let scene = Scene {
            objects: vec![floor_object("Floor_main")],
            ..Default::default()
        };
        let cell_col = Collection {
            name: "kitchen".into(),
            objects: vec![ObjectId(0)],
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let opts = CellOptions {
            building_name: "house",
            out_root: dir.path(),
            export_children: false,
            flip_uv: false,
        };

        let mut ctx = ExportContext::new();
        let cell = collect_cell(&scene, &mut ctx, 2, &cell_col, &opts).unwrap();
        assert_eq!(cell.name, "kitchen");
        assert!(cell.floor_path.contains("r2_kitchen"));
    }
}
