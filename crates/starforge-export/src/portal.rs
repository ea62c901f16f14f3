//! Portal collection and connectivity resolution
//!
//! Portals are authored once and referenced from the `Portals_`
//! sub-collection of each cell they touch. Collection de-duplicates them
//! into one global list keyed by object identity; resolution then pins down
//! which two cells every portal connects and which side owns the clockwise
//! winding. Resolution cannot run until every cell has been scanned, so the
//! building export is necessarily two-pass.
//!
//! All scan state lives in an [`ExportContext`] value scoped to one export
//! call; nothing here is module-level.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use starforge_core::{Error, Result, Transform, Vec3};
use starforge_scene::{Collection, ObjectId, Scene, SceneObject};

use crate::cell::Cell;
use crate::normalize::world_triangle_list;

/// Prefix that marks a cell's portal sub-collection
pub const PORTALS_PREFIX: &str = "Portals_";

/// One de-duplicated portal: its polygon in world space, game axes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Portal {
    pub verts: Vec<Vec3>,
    pub indices: Vec<[u32; 3]>,
}

impl Portal {
    /// Mean of the polygon vertices; zero for a degenerate portal
    pub fn center(&self) -> Vec3 {
        if self.verts.is_empty() {
            return Vec3::ZERO;
        }
        let sum = self.verts.iter().fold(Vec3::ZERO, |acc, &v| acc + v);
        sum / self.verts.len() as f32
    }

    /// Supporting plane as `(origin, unit normal)`, from the first
    /// non-degenerate vertex triple
    pub fn plane(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.verts.first()?;
        for i in 1..self.verts.len() {
            for j in i + 1..self.verts.len() {
                let n = (self.verts[i] - first).cross(&(self.verts[j] - first));
                if n.length() > 1e-6 {
                    return Some((first, n.normalize()));
                }
            }
        }
        None
    }

    /// Axis-aligned bounds of the polygon
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Vec3::new(f32::MIN, f32::MIN, f32::MIN);
        for v in &self.verts {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }
        (min, max)
    }
}

/// A cell's reference to a global portal
///
/// `connecting_cell` and `clockwise` start unresolved and are filled by the
/// resolution pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortalData {
    /// Global portal id
    pub portal: usize,
    pub passable: bool,
    pub clockwise: bool,
    pub connecting_cell: Option<usize>,
    pub door_style: Option<String>,
    /// World-space door hardpoint, game axes
    pub door_hardpoint: Option<Transform>,
}

/// Transient scan state for one building export
#[derive(Debug, Default)]
pub struct ExportContext {
    /// Global portal list, in discovery order
    pub portals: Vec<Portal>,
    /// Object identity -> global portal id
    portal_ids: HashMap<ObjectId, usize>,
    /// Global portal id -> owning cell ids, in scan order
    connections: HashMap<usize, Vec<usize>>,
    /// Global portal id -> first cell that referenced it
    clockwise_owner: HashMap<usize, usize>,
}

impl ExportContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection pass, step 1: de-duplicate every portal mesh found in any
    /// cell's `Portals_` sub-collection into the global list.
    pub fn collect_portals(&mut self, scene: &Scene, building: &Collection) -> Result<()> {
        for cell_col in &building.children {
            for sub in &cell_col.children {
                if !sub.name.starts_with(PORTALS_PREFIX) {
                    continue;
                }
                for &id in &sub.objects {
                    let obj = scene.object(id)?;
                    if !obj.is_mesh() || self.portal_ids.contains_key(&id) {
                        continue;
                    }
                    let mesh = obj.as_mesh().ok_or_else(|| Error::internal("mesh vanished"))?;
                    let (verts, indices) = world_triangle_list(mesh, &obj.matrix_world)?;
                    let pid = self.portals.len();
                    debug!(portal = pid, object = %obj.name, "registered global portal");
                    self.portals.push(Portal { verts, indices });
                    self.portal_ids.insert(id, pid);
                }
            }
        }
        Ok(())
    }

    /// The global id of a portal object, if it was collected
    pub fn portal_id(&self, id: ObjectId) -> Option<usize> {
        self.portal_ids.get(&id).copied()
    }

    /// Collection pass, step 2: record one cell's reference to a portal
    /// object, producing its (unresolved) [`PortalData`].
    pub fn record_cell_portal(
        &mut self,
        scene: &Scene,
        cell_id: usize,
        cell_name: &str,
        object_id: ObjectId,
    ) -> Result<PortalData> {
        let obj = scene.object(object_id)?;
        let portal = self.portal_id(object_id).ok_or_else(|| Error::UnknownPortal {
            cell: cell_name.to_string(),
            object: obj.name.clone(),
        })?;

        self.connections.entry(portal).or_default().push(cell_id);
        self.clockwise_owner.entry(portal).or_insert(cell_id);

        let (door_style, door_hardpoint) = door_marker(scene, obj)?;

        Ok(PortalData {
            portal,
            passable: is_passable(obj),
            clockwise: false,
            connecting_cell: None,
            door_style,
            door_hardpoint,
        })
    }

    /// Resolution pass: validate that every portal has exactly two owning
    /// cells, then fill each side's connecting cell and winding owner.
    pub fn resolve(&self, cells: &mut [Cell]) -> Result<()> {
        let mut portal_ids: Vec<&usize> = self.connections.keys().collect();
        portal_ids.sort();
        for &&portal in &portal_ids {
            let owners = &self.connections[&portal];
            if owners.len() != 2 {
                return Err(Error::PortalOwnerCount {
                    portal,
                    owners: owners.len(),
                });
            }
        }

        for (cell_id, cell) in cells.iter_mut().enumerate() {
            for portal_data in &mut cell.portals {
                let owners = self
                    .connections
                    .get(&portal_data.portal)
                    .ok_or(Error::PortalOwnerCount {
                        portal: portal_data.portal,
                        owners: 0,
                    })?;
                let connected = owners
                    .iter()
                    .copied()
                    .find(|&other| other != cell_id)
                    .ok_or_else(|| {
                        Error::internal(format!(
                            "portal {} owned twice by cell {cell_id}",
                            portal_data.portal
                        ))
                    })?;
                portal_data.connecting_cell = Some(connected);
                portal_data.clockwise = self.clockwise_owner[&portal_data.portal] == cell_id;
                debug!(
                    cell = cell_id,
                    portal = portal_data.portal,
                    leads_to = connected,
                    "resolved portal connection"
                );
            }
        }
        Ok(())
    }
}

/// Read the authored passability flag; portals are passable by default
fn is_passable(obj: &SceneObject) -> bool {
    if !obj.is_mesh() {
        return false;
    }
    obj.properties
        .get("passable")
        .and_then(|v| v.as_flag())
        .unwrap_or(true)
}

/// Door metadata from a portal's single arrows-empty child, if present
fn door_marker(scene: &Scene, obj: &SceneObject) -> Result<(Option<String>, Option<Transform>)> {
    if obj.children.len() != 1 {
        return Ok((None, None));
    }
    let child = scene.object(obj.children[0])?;
    if !child.is_arrows_empty() {
        return Ok((None, None));
    }
    let style = child
        .properties
        .get("doorstyle")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Ok((style, Some(child.matrix_world.to_game_axes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use starforge_core::Vec2;
    use starforge_scene::{
        EmptyDisplay, ObjectData, PolyMesh, Polygon, PropertyValue, UvLayer,
    };

    fn portal_object(name: &str) -> SceneObject {
        SceneObject {
            name: name.into(),
            data: ObjectData::Mesh(PolyMesh {
                positions: vec![
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(1.0, 0.0, 0.0),
                    Vec3::new(1.0, 0.0, 2.0),
                    Vec3::new(0.0, 0.0, 2.0),
                ],
                loops: vec![0, 1, 2, 3],
                polygons: vec![Polygon {
                    loop_start: 0,
                    loop_total: 4,
                    material_index: 0,
                }],
                loop_normals: vec![Vec3::new(0.0, 1.0, 0.0); 4],
                uv_layers: vec![UvLayer {
                    name: "UVMap".into(),
                    data: vec![Vec2::ZERO; 4],
                }],
                ..Default::default()
            }),
            matrix_world: Transform::IDENTITY,
            properties: Default::default(),
            children: Vec::new(),
        }
    }

    fn two_cell_building() -> (Scene, Collection) {
        let scene = Scene {
            objects: vec![portal_object("shared_portal")],
            ..Default::default()
        };
        let cell = |name: &str| Collection {
            name: name.into(),
            children: vec![Collection {
                name: format!("Portals_{name}"),
                objects: vec![ObjectId(0)],
                ..Default::default()
            }],
            ..Default::default()
        };
        let building = Collection {
            name: "house".into(),
            children: vec![cell("r0"), cell("r1")],
            ..Default::default()
        };
        (scene, building)
    }

    #[test]
    fn test_shared_portal_collected_once() {
        let (scene, building) = two_cell_building();
        let mut ctx = ExportContext::new();
        ctx.collect_portals(&scene, &building).unwrap();
        assert_eq!(ctx.portals.len(), 1);
        assert_eq!(ctx.portal_id(ObjectId(0)), Some(0));
    }

    #[test]
    fn test_unknown_portal_rejected() {
        let (scene, _) = two_cell_building();
        let mut ctx = ExportContext::new();
        // No collection pass ran, so the object is not in the global list.
        let err = ctx
            .record_cell_portal(&scene, 0, "r0", ObjectId(0))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownPortal { .. }));
    }

    #[test]
    fn test_single_owner_rejected_at_resolve() {
        let (scene, building) = two_cell_building();
        let mut ctx = ExportContext::new();
        ctx.collect_portals(&scene, &building).unwrap();
        ctx.record_cell_portal(&scene, 0, "r0", ObjectId(0)).unwrap();

        let err = ctx.resolve(&mut []).unwrap_err();
        assert!(matches!(
            err,
            Error::PortalOwnerCount {
                portal: 0,
                owners: 1
            }
        ));
    }

    #[test]
    fn test_passable_defaults_true() {
        let obj = portal_object("p");
        assert!(is_passable(&obj));
    }

    #[test]
    fn test_passable_flag_honored() {
        let mut obj = portal_object("p");
        obj.properties.insert("passable", PropertyValue::Int(0));
        assert!(!is_passable(&obj));
    }

    #[test]
    fn test_portal_center() {
        let portal = Portal {
            verts: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 2.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            indices: Vec::new(),
        };
        assert_eq!(portal.center(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_door_marker_read_from_arrows_child() {
        let mut portal = portal_object("p");
        portal.children.push(ObjectId(1));
        let mut marker = SceneObject {
            name: "door".into(),
            data: ObjectData::Empty {
                display: EmptyDisplay::Arrows,
            },
            matrix_world: Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            properties: Default::default(),
            children: Vec::new(),
        };
        marker
            .properties
            .insert("doorstyle", PropertyValue::String("sliding".into()));

        let scene = Scene {
            objects: vec![portal.clone(), marker],
            ..Default::default()
        };

        let (style, hardpoint) = door_marker(&scene, &portal).unwrap();
        assert_eq!(style.as_deref(), Some("sliding"));
        // Translation (1,2,3) -> game (-1, 3, -2).
        assert_eq!(
            hardpoint.unwrap().translation(),
            Vec3::new(-1.0, 3.0, -2.0)
        );
    }
}
