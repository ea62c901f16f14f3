//! Floor export
//!
//! A cell's floor object becomes the walkable collision mesh plus the
//! sample nodes the building path graph is anchored on: one node per floor
//! triangle, at its centroid. Triangle edges that lie against a passable
//! portal polygon are tagged with the portal's index in the owning cell's
//! portal list, so the client can route across cell boundaries.

use serde::Serialize;

use starforge_core::{Result, Vec3};
use starforge_scene::SceneObject;

use crate::normalize::world_triangle_list;
use crate::portal::Portal;

/// Distance tolerance for matching a floor edge to a portal polygon
const PORTAL_EDGE_EPS: f32 = 0.05;

/// One walkable triangle; `portal_ids` are per-edge local portal indices,
/// -1 when the edge crosses no portal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloorTri {
    pub indices: [u32; 3],
    pub portal_ids: [i32; 3],
}

/// The exported floor: mesh plus derived path-graph sample nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FloorModel {
    pub verts: Vec<Vec3>,
    pub tris: Vec<FloorTri>,
    /// One node per triangle, at its centroid, game axes
    pub path_nodes: Vec<Vec3>,
}

impl FloorModel {
    /// Centroid of the node set; zero when the floor yielded no nodes
    pub fn node_centroid(&self) -> Vec3 {
        if self.path_nodes.is_empty() {
            return Vec3::ZERO;
        }
        let sum = self
            .path_nodes
            .iter()
            .fold(Vec3::ZERO, |acc, &n| acc + n);
        sum / self.path_nodes.len() as f32
    }
}

/// Build the floor model from a floor object.
///
/// `portals` pairs each passable portal of the owning cell with its local
/// index in the cell's portal list.
pub fn build_floor(floor_obj: &SceneObject, portals: &[(usize, &Portal)]) -> Result<FloorModel> {
    let mesh = floor_obj.as_mesh().ok_or_else(|| {
        starforge_core::Error::invalid_scene(format!(
            "floor object '{}' is not a mesh",
            floor_obj.name
        ))
    })?;

    let (verts, raw_tris) = world_triangle_list(mesh, &floor_obj.matrix_world)?;

    let mut tris = Vec::with_capacity(raw_tris.len());
    let mut path_nodes = Vec::with_capacity(raw_tris.len());
    for t in &raw_tris {
        let corners = [
            verts[t[0] as usize],
            verts[t[1] as usize],
            verts[t[2] as usize],
        ];
        let edges = [
            (corners[0], corners[1]),
            (corners[1], corners[2]),
            (corners[2], corners[0]),
        ];

        let mut portal_ids = [-1i32; 3];
        for (ei, &(a, b)) in edges.iter().enumerate() {
            for &(local_id, portal) in portals {
                if edge_on_portal(a, b, portal) {
                    portal_ids[ei] = local_id as i32;
                    break;
                }
            }
        }

        tris.push(FloorTri {
            indices: *t,
            portal_ids,
        });
        path_nodes.push((corners[0] + corners[1] + corners[2]) / 3.0);
    }

    Ok(FloorModel {
        verts,
        tris,
        path_nodes,
    })
}

/// True when both edge endpoints lie on the portal polygon's plane and
/// inside its (tolerance-expanded) bounds.
fn edge_on_portal(a: Vec3, b: Vec3, portal: &Portal) -> bool {
    let Some(plane) = portal.plane() else {
        return false;
    };
    let (origin, normal) = plane;

    let dist_a = (a - origin).dot(&normal).abs();
    let dist_b = (b - origin).dot(&normal).abs();
    if dist_a > PORTAL_EDGE_EPS || dist_b > PORTAL_EDGE_EPS {
        return false;
    }

    let (min, max) = portal.bounds();
    let inside = |p: Vec3| {
        p.x >= min.x - PORTAL_EDGE_EPS
            && p.x <= max.x + PORTAL_EDGE_EPS
            && p.y >= min.y - PORTAL_EDGE_EPS
            && p.y <= max.y + PORTAL_EDGE_EPS
            && p.z >= min.z - PORTAL_EDGE_EPS
            && p.z <= max.z + PORTAL_EDGE_EPS
    };
    inside(a) && inside(b)
}
