//! Building path graph synthesis
//!
//! The navigation graph over a finished building: one node per global
//! portal, one node per cell, and an opposite-direction edge pair for every
//! cell/portal adjacency, which makes the graph logically undirected.
//!
//! Node indices come from a single monotonically increasing counter with
//! portals first, then cells. That ordering is an external contract with
//! the consuming navigation system and must not change.

use serde::Serialize;

use starforge_core::Vec3;

use crate::cell::Cell;
use crate::portal::Portal;

/// Node kinds, as the client encodes them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum PathNodeKind {
    /// A portal on the building's entry frame
    CellPortal = 3,
    /// A cell interior anchor
    Cell = 4,
    /// Any other waypoint (interior portals)
    Waypoint = 5,
}

/// One navigation node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathGraphNode {
    pub kind: PathNodeKind,
    pub position: Vec3,
    pub index: u32,
    /// Source portal id or cell id
    pub key: i32,
    /// Always zero in this pipeline
    pub radius: f32,
}

/// One directed edge between node indices
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathGraphEdge {
    pub index_a: u32,
    pub index_b: u32,
}

/// The building navigation graph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathGraph {
    pub nodes: Vec<PathGraphNode>,
    pub edges: Vec<PathGraphEdge>,
}

/// Synthesize the building path graph from resolved cells and portals.
///
/// A portal referenced by the building's *first* cell is tagged
/// [`PathNodeKind::CellPortal`], everything else [`PathNodeKind::Waypoint`].
/// Configuration assumption carried from the source data: cell 0 is the
/// exterior/entry frame.
pub fn synthesize_path_graph(portals: &[Portal], cells: &[Cell]) -> PathGraph {
    let mut graph = PathGraph::default();
    let mut next_index = 0u32;

    let mut node_by_portal = vec![0u32; portals.len()];
    for (portal_id, portal) in portals.iter().enumerate() {
        let on_entry_frame = cells
            .first()
            .is_some_and(|cell| cell.portals.iter().any(|pd| pd.portal == portal_id));

        graph.nodes.push(PathGraphNode {
            kind: if on_entry_frame {
                PathNodeKind::CellPortal
            } else {
                PathNodeKind::Waypoint
            },
            position: portal.center(),
            index: next_index,
            key: portal_id as i32,
            radius: 0.0,
        });
        node_by_portal[portal_id] = next_index;
        next_index += 1;
    }

    for (cell_id, cell) in cells.iter().enumerate() {
        let cell_node = next_index;
        graph.nodes.push(PathGraphNode {
            kind: PathNodeKind::Cell,
            position: cell.anchor,
            index: cell_node,
            key: cell_id as i32,
            radius: 0.0,
        });
        next_index += 1;

        for portal_data in &cell.portals {
            let portal_node = node_by_portal[portal_data.portal];
            graph.edges.push(PathGraphEdge {
                index_a: cell_node,
                index_b: portal_node,
            });
            graph.edges.push(PathGraphEdge {
                index_a: portal_node,
                index_b: cell_node,
            });
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extents::Extents;
    use crate::portal::PortalData;

    fn portal(verts: Vec<Vec3>) -> Portal {
        Portal {
            verts,
            indices: Vec::new(),
        }
    }

    fn cell(name: &str, anchor: Vec3, portal_ids: &[usize]) -> Cell {
        Cell {
            name: name.into(),
            portals: portal_ids
                .iter()
                .map(|&portal| PortalData {
                    portal,
                    passable: true,
                    clockwise: false,
                    connecting_cell: None,
                    door_style: None,
                    door_hardpoint: None,
                })
                .collect(),
            appearance_path: None,
            floor_path: String::new(),
            collision: Extents::Null,
            lights: Vec::new(),
            anchor,
        }
    }

    #[test]
    fn test_portals_first_then_cells() {
        let portals = vec![portal(vec![Vec3::ZERO])];
        let cells = vec![
            cell("r0", Vec3::new(1.0, 0.0, 0.0), &[0]),
            cell("r1", Vec3::new(2.0, 0.0, 0.0), &[0]),
        ];
        let graph = synthesize_path_graph(&portals, &cells);

        assert_eq!(graph.nodes.len(), 3);
        let indices: Vec<u32> = graph.nodes.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(graph.nodes[0].key, 0);
        assert_eq!(graph.nodes[1].kind, PathNodeKind::Cell);
        assert_eq!(graph.nodes[2].kind, PathNodeKind::Cell);
    }

    #[test]
    fn test_first_cell_portals_are_entry_frame() {
        let portals = vec![portal(vec![Vec3::ZERO]), portal(vec![Vec3::ZERO])];
        let cells = vec![
            cell("r0", Vec3::ZERO, &[0]),
            cell("r1", Vec3::ZERO, &[0, 1]),
            cell("r2", Vec3::ZERO, &[1]),
        ];
        let graph = synthesize_path_graph(&portals, &cells);

        assert_eq!(graph.nodes[0].kind, PathNodeKind::CellPortal);
        assert_eq!(graph.nodes[1].kind, PathNodeKind::Waypoint);
    }

    #[test]
    fn test_edge_pairs_per_adjacency() {
        let portals = vec![portal(vec![Vec3::ZERO])];
        let cells = vec![cell("r0", Vec3::ZERO, &[0]), cell("r1", Vec3::ZERO, &[0])];
        let graph = synthesize_path_graph(&portals, &cells);

        assert_eq!(graph.edges.len(), 4);
        // r0 (node 1) <-> portal (node 0)
        assert_eq!(graph.edges[0], PathGraphEdge { index_a: 1, index_b: 0 });
        assert_eq!(graph.edges[1], PathGraphEdge { index_a: 0, index_b: 1 });
        // r1 (node 2) <-> portal (node 0)
        assert_eq!(graph.edges[2], PathGraphEdge { index_a: 2, index_b: 0 });
        assert_eq!(graph.edges[3], PathGraphEdge { index_a: 0, index_b: 2 });
    }

    #[test]
    fn test_portal_node_at_polygon_mean() {
        let portals = vec![portal(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ])];
        let cells = vec![cell("r0", Vec3::ZERO, &[0]), cell("r1", Vec3::ZERO, &[0])];
        let graph = synthesize_path_graph(&portals, &cells);
        assert_eq!(graph.nodes[0].position, Vec3::new(1.0, 1.0, 0.0));
    }
}
