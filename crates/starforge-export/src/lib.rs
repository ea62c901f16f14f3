//! starforge-export
//!
//! The two export pipelines that turn an authored scene into the client's
//! interchange formats:
//!
//! | Format | Extension | Description |
//! |--------|-----------|-------------|
//! | MGN    | `.mgn`    | Skinned mesh (bones, blend shapes, per-shader batches) |
//! | POB    | `.pob`    | Interior building (cells, portals, path graph) |
//! | FLR    | `.flr`    | Per-cell floor collision + path nodes |
//! | MSH    | `.msh`    | Static appearance mesh |
//! | LOD    | `.lod`    | Detail-level wrapper over MSH children |
//!
//! Both pipelines share the geometry normalizer; everything downstream of
//! it works on triangulated, axis-converted data. The building pipeline is
//! two-pass by necessity: portals only resolve once every cell is scanned.

pub mod batch;
pub mod cell;
pub mod extents;
pub mod floor;
pub mod iff;
pub mod lights;
pub mod mgn;
pub mod msh;
pub mod normalize;
pub mod pathgraph;
pub mod pob;
pub mod portal;
pub mod skin;

// Re-export main types
pub use batch::{batch_by_material, PerShaderBatch};
pub use cell::{collect_cell, Cell, CellOptions};
pub use extents::{extents_from_collection, Extents};
pub use floor::{build_floor, FloorModel, FloorTri};
pub use lights::{light_from_object, LightDescriptor, LightDescriptorKind};
pub use mgn::{build_mgn, export_mgn, MgnModel, MgnOptions, Occlusion};
pub use msh::{build_lod_children, build_msh, LodModel, MshModel};
pub use normalize::{normalize, world_triangle_list, TangentLayer, TriMesh, Triangle};
pub use pathgraph::{synthesize_path_graph, PathGraph, PathGraphEdge, PathGraphNode, PathNodeKind};
pub use pob::{build_pob, export_pob, PobModel, PobOptions};
pub use portal::{ExportContext, Portal, PortalData};
pub use skin::{package_blend_shapes, package_weights, BlendShape, BoneWeight, SkinTable, VertexWeightEntry};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
