//! Building export orchestration
//!
//! Drives the whole building pipeline: the collection pass (global portal
//! scan, then every cell), the resolution pass (portal connectivity), path
//! graph synthesis, and the final hand-off to the writer. The two passes
//! are a correctness requirement, not an optimization: a portal's
//! connecting cell cannot be known until every cell has been scanned.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use starforge_core::{Error, Result};
use starforge_scene::Scene;

use crate::cell::{collect_cell, Cell, CellOptions};
use crate::iff;
use crate::pathgraph::{synthesize_path_graph, PathGraph};
use crate::portal::{ExportContext, Portal};

/// Options for a building export
#[derive(Debug, Clone)]
pub struct PobOptions {
    /// Mirror V on child geometry UVs
    pub flip_uv: bool,
    /// Also write the per-cell appearance geometry files
    pub export_children: bool,
    /// Reuse the identifier stored on the building collection by a prior
    /// import instead of deriving a fresh one
    pub use_imported_crc: bool,
}

impl Default for PobOptions {
    fn default() -> Self {
        Self {
            flip_uv: false,
            export_children: true,
            use_imported_crc: false,
        }
    }
}

/// The populated building model handed to the writer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PobModel {
    /// Building (collection) name
    pub name: String,
    /// Building identifier: imported, or derived from the reference name
    pub crc: u32,
    pub cells: Vec<Cell>,
    /// Global de-duplicated portal list
    pub portals: Vec<Portal>,
    pub path_graph: PathGraph,
}

/// Build the building model from the scene's active collection.
///
/// Child geometry and floor files are written under `out_root` along the
/// way; the building file itself is not written here.
pub fn build_pob(scene: &Scene, out_root: &Path, options: &PobOptions) -> Result<PobModel> {
    let building = scene
        .active_collection()
        .ok_or(Error::NoActiveCollection)?;

    // Identifier first: a doomed reuse request must abort before anything
    // is written.
    let crc = if options.use_imported_crc {
        building
            .properties
            .get("crc")
            .and_then(|v| v.as_int())
            .map(|v| v as u32)
            .ok_or_else(|| Error::MissingImportedCrc {
                collection: building.name.clone(),
            })?
    } else {
        crc32fast::hash(format!("{}.pob", building.name).as_bytes())
    };

    info!(building = %building.name, crc, flip_uv = options.flip_uv, "exporting building");

    let mut ctx = ExportContext::new();
    ctx.collect_portals(scene, building)?;

    let cell_opts = CellOptions {
        building_name: &building.name,
        out_root,
        export_children: options.export_children,
        flip_uv: options.flip_uv,
    };
    let mut cells: Vec<Cell> = Vec::with_capacity(building.children.len());
    for (cell_id, cell_col) in building.children.iter().enumerate() {
        cells.push(collect_cell(scene, &mut ctx, cell_id, cell_col, &cell_opts)?);
    }

    ctx.resolve(&mut cells)?;

    let path_graph = synthesize_path_graph(&ctx.portals, &cells);
    info!(
        cells = cells.len(),
        portals = ctx.portals.len(),
        nodes = path_graph.nodes.len(),
        edges = path_graph.edges.len(),
        "building model assembled"
    );

    Ok(PobModel {
        name: building.name.clone(),
        crc,
        cells,
        portals: ctx.portals,
        path_graph,
    })
}

/// Export the active collection as a building: build, validate, write.
/// Returns the path of the written building file.
pub fn export_pob(scene: &Scene, out_root: &Path, options: &PobOptions) -> Result<PathBuf> {
    let model = build_pob(scene, out_root, options)?;
    let path = out_root.join(format!("{}.pob", model.name));
    iff::write_pob(&model, &path)?;
    info!(path = %path.display(), "wrote POB");
    Ok(path)
}
