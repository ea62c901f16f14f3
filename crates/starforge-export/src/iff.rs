//! IFF chunk writer sink
//!
//! The client formats are IFF-style containers: 4-byte ASCII tags, nested
//! FORMs with big-endian sizes, little-endian chunk payloads. The writer is
//! the end of both pipelines and performs no validation of the model; the
//! exporters populate and validate everything before handing off.
//!
//! Every file is serialized to memory first and persisted through a
//! temp-file rename, so an abort never leaves a partially written output.

use std::io::Write;
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use starforge_core::{Error, Result, Transform, Vec2, Vec3};

use crate::extents::Extents;
use crate::floor::FloorModel;
use crate::mgn::MgnModel;
use crate::msh::{LodModel, MshModel};
use crate::pob::PobModel;

/// Stack-based IFF form/chunk builder
#[derive(Debug, Default)]
pub struct IffWriter {
    buf: Vec<u8>,
    /// Offsets of pending size fields
    stack: Vec<usize>,
}

fn tag_bytes(tag: &str) -> [u8; 4] {
    let mut out = [b' '; 4];
    for (slot, b) in out.iter_mut().zip(tag.bytes()) {
        *slot = b;
    }
    out
}

impl IffWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a FORM container; its size covers the form tag and contents
    pub fn begin_form(&mut self, tag: &str) -> Result<()> {
        self.buf.write_all(b"FORM")?;
        self.stack.push(self.buf.len());
        self.buf.write_u32::<BigEndian>(0)?;
        self.buf.write_all(&tag_bytes(tag))?;
        Ok(())
    }

    /// Open a data chunk
    pub fn begin_chunk(&mut self, tag: &str) -> Result<()> {
        self.buf.write_all(&tag_bytes(tag))?;
        self.stack.push(self.buf.len());
        self.buf.write_u32::<BigEndian>(0)?;
        Ok(())
    }

    /// Close the innermost open form or chunk, patching its size
    pub fn end(&mut self) -> Result<()> {
        let offset = self
            .stack
            .pop()
            .ok_or_else(|| Error::internal("IFF end() without open scope"))?;
        let size = (self.buf.len() - offset - 4) as u32;
        self.buf[offset..offset + 4].copy_from_slice(&size.to_be_bytes());
        Ok(())
    }

    pub fn put_u8(&mut self, v: u8) -> Result<()> {
        self.buf.write_u8(v)?;
        Ok(())
    }

    pub fn put_u32(&mut self, v: u32) -> Result<()> {
        self.buf.write_u32::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn put_i32(&mut self, v: i32) -> Result<()> {
        self.buf.write_i32::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn put_f32(&mut self, v: f32) -> Result<()> {
        self.buf.write_f32::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn put_vec2(&mut self, v: Vec2) -> Result<()> {
        self.put_f32(v.x)?;
        self.put_f32(v.y)
    }

    pub fn put_vec3(&mut self, v: Vec3) -> Result<()> {
        self.put_f32(v.x)?;
        self.put_f32(v.y)?;
        self.put_f32(v.z)
    }

    pub fn put_transform(&mut self, t: &Transform) -> Result<()> {
        for v in t.to_flat() {
            self.put_f32(v)?;
        }
        Ok(())
    }

    /// Null-terminated string
    pub fn put_cstring(&mut self, s: &str) -> Result<()> {
        self.buf.write_all(s.as_bytes())?;
        self.buf.write_u8(0)?;
        Ok(())
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.write_all(bytes)?;
        Ok(())
    }

    /// Take the finished buffer; every scope must be closed
    pub fn finish(self) -> Result<Vec<u8>> {
        if !self.stack.is_empty() {
            return Err(Error::internal(format!(
                "IFF finish() with {} open scope(s)",
                self.stack.len()
            )));
        }
        Ok(self.buf)
    }
}

/// Persist serialized bytes atomically: temp file in the target directory,
/// then rename over the destination.
pub fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

// ==================== MGN ====================

/// Serialize a skinned-mesh model
pub fn mgn_bytes(model: &MgnModel) -> Result<Vec<u8>> {
    let mut w = IffWriter::new();
    w.begin_form("SKMG")?;
    w.begin_form("0004")?;

    w.begin_chunk("INFO")?;
    w.put_u32(model.skeletons.len() as u32)?;
    w.put_u32(model.bone_names.len() as u32)?;
    w.put_u32(model.positions.len() as u32)?;
    w.put_u32(model.weights.len() as u32)?;
    w.put_u32(model.normals.len() as u32)?;
    w.put_u32(model.psdts.len() as u32)?;
    w.put_u32(model.blends.len() as u32)?;
    w.put_u32(model.occlusions.len() as u32)?;
    w.put_i32(model.occlusion_layer.unwrap_or(2) as i32)?;
    w.end()?;

    w.begin_chunk("SKTM")?;
    for skeleton in &model.skeletons {
        w.put_cstring(skeleton)?;
    }
    w.end()?;

    w.begin_chunk("XFNM")?;
    for bone in &model.bone_names {
        w.put_cstring(bone)?;
    }
    w.end()?;

    w.begin_chunk("POSN")?;
    for &p in &model.positions {
        w.put_vec3(p)?;
    }
    w.end()?;

    w.begin_chunk("TWHD")?;
    for entry in &model.weights {
        w.put_u32(entry.vertex)?;
        w.put_u32(entry.weights.len() as u32)?;
    }
    w.end()?;

    w.begin_chunk("TWDT")?;
    for entry in &model.weights {
        for bw in &entry.weights {
            w.put_u32(bw.bone)?;
            w.put_f32(bw.weight)?;
        }
    }
    w.end()?;

    w.begin_chunk("NORM")?;
    for &n in &model.normals {
        w.put_vec3(n)?;
    }
    w.end()?;

    if let Some(dot3) = &model.dot3 {
        w.begin_chunk("DOT3")?;
        w.put_u32(dot3.len() as u32)?;
        for t in dot3 {
            for &c in t {
                w.put_f32(c)?;
            }
        }
        w.end()?;
    }

    if !model.occlusions.is_empty() {
        w.begin_chunk("OZN ")?;
        for occ in &model.occlusions {
            w.put_cstring(&occ.name)?;
            w.put_u32(occ.index)?;
            w.put_i32(occ.value as i32)?;
        }
        w.end()?;
    }

    if let Some(hpts) = &model.binary_hardpoints {
        w.begin_chunk("HPTS")?;
        w.put_bytes(hpts)?;
        w.end()?;
    }
    if let Some(trts) = &model.binary_trts {
        w.begin_chunk("TRTS")?;
        w.put_bytes(trts)?;
        w.end()?;
    }

    if !model.blends.is_empty() {
        w.begin_form("BLTS")?;
        for blend in &model.blends {
            w.begin_form("BLT ")?;
            w.begin_chunk("INFO")?;
            w.put_u32(blend.positions.len() as u32)?;
            w.put_cstring(&blend.name)?;
            w.end()?;
            w.begin_chunk("POSN")?;
            for &(vertex, delta) in &blend.positions {
                w.put_u32(vertex)?;
                w.put_vec3(delta)?;
            }
            w.end()?;
            w.begin_chunk("NORM")?;
            for &(vertex, delta) in &blend.normals {
                w.put_u32(vertex)?;
                w.put_vec3(delta)?;
            }
            w.end()?;
            if let Some(tangents) = &blend.tangents {
                w.begin_chunk("DOT3")?;
                for &(vertex, delta) in tangents {
                    w.put_u32(vertex)?;
                    w.put_vec3(delta)?;
                }
                w.end()?;
            }
            w.end()?;
        }
        w.end()?;
    }

    for psdt in &model.psdts {
        w.begin_form("PSDT")?;
        w.begin_chunk("NAME")?;
        w.put_cstring(&psdt.name)?;
        w.end()?;
        w.begin_chunk("PIDX")?;
        w.put_u32(psdt.position_indices.len() as u32)?;
        for &idx in &psdt.position_indices {
            w.put_u32(idx)?;
        }
        w.end()?;
        w.begin_chunk("NIDX")?;
        for &idx in &psdt.normal_indices {
            w.put_u32(idx)?;
        }
        w.end()?;
        if let Some(tangent_indices) = &psdt.tangent_indices {
            w.begin_chunk("DOT3")?;
            for &idx in tangent_indices {
                w.put_u32(idx)?;
            }
            w.end()?;
        }
        w.begin_chunk("TCSD")?;
        for &uv in &psdt.uvs {
            w.put_vec2(uv)?;
        }
        w.end()?;
        w.begin_form("PRIM")?;
        w.begin_chunk("ITL ")?;
        w.put_u32((psdt.primitives.len() / 3) as u32)?;
        for &idx in &psdt.primitives {
            w.put_u32(idx)?;
        }
        w.end()?;
        w.end()?;
        w.end()?;
    }

    w.end()?;
    w.end()?;
    w.finish()
}

/// Write a skinned-mesh model to disk
pub fn write_mgn(model: &MgnModel, path: &Path) -> Result<()> {
    persist(path, &mgn_bytes(model)?)
}

// ==================== POB ====================

fn put_extents(w: &mut IffWriter, extents: &Extents) -> Result<()> {
    w.begin_chunk("XTNT")?;
    match extents {
        Extents::Null => w.put_u8(0)?,
        Extents::Box { min, max } => {
            w.put_u8(1)?;
            w.put_vec3(*min)?;
            w.put_vec3(*max)?;
        }
    }
    w.end()
}

/// Serialize a building model
pub fn pob_bytes(model: &PobModel) -> Result<Vec<u8>> {
    let mut w = IffWriter::new();
    w.begin_form("PRTO")?;
    w.begin_form("0004")?;

    w.begin_chunk("DATA")?;
    w.put_i32(model.portals.len() as i32)?;
    w.put_i32(model.cells.len() as i32)?;
    w.end()?;

    w.begin_form("PRTS")?;
    for portal in &model.portals {
        w.begin_form("PRTL")?;
        w.begin_chunk("VERT")?;
        w.put_u32(portal.verts.len() as u32)?;
        for &v in &portal.verts {
            w.put_vec3(v)?;
        }
        w.end()?;
        w.begin_chunk("INDX")?;
        w.put_u32(portal.indices.len() as u32)?;
        for tri in &portal.indices {
            for &i in tri {
                w.put_u32(i)?;
            }
        }
        w.end()?;
        w.end()?;
    }
    w.end()?;

    w.begin_form("CELS")?;
    for cell in &model.cells {
        w.begin_form("CELL")?;

        w.begin_chunk("DATA")?;
        w.put_u32(cell.portals.len() as u32)?;
        w.put_cstring(&cell.name)?;
        w.put_cstring(cell.appearance_path.as_deref().unwrap_or(""))?;
        w.put_cstring(&cell.floor_path)?;
        w.end()?;

        for portal in &cell.portals {
            w.begin_chunk("PRTL")?;
            w.put_u8(portal.passable as u8)?;
            w.put_u8(portal.clockwise as u8)?;
            w.put_i32(portal.portal as i32)?;
            w.put_i32(portal.connecting_cell.map_or(-1, |c| c as i32))?;
            match &portal.door_style {
                Some(style) => {
                    w.put_u8(1)?;
                    w.put_cstring(style)?;
                }
                None => w.put_u8(0)?,
            }
            match &portal.door_hardpoint {
                Some(hardpoint) => {
                    w.put_u8(1)?;
                    w.put_transform(hardpoint)?;
                }
                None => w.put_u8(0)?,
            }
            w.end()?;
        }

        put_extents(&mut w, &cell.collision)?;

        w.begin_form("LGTS")?;
        for light in &cell.lights {
            w.begin_chunk("LGHT")?;
            w.put_u8(light.kind as u8)?;
            for &c in &light.diffuse {
                w.put_f32(c)?;
            }
            for &c in &light.specular {
                w.put_f32(c)?;
            }
            w.put_transform(&light.transform)?;
            w.put_f32(light.constant_attenuation)?;
            w.put_f32(light.linear_attenuation)?;
            w.put_f32(light.quadratic_attenuation)?;
            w.end()?;
        }
        w.end()?;

        w.end()?;
    }
    w.end()?;

    w.begin_form("PGRF")?;
    w.begin_chunk("PNOD")?;
    w.put_u32(model.path_graph.nodes.len() as u32)?;
    for node in &model.path_graph.nodes {
        w.put_i32(node.index as i32)?;
        w.put_i32(node.key)?;
        w.put_u8(node.kind as u8)?;
        w.put_f32(node.radius)?;
        w.put_vec3(node.position)?;
    }
    w.end()?;
    w.begin_chunk("PEDG")?;
    w.put_u32(model.path_graph.edges.len() as u32)?;
    for edge in &model.path_graph.edges {
        w.put_i32(edge.index_a as i32)?;
        w.put_i32(edge.index_b as i32)?;
    }
    w.end()?;
    w.end()?;

    w.begin_chunk("CRC ")?;
    w.put_u32(model.crc)?;
    w.end()?;

    w.end()?;
    w.end()?;
    w.finish()
}

/// Write a building model to disk
pub fn write_pob(model: &PobModel, path: &Path) -> Result<()> {
    persist(path, &pob_bytes(model)?)
}

// ==================== FLR / MSH / LOD ====================

/// Write a floor model to disk
pub fn write_flr(model: &FloorModel, path: &Path) -> Result<()> {
    let mut w = IffWriter::new();
    w.begin_form("FLOR")?;
    w.begin_chunk("VERT")?;
    w.put_u32(model.verts.len() as u32)?;
    for &v in &model.verts {
        w.put_vec3(v)?;
    }
    w.end()?;
    w.begin_chunk("TRIS")?;
    w.put_u32(model.tris.len() as u32)?;
    for tri in &model.tris {
        for &i in &tri.indices {
            w.put_u32(i)?;
        }
        for &p in &tri.portal_ids {
            w.put_i32(p)?;
        }
    }
    w.end()?;
    w.begin_chunk("PNOD")?;
    w.put_u32(model.path_nodes.len() as u32)?;
    for &n in &model.path_nodes {
        w.put_vec3(n)?;
    }
    w.end()?;
    w.end()?;
    persist(path, &w.finish()?)
}

/// Write a static mesh model to disk
pub fn write_msh(model: &MshModel, path: &Path) -> Result<()> {
    let mut w = IffWriter::new();
    w.begin_form("MESH")?;
    w.begin_chunk("INFO")?;
    w.put_u32(model.positions.len() as u32)?;
    w.put_u32(model.normals.len() as u32)?;
    w.put_u32(model.batches.len() as u32)?;
    w.end()?;
    w.begin_chunk("POSN")?;
    for &p in &model.positions {
        w.put_vec3(p)?;
    }
    w.end()?;
    w.begin_chunk("NORM")?;
    for &n in &model.normals {
        w.put_vec3(n)?;
    }
    w.end()?;
    for batch in &model.batches {
        w.begin_form("SPS ")?;
        w.begin_chunk("NAME")?;
        w.put_cstring(&batch.name)?;
        w.end()?;
        w.begin_chunk("PIDX")?;
        w.put_u32(batch.position_indices.len() as u32)?;
        for &idx in &batch.position_indices {
            w.put_u32(idx)?;
        }
        w.end()?;
        w.begin_chunk("NIDX")?;
        for &idx in &batch.normal_indices {
            w.put_u32(idx)?;
        }
        w.end()?;
        w.begin_chunk("TCSD")?;
        for &uv in &batch.uvs {
            w.put_vec2(uv)?;
        }
        w.end()?;
        w.begin_chunk("ITL ")?;
        w.put_u32((batch.primitives.len() / 3) as u32)?;
        for &idx in &batch.primitives {
            w.put_u32(idx)?;
        }
        w.end()?;
        w.end()?;
    }
    w.end()?;
    persist(path, &w.finish()?)
}

/// Write a level-of-detail wrapper referencing child meshes
pub fn write_lod(model: &LodModel, path: &Path) -> Result<()> {
    let mut w = IffWriter::new();
    w.begin_form("DTLA")?;
    w.begin_chunk("INFO")?;
    w.put_u32(model.children.len() as u32)?;
    w.end()?;
    w.begin_chunk("CHLD")?;
    for (level, reference) in model.children.iter().enumerate() {
        w.put_u32(level as u32)?;
        w.put_cstring(reference)?;
    }
    w.end()?;
    w.end()?;
    persist(path, &w.finish()?)
}
