//! Geometry normalization
//!
//! Turns an authored polygonal mesh into the triangulated, axis-converted
//! form both exporters consume. N-gons are fan-split over their loop
//! sequence, which preserves vertex count and winding; per-corner
//! attributes (split normals, UVs) follow their source loops onto the new
//! triangles. Everything leaves here in game axes (`(x,y,z) -> (-x,z,-y)`).
//!
//! The source mesh is never mutated; the normalizer reads it and builds a
//! fresh [`TriMesh`].

use tracing::{debug, warn};

use starforge_core::{Result, Transform, Vec2, Vec3};
use starforge_scene::{PolyMesh, UvLayer};

/// One triangle of a normalized mesh, owning loops `3i..3i+3`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// New loop ids, sequential in emission order
    pub loops: [u32; 3],
    /// Material slot inherited from the source polygon
    pub material_index: u32,
}

/// Per-loop tangent + bitangent-sign for one UV channel
#[derive(Debug, Clone, PartialEq)]
pub struct TangentLayer {
    pub name: String,
    /// `[x, y, z, bitangent_sign]` per loop, game axes
    pub data: Vec<[f32; 4]>,
}

/// A triangulated, axis-converted mesh
///
/// Positions keep the source vertex order; loop-indexed arrays are parallel
/// to the re-assigned loop sequence (triangle `i` owns loops `3i..3i+3`).
/// Triangles carry exactly three loops by construction, which is the
/// precondition the primitive batcher relies on.
#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<Triangle>,
    /// Per new loop: source vertex index
    pub loop_vertices: Vec<u32>,
    /// Per new loop: split normal, game axes
    pub loop_normals: Vec<Vec3>,
    /// UV channels rebuilt against the new loop sequence
    pub uv_layers: Vec<UvLayer>,
    pub active_uv: usize,
    /// Material slot names carried over from the source mesh
    pub materials: Vec<String>,
    /// One entry per UV channel whose tangents could be computed
    pub tangent_layers: Vec<TangentLayer>,
}

impl TriMesh {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn loop_count(&self) -> usize {
        self.loop_vertices.len()
    }

    /// The active UV layer, if the source mesh had one
    pub fn active_uv_layer(&self) -> Option<&UvLayer> {
        self.uv_layers.get(self.active_uv)
    }

    /// Tangents of the preferred channel: the last computed layer, matching
    /// the authoring tool's "last `calc_tangents` call wins" behavior
    pub fn tangents(&self) -> Option<&[[f32; 4]]> {
        self.tangent_layers.last().map(|l| l.data.as_slice())
    }
}

/// Normalize a mesh: triangulate, convert axes, optionally compute tangents.
///
/// Tangent computation is requested once per UV channel; a channel that
/// cannot be computed is skipped with a warning (non-fatal).
pub fn normalize(mesh: &PolyMesh, do_tangents: bool) -> Result<TriMesh> {
    mesh.validate()?;

    let mut out = TriMesh {
        positions: mesh.positions.iter().map(|p| p.to_game_axes()).collect(),
        active_uv: mesh.active_uv,
        materials: mesh.materials.clone(),
        ..Default::default()
    };
    out.uv_layers = mesh
        .uv_layers
        .iter()
        .map(|layer| UvLayer {
            name: layer.name.clone(),
            data: Vec::new(),
        })
        .collect();

    // Authoring-space copies of the per-loop data, kept so tangents can be
    // computed in the source space before conversion.
    let mut src_positions = Vec::new();
    let mut src_normals = Vec::new();

    for poly in &mesh.polygons {
        let loop_run = mesh.polygon_loops(poly);
        let base = poly.loop_start as usize;

        // Fan split: (l0, li, li+1) keeps the source winding.
        for i in 1..loop_run.len() - 1 {
            let corner_loops = [base, base + i, base + i + 1];
            let first = out.loop_vertices.len() as u32;

            for &src_loop in &corner_loops {
                out.loop_vertices.push(mesh.loops[src_loop]);
                out.loop_normals
                    .push(mesh.loop_normals[src_loop].to_game_axes());
                src_positions.push(mesh.positions[mesh.loops[src_loop] as usize]);
                src_normals.push(mesh.loop_normals[src_loop]);
                for (li, layer) in mesh.uv_layers.iter().enumerate() {
                    out.uv_layers[li].data.push(layer.data[src_loop]);
                }
            }

            out.triangles.push(Triangle {
                loops: [first, first + 1, first + 2],
                material_index: poly.material_index,
            });
        }
    }

    if do_tangents {
        for layer in &out.uv_layers {
            match compute_tangent_layer(&src_positions, &src_normals, &layer.data) {
                Some(data) => {
                    debug!(channel = %layer.name, "computed tangents");
                    out.tangent_layers.push(TangentLayer {
                        name: layer.name.clone(),
                        data,
                    });
                }
                None => {
                    warn!(channel = %layer.name, "could not compute tangents for UV channel, skipping");
                }
            }
        }
    }

    Ok(out)
}

/// Triangulate a mesh into world space for portal and floor geometry.
///
/// Returns the axis-converted, world-transformed vertex list (source order)
/// plus triangle vertex-index triples.
pub fn world_triangle_list(
    mesh: &PolyMesh,
    matrix_world: &Transform,
) -> Result<(Vec<Vec3>, Vec<[u32; 3]>)> {
    mesh.validate()?;

    let verts: Vec<Vec3> = mesh
        .positions
        .iter()
        .map(|&p| matrix_world.apply(p).to_game_axes())
        .collect();

    let mut tris = Vec::new();
    for poly in &mesh.polygons {
        let loop_run = mesh.polygon_loops(poly);
        for i in 1..loop_run.len() - 1 {
            tris.push([loop_run[0], loop_run[i], loop_run[i + 1]]);
        }
    }

    Ok((verts, tris))
}

/// Per-loop tangent basis for one UV channel, in game axes.
///
/// Standard per-triangle derivation; the tangent is orthonormalized against
/// the loop's split normal and the bitangent handedness goes into the
/// fourth component. Degenerate UV triangles fall back to a unit X tangent
/// rather than failing the channel.
fn compute_tangent_layer(
    src_positions: &[Vec3],
    src_normals: &[Vec3],
    uvs: &[Vec2],
) -> Option<Vec<[f32; 4]>> {
    if uvs.len() != src_positions.len() || uvs.is_empty() {
        return None;
    }

    let mut data = Vec::with_capacity(uvs.len());
    for tri in 0..uvs.len() / 3 {
        let base = tri * 3;
        let (p0, p1, p2) = (
            src_positions[base],
            src_positions[base + 1],
            src_positions[base + 2],
        );
        let (uv0, uv1, uv2) = (uvs[base], uvs[base + 1], uvs[base + 2]);

        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let du1 = uv1.x - uv0.x;
        let dv1 = uv1.y - uv0.y;
        let du2 = uv2.x - uv0.x;
        let dv2 = uv2.y - uv0.y;

        let det = du1 * dv2 - du2 * dv1;
        let (tangent, bitangent) = if det.abs() < 1e-12 {
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0))
        } else {
            let r = 1.0 / det;
            (
                (e1 * dv2 - e2 * dv1) * r,
                (e2 * du1 - e1 * du2) * r,
            )
        };

        for corner in 0..3 {
            let n = src_normals[base + corner];
            // Gram-Schmidt against the split normal.
            let t = (tangent - n * n.dot(&tangent)).normalize();
            let t = if t == Vec3::ZERO {
                Vec3::new(1.0, 0.0, 0.0)
            } else {
                t
            };
            let sign = if n.cross(&t).dot(&bitangent) < 0.0 {
                -1.0
            } else {
                1.0
            };
            let g = t.to_game_axes();
            data.push([g.x, g.y, g.z, sign]);
        }
    }

    Some(data)
}
