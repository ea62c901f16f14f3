//! Collision extents
//!
//! A cell's `Collision_` sub-collection reduces to an extents volume: the
//! axis-converted world-space bounding box of every mesh object it holds.
//! No collision geometry yields null extents, which the writer encodes as
//! an empty extent record.

use serde::Serialize;

use starforge_core::{Result, Vec3};
use starforge_scene::{Collection, Scene};

/// Collision volume of a cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Extents {
    Null,
    Box { min: Vec3, max: Vec3 },
}

impl Extents {
    pub fn is_null(&self) -> bool {
        matches!(self, Extents::Null)
    }
}

/// Build extents from a collision collection (recursing into children).
pub fn extents_from_collection(scene: &Scene, collection: &Collection) -> Result<Extents> {
    let mut min = Vec3::new(f32::MAX, f32::MAX, f32::MAX);
    let mut max = Vec3::new(f32::MIN, f32::MIN, f32::MIN);
    let mut any = false;

    let mut stack = vec![collection];
    while let Some(col) = stack.pop() {
        for &id in &col.objects {
            let obj = scene.object(id)?;
            let Some(mesh) = obj.as_mesh() else { continue };
            for &p in &mesh.positions {
                let w = obj.matrix_world.apply(p).to_game_axes();
                min.x = min.x.min(w.x);
                min.y = min.y.min(w.y);
                min.z = min.z.min(w.z);
                max.x = max.x.max(w.x);
                max.y = max.y.max(w.y);
                max.z = max.z.max(w.z);
                any = true;
            }
        }
        stack.extend(col.children.iter());
    }

    Ok(if any {
        Extents::Box { min, max }
    } else {
        Extents::Null
    })
}
