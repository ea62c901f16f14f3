//! Light conversion
//!
//! Authored lights become the client's light descriptors. Only sun and
//! point lights have a client counterpart (parallel and point); anything
//! else is skipped with a warning, a best-effort degradation rather than
//! an error.

use serde::Serialize;
use tracing::warn;

use starforge_core::Transform;
use starforge_scene::{LightKind, SceneObject};

/// Client light kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum LightDescriptorKind {
    Ambient = 0,
    Parallel = 1,
    Point = 2,
}

/// One light record of a cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightDescriptor {
    pub kind: LightDescriptorKind,
    /// Diffuse color scaled by the authored energy
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    /// World transform in game axes
    pub transform: Transform,
    pub constant_attenuation: f32,
    pub linear_attenuation: f32,
    pub quadratic_attenuation: f32,
}

/// Convert one authored light object; `None` when the type has no client
/// counterpart.
pub fn light_from_object(obj: &SceneObject) -> Option<LightDescriptor> {
    let light = obj.as_light()?;
    let kind = match light.kind {
        LightKind::Sun => LightDescriptorKind::Parallel,
        LightKind::Point => LightDescriptorKind::Point,
        LightKind::Spot | LightKind::Area => {
            warn!(object = %obj.name, kind = ?light.kind, "light type has no client counterpart, skipping");
            return None;
        }
    };

    let diffuse = [
        light.color[0] * light.energy,
        light.color[1] * light.energy,
        light.color[2] * light.energy,
    ];

    Some(LightDescriptor {
        kind,
        diffuse,
        specular: [0.0, 0.0, 0.0],
        transform: obj.matrix_world.to_game_axes(),
        constant_attenuation: 1.0,
        linear_attenuation: 0.0,
        quadratic_attenuation: 0.0,
    })
}
