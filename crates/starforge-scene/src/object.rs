//! Scene objects: meshes, lights, and empties
//!
//! Objects live in the scene's arena and are addressed by [`ObjectId`]
//! handles; the handle is the object's identity for the whole export
//! (portal de-duplication keys on it).
//!
//! [`ObjectId`]: crate::collection::ObjectId

use serde::{Deserialize, Serialize};

use starforge_core::Transform;

use crate::collection::ObjectId;
use crate::mesh::PolyMesh;
use crate::props::PropertyBag;

/// Authored light kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Point,
    Sun,
    Spot,
    Area,
}

/// An authored light source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    /// Linear RGB color
    pub color: [f32; 3],
    /// Authored intensity
    pub energy: f32,
}

/// Display style of an empty; door markers use `Arrows`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyDisplay {
    PlainAxes,
    Arrows,
    Sphere,
    Cube,
}

/// The payload of a scene object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectData {
    Mesh(PolyMesh),
    Light(Light),
    Empty { display: EmptyDisplay },
}

/// One object in the scene arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub data: ObjectData,
    /// Object-to-world transform
    #[serde(default)]
    pub matrix_world: Transform,
    /// String-keyed custom properties
    #[serde(default)]
    pub properties: PropertyBag,
    /// Child objects (door markers hang off portal meshes)
    #[serde(default)]
    pub children: Vec<ObjectId>,
}

impl SceneObject {
    pub fn is_mesh(&self) -> bool {
        matches!(self.data, ObjectData::Mesh(_))
    }

    pub fn as_mesh(&self) -> Option<&PolyMesh> {
        match &self.data {
            ObjectData::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.data {
            ObjectData::Light(light) => Some(light),
            _ => None,
        }
    }

    /// True for an empty displayed as arrows (a door marker)
    pub fn is_arrows_empty(&self) -> bool {
        matches!(
            self.data,
            ObjectData::Empty {
                display: EmptyDisplay::Arrows
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_kind_accessors() {
        let obj = SceneObject {
            name: "door_marker".into(),
            data: ObjectData::Empty {
                display: EmptyDisplay::Arrows,
            },
            matrix_world: Transform::IDENTITY,
            properties: PropertyBag::new(),
            children: Vec::new(),
        };
        assert!(obj.is_arrows_empty());
        assert!(!obj.is_mesh());
        assert!(obj.as_mesh().is_none());
    }
}
