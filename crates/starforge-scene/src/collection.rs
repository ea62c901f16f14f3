//! Scene arena and collection tree
//!
//! The scene owns every object in a flat arena; collections reference
//! objects by [`ObjectId`]. Handles are assigned once at load time and are
//! stable for the lifetime of the scene, which makes them usable as map
//! keys during an export (object identity).

use std::path::Path;

use serde::{Deserialize, Serialize};

use starforge_core::{Error, Result};

use crate::object::SceneObject;
use crate::props::PropertyBag;

/// Stable handle to an object in the scene arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named grouping of objects and sub-collections
///
/// Building exports read structure from the collection tree: the active
/// collection is the building, its children are cells, and each cell's
/// sub-collections are classified by name prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ObjectId>,
    #[serde(default)]
    pub children: Vec<Collection>,
    #[serde(default)]
    pub properties: PropertyBag,
}

impl Collection {
    /// Find a direct or transitive sub-collection by name
    pub fn find(&self, name: &str) -> Option<&Collection> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

/// A loaded authoring scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Object arena; [`ObjectId`] indexes into this
    pub objects: Vec<SceneObject>,
    /// Root collections
    #[serde(default)]
    pub collections: Vec<Collection>,
    /// Currently selected objects
    #[serde(default)]
    pub selected: Vec<ObjectId>,
    /// Name of the active collection, if any
    #[serde(default)]
    pub active_collection: Option<String>,
}

impl Scene {
    /// Resolve an object handle
    pub fn object(&self, id: ObjectId) -> Result<&SceneObject> {
        self.objects
            .get(id.0 as usize)
            .ok_or_else(|| Error::invalid_scene(format!("dangling object handle {id}")))
    }

    /// The active collection, resolved by name
    pub fn active_collection(&self) -> Option<&Collection> {
        let name = self.active_collection.as_deref()?;
        self.collections.iter().find_map(|c| c.find(name))
    }

    /// Selected objects in selection order
    pub fn selected_objects(&self) -> Result<Vec<(ObjectId, &SceneObject)>> {
        self.selected
            .iter()
            .map(|&id| Ok((id, self.object(id)?)))
            .collect()
    }

    /// Load a scene from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let scene: Scene = serde_json::from_str(text)
            .map_err(|e| Error::invalid_scene(format!("scene JSON: {e}")))?;
        scene.validate()?;
        Ok(scene)
    }

    /// Load a scene from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Check handle and mesh consistency across the whole scene
    pub fn validate(&self) -> Result<()> {
        let check_handle = |id: ObjectId| -> Result<()> {
            if id.0 as usize >= self.objects.len() {
                return Err(Error::invalid_scene(format!("dangling object handle {id}")));
            }
            Ok(())
        };

        for obj in &self.objects {
            if let Some(mesh) = obj.as_mesh() {
                mesh.validate()?;
            }
            for &child in &obj.children {
                check_handle(child)?;
            }
        }
        for &id in &self.selected {
            check_handle(id)?;
        }

        fn walk(col: &Collection, check: &dyn Fn(ObjectId) -> Result<()>) -> Result<()> {
            for &id in &col.objects {
                check(id)?;
            }
            for child in &col.children {
                walk(child, check)?;
            }
            Ok(())
        }
        for col in &self.collections {
            walk(col, &check_handle)?;
        }

        Ok(())
    }
}
