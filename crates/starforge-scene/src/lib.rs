//! starforge-scene
//!
//! The authoring-scene data model the exporters consume read-only: a flat
//! object arena with stable handles, a collection tree, polygonal meshes
//! with face-corner attributes, vertex groups, shape keys, lights, and
//! string-keyed custom property bags. Scenes deserialize from JSON so the
//! CLI and tests have a concrete source.

pub mod collection;
pub mod mesh;
pub mod object;
pub mod props;

pub use collection::{Collection, ObjectId, Scene};
pub use mesh::{GroupWeight, KeyBlock, PolyMesh, Polygon, UvLayer, VertexGroup, VertexWeights};
pub use object::{EmptyDisplay, Light, LightKind, ObjectData, SceneObject};
pub use props::{PropertyBag, PropertyValue};
