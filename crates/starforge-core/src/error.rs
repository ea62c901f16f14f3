//! Unified error handling for starforge
//!
//! One error type covers both export pipelines. Variants are grouped into
//! the three categories the exporters distinguish: precondition violations
//! (bad invocation, nothing inspected yet), data-integrity violations
//! (the scene is structurally unexportable), and I/O failures from the
//! writer sink. Best-effort degradations are not errors; they are logged
//! and the offending element is omitted.

use thiserror::Error;

/// Unified error type for all starforge operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Precondition Violations ====================

    /// Mesh export requires exactly one selected object
    #[error("Expected exactly one selected object, found {selected}")]
    SelectionCount { selected: usize },

    /// The selected object is not a mesh
    #[error("Selected object '{object}' is not a mesh")]
    NotAMesh { object: String },

    /// Building export requires an active collection
    #[error("No active collection; a building export needs one")]
    NoActiveCollection,

    // ==================== Data-Integrity Violations ====================

    /// A portal must be shared by exactly two cells
    #[error("Portal {portal} is owned by {owners} cell(s), expected exactly 2")]
    PortalOwnerCount { portal: usize, owners: usize },

    /// Every cell needs a floor object
    #[error("Cell {cell_id} ('{cell}') has no floor object")]
    MissingFloor { cell_id: usize, cell: String },

    /// A cell references a portal object absent from the global portal list
    #[error("Cell '{cell}' references portal object '{object}' which is not in the global portal list")]
    UnknownPortal { cell: String, object: String },

    /// Reuse of an imported identifier was requested but none is stored
    #[error("Collection '{collection}' has no stored 'crc' property to reuse")]
    MissingImportedCrc { collection: String },

    /// A vertex group's declared index does not name a bone
    #[error("Bone index {bone} is outside the bone-name table (len {bone_count})")]
    BoneIndexOutOfRange { bone: u32, bone_count: usize },

    /// Structurally invalid scene data
    #[error("Invalid scene data: {message}")]
    InvalidScene { message: String },

    // ==================== General Errors ====================

    /// Internal error (should not happen)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid-scene error
    pub fn invalid_scene(message: impl Into<String>) -> Self {
        Error::InvalidScene {
            message: message.into(),
        }
    }

    /// Check if this is a precondition violation (bad invocation)
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::SelectionCount { .. } | Error::NotAMesh { .. } | Error::NoActiveCollection
        )
    }

    /// Check if this is a data-integrity violation (unexportable scene)
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Error::PortalOwnerCount { .. }
                | Error::MissingFloor { .. }
                | Error::UnknownPortal { .. }
                | Error::MissingImportedCrc { .. }
                | Error::BoneIndexOutOfRange { .. }
                | Error::InvalidScene { .. }
        )
    }
}
