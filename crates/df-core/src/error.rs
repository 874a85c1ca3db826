//! Error types for document operations.
//!
//! Only *invalid input* is an error. Invariant races (deleting the last
//! layer, touching a block that is already gone) are reported as `false` or
//! `None` by the model instead, and out-of-range numbers are clamped.

use crate::id::{BlockId, LayerId};
use crate::model::BlockType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocError {
    /// A block with this id is already stored.
    #[error("duplicate block id: {0}")]
    DuplicateBlock(BlockId),

    /// A layer with this id already exists.
    #[error("duplicate layer id: {0}")]
    DuplicateLayer(LayerId),

    /// A patch for one block kind was applied to a block of another kind.
    #[error("cannot apply a {patch:?} update to {id} ({block:?} block)")]
    KindMismatch {
        id: BlockId,
        block: BlockType,
        patch: BlockType,
    },

    /// The block type tag is not one the builder knows how to create.
    #[error("unsupported block type: {0:?}")]
    UnsupportedBlockType(String),

    /// A new layer arrived already referencing blocks.
    #[error("layer {0} must be empty when added")]
    LayerNotEmpty(LayerId),

    /// Block ↔ layer references are inconsistent.
    #[error("inconsistent document: {0}")]
    Inconsistent(String),

    /// A table's cell matrix does not match its declared dimensions.
    #[error("table {id} has a malformed cell matrix: {reason}")]
    MalformedTable { id: BlockId, reason: String },

    /// The template was written by a newer schema than this build supports.
    #[error("template schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    /// The template is structurally invalid.
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// The template JSON could not be parsed.
    #[error("template JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for document operations.
pub type DocResult<T> = Result<T, DocError>;
