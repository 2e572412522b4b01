use crate::core::models::{DuplicateError, Level};
use crate::core::selection::error::SelectionError;
use thiserror::Error;

/// Errors raised by the traversal and mutation layers.
///
/// Every variant is raised before any mutation takes place, so a failed
/// operation leaves the hierarchy unchanged. A unique-result query that
/// matches nothing is not an error; it reports `Ok(None)` instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Duplicate(#[from] DuplicateError),

    #[error("the identifier {id:?} corresponds to more than a single {level}")]
    Ambiguous { level: Level, id: String },

    #[error("a residue identifier is not allowed within {id:?}")]
    ResidueIdDisallowed { id: String },

    #[error("a spin identifier is not allowed within {id:?}")]
    SpinIdDisallowed { id: String },

    #[error("the molecule in {id:?} does not exist in the hierarchy")]
    MoleculeNotFound { id: String },

    #[error("the residue in {id:?} does not exist in the hierarchy")]
    ResidueNotFound { id: String },

    #[error("the spin {id:?} does not exist in the hierarchy")]
    SpinNotFound { id: String },

    #[error("the {level} {id:?} already exists in the hierarchy")]
    TargetExists { level: Level, id: String },

    #[error("numbering more than one {level} at once is disallowed, each {level} requires a unique number")]
    MultipleRenumber { level: Level },

    #[error("no position information is available for the spin {id:?}")]
    MissingPosition { id: String },
}

impl EngineError {
    pub(crate) fn ambiguous(level: Level, id: Option<&str>) -> Self {
        EngineError::Ambiguous {
            level,
            id: id.unwrap_or_default().to_string(),
        }
    }
}
