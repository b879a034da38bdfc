//! Per-declaration mapping errors.

use thiserror::Error;

use crate::model::CodeLocation;

/// A declaration that could not be mapped. Other declarations of the same
/// unit are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("function `{function}` has unmapped calling convention `{convention}` ({location})")]
    UnmappedCallingConvention {
        function: String,
        convention: String,
        location: CodeLocation,
    },
}

impl MapError {
    /// Name of the declaration that failed.
    pub fn declaration(&self) -> &str {
        match self {
            MapError::UnmappedCallingConvention { function, .. } => function,
        }
    }

    pub fn location(&self) -> &CodeLocation {
        match self {
            MapError::UnmappedCallingConvention { location, .. } => location,
        }
    }
}
