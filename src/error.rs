use std::path::PathBuf;

use thiserror::Error;

use crate::crossword::Variable;

/// Errors raised while loading or building a puzzle. Failing to find a fill is not one of these;
/// see `FillFailure` for that.
#[derive(Debug, Error)]
pub enum Error {
    #[error("couldn't read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("structure must have at least one row")]
    EmptyStructure,

    #[error("variable starting at ({i}, {j}) must have a positive length")]
    ZeroLengthVariable { i: usize, j: usize },

    #[error("variable starting at ({i}, {j}) runs past the largest supported grid")]
    VariableOutOfBounds { i: usize, j: usize },

    #[error("variable {0:?} appears more than once")]
    DuplicateVariable(Variable),

    #[error("cell ({i}, {j}) is claimed by conflicting variables")]
    ConflictingVariables { i: usize, j: usize },
}
