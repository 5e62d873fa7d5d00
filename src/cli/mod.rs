//! CLI support for hdfq
//!
//! Provides programmatic access to the `hdfq` commands so they can be driven
//! without spawning the binary.

mod repair;
mod run;

pub use repair::{RepairOptions, repair_document};
pub use run::{OutputFormat, RunOptions, execute};

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{document::StoreError, evaluator::EvalError, parser::ParseError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Usage error: the document path names no file
    #[error("{} does not exist for 'PATH'.", .0.display())]
    MissingPath(PathBuf),

    /// No path argument and nothing piped on stdin
    #[error("Missing argument 'PATH'.")]
    NoPath,
}

fn ensure_exists(path: &std::path::Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::MissingPath(path.to_path_buf()))
    }
}
