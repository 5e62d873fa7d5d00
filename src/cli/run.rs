//! Run a filter against a document file

use std::{io::Write, path::PathBuf};

use tracing::debug;

use super::{CliError, ensure_exists};
use crate::{
    evaluator::{EvalObject, Evaluator},
    output::{JsonRenderer, TextRenderer},
    parser::parse,
    store::{ErrorMode, Mode, Store},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Indented, jq-like display
    #[default]
    Text,

    /// One JSON document
    Json,
}

/// Options for running a filter
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// The filter to evaluate
    pub filter: String,
    /// Document file to run it on
    pub path: PathBuf,
    pub format: OutputFormat,
    /// How malformed entries are handled when the document is only read
    pub error_mode: ErrorMode,
}

/// Parses the filter, opens the document in the mode the filter needs,
/// evaluates it and writes the rendered result to `out`.
///
/// The document is saved even when evaluation fails part-way: statements that
/// already ran stay applied.
pub fn execute<W: Write>(options: &RunOptions, out: W) -> Result<EvalObject, CliError> {
    ensure_exists(&options.path)?;

    let parsed = parse(&options.filter)?;
    let mode = if parsed.requires_write_access {
        Mode::ReadWrite
    } else {
        Mode::Read
    };
    debug!(tree = %parsed.tree, ?mode, "parsed filter");

    let mut store = Store::open(&options.path, mode, options.error_mode)?;
    let result = match options.format {
        OutputFormat::Text => {
            Evaluator::new(store.document_mut(), TextRenderer::new(out)).eval(&parsed.tree)
        }
        OutputFormat::Json => {
            Evaluator::new(store.document_mut(), JsonRenderer::new(out, true)).eval(&parsed.tree)
        }
    };

    let closed = store.close();
    let value = result?;
    closed?;
    Ok(value)
}
