//! Recover the readable part of a damaged document

use std::{io::Write, path::PathBuf};

use super::{CliError, ensure_exists};
use crate::store::{self, RepairReport};

#[derive(Debug, Clone)]
pub struct RepairOptions {
    pub path: PathBuf,
    /// List every entry that was dropped
    pub verbose: bool,
}

/// Repairs the document in place and writes a summary to `out`.
pub fn repair_document<W: Write>(
    options: &RepairOptions,
    mut out: W,
) -> Result<RepairReport, CliError> {
    ensure_exists(&options.path)?;

    let report = store::repair(&options.path)?;

    writeln!(
        out,
        "Recovered {} entries, dropped {}.",
        report.recovered,
        report.skipped.len()
    )?;
    if options.verbose {
        for path in &report.skipped {
            writeln!(out, "  dropped {}", path)?;
        }
    }

    Ok(report)
}
