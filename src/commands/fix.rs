//! The `fix` command: run detection, then apply one refactoring per finding.
//!
//! Findings are processed in report order against a single live session, so
//! a later finding sees the rewrites of an earlier one. A finding whose
//! group can no longer be confirmed (typically the mirror report of a pair
//! already fixed) is skipped, not an error.

use super::DetectionOverrides;
use crate::config;
use crate::core::SmellKind;
use crate::detect;
use crate::refactor::{self, AutoInteraction};
use crate::session::Session;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub struct FixConfig {
    pub path: PathBuf,
    pub dry_run: bool,
    pub only: Option<crate::cli::FixKind>,
    pub overrides: DetectionOverrides,
}

pub struct FixSummary {
    pub applied: usize,
    pub skipped: usize,
    pub files_written: Vec<PathBuf>,
}

pub fn handle_fix(config: FixConfig) -> Result<()> {
    let mut declump_config = config::get_config().clone();
    config.overrides.apply(&mut declump_config);

    let mut session = Session::open(&config.path, declump_config)
        .with_context(|| format!("Failed to load sources under {}", config.path.display()))?;
    session.warm_up()?;
    let summary = fix_all(&mut session, config.only, config.dry_run)?;

    println!(
        "{} refactoring(s) applied, {} finding(s) skipped",
        summary.applied, summary.skipped
    );
    if config.dry_run {
        for path in session.workspace().dirty_paths() {
            println!("would write {}", path.display());
        }
    } else {
        for path in &summary.files_written {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

/// Detect and refactor every matching finding on `session`. Files are only
/// written back when `dry_run` is off.
pub fn fix_all(
    session: &mut Session,
    only: Option<crate::cli::FixKind>,
    dry_run: bool,
) -> Result<FixSummary> {
    let report = detect::analyze(session)?;
    let mut applied = 0;
    let mut skipped = 0;

    for finding in &report.findings {
        if let Some(only) = only {
            if !only.includes(finding.kind) {
                continue;
            }
        }
        // Pair findings come in duplicate; the second rebuild fails
        // harmlessly once the first fix has landed.
        let mut interaction = AutoInteraction::default();
        match refactor::refactor_finding(session, finding, &mut interaction) {
            Ok(outcome) if outcome.applied => {
                applied += 1;
                log::info!(
                    "{}: extracted {}",
                    display_kind(finding.kind),
                    outcome.class_name
                );
                for reason in &outcome.skipped {
                    log::warn!("skipped occurrence: {reason}");
                }
            }
            Ok(outcome) => {
                skipped += 1;
                for reason in &outcome.skipped {
                    log::debug!("{}: {reason}", finding.file.display());
                }
            }
            Err(e) => {
                skipped += 1;
                log::warn!(
                    "refactoring failed for {}:{}: {e}",
                    finding.file.display(),
                    finding.line
                );
            }
        }
    }

    let files_written = if dry_run {
        Vec::new()
    } else {
        session.write_back()?
    };
    Ok(FixSummary {
        applied,
        skipped,
        files_written,
    })
}

fn display_kind(kind: SmellKind) -> String {
    kind.to_string()
}
