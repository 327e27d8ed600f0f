//! The `analyze` command: scan a tree, report findings.

use super::DetectionOverrides;
use crate::config;
use crate::detect;
use crate::io::output::{self, OutputFormat};
use crate::session::Session;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub struct AnalyzeConfig {
    pub path: PathBuf,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub overrides: DetectionOverrides,
}

pub fn handle_analyze(config: AnalyzeConfig) -> Result<()> {
    let mut declump_config = config::get_config().clone();
    config.overrides.apply(&mut declump_config);
    let format = resolve_format(config.format, &declump_config);

    let mut session = Session::open(&config.path, declump_config)
        .with_context(|| format!("Failed to load sources under {}", config.path.display()))?;
    session.warm_up()?;
    let report = detect::analyze(&mut session)?;

    match &config.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            output::create_writer(format, file).write_report(&report)?;
        }
        None => {
            output::create_writer(format, std::io::stdout()).write_report(&report)?;
        }
    }
    Ok(())
}

/// Command line beats configuration; terminal is the fallback.
fn resolve_format(
    requested: Option<OutputFormat>,
    config: &crate::config::DeclumpConfig,
) -> OutputFormat {
    requested
        .or_else(|| {
            config
                .output
                .default_format
                .as_deref()
                .and_then(OutputFormat::from_name)
        })
        .unwrap_or(OutputFormat::Terminal)
}
