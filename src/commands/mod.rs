//! CLI command implementations.
//!
//! Each submodule handles one command: its configuration struct, threshold
//! overrides, and execution logic.
//!
//! - **analyze**: scan a Java tree and report data clumps
//! - **fix**: apply extract-class refactorings for the clumps found
//! - **init**: write a starter configuration file

pub mod analyze;
pub mod fix;
pub mod init;

pub use analyze::{handle_analyze, AnalyzeConfig};
pub use fix::{handle_fix, FixConfig};
pub use init::init_config;

use crate::config::DeclumpConfig;

/// Threshold and comparison overrides shared by `analyze` and `fix`.
#[derive(Debug, Clone, Default)]
pub struct DetectionOverrides {
    pub min_fields: Option<usize>,
    pub min_parameters: Option<usize>,
    pub no_same_class: bool,
    pub check_fields_hierarchy: bool,
    pub check_parameters_hierarchy: bool,
}

impl DetectionOverrides {
    /// Fold the command-line overrides into a loaded configuration.
    pub fn apply(&self, config: &mut DeclumpConfig) {
        if let Some(min_fields) = self.min_fields {
            config.detection.min_fields_count = min_fields;
        }
        if let Some(min_parameters) = self.min_parameters {
            config.detection.min_parameters_count = min_parameters;
        }
        if self.no_same_class {
            config.detection.include_methods_in_same_class = false;
        }
        if self.check_fields_hierarchy {
            config.detection.check_fields_hierarchy = true;
        }
        if self.check_parameters_hierarchy {
            config.detection.check_parameters_hierarchy = true;
        }
        config.detection.normalize();
    }
}
