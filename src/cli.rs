use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "declump")]
#[command(about = "Data clump detector and extract-class refactoring tool for Java", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a Java source tree and report data clumps
    Analyze {
        /// Root directory to scan
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum number of matching fields for a field clump
        #[arg(long = "min-fields")]
        min_fields: Option<usize>,

        /// Minimum number of matching parameters for a parameter clump
        #[arg(long = "min-parameters", visible_alias = "min-params")]
        min_parameters: Option<usize>,

        /// Do not compare methods declared in the same class
        #[arg(long = "no-same-class")]
        no_same_class: bool,

        /// Skip field clump pairs whose classes share a hierarchy
        #[arg(long = "check-fields-hierarchy")]
        check_fields_hierarchy: bool,

        /// Compare overriding methods too, skipping pairs whose classes
        /// share a hierarchy
        #[arg(long = "check-parameters-hierarchy")]
        check_parameters_hierarchy: bool,
    },

    /// Apply extract-class refactorings for every clump found
    Fix {
        /// Root directory to scan and rewrite
        path: PathBuf,

        /// Report what would change without writing any file
        #[arg(long = "dry-run")]
        dry_run: bool,

        /// Only fix one smell family
        #[arg(long = "only", value_enum)]
        only: Option<FixKind>,

        /// Minimum number of matching fields for a field clump
        #[arg(long = "min-fields")]
        min_fields: Option<usize>,

        /// Minimum number of matching parameters for a parameter clump
        #[arg(long = "min-parameters", visible_alias = "min-params")]
        min_parameters: Option<usize>,

        /// Do not compare methods declared in the same class
        #[arg(long = "no-same-class")]
        no_same_class: bool,
    },

    /// Write a starter .declump.toml
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Terminal,
}

impl From<OutputFormat> for crate::io::output::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Json => crate::io::output::OutputFormat::Json,
            OutputFormat::Terminal => crate::io::output::OutputFormat::Terminal,
        }
    }
}

/// Smell families the `fix` command can be restricted to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FixKind {
    Fields,
    Parameters,
    Globals,
}

impl FixKind {
    pub fn includes(&self, kind: crate::core::SmellKind) -> bool {
        use crate::core::SmellKind;
        match self {
            FixKind::Fields => kind == SmellKind::FieldClump,
            FixKind::Parameters => {
                kind == SmellKind::ParameterClump || kind == SmellKind::AlreadyExtracted
            }
            FixKind::Globals => kind == SmellKind::GlobalData,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
