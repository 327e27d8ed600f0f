// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod detect;
pub mod index;
pub mod io;
pub mod program;
pub mod refactor;
pub mod session;
pub mod smell;

// Re-export commonly used types
pub use crate::core::{
    AnalysisReport, CancelToken, Finding, Severity, SmellKind, Symbol,
};

pub use crate::core::errors::{Error, Result};

pub use crate::detect::analyze;

pub use crate::index::hierarchy::HierarchyResolver;
pub use crate::index::SymbolIndex;

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};

pub use crate::program::{ProgramModel, Workspace};

pub use crate::refactor::{
    encapsulate_global, refactor, refactor_finding, AutoInteraction, Interaction, RefactorOutcome,
    ScriptedInteraction,
};

pub use crate::session::Session;

pub use crate::smell::{Connection, SmellGroup};
