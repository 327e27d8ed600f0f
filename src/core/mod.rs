pub mod errors;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

/// A named, typed program element taking part in a data clump.
///
/// Detection and rewriting never branch on runtime type information; the
/// kind is carried in the variant and consumed through pattern matching.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Symbol {
    Field {
        name: String,
        type_text: String,
        modifier_text: String,
        owner_class: String,
        file: PathBuf,
        line: usize,
    },
    Parameter {
        name: String,
        type_text: String,
        owner_class: String,
        owner_method: String,
        file: PathBuf,
        line: usize,
    },
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Field { name, .. } => name,
            Symbol::Parameter { name, .. } => name,
        }
    }

    pub fn type_text(&self) -> &str {
        match self {
            Symbol::Field { type_text, .. } => type_text,
            Symbol::Parameter { type_text, .. } => type_text,
        }
    }

    /// Structural identity text, `<type> <name>` as declared.
    pub fn text(&self) -> String {
        format!("{} {}", self.type_text(), self.name())
    }

    pub fn is_field(&self) -> bool {
        matches!(self, Symbol::Field { .. })
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, Symbol::Parameter { .. })
    }

    /// Exact structural equality, used for group de-duplication.
    pub fn same_text(&self, other: &Symbol) -> bool {
        self.text() == other.text()
    }
}

/// The smell families this tool detects.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SmellKind {
    FieldClump,
    ParameterClump,
    AlreadyExtracted,
    GlobalData,
}

impl std::fmt::Display for SmellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(SmellKind, &str)] = &[
            (SmellKind::FieldClump, "Field Data Clump"),
            (SmellKind::ParameterClump, "Parameter Data Clump"),
            (SmellKind::AlreadyExtracted, "Already Extracted Class"),
            (SmellKind::GlobalData, "Global Mutable Data"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, s)| *s)
            .unwrap_or("Unknown");
        write!(f, "{display_str}")
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(Severity, &str)] = &[
            (Severity::Low, "LOW"),
            (Severity::Medium, "MEDIUM"),
            (Severity::High, "HIGH"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(severity, _)| severity == self)
            .map(|(_, s)| *s)
            .unwrap_or("UNKNOWN");
        write!(f, "{display_str}")
    }
}

/// One detected smell occurrence.
///
/// The rendered `message` doubles as the reconstruction key when a fix is
/// applied later: connection candidates are confirmed by matching their
/// names against it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub kind: SmellKind,
    pub severity: Severity,
    pub file: PathBuf,
    pub line: usize,
    /// Qualified name of the class the finding is anchored at.
    pub anchor_class: String,
    /// Anchor method name for parameter clumps.
    pub anchor_method: Option<String>,
    pub count: usize,
    /// Structural texts of the shared elements, in anchor declaration order.
    pub elements: Vec<String>,
    pub message: String,
}

impl Finding {
    pub fn mentions(&self, name: &str) -> bool {
        self.message.contains(name)
    }
}

/// Full result of one `analyze` run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub root: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub files_scanned: usize,
    pub classes_indexed: usize,
    pub findings: Vec<Finding>,
}

impl AnalysisReport {
    pub fn new(root: PathBuf, files_scanned: usize, classes_indexed: usize) -> Self {
        Self {
            root,
            timestamp: Utc::now(),
            files_scanned,
            classes_indexed,
            findings: Vec::new(),
        }
    }
}

/// Wall-clock timer for index builds, detector runs and refactor units.
/// Results go to the log at debug level.
pub struct SmellTimer {
    label: String,
    class_name: Option<String>,
    started: Option<Instant>,
    elapsed_micros: u128,
}

impl SmellTimer {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            class_name: None,
            started: None,
            elapsed_micros: 0,
        }
    }

    pub fn set_class_name(&mut self, name: impl Into<String>) {
        self.class_name = Some(name.into());
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed_micros = started.elapsed().as_micros();
        }
    }

    pub fn duration_micros(&self) -> u128 {
        self.elapsed_micros
    }

    pub fn report(&self) {
        match &self.class_name {
            Some(class_name) => log::debug!(
                "{} ({}): {} us",
                self.label,
                class_name,
                self.elapsed_micros
            ),
            None => log::debug!("{}: {} us", self.label, self.elapsed_micros),
        }
    }
}

/// Cooperative cancellation shared between a caller and long-running index
/// or detector work. Cloning shares the underlying flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Return `Error::Cancelled` once the token is tripped.
    pub fn check(&self) -> errors::Result<()> {
        if self.is_cancelled() {
            Err(errors::Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, type_text: &str) -> Symbol {
        Symbol::Field {
            name: name.to_string(),
            type_text: type_text.to_string(),
            modifier_text: "public".to_string(),
            owner_class: "A".to_string(),
            file: PathBuf::from("A.java"),
            line: 2,
        }
    }

    #[test]
    fn test_symbol_text_is_type_then_name() {
        assert_eq!(field("x", "int").text(), "int x");
    }

    #[test]
    fn test_same_text_ignores_location() {
        let a = field("x", "int");
        let b = Symbol::Field {
            name: "x".to_string(),
            type_text: "int".to_string(),
            modifier_text: "private".to_string(),
            owner_class: "B".to_string(),
            file: PathBuf::from("B.java"),
            line: 9,
        };
        assert!(a.same_text(&b));
    }

    #[test]
    fn test_smell_kind_display() {
        assert_eq!(SmellKind::GlobalData.to_string(), "Global Mutable Data");
        assert_eq!(SmellKind::FieldClump.to_string(), "Field Data Clump");
    }

    #[test]
    fn test_timer_reports_after_stop() {
        let mut timer = SmellTimer::new("detector");
        timer.start();
        timer.stop();
        timer.report();
        assert!(timer.duration_micros() < 1_000_000);
    }

    #[test]
    fn test_cancel_token_shares_flag_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(errors::Error::Cancelled)));
    }
}
