//! Text edit primitives for rewriting Java sources.
//!
//! Edits are collected against a specific file revision, validated for
//! overlap, and applied in descending source order so earlier spans stay
//! valid while later ones are replaced.

use super::java::Span;
use crate::core::errors::{Error, Result};
use std::path::{Path, PathBuf};

/// One span replacement. Deleting is replacing with the empty string,
/// inserting is replacing an empty span.
#[derive(Clone, Debug)]
pub struct SourceEdit {
    pub span: Span,
    pub replacement: String,
}

/// A batch of edits against one file at a known revision.
#[derive(Clone, Debug)]
pub struct EditTransaction {
    file: PathBuf,
    base_revision: u64,
    edits: Vec<SourceEdit>,
}

impl EditTransaction {
    pub fn new(file: impl Into<PathBuf>, base_revision: u64) -> Self {
        Self {
            file: file.into(),
            base_revision,
            edits: Vec::new(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn base_revision(&self) -> u64 {
        self.base_revision
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn replace(&mut self, span: Span, replacement: impl Into<String>) {
        self.edits.push(SourceEdit {
            span,
            replacement: replacement.into(),
        });
    }

    pub fn delete(&mut self, span: Span) {
        self.replace(span, "");
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.replace(
            Span {
                start: offset,
                end: offset,
            },
            text,
        );
    }

    /// Apply every edit to `source`, highest offset first. Fails if any two
    /// edits overlap or an edit reaches past the end of the text.
    pub fn apply(&self, source: &str) -> Result<String> {
        let mut ordered: Vec<&SourceEdit> = self.edits.iter().collect();
        ordered.sort_by_key(|e| (e.span.start, e.span.end));

        for pair in ordered.windows(2) {
            if pair[0].span.end > pair[1].span.start {
                return Err(Error::edit(
                    &self.file,
                    format!(
                        "Overlapping edits at {}..{} and {}..{}",
                        pair[0].span.start, pair[0].span.end, pair[1].span.start, pair[1].span.end
                    ),
                ));
            }
        }
        if let Some(last) = ordered.last() {
            if last.span.end > source.len() {
                return Err(Error::edit(
                    &self.file,
                    format!(
                        "Edit {}..{} reaches past end of file ({} bytes)",
                        last.span.start,
                        last.span.end,
                        source.len()
                    ),
                ));
            }
        }

        let mut text = source.to_string();
        for edit in ordered.iter().rev() {
            text.replace_range(edit.span.start..edit.span.end, &edit.replacement);
        }
        Ok(text)
    }
}

#[derive(Clone, Copy, Debug)]
struct AppliedEdit {
    start: usize,
    end: usize,
    new_len: usize,
}

/// Tracks edits already applied to a buffer so spans from the original
/// parse snapshot can be located in the current text.
///
/// A span whose text was partially destroyed by an earlier edit cannot be
/// remapped and yields `None`; callers skip such references.
#[derive(Clone, Debug, Default)]
pub struct OffsetLog {
    applied: Vec<AppliedEdit>,
}

impl OffsetLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit, given in original snapshot coordinates.
    pub fn record(&mut self, span: Span, new_len: usize) {
        self.applied.push(AppliedEdit {
            start: span.start,
            end: span.end,
            new_len,
        });
    }

    /// Map `span` from snapshot coordinates to current buffer coordinates.
    ///
    /// Edits fully before the span shift it; edits fully inside stretch it
    /// (the span then covers the replacement text). An edit that straddles
    /// the span boundary, or that replaced an enclosing region, consumed
    /// the span.
    pub fn remap(&self, span: Span) -> Option<Span> {
        let mut shift: isize = 0;
        let mut stretch: isize = 0;
        for edit in &self.applied {
            let delta = edit.new_len as isize - (edit.end - edit.start) as isize;
            if edit.end <= span.start {
                shift += delta;
            } else if edit.start >= span.end {
                continue;
            } else if span.start <= edit.start && edit.end <= span.end {
                stretch += delta;
            } else {
                return None;
            }
        }
        let start = (span.start as isize + shift).max(0) as usize;
        let end = (span.end as isize + shift + stretch).max(0) as usize;
        Some(Span { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_replaces_in_descending_order() {
        let source = "int a; int b; int c;";
        let mut tx = EditTransaction::new("T.java", 0);
        tx.replace(Span { start: 4, end: 5 }, "alpha");
        tx.replace(Span { start: 11, end: 12 }, "beta");
        tx.delete(Span { start: 14, end: 20 });
        let result = tx.apply(source).unwrap();
        assert_eq!(result, "int alpha; int beta; ");
    }

    #[test]
    fn test_insert_at_offset() {
        let mut tx = EditTransaction::new("T.java", 0);
        tx.insert(0, "package p;\n");
        let result = tx.apply("class A {}").unwrap();
        assert_eq!(result, "package p;\nclass A {}");
    }

    #[test]
    fn test_overlapping_edits_rejected() {
        let mut tx = EditTransaction::new("T.java", 0);
        tx.replace(Span { start: 0, end: 5 }, "x");
        tx.replace(Span { start: 3, end: 8 }, "y");
        let err = tx.apply("0123456789").unwrap_err();
        assert!(err.to_string().contains("Overlapping"));
    }

    #[test]
    fn test_edit_past_end_rejected() {
        let mut tx = EditTransaction::new("T.java", 0);
        tx.replace(Span { start: 2, end: 50 }, "x");
        assert!(tx.apply("short").is_err());
    }

    #[test]
    fn test_remap_shifts_after_earlier_edit() {
        let mut log = OffsetLog::new();
        // "xx" (2 bytes) replaced by "long" (4 bytes) at 0..2
        log.record(Span { start: 0, end: 2 }, 4);
        let mapped = log.remap(Span { start: 10, end: 14 }).unwrap();
        assert_eq!(mapped, Span { start: 12, end: 16 });
    }

    #[test]
    fn test_remap_stretches_interior_edit() {
        let mut log = OffsetLog::new();
        log.record(Span { start: 12, end: 14 }, 10);
        let mapped = log.remap(Span { start: 10, end: 20 }).unwrap();
        assert_eq!(mapped, Span { start: 10, end: 28 });
    }

    #[test]
    fn test_remap_exact_replacement_covers_new_text() {
        let mut log = OffsetLog::new();
        log.record(Span { start: 5, end: 8 }, 12);
        let mapped = log.remap(Span { start: 5, end: 8 }).unwrap();
        assert_eq!(mapped, Span { start: 5, end: 17 });
    }

    #[test]
    fn test_remap_straddling_span_is_consumed() {
        let mut log = OffsetLog::new();
        log.record(Span { start: 5, end: 15 }, 3);
        assert_eq!(log.remap(Span { start: 10, end: 20 }), None);
        assert_eq!(log.remap(Span { start: 0, end: 7 }), None);
        assert_eq!(log.remap(Span { start: 7, end: 9 }), None);
    }

    #[test]
    fn test_remap_unaffected_span() {
        let mut log = OffsetLog::new();
        log.record(Span { start: 50, end: 60 }, 1);
        let mapped = log.remap(Span { start: 10, end: 20 }).unwrap();
        assert_eq!(mapped, Span { start: 10, end: 20 });
    }
}
