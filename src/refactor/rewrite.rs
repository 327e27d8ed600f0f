//! Reference and call rewriting against a live text buffer.
//!
//! All spans come from one parse snapshot of the file. Callers present
//! rewrites in descending source-position order; the offset log then
//! locates each snapshot span in the partially rewritten buffer, so the
//! text of an assignment right side already reflects rewrites applied
//! inside it.

use crate::program::java::{self, FileFacts, Span};
use crate::program::{CallSite, OffsetLog, Reference, ReferenceContext};

/// What happened to one planned rewrite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RewriteOutcome {
    Done,
    Skipped(String),
}

impl RewriteOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, RewriteOutcome::Done)
    }
}

/// One file's text under rewriting. Spans are addressed in the coordinates
/// of the parse the caller took them from; the offset log translates them
/// to the current buffer.
pub struct Rewriter {
    text: String,
    log: OffsetLog,
}

impl Rewriter {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            log: OffsetLog::new(),
        }
    }

    /// Replace a snapshot span with new text. False when an earlier rewrite
    /// consumed the span.
    pub fn replace(&mut self, span: Span, replacement: &str) -> bool {
        let Some(mapped) = self.log.remap(span) else {
            return false;
        };
        self.text
            .replace_range(mapped.start..mapped.end, replacement);
        self.log.record(span, replacement.len());
        true
    }

    /// Current text of a snapshot span, rewrites included.
    pub fn current(&self, span: Span) -> Option<String> {
        let mapped = self.log.remap(span)?;
        Some(self.text[mapped.start..mapped.end].to_string())
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Rewrite one classified reference of `name` into accessor calls on
/// `target`. The accessor suffix can differ from the referenced name when
/// an existing type with its own field spelling is being reused.
pub fn rewrite_reference(
    rewriter: &mut Rewriter,
    reference: &Reference,
    name: &str,
    target: &str,
    accessor: &str,
) -> RewriteOutcome {
    if reference.shadowed {
        return RewriteOutcome::Skipped(format!(
            "line {}: '{name}' is redeclared by a nested scope; left unchanged",
            reference.line
        ));
    }
    let getter = format!("{target}.get{accessor}()");

    match &reference.context {
        ReferenceContext::CallQualifier | ReferenceContext::Read | ReferenceContext::Other => {
            if rewriter.replace(reference.element_span, &getter) {
                RewriteOutcome::Done
            } else {
                consumed(reference, name)
            }
        }
        ReferenceContext::Assigned {
            assignment_span,
            rhs_span,
            operator,
        } => {
            if operator != "=" {
                return RewriteOutcome::Skipped(format!(
                    "line {}: write through '{operator}' to '{name}' has no setter form; left unchanged",
                    reference.line
                ));
            }
            let Some(rhs) = rewriter.current(*rhs_span) else {
                return consumed(reference, name);
            };
            let setter = format!("{target}.set{accessor}({rhs})");
            if rewriter.replace(*assignment_span, &setter) {
                RewriteOutcome::Done
            } else {
                consumed(reference, name)
            }
        }
    }
}

fn consumed(reference: &Reference, name: &str) -> RewriteOutcome {
    RewriteOutcome::Skipped(format!(
        "line {}: an earlier rewrite overlapped the reference to '{name}'; left unchanged",
        reference.line
    ))
}

/// Rewrite one call of an affected method: the clump arguments fold into a
/// construction placed before the surviving arguments, or standing alone
/// when none survive.
pub fn rewrite_call(
    rewriter: &mut Rewriter,
    call: &CallSite,
    param_to_element: &[Option<usize>],
    element_count: usize,
    class_name: &str,
) -> RewriteOutcome {
    if call.args.len() != param_to_element.len() {
        return RewriteOutcome::Skipped(format!(
            "line {}: call arity {} no longer matches the declaration; left unchanged",
            call.line,
            call.args.len()
        ));
    }
    let mut folded: Vec<Option<String>> = vec![None; element_count];
    let mut kept: Vec<String> = Vec::new();
    for (index, arg_span) in call.args.iter().enumerate() {
        let Some(text) = rewriter.current(*arg_span) else {
            return RewriteOutcome::Skipped(format!(
                "line {}: an earlier rewrite overlapped a call argument; left unchanged",
                call.line
            ));
        };
        match param_to_element[index] {
            Some(slot) => folded[slot] = Some(text),
            None => kept.push(text),
        }
    }
    let values: Option<Vec<String>> = folded.into_iter().collect();
    let Some(values) = values else {
        return RewriteOutcome::Skipped(format!(
            "line {}: not every clump element has an argument at this call; left unchanged",
            call.line
        ));
    };
    let mut rendered = vec![format!("new {class_name}({})", values.join(", "))];
    rendered.extend(kept);
    let replacement = format!("({})", rendered.join(", "));
    if rewriter.replace(call.arg_list_span, &replacement) {
        RewriteOutcome::Done
    } else {
        RewriteOutcome::Skipped(format!(
            "line {}: an earlier rewrite overlapped the call; left unchanged",
            call.line
        ))
    }
}

/// Add `import <qualified>;` after the file header when the type lives in
/// another package and no existing import already covers it. Runs last so
/// the insertion point is still clean.
pub fn ensure_import(
    rewriter: &mut Rewriter,
    facts: &FileFacts,
    package: Option<&str>,
    qualified: &str,
) -> bool {
    if package == facts.package.as_deref() {
        return false;
    }
    let Some((type_package, _)) = qualified.rsplit_once('.') else {
        return false;
    };
    let wildcard = format!("{type_package}.*");
    if facts
        .imports
        .iter()
        .any(|import| import == qualified || *import == wildcard)
    {
        return false;
    }
    let insertion = if facts.header_end == 0 {
        format!("import {qualified};\n\n")
    } else {
        format!("\nimport {qualified};")
    };
    rewriter.replace(
        Span {
            start: facts.header_end,
            end: facts.header_end,
        },
        &insertion,
    )
}
