//! Smell detectors and the analysis driver.
//!
//! Matching is structural text comparison: counting matches is
//! case-insensitive, while the element lists attached to findings keep the
//! case-sensitive matches only.

pub mod fields;
pub mod global_data;
pub mod parameters;

use crate::core::errors::Result;
use crate::core::{AnalysisReport, SmellTimer};
use crate::program::java::{ClassRecord, FieldRecord, MethodRecord, ParamRecord};
use crate::session::Session;

/// Run every detector over the session's workspace and collect findings in
/// deterministic file/class order.
pub fn analyze(session: &mut Session) -> Result<AnalysisReport> {
    session.ensure_indexed()?;

    let cancel = session.cancel_token();
    let config = session.config().detection.clone();
    let root = session.workspace().root().to_path_buf();
    let files_scanned = session.workspace().len();
    let paths = session.workspace().paths();

    let (hierarchy, index) = session.hierarchy_and_model();
    let mut report = AnalysisReport::new(root, files_scanned, index.class_count());

    let mut timer = SmellTimer::new("detection");
    timer.start();

    for path in &paths {
        cancel.check()?;
        for class in index.classes_in_file(path) {
            timer.set_class_name(class.qualified_name.as_str());
            report
                .findings
                .extend(fields::check_class_fields(class, index, hierarchy, &config));
            for method in &class.methods {
                report.findings.extend(parameters::check_method_parameters(
                    class, method, index, hierarchy, &config,
                ));
            }
            report
                .findings
                .extend(global_data::check_class_global_data(class));
        }
    }

    timer.stop();
    timer.report();
    log::info!(
        "Found {} smell instances in {} files",
        report.findings.len(),
        report.files_scanned
    );
    Ok(report)
}

fn eq_ci(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Fields matching between two classes, by modifier text, type text and
/// name, all compared case-insensitively.
pub fn count_common_fields(a: &ClassRecord, b: &ClassRecord) -> usize {
    a.fields
        .iter()
        .filter(|f1| {
            b.fields.iter().any(|f2| {
                eq_ci(&f1.modifier_text, &f2.modifier_text)
                    && eq_ci(&f1.type_text, &f2.type_text)
                    && eq_ci(&f1.name, &f2.name)
            })
        })
        .count()
}

/// The matched fields themselves, taken from `a`. Collection is stricter
/// than counting: modifier, type and name must match exactly.
pub fn common_fields<'a>(a: &'a ClassRecord, b: &ClassRecord) -> Vec<&'a FieldRecord> {
    a.fields
        .iter()
        .filter(|f1| {
            b.fields.iter().any(|f2| {
                f1.modifier_text == f2.modifier_text
                    && f1.type_text == f2.type_text
                    && f1.name == f2.name
            })
        })
        .collect()
}

/// Parameters matching between two methods by full declaration text,
/// case-insensitively.
pub fn count_common_parameters(a: &MethodRecord, b: &MethodRecord) -> usize {
    a.params
        .iter()
        .filter(|p1| b.params.iter().any(|p2| eq_ci(&p1.text, &p2.text)))
        .count()
}

/// The matched parameters, taken from `a`.
pub fn common_parameters<'a>(a: &'a MethodRecord, b: &MethodRecord) -> Vec<&'a ParamRecord> {
    a.params
        .iter()
        .filter(|p1| b.params.iter().any(|p2| eq_ci(&p1.text, &p2.text)))
        .collect()
}

/// Fields of `class` that match a parameter of `method` by type and name.
pub fn fields_matching_params<'a>(
    class: &'a ClassRecord,
    method: &MethodRecord,
) -> Vec<&'a FieldRecord> {
    class
        .fields
        .iter()
        .filter(|field| {
            method
                .params
                .iter()
                .any(|p| eq_ci(&field.type_text, &p.type_text) && eq_ci(&field.name, &p.name))
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::CancelToken;
    use crate::index::SymbolIndex;
    use crate::program::Workspace;
    use std::path::PathBuf;

    pub fn index_of(sources: &[(&str, &str)]) -> SymbolIndex {
        let mut ws = Workspace::new("/project");
        for (path, text) in sources {
            ws.insert(PathBuf::from(path), text.to_string()).unwrap();
        }
        let mut index = SymbolIndex::new();
        index.build(&ws, &CancelToken::new()).unwrap();
        index
    }
}
