//! Field data clump detector.
//!
//! A class is compared against every other indexed class; when at least
//! `min_fields_count` of its fields recur in the other class, the shared
//! fields form a clump. With the hierarchy check enabled, classes that
//! share a superclass or interface are not reported against each other.

use super::{common_fields, count_common_fields};
use crate::config::DetectionConfig;
use crate::core::{Finding, Severity, SmellKind};
use crate::index::hierarchy::HierarchyResolver;
use crate::program::java::ClassRecord;
use crate::program::ProgramModel;

pub fn check_class_fields(
    class: &ClassRecord,
    model: &dyn ProgramModel,
    hierarchy: &mut HierarchyResolver,
    config: &DetectionConfig,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for other in model.classes() {
        if other.qualified_name == class.qualified_name {
            continue;
        }
        let count = count_common_fields(class, other);
        if count < config.min_fields_count {
            continue;
        }
        if config.check_fields_hierarchy && hierarchy.common_hierarchy(class, other, model) {
            continue;
        }

        let shared = common_fields(class, other);
        let names: Vec<&str> = shared.iter().map(|f| f.name.as_str()).collect();
        let line = shared.first().map(|f| f.line).unwrap_or(class.line);

        findings.push(Finding {
            kind: SmellKind::FieldClump,
            severity: Severity::Medium,
            file: class.file.clone(),
            line,
            anchor_class: class.qualified_name.clone(),
            anchor_method: None,
            count,
            elements: names.iter().map(|n| n.to_string()).collect(),
            message: format!(
                "{} matching fields in file: {} in class: {}, fields: {}",
                count,
                other.file.display(),
                other.simple_name,
                names.join(", ")
            ),
        });
    }

    findings
}
