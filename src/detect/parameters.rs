//! Parameter data clump detector.
//!
//! An eligible anchor method is compared against every method in the
//! program. Candidates pass a chain of gates lifted from how inspection
//! users expect clumps to behave: overloads of the anchor are skipped,
//! overriding methods and constructors are skipped, and hierarchy handling
//! depends on `check_parameters_hierarchy`. Each class is additionally
//! probed for an existing extraction of the same parameter group.

use super::{common_parameters, count_common_parameters, fields_matching_params};
use crate::config::DetectionConfig;
use crate::core::{Finding, Severity, SmellKind};
use crate::index::hierarchy::HierarchyResolver;
use crate::program::java::{ClassRecord, MethodRecord};
use crate::program::ProgramModel;
use std::collections::HashSet;

pub fn check_method_parameters(
    class: &ClassRecord,
    method: &MethodRecord,
    model: &dyn ProgramModel,
    hierarchy: &mut HierarchyResolver,
    config: &DetectionConfig,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    if !anchor_eligible(class, method, config) {
        return findings;
    }
    // Without the hierarchy analysis, an anchor that overrides anything is
    // dropped entirely.
    if !config.check_parameters_hierarchy && has_super_method(class, method, model) {
        return findings;
    }

    for other in model.classes() {
        let same_class = other.qualified_name == class.qualified_name;

        for candidate in &other.methods {
            if !candidate_matches(
                class, method, other, candidate, same_class, model, hierarchy, config,
            ) {
                continue;
            }

            let count = count_common_parameters(method, candidate);
            let shared = common_parameters(method, candidate);
            findings.push(Finding {
                kind: SmellKind::ParameterClump,
                severity: Severity::Medium,
                file: class.file.clone(),
                line: method.line,
                anchor_class: class.qualified_name.clone(),
                anchor_method: Some(method.name.clone()),
                count,
                elements: shared.iter().map(|p| p.name.clone()).collect(),
                message: format!(
                    "{} matching parameters in file: {} in class: {}, method: {}",
                    count,
                    other.file.display(),
                    other.qualified_name,
                    candidate.name
                ),
            });
        }

        if let Some(finding) = check_already_extracted(class, method, other, config) {
            findings.push(finding);
        }
    }

    findings
}

fn anchor_eligible(class: &ClassRecord, method: &MethodRecord, config: &DetectionConfig) -> bool {
    !method.is_constructor
        && method.name != class.simple_name
        && !method.has_override
        && method.params.len() >= config.min_parameters_count
}

#[allow(clippy::too_many_arguments)]
fn candidate_matches(
    class: &ClassRecord,
    method: &MethodRecord,
    other: &ClassRecord,
    candidate: &MethodRecord,
    same_class: bool,
    model: &dyn ProgramModel,
    hierarchy: &mut HierarchyResolver,
    config: &DetectionConfig,
) -> bool {
    if !config.check_parameters_hierarchy && has_super_method(other, candidate, model) {
        return false;
    }
    // Overloads of the anchor are never connections.
    if candidate.name == method.name && same_class {
        return false;
    }
    if candidate.has_override {
        return false;
    }
    if candidate.is_constructor || candidate.name == other.simple_name {
        return false;
    }
    if count_common_parameters(method, candidate) < config.min_parameters_count {
        return false;
    }
    (!config.check_parameters_hierarchy && !same_class)
        || (config.include_methods_in_same_class && same_class)
        || !hierarchy.common_hierarchy(class, other, model)
}

/// True when a resolvable supertype declares a method with the same name
/// and arity. Unresolvable supertypes contribute nothing.
fn has_super_method(class: &ClassRecord, method: &MethodRecord, model: &dyn ProgramModel) -> bool {
    let mut done: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = Vec::new();
    seed_supertypes(class, model, &mut done, &mut stack);

    while let Some(qualified) = stack.pop() {
        let Some(record) = model.class_named(&qualified) else {
            continue;
        };
        let declares = record
            .methods
            .iter()
            .any(|m| !m.is_constructor && m.name == method.name && m.arity() == method.arity());
        if declares {
            return true;
        }
        seed_supertypes(record, model, &mut done, &mut stack);
    }
    false
}

fn seed_supertypes(
    class: &ClassRecord,
    model: &dyn ProgramModel,
    done: &mut HashSet<String>,
    stack: &mut Vec<String>,
) {
    for supertype in &class.supertypes {
        let simple = crate::program::java::simple_type_name(supertype);
        for candidate in model.classes_by_simple_name(&simple) {
            if done.insert(candidate.qualified_name.clone()) {
                stack.push(candidate.qualified_name.clone());
            }
        }
    }
}

/// A class whose fields already mirror the anchor's parameters, and which
/// can be constructed, is reported as an existing extraction.
fn check_already_extracted(
    class: &ClassRecord,
    method: &MethodRecord,
    candidate: &ClassRecord,
    config: &DetectionConfig,
) -> Option<Finding> {
    let matching = fields_matching_params(candidate, method);
    if matching.len() < config.min_parameters_count {
        return None;
    }
    candidate.constructors().next()?;

    Some(Finding {
        kind: SmellKind::AlreadyExtracted,
        severity: Severity::Low,
        file: class.file.clone(),
        line: method.line,
        anchor_class: class.qualified_name.clone(),
        anchor_method: Some(method.name.clone()),
        count: matching.len(),
        elements: matching.iter().map(|f| f.name.clone()).collect(),
        message: format!(
            "{} matching fields in already extracted class: {} for method: {}",
            matching.len(),
            candidate.qualified_name,
            method.name
        ),
    })
}
