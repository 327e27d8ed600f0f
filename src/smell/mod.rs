//! Smell groups: the element list plus the declarations that share it.
//!
//! Detection emits findings; before a refactoring runs, the group behind a
//! finding is rebuilt from the finding's message against the current index.
//! Rebuilding is deliberately conservative: a connection is only kept when
//! the message still matches the code, and a group with fewer than two
//! connections is rejected.

use crate::core::{Finding, SmellKind, Symbol};
use crate::program::java::{ClassRecord, MethodRecord};
use crate::program::ProgramModel;
use std::collections::HashSet;
use std::path::PathBuf;

/// A declaration site participating in a smell group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Connection {
    /// A method whose parameter list contains the clump.
    Method {
        class: String,
        method: String,
        file: PathBuf,
        param_texts: Vec<String>,
        line: usize,
    },
    /// A constructor of a class that already holds the extracted state.
    /// Kept for reporting; never rewritten.
    Constructor {
        class: String,
        file: PathBuf,
        param_texts: Vec<String>,
        line: usize,
    },
    /// A class whose fields contain the clump.
    Class {
        class: String,
        file: PathBuf,
        line: usize,
    },
}

impl Connection {
    pub fn class_name(&self) -> &str {
        match self {
            Connection::Method { class, .. }
            | Connection::Constructor { class, .. }
            | Connection::Class { class, .. } => class,
        }
    }

    pub fn file(&self) -> &PathBuf {
        match self {
            Connection::Method { file, .. }
            | Connection::Constructor { file, .. }
            | Connection::Class { file, .. } => file,
        }
    }

    pub fn is_rewritable(&self) -> bool {
        !matches!(self, Connection::Constructor { .. })
    }
}

#[derive(Clone, Debug)]
pub struct SmellGroup {
    pub kind: SmellKind,
    pub elements: Vec<Symbol>,
    pub connections: Vec<Connection>,
}

impl SmellGroup {
    pub fn new(kind: SmellKind) -> Self {
        Self {
            kind,
            elements: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn has_element(&self, symbol: &Symbol) -> bool {
        self.elements.iter().any(|e| e.same_text(symbol))
    }

    pub fn add_element(&mut self, symbol: Symbol) {
        if !self.has_element(&symbol) {
            self.elements.push(symbol);
        }
    }

    pub fn add_connection(&mut self, connection: Connection) {
        if !self.connections.contains(&connection) {
            self.connections.push(connection);
        }
    }

    /// The connection the refactoring is anchored on.
    pub fn anchor(&self) -> Option<&Connection> {
        self.connections.first()
    }

    pub fn element_names(&self) -> Vec<&str> {
        self.elements.iter().map(|e| e.name()).collect()
    }

    /// A group needs at least two connections and two elements to be worth
    /// extracting.
    pub fn is_viable(&self) -> bool {
        self.connections.len() >= 2 && self.elements.len() >= 2
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Rebuild a parameter clump group from a finding.
///
/// The anchor method is the finding's own declaration; further connections
/// are the methods of classes named in the message. The element list is the
/// intersection of parameter texts across every confirmed connection.
pub fn rebuild_parameter_group(finding: &Finding, model: &dyn ProgramModel) -> Option<SmellGroup> {
    let anchor_class = model.class_named(&finding.anchor_class)?;
    let anchor_method_name = finding.anchor_method.as_deref()?;
    let anchor_method = anchor_class
        .methods
        .iter()
        .find(|m| m.name == anchor_method_name && !m.is_constructor)?;

    let mut group = SmellGroup::new(SmellKind::ParameterClump);
    group.add_connection(method_connection(anchor_class, anchor_method));

    for class in model.classes() {
        if !class_mentioned(finding, class) {
            continue;
        }
        for method in &class.methods {
            if method.is_constructor || !finding.mentions(&method.name) {
                continue;
            }
            if class.qualified_name == anchor_class.qualified_name
                && method.name == anchor_method.name
            {
                continue;
            }
            group.add_connection(method_connection(class, method));
        }
    }

    // Elements: anchor parameters present in every confirmed connection.
    for param in &anchor_method.params {
        let everywhere = group.connections.iter().all(|connection| match connection {
            Connection::Method { param_texts, .. } | Connection::Constructor { param_texts, .. } => {
                param_texts.iter().any(|t| eq_ignore_case(t, &param.text))
            }
            Connection::Class { .. } => false,
        });
        if everywhere {
            group.add_element(Symbol::Parameter {
                name: param.name.clone(),
                type_text: param.type_text.clone(),
                owner_class: anchor_class.qualified_name.clone(),
                owner_method: anchor_method.name.clone(),
                file: anchor_class.file.clone(),
                line: anchor_method.line,
            });
        }
    }

    group.is_viable().then_some(group)
}

/// Rebuild a field clump group from a finding.
///
/// The anchor is the last class in the finding's file declared at or before
/// the finding line. Elements are the anchor fields named in the message; a
/// candidate class is confirmed only when every element name is found among
/// its fields, inherited ones included.
pub fn rebuild_field_group(finding: &Finding, model: &dyn ProgramModel) -> Option<SmellGroup> {
    let anchor_class = model
        .classes()
        .into_iter()
        .filter(|c| c.file == finding.file && c.line <= finding.line)
        .max_by_key(|c| c.line)?;

    let mut group = SmellGroup::new(SmellKind::FieldClump);
    group.add_connection(Connection::Class {
        class: anchor_class.qualified_name.clone(),
        file: anchor_class.file.clone(),
        line: anchor_class.line,
    });

    for field in &anchor_class.fields {
        if finding.mentions(&field.name) {
            group.add_element(Symbol::Field {
                name: field.name.clone(),
                type_text: field.type_text.clone(),
                modifier_text: field.modifier_text.clone(),
                owner_class: anchor_class.qualified_name.clone(),
                file: anchor_class.file.clone(),
                line: field.line,
            });
        }
    }
    if group.elements.is_empty() {
        return None;
    }

    let element_names: Vec<String> = group
        .elements
        .iter()
        .map(|e| e.name().to_string())
        .collect();

    for class in model.classes() {
        if class.qualified_name == anchor_class.qualified_name {
            continue;
        }
        if !class_mentioned(finding, class) {
            continue;
        }
        let available = inherited_field_names(class, model);
        let confirmed = element_names.iter().all(|name| available.contains(name));
        if confirmed {
            group.add_connection(Connection::Class {
                class: class.qualified_name.clone(),
                file: class.file.clone(),
                line: class.line,
            });
        }
    }

    group.is_viable().then_some(group)
}

/// Rebuild a group for a clump that matches a type already extracted
/// elsewhere in the program.
///
/// The anchor method still carries the parameters; the extracted type
/// joins through its first constructor as a non-rewritable connection, so
/// the group stays viable without its signature being touched. Elements
/// are the anchor parameters the extracted type holds as fields.
pub fn rebuild_already_extracted_group(
    finding: &Finding,
    model: &dyn ProgramModel,
) -> Option<SmellGroup> {
    let anchor_class = model.class_named(&finding.anchor_class)?;
    let anchor_method_name = finding.anchor_method.as_deref()?;
    let anchor_method = anchor_class
        .methods
        .iter()
        .find(|m| m.name == anchor_method_name && !m.is_constructor)?;

    let candidate = model.classes().into_iter().find(|class| {
        class.qualified_name != anchor_class.qualified_name
            && class_mentioned(finding, class)
            && class.constructors().next().is_some()
    })?;
    let constructor = candidate.constructors().next()?;

    let mut group = SmellGroup::new(SmellKind::AlreadyExtracted);
    group.add_connection(method_connection(anchor_class, anchor_method));
    group.add_connection(Connection::Constructor {
        class: candidate.qualified_name.clone(),
        file: candidate.file.clone(),
        param_texts: constructor.params.iter().map(|p| p.text.clone()).collect(),
        line: constructor.line,
    });

    for param in &anchor_method.params {
        let held = candidate.fields.iter().any(|field| {
            field.name.eq_ignore_ascii_case(&param.name) && field.type_text == param.type_text
        });
        if held {
            group.add_element(Symbol::Parameter {
                name: param.name.clone(),
                type_text: param.type_text.clone(),
                owner_class: anchor_class.qualified_name.clone(),
                owner_method: anchor_method.name.clone(),
                file: anchor_class.file.clone(),
                line: anchor_method.line,
            });
        }
    }

    group.is_viable().then_some(group)
}

fn method_connection(class: &ClassRecord, method: &MethodRecord) -> Connection {
    Connection::Method {
        class: class.qualified_name.clone(),
        method: method.name.clone(),
        file: class.file.clone(),
        param_texts: method.params.iter().map(|p| p.text.clone()).collect(),
        line: method.line,
    }
}

fn class_mentioned(finding: &Finding, class: &ClassRecord) -> bool {
    finding.mentions(&class.qualified_name) || finding.mentions(&class.simple_name)
}

/// Field names declared on the class or anywhere above it in the resolvable
/// hierarchy.
fn inherited_field_names(class: &ClassRecord, model: &dyn ProgramModel) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut done: HashSet<String> = HashSet::new();
    let mut stack = vec![class.qualified_name.clone()];
    done.insert(class.qualified_name.clone());

    while let Some(qualified) = stack.pop() {
        let Some(record) = model.class_named(&qualified) else {
            continue;
        };
        for field in &record.fields {
            names.insert(field.name.clone());
        }
        for supertype in &record.supertypes {
            let simple = crate::program::java::simple_type_name(supertype);
            for candidate in model.classes_by_simple_name(&simple) {
                if done.insert(candidate.qualified_name.clone()) {
                    stack.push(candidate.qualified_name.clone());
                }
            }
        }
    }
    names
}
