//! Program model: parsed source files, reference search, and edits.
//!
//! The `Workspace` owns every loaded Java file together with its parse tree
//! and a revision counter that advances on each change. Detectors never see
//! the workspace directly; they query a [`ProgramModel`], implemented by the
//! symbol index built on top of it.

pub mod edit;
pub mod java;

use crate::core::errors::{Error, Result};
use edit::EditTransaction;
use java::{ClassRecord, Span};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tree_sitter::Tree;

pub use edit::{OffsetLog, SourceEdit};

/// Read-only query surface the detectors and the hierarchy resolver work
/// against.
pub trait ProgramModel {
    fn classes(&self) -> Vec<&ClassRecord>;
    fn class_named(&self, qualified_name: &str) -> Option<&ClassRecord>;
    fn classes_by_simple_name(&self, simple_name: &str) -> Vec<&ClassRecord>;
}

#[derive(Clone, Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    pub tree: Tree,
    pub revision: u64,
}

/// All loaded sources, keyed by path. Iteration order is the path order, so
/// analysis output is deterministic.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    root: PathBuf,
    files: BTreeMap<PathBuf, SourceFile>,
    dirty: BTreeSet<PathBuf>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: BTreeMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    /// Load every `.java` file under the root directory.
    pub fn load(root: &Path) -> Result<Self> {
        let mut workspace = Self::new(root);
        for path in crate::io::walker::find_java_files(root)? {
            workspace.open(&path)?;
        }
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn open(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::file_system(format!("Failed to read {}", path.display()), path, e)
        })?;
        self.insert(path.to_path_buf(), text)
    }

    /// Register an in-memory source, parsing it immediately.
    pub fn insert(&mut self, path: PathBuf, text: String) -> Result<()> {
        let tree = java::parse(&text, &path)?;
        let revision = self.files.get(&path).map(|f| f.revision + 1).unwrap_or(0);
        self.files.insert(
            path.clone(),
            SourceFile {
                path,
                text,
                tree,
                revision,
            },
        );
        Ok(())
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn text(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(|f| f.text.as_str())
    }

    pub fn revision(&self, path: &Path) -> Option<u64> {
        self.files.get(path).map(|f| f.revision)
    }

    /// True when the file's current parse tree holds error nodes. Used by
    /// the refactoring engine to validate rewritten text before committing.
    pub fn has_parse_errors(&self, path: &Path) -> bool {
        self.files
            .get(path)
            .map(|f| f.tree.root_node().has_error())
            .unwrap_or(false)
    }

    pub fn dirty_paths(&self) -> Vec<PathBuf> {
        self.dirty.iter().cloned().collect()
    }

    /// Apply a transaction. The transaction must have been built against the
    /// file's current revision; a mismatch means some earlier change was not
    /// accounted for and the edit spans cannot be trusted.
    pub fn apply(&mut self, tx: &EditTransaction) -> Result<()> {
        let file = self.files.get(tx.file()).ok_or_else(|| {
            Error::edit(tx.file(), "File is not loaded in the workspace")
        })?;
        if file.revision != tx.base_revision() {
            return Err(Error::edit(
                tx.file(),
                format!(
                    "Stale transaction: built at revision {}, file is at {}",
                    tx.base_revision(),
                    file.revision
                ),
            ));
        }
        let new_text = tx.apply(&file.text)?;
        self.set_text(tx.file(), new_text)
    }

    /// Replace a file's content wholesale, reparsing and bumping the
    /// revision.
    pub fn set_text(&mut self, path: &Path, text: String) -> Result<()> {
        let tree = java::parse(&text, path)?;
        let file = self
            .files
            .get_mut(path)
            .ok_or_else(|| Error::edit(path, "File is not loaded in the workspace"))?;
        file.text = text;
        file.tree = tree;
        file.revision += 1;
        self.dirty.insert(path.to_path_buf());
        Ok(())
    }

    /// Add a brand-new file. Fails if the path is already loaded or exists
    /// on disk.
    pub fn create_file(&mut self, path: &Path, text: String) -> Result<()> {
        if self.files.contains_key(path) || path.exists() {
            return Err(Error::edit(path, "File already exists"));
        }
        self.insert(path.to_path_buf(), text)?;
        self.dirty.insert(path.to_path_buf());
        Ok(())
    }

    pub fn remove_file(&mut self, path: &Path) -> Option<SourceFile> {
        self.dirty.remove(path);
        self.files.remove(path)
    }

    /// True when a `.java` file for `class_name` already exists in `dir`,
    /// either on disk or in memory.
    pub fn java_file_exists(&self, dir: &Path, class_name: &str) -> bool {
        let candidate = dir.join(format!("{class_name}.java"));
        self.files.contains_key(&candidate) || candidate.exists()
    }

    /// Write every changed file back to disk, creating parent directories
    /// for generated files.
    pub fn write_back(&self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for path in &self.dirty {
            let Some(file) = self.files.get(path) else {
                continue;
            };
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::file_system(format!("Failed to create {}", parent.display()), parent, e)
                })?;
            }
            std::fs::write(path, &file.text).map_err(|e| {
                Error::file_system(format!("Failed to write {}", path.display()), path, e)
            })?;
            written.push(path.clone());
        }
        Ok(written)
    }

    /// Find name references inside `container` (falling back to the whole
    /// file), classified by the syntax around them.
    pub fn find_references(
        &self,
        path: &Path,
        container: Option<Span>,
        name: &str,
    ) -> Vec<Reference> {
        let Some(file) = self.files.get(path) else {
            return Vec::new();
        };
        let root = file.tree.root_node();
        let container_node = match container {
            Some(span) => root
                .named_descendant_for_byte_range(span.start, span.end)
                .unwrap_or(root),
            None => root,
        };
        let mut references = Vec::new();
        collect_references(&container_node, &container_node, &file.text, name, &mut references);
        references.sort_by_key(|r| r.ident_span.start);
        references
    }

    /// Find every call of `name` with exactly `arity` arguments across the
    /// workspace.
    pub fn find_method_calls(&self, name: &str, arity: usize) -> Vec<CallSite> {
        let mut calls = Vec::new();
        for file in self.files.values() {
            collect_calls(&file.tree.root_node(), file, name, arity, &mut calls);
        }
        calls
    }
}

/// How a reference is used at its site. Decides whether the rewrite becomes
/// a getter or a setter call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReferenceContext {
    /// Object of a call or member access; the element itself is replaced.
    CallQualifier,
    /// Written to: an assignment left side, or an update expression. Only
    /// plain `=` has a setter form; other operators are refused.
    Assigned {
        assignment_span: Span,
        rhs_span: Span,
        operator: String,
    },
    /// Value read inside an assignment right side or a binary expression.
    Read,
    /// Any other read position; replaced like a read.
    Other,
}

#[derive(Clone, Debug)]
pub struct Reference {
    /// The identifier itself.
    pub ident_span: Span,
    /// Widest covering reference element (`obj.x` when the identifier is
    /// the accessed member, otherwise the identifier).
    pub element_span: Span,
    pub context: ReferenceContext,
    pub line: usize,
    /// A nested declaration between the reference and the search container
    /// redeclares this name; the reference belongs to that declaration.
    pub shadowed: bool,
}

#[derive(Clone, Debug)]
pub struct CallSite {
    pub file: PathBuf,
    pub span: Span,
    pub arg_list_span: Span,
    pub args: Vec<Span>,
    pub line: usize,
    pub revision: u64,
}

type Node<'a> = tree_sitter::Node<'a>;

fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn collect_references(
    node: &Node,
    container: &Node,
    source: &str,
    name: &str,
    out: &mut Vec<Reference>,
) {
    if node.kind() == "identifier" && node_text(node, source) == name {
        if let Some(reference) = classify_reference(node, container, source) {
            out.push(reference);
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_references(&child, container, source, name, out);
    }
}

fn classify_reference(ident: &Node, container: &Node, source: &str) -> Option<Reference> {
    let parent = ident.parent()?;

    // Names inside import and package declarations are not value references.
    let mut ancestor = Some(parent);
    while let Some(node) = ancestor {
        if matches!(node.kind(), "import_declaration" | "package_declaration") {
            return None;
        }
        ancestor = node.parent();
    }

    // Declaration sites and call names are not value references.
    match parent.kind() {
        "formal_parameter" | "spread_parameter" | "catch_formal_parameter"
        | "inferred_parameters" => return None,
        "variable_declarator" | "enhanced_for_statement" => {
            if parent.child_by_field_name("name").map(|n| n.id()) == Some(ident.id()) {
                return None;
            }
        }
        "method_declaration" | "constructor_declaration" | "class_declaration"
        | "interface_declaration" | "enum_declaration" | "record_declaration" => {
            if parent.child_by_field_name("name").map(|n| n.id()) == Some(ident.id()) {
                return None;
            }
        }
        "method_invocation" => {
            if parent.child_by_field_name("name").map(|n| n.id()) == Some(ident.id()) {
                return None;
            }
        }
        "lambda_expression" => {
            if parent.child_by_field_name("parameters").map(|n| n.id()) == Some(ident.id()) {
                return None;
            }
        }
        "labeled_statement" | "break_statement" | "continue_statement" => return None,
        _ => {}
    }

    // Widen to the enclosing member access when the identifier is the
    // accessed field, so `obj.x` is replaced as a whole.
    let mut element = *ident;
    if parent.kind() == "field_access"
        && parent.child_by_field_name("field").map(|n| n.id()) == Some(ident.id())
    {
        element = parent;
    }

    let context = element_context(&element, source);

    Some(Reference {
        ident_span: Span::of(ident),
        element_span: Span::of(&element),
        context,
        line: ident.start_position().row + 1,
        shadowed: is_shadowed(ident, container, source),
    })
}

fn element_context(element: &Node, source: &str) -> ReferenceContext {
    let Some(parent) = element.parent() else {
        return ReferenceContext::Other;
    };

    match parent.kind() {
        "method_invocation" | "field_access" => {
            if parent.child_by_field_name("object").map(|n| n.id()) == Some(element.id()) {
                return ReferenceContext::CallQualifier;
            }
        }
        "assignment_expression" => {
            let left = parent.child_by_field_name("left");
            let right = parent.child_by_field_name("right");
            if left.map(|n| n.id()) == Some(element.id()) {
                let operator = parent
                    .children(&mut parent.walk())
                    .find(|c| !c.is_named() && node_text(c, source).contains('='))
                    .map(|c| node_text(&c, source).to_string())
                    .unwrap_or_else(|| "=".to_string());
                if let Some(rhs) = right {
                    return ReferenceContext::Assigned {
                        assignment_span: Span::of(&parent),
                        rhs_span: Span::of(&rhs),
                        operator,
                    };
                }
            }
            if right.map(|n| n.id()) == Some(element.id()) {
                return ReferenceContext::Read;
            }
        }
        "binary_expression" => return ReferenceContext::Read,
        // `x++` and `--x` are writes with no setter form; the operator is
        // surfaced so the engine can refuse them.
        "update_expression" => {
            let operator = parent
                .children(&mut parent.walk())
                .find(|c| !c.is_named())
                .map(|c| node_text(&c, source).to_string())
                .unwrap_or_else(|| "++".to_string());
            return ReferenceContext::Assigned {
                assignment_span: Span::of(&parent),
                rhs_span: Span::of(element),
                operator,
            };
        }
        _ => {}
    }

    ReferenceContext::Other
}

/// Walk from the identifier up to the search container looking for nested
/// scopes (methods, lambdas, inner class bodies) that declare the same
/// name. A syntactic search cannot resolve those references, so the caller
/// skips them.
fn is_shadowed(ident: &Node, container: &Node, source: &str) -> bool {
    let name = node_text(ident, source);
    let mut current = ident.parent();
    while let Some(node) = current {
        if node.id() == container.id() {
            return false;
        }
        match node.kind() {
            "method_declaration" | "constructor_declaration" | "lambda_expression" => {
                if scope_declares(&node, name, source) {
                    return true;
                }
            }
            "class_body" => {
                if node.parent().map(|p| p.id()) != Some(container.id())
                    && class_body_declares(&node, name, source)
                {
                    return true;
                }
            }
            _ => {}
        }
        current = node.parent();
    }
    false
}

fn scope_declares(scope: &Node, name: &str, source: &str) -> bool {
    if scope.kind() == "lambda_expression" {
        if let Some(params) = scope.child_by_field_name("parameters") {
            if params.kind() == "identifier" && node_text(&params, source) == name {
                return true;
            }
            let mut cursor = params.walk();
            for child in params.children(&mut cursor) {
                if child.kind() == "identifier" && node_text(&child, source) == name {
                    return true;
                }
            }
        }
    }
    let mut stack = vec![*scope];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "formal_parameter" | "spread_parameter" | "catch_formal_parameter" => {
                if node
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, source) == name)
                    .unwrap_or(false)
                {
                    return true;
                }
            }
            "local_variable_declaration" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "variable_declarator"
                        && child
                            .child_by_field_name("name")
                            .map(|n| node_text(&n, source) == name)
                            .unwrap_or(false)
                    {
                        return true;
                    }
                }
            }
            "enhanced_for_statement" => {
                if node
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, source) == name)
                    .unwrap_or(false)
                {
                    return true;
                }
            }
            // Nested type bodies have their own scope check.
            "class_body" => continue,
            _ => {}
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    false
}

fn class_body_declares(body: &Node, name: &str, source: &str) -> bool {
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        if member.kind() != "field_declaration" {
            continue;
        }
        let mut inner = member.walk();
        for child in member.children(&mut inner) {
            if child.kind() == "variable_declarator"
                && child
                    .child_by_field_name("name")
                    .map(|n| node_text(&n, source) == name)
                    .unwrap_or(false)
            {
                return true;
            }
        }
    }
    false
}

fn collect_calls(node: &Node, file: &SourceFile, name: &str, arity: usize, out: &mut Vec<CallSite>) {
    if node.kind() == "method_invocation" {
        let called = node
            .child_by_field_name("name")
            .map(|n| node_text(&n, &file.text).to_string());
        if called.as_deref() == Some(name) {
            if let Some(arg_list) = node.child_by_field_name("arguments") {
                let mut args = Vec::new();
                let mut cursor = arg_list.walk();
                for arg in arg_list.children(&mut cursor) {
                    if arg.is_named() {
                        args.push(Span::of(&arg));
                    }
                }
                if args.len() == arity {
                    out.push(CallSite {
                        file: file.path.clone(),
                        span: Span::of(node),
                        arg_list_span: Span::of(&arg_list),
                        args,
                        line: node.start_position().row + 1,
                        revision: file.revision,
                    });
                }
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(&child, file, name, arity, out);
    }
}
