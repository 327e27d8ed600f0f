//! Java source parsing and structural extraction built on tree-sitter.
//!
//! Produces plain-data records (classes, fields, methods, parameters) with
//! byte spans back into the source. Records are snapshots: they carry the
//! file revision they were extracted at and must be revalidated through the
//! workspace before use.

use crate::core::errors::{Error, Result};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// Byte range into a file's source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn of(node: &Node) -> Self {
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
}

/// A class observed while indexing, with everything the detectors compare.
#[derive(Clone, Debug)]
pub struct ClassRecord {
    pub qualified_name: String,
    pub simple_name: String,
    pub kind: TypeKind,
    pub file: PathBuf,
    pub line: usize,
    pub span: Span,
    pub body_span: Span,
    /// Direct supertype and interface names exactly as written.
    pub supertypes: Vec<String>,
    pub fields: Vec<FieldRecord>,
    pub methods: Vec<MethodRecord>,
    /// Workspace revision of the file when this record was extracted.
    pub revision: u64,
}

impl ClassRecord {
    pub fn field_named(&self, name: &str) -> Option<&FieldRecord> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodRecord> {
        self.methods.iter().filter(|m| m.is_constructor)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct FieldRecord {
    pub name: String,
    pub type_text: String,
    /// Full modifier list text, e.g. `public static`; empty when none.
    pub modifier_text: String,
    pub is_public: bool,
    pub is_private: bool,
    pub is_static: bool,
    pub is_final: bool,
    pub initializer: Option<String>,
    /// Span of the whole `field_declaration`, shared between declarators.
    pub declaration_span: Span,
    pub modifiers_span: Option<Span>,
    pub name_span: Span,
    pub line: usize,
}

impl FieldRecord {
    /// Structural identity text used for group elements.
    pub fn text(&self) -> String {
        format!("{} {}", self.type_text, self.name)
    }
}

#[derive(Clone, Debug)]
pub struct MethodRecord {
    pub name: String,
    pub is_constructor: bool,
    pub has_override: bool,
    pub params: Vec<ParamRecord>,
    /// Span of `formal_parameters` including the parentheses.
    pub param_list_span: Span,
    pub body_span: Option<Span>,
    pub span: Span,
    pub line: usize,
}

impl MethodRecord {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Clone, Debug)]
pub struct ParamRecord {
    pub name: String,
    pub type_text: String,
    /// Full declaration text including any modifiers, as written.
    pub text: String,
    pub span: Span,
    pub index: usize,
}

impl ParamRecord {
    /// Normalized `<type> <name>` form.
    pub fn type_name_text(&self) -> String {
        format!("{} {}", self.type_text, self.name)
    }
}

/// Package and import facts for one file.
#[derive(Clone, Debug, Default)]
pub struct FileFacts {
    pub package: Option<String>,
    pub imports: Vec<String>,
    /// Byte offset right after the last header element (package or import),
    /// where a new import line can be inserted.
    pub header_end: usize,
}

pub fn parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| Error::Analysis(format!("Failed to set Java language: {e}")))?;
    Ok(parser)
}

pub fn parse(content: &str, file: &Path) -> Result<Tree> {
    let mut parser = parser()?;
    parser
        .parse(content, None)
        .ok_or_else(|| Error::parse(file, 0, 0, "Failed to parse Java source"))
}

/// True when `text` parses as a standalone Java expression. Used by the
/// rewrite fallback to validate substituted reference text.
pub fn is_valid_expression(text: &str) -> bool {
    let wrapped = format!("class __Probe {{ Object __v = {text}; }}");
    match parse(&wrapped, Path::new("__probe.java")) {
        Ok(tree) => !tree.root_node().has_error(),
        Err(_) => false,
    }
}

const TYPE_DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];

fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn line_of(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Extract every named class/interface/enum/record in the file, nested
/// members included. Anonymous and method-local classes carry no qualified
/// name and are not indexed.
pub fn extract_classes(file: &Path, source: &str, tree: &Tree, revision: u64) -> Vec<ClassRecord> {
    let facts = extract_file_facts(source, tree);
    let mut records = Vec::new();
    let root = tree.root_node();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if TYPE_DECLARATION_KINDS.contains(&child.kind()) {
            collect_type(
                file,
                source,
                &child,
                facts.package.as_deref(),
                revision,
                &mut records,
            );
        }
    }
    records
}

fn collect_type(
    file: &Path,
    source: &str,
    node: &Node,
    enclosing: Option<&str>,
    revision: u64,
    records: &mut Vec<ClassRecord>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let simple_name = node_text(&name_node, source).to_string();
    let qualified_name = match enclosing {
        Some(prefix) => format!("{prefix}.{simple_name}"),
        None => simple_name.clone(),
    };

    let kind = match node.kind() {
        "interface_declaration" => TypeKind::Interface,
        "enum_declaration" => TypeKind::Enum,
        "record_declaration" => TypeKind::Record,
        _ => TypeKind::Class,
    };

    let Some(body) = node.child_by_field_name("body") else {
        return;
    };

    let mut record = ClassRecord {
        qualified_name: qualified_name.clone(),
        simple_name,
        kind,
        file: file.to_path_buf(),
        line: line_of(node),
        span: Span::of(node),
        body_span: Span::of(&body),
        supertypes: extract_supertypes(node, source),
        fields: Vec::new(),
        methods: Vec::new(),
        revision,
    };

    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        match member.kind() {
            "field_declaration" => {
                record.fields.extend(extract_fields(&member, source));
            }
            "method_declaration" | "constructor_declaration" => {
                if let Some(method) = extract_method(&member, source) {
                    record.methods.push(method);
                }
            }
            kind if TYPE_DECLARATION_KINDS.contains(&kind) => {
                collect_type(file, source, &member, Some(&qualified_name), revision, records);
            }
            _ => {}
        }
    }

    records.push(record);
}

fn extract_supertypes(node: &Node, source: &str) -> Vec<String> {
    let mut supertypes = Vec::new();

    if let Some(superclass) = node.child_by_field_name("superclass") {
        // superclass node is `extends <type>`; the type is its last child
        let mut cursor = superclass.walk();
        for child in superclass.children(&mut cursor) {
            if child.is_named() {
                supertypes.push(node_text(&child, source).to_string());
            }
        }
    }

    if let Some(interfaces) = node.child_by_field_name("interfaces") {
        collect_type_list(&interfaces, source, &mut supertypes);
    }

    // interfaces extending interfaces use a dedicated node
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "extends_interfaces" {
            collect_type_list(&child, source, &mut supertypes);
        }
    }

    supertypes
}

fn collect_type_list(node: &Node, source: &str, out: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "type_list" {
            let mut inner = child.walk();
            for ty in child.children(&mut inner) {
                if ty.is_named() {
                    out.push(node_text(&ty, source).to_string());
                }
            }
        }
    }
}

fn extract_fields(node: &Node, source: &str) -> Vec<FieldRecord> {
    let declaration_span = Span::of(node);
    let mut modifier_text = String::new();
    let mut modifiers_span = None;
    let mut is_public = false;
    let mut is_private = false;
    let mut is_static = false;
    let mut is_final = false;
    let mut type_text = String::new();
    let mut fields = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "modifiers" => {
                modifier_text = node_text(&child, source).to_string();
                modifiers_span = Some(Span::of(&child));
                let mut inner = child.walk();
                for modifier in child.children(&mut inner) {
                    match modifier.kind() {
                        "public" => is_public = true,
                        "private" => is_private = true,
                        "static" => is_static = true,
                        "final" => is_final = true,
                        _ => {}
                    }
                }
            }
            "variable_declarator" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let initializer = child
                    .child_by_field_name("value")
                    .map(|value| node_text(&value, source).to_string());
                fields.push(FieldRecord {
                    name: node_text(&name_node, source).to_string(),
                    type_text: type_text.clone(),
                    modifier_text: modifier_text.clone(),
                    is_public,
                    is_private,
                    is_static,
                    is_final,
                    initializer,
                    declaration_span,
                    modifiers_span,
                    name_span: Span::of(&name_node),
                    line: line_of(&name_node),
                });
            }
            kind if is_type_kind(kind) => {
                type_text = node_text(&child, source).to_string();
            }
            _ => {}
        }
    }

    fields
}

fn is_type_kind(kind: &str) -> bool {
    matches!(
        kind,
        "type_identifier"
            | "integral_type"
            | "floating_point_type"
            | "boolean_type"
            | "generic_type"
            | "array_type"
            | "scoped_type_identifier"
            | "void_type"
    )
}

fn extract_method(node: &Node, source: &str) -> Option<MethodRecord> {
    let name_node = node.child_by_field_name("name")?;
    let param_list = node.child_by_field_name("parameters")?;
    let is_constructor = node.kind() == "constructor_declaration";

    let mut has_override = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifiers" {
            let mut inner = child.walk();
            for modifier in child.children(&mut inner) {
                if matches!(modifier.kind(), "marker_annotation" | "annotation") {
                    let text = node_text(&modifier, source);
                    if text == "@Override" || text.starts_with("@Override(") {
                        has_override = true;
                    }
                }
            }
        }
    }

    Some(MethodRecord {
        name: node_text(&name_node, source).to_string(),
        is_constructor,
        has_override,
        params: extract_parameters(&param_list, source),
        param_list_span: Span::of(&param_list),
        body_span: node.child_by_field_name("body").map(|b| Span::of(&b)),
        span: Span::of(node),
        line: line_of(node),
    })
}

fn extract_parameters(param_list: &Node, source: &str) -> Vec<ParamRecord> {
    let mut params = Vec::new();
    let mut cursor = param_list.walk();
    for child in param_list.children(&mut cursor) {
        if !matches!(child.kind(), "formal_parameter" | "spread_parameter") {
            continue;
        }
        let mut type_text = String::new();
        let mut name = String::new();
        let mut inner = child.walk();
        for part in child.children(&mut inner) {
            if is_type_kind(part.kind()) {
                type_text = node_text(&part, source).to_string();
            } else if part.kind() == "identifier" {
                name = node_text(&part, source).to_string();
            } else if part.kind() == "..." {
                type_text.push_str("...");
            }
        }
        if name.is_empty() {
            continue;
        }
        params.push(ParamRecord {
            name,
            type_text,
            text: node_text(&child, source).to_string(),
            span: Span::of(&child),
            index: params.len(),
        });
    }
    params
}

pub fn extract_file_facts(source: &str, tree: &Tree) -> FileFacts {
    let mut facts = FileFacts::default();
    let root = tree.root_node();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "package_declaration" => {
                let mut inner = child.walk();
                for part in child.children(&mut inner) {
                    if matches!(part.kind(), "identifier" | "scoped_identifier") {
                        facts.package = Some(node_text(&part, source).to_string());
                    }
                }
                facts.header_end = child.end_byte();
            }
            "import_declaration" => {
                let text = node_text(&child, source);
                let imported = text
                    .trim_start_matches("import")
                    .trim_end_matches(';')
                    .trim()
                    .to_string();
                facts.imports.push(imported);
                facts.header_end = child.end_byte();
            }
            _ => {}
        }
    }
    facts
}

/// Simple name of a declared type reference: strips type arguments and any
/// qualifying package prefix.
pub fn simple_type_name(raw: &str) -> String {
    let no_args = match raw.find('<') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let trimmed = no_args.trim();
    match trimmed.rfind('.') {
        Some(idx) => trimmed[idx + 1..].to_string(),
        None => trimmed.to_string(),
    }
}

/// Java type default used when a deleted field has no initializer.
pub fn default_value_for(type_text: &str) -> &'static str {
    const PRIMITIVE_NUMBERS: &[&str] = &["byte", "short", "int", "long", "float", "double"];
    if PRIMITIVE_NUMBERS.contains(&type_text) {
        return "0";
    }
    if type_text == "boolean" {
        return "false";
    }
    if type_text == "char" {
        return "0";
    }
    "null"
}

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while",
];

/// Validate a candidate class name: a legal Java identifier that is not a
/// reserved word.
pub fn check_identifier(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("Class name must not be empty".to_string());
    }
    let mut chars = name.chars();
    let first = chars.next().unwrap_or(' ');
    if !(first.is_alphabetic() || first == '_' || first == '$') {
        return Err(format!("'{name}' is not a valid Java identifier"));
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
        return Err(format!("'{name}' is not a valid Java identifier"));
    }
    if JAVA_KEYWORDS.contains(&name) {
        return Err(format!("'{name}' is a reserved word"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn classes_of(source: &str) -> Vec<ClassRecord> {
        let file = PathBuf::from("Test.java");
        let tree = parse(source, &file).unwrap();
        extract_classes(&file, source, &tree, 0)
    }

    #[test]
    fn test_extracts_fields_with_modifiers_and_initializers() {
        let source = indoc! {r#"
            package com.example;

            public class Account {
                public static int counter = 7;
                private String owner;
            }
        "#};
        let classes = classes_of(source);
        assert_eq!(classes.len(), 1);
        let class = &classes[0];
        assert_eq!(class.qualified_name, "com.example.Account");
        assert_eq!(class.fields.len(), 2);

        let counter = class.field_named("counter").unwrap();
        assert_eq!(counter.type_text, "int");
        assert_eq!(counter.modifier_text, "public static");
        assert!(counter.is_public && counter.is_static && !counter.is_final);
        assert_eq!(counter.initializer.as_deref(), Some("7"));

        let owner = class.field_named("owner").unwrap();
        assert_eq!(owner.type_text, "String");
        assert!(owner.is_private);
        assert_eq!(owner.initializer, None);
    }

    #[test]
    fn test_multiple_declarators_share_declaration_span() {
        let source = "class A { int x, y; }";
        let classes = classes_of(source);
        let fields = &classes[0].fields;
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "x");
        assert_eq!(fields[1].name, "y");
        assert_eq!(fields[0].declaration_span, fields[1].declaration_span);
    }

    #[test]
    fn test_extracts_methods_parameters_and_override() {
        let source = indoc! {r#"
            class Shape {
                void move(int dx, int dy, boolean animate) {}

                @Override
                public String toString() { return ""; }

                Shape(int dx) {}
            }
        "#};
        let classes = classes_of(source);
        let class = &classes[0];
        assert_eq!(class.methods.len(), 3);

        let move_method = &class.methods[0];
        assert_eq!(move_method.name, "move");
        assert_eq!(move_method.arity(), 3);
        assert_eq!(move_method.params[0].text, "int dx");
        assert_eq!(move_method.params[2].type_name_text(), "boolean animate");
        assert!(!move_method.has_override);

        assert!(class.methods[1].has_override);
        assert!(class.methods[2].is_constructor);
    }

    #[test]
    fn test_supertypes_collected_from_extends_and_implements() {
        let source = indoc! {r#"
            class Sprite extends Shape implements Drawable, Cloneable {}
            interface Drawable extends Paintable {}
        "#};
        let classes = classes_of(source);
        assert_eq!(
            classes[0].supertypes,
            vec!["Shape", "Drawable", "Cloneable"]
        );
        assert_eq!(classes[1].supertypes, vec!["Paintable"]);
    }

    #[test]
    fn test_nested_classes_get_qualified_names() {
        let source = indoc! {r#"
            package app;

            class Outer {
                class Inner {
                    int depth;
                }
            }
        "#};
        let classes = classes_of(source);
        let names: Vec<&str> = classes.iter().map(|c| c.qualified_name.as_str()).collect();
        assert!(names.contains(&"app.Outer"));
        assert!(names.contains(&"app.Outer.Inner"));
    }

    #[test]
    fn test_local_and_anonymous_classes_are_not_indexed() {
        let source = indoc! {r#"
            class Holder {
                void run() {
                    class Local {}
                    Runnable r = new Runnable() {
                        public void run() {}
                    };
                }
            }
        "#};
        let classes = classes_of(source);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].simple_name, "Holder");
    }

    #[test]
    fn test_file_facts_package_and_imports() {
        let source = indoc! {r#"
            package com.example.app;

            import java.util.List;
            import com.other.Point;

            class A {}
        "#};
        let file = PathBuf::from("A.java");
        let tree = parse(source, &file).unwrap();
        let facts = extract_file_facts(source, &tree);
        assert_eq!(facts.package.as_deref(), Some("com.example.app"));
        assert_eq!(facts.imports, vec!["java.util.List", "com.other.Point"]);
        assert!(facts.header_end > 0);
    }

    #[test]
    fn test_simple_type_name_strips_generics_and_packages() {
        assert_eq!(simple_type_name("List<String>"), "List");
        assert_eq!(simple_type_name("java.util.Map<K, V>"), "Map");
        assert_eq!(simple_type_name("Shape"), "Shape");
    }

    #[test]
    fn test_default_values_follow_java_rules() {
        assert_eq!(default_value_for("int"), "0");
        assert_eq!(default_value_for("double"), "0");
        assert_eq!(default_value_for("boolean"), "false");
        assert_eq!(default_value_for("char"), "0");
        assert_eq!(default_value_for("String"), "null");
    }

    #[test]
    fn test_expression_validation() {
        assert!(is_valid_expression("point.getx()"));
        assert!(is_valid_expression("a + b * 2"));
        assert!(!is_valid_expression("int x = ;"));
    }

    #[test]
    fn test_check_identifier() {
        assert!(check_identifier("PointData").is_ok());
        assert!(check_identifier("class").is_err());
        assert!(check_identifier("9Lives").is_err());
        assert!(check_identifier("").is_err());
    }
}
