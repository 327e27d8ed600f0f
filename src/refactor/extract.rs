//! Consolidated-type generation and reuse detection.

use crate::core::Symbol;
use crate::program::java::ClassRecord;
use crate::program::ProgramModel;

/// Default name for the consolidated type: the element names concatenated
/// in element order.
pub fn generate_class_name(elements: &[Symbol]) -> String {
    elements.iter().map(|e| e.name()).collect()
}

/// Render the source of the consolidated class.
///
/// Per element a public field, a `get<name>` and a `set<name>` method; then
/// a constructor taking every element in element order, and a no-argument
/// constructor last. Accessor names concatenate the raw element name, so
/// the reuse probe finds the same shape it checks for.
pub fn render_class(
    package: Option<&str>,
    imports: &[String],
    name: &str,
    elements: &[Symbol],
) -> String {
    let mut out = String::new();
    if let Some(package) = package {
        out.push_str(&format!("package {package};\n\n"));
    }
    for import in imports {
        out.push_str(&format!("import {import};\n"));
    }
    if !imports.is_empty() {
        out.push('\n');
    }
    out.push_str(&format!("public class {name} {{\n"));

    for element in elements {
        let ty = element.type_text();
        let n = element.name();
        out.push_str(&format!("    public {ty} {n};\n\n"));
        out.push_str(&format!(
            "    public {ty} get{n}() {{\n        return this.{n};\n    }}\n\n"
        ));
        out.push_str(&format!(
            "    public void set{n}({ty} newValue) {{\n        {n} = newValue;\n    }}\n\n"
        ));
    }

    let params: Vec<String> = elements.iter().map(|e| e.text()).collect();
    out.push_str(&format!("    public {name}({}) {{\n", params.join(", ")));
    for element in elements {
        let n = element.name();
        out.push_str(&format!("        this.{n} = {n};\n"));
    }
    out.push_str("    }\n\n");
    out.push_str(&format!("    public {name}() {{\n    }}\n"));
    out.push_str("}\n");
    out
}

/// Imports of the anchor file that any element type mentions, carried over
/// so the generated file resolves the same names. On-demand imports are
/// kept wholesale since their contribution cannot be told apart.
pub fn imports_for_elements(imports: &[String], elements: &[Symbol]) -> Vec<String> {
    imports
        .iter()
        .filter(|import| {
            let simple = import.rsplit('.').next().unwrap_or(import);
            if simple == "*" {
                return true;
            }
            elements
                .iter()
                .any(|element| type_mentions(element.type_text(), simple))
        })
        .cloned()
        .collect()
}

fn type_mentions(type_text: &str, simple: &str) -> bool {
    type_text
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .any(|token| token == simple)
}

/// Search the program for a type that already holds the clump: at least as
/// many fields as the group has elements, every field matching some element
/// by case-insensitive name and exact type, with a `get<field>` and
/// `set<field>` method each. Only parameter elements take part, so field
/// groups never reuse an existing type. Candidates are visited in qualified
/// name order and the first match wins.
pub fn find_parameter_object<'a>(
    model: &'a dyn ProgramModel,
    elements: &[Symbol],
) -> Option<&'a ClassRecord> {
    if elements.is_empty() {
        return None;
    }
    model
        .classes()
        .into_iter()
        .find(|class| holds_all_elements(class, elements))
}

fn holds_all_elements(class: &ClassRecord, elements: &[Symbol]) -> bool {
    if class.fields.len() < elements.len() {
        return false;
    }
    class.fields.iter().all(|field| {
        let matched = elements.iter().any(|element| {
            element.is_parameter()
                && element.name().eq_ignore_ascii_case(&field.name)
                && element.type_text() == field.type_text
        });
        matched
            && class.has_method(&format!("get{}", field.name))
            && class.has_method(&format!("set{}", field.name))
    })
}
