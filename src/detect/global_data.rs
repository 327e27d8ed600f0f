//! Global mutable data detector.
//!
//! Flags `public static` fields that are not `final`: writable from
//! anywhere in the program, they are shared state with no owner.

use crate::core::{Finding, Severity, SmellKind};
use crate::program::java::ClassRecord;

pub fn check_class_global_data(class: &ClassRecord) -> Vec<Finding> {
    class
        .fields
        .iter()
        .filter(|field| field.is_public && field.is_static && !field.is_final)
        .map(|field| Finding {
            kind: SmellKind::GlobalData,
            severity: Severity::High,
            file: class.file.clone(),
            line: field.line,
            anchor_class: class.qualified_name.clone(),
            anchor_method: None,
            count: 1,
            elements: vec![field.name.clone()],
            message: format!(
                "Global mutable data: {}.{} is public static and not final",
                class.simple_name, field.name
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::index_of;
    use super::*;
    use crate::program::ProgramModel;
    use indoc::indoc;

    #[test]
    fn test_public_static_mutable_field_is_flagged() {
        let index = index_of(&[(
            "Counters.java",
            indoc! {r#"
                public class Counters {
                    public static int hits;
                    public static final int LIMIT = 10;
                    private static int internal;
                    public int instance;
                    static int packagePrivate;
                }
            "#},
        )]);
        let findings = check_class_global_data(index.class_named("Counters").unwrap());
        assert_eq!(findings.len(), 1);

        let finding = &findings[0];
        assert_eq!(finding.kind, SmellKind::GlobalData);
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.elements, vec!["hits"]);
        assert_eq!(finding.line, 2);
        assert!(finding.mentions("Counters.hits"));
    }

    #[test]
    fn test_class_without_globals_is_quiet() {
        let index = index_of(&[(
            "Clean.java",
            "public class Clean { private int x; public final int y = 1; }",
        )]);
        assert!(check_class_global_data(index.class_named("Clean").unwrap()).is_empty());
    }
}
