//! End-to-end detection scenarios driven through the public session API.

use declump::config::DeclumpConfig;
use declump::core::SmellKind;
use declump::program::Workspace;
use declump::session::Session;
use indoc::indoc;
use std::path::PathBuf;

fn session_with_config(sources: &[(&str, &str)], config: DeclumpConfig) -> Session {
    let mut ws = Workspace::new("/project");
    for (path, text) in sources {
        ws.insert(PathBuf::from(path), text.to_string()).unwrap();
    }
    Session::new(ws, config)
}

fn session(sources: &[(&str, &str)]) -> Session {
    session_with_config(sources, DeclumpConfig::default())
}

fn kinds(session: &mut Session) -> Vec<SmellKind> {
    declump::analyze(session)
        .unwrap()
        .findings
        .iter()
        .map(|f| f.kind)
        .collect()
}

#[test]
fn simple_fields_reports_both_sides_of_the_pair() {
    let mut session = session(&[(
        "Shapes.java",
        indoc! {r#"
            class Circle {
                public int x;
                public int y;
                public int depth;
            }
            class Label {
                public int x;
                public int y;
                public int depth;
                public String text;
            }
        "#},
    )]);
    let report = declump::analyze(&mut session).unwrap();
    let fields: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.kind == SmellKind::FieldClump)
        .collect();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].anchor_class, "Circle");
    assert_eq!(fields[1].anchor_class, "Label");
    assert!(fields[0].mentions("Label"));
    assert!(fields[1].mentions("Circle"));
    assert_eq!(fields[0].elements, vec!["x", "y", "depth"]);
}

#[test]
fn simple_parameters_reports_both_sides_of_the_pair() {
    let mut session = session(&[(
        "Move.java",
        indoc! {r#"
            class Sprite {
                void move(int x, int y, int speed) {}
            }
            class Camera {
                void pan(int x, int y, int speed) {}
            }
        "#},
    )]);
    let report = declump::analyze(&mut session).unwrap();
    assert_eq!(report.findings.len(), 2);
    assert!(report
        .findings
        .iter()
        .all(|f| f.kind == SmellKind::ParameterClump));
    assert_eq!(report.findings[0].anchor_method.as_deref(), Some("move"));
    assert_eq!(report.findings[1].anchor_method.as_deref(), Some("pan"));
}

#[test]
fn polymorphism_pair_is_suppressed_only_with_the_hierarchy_check() {
    let sources = &[(
        "Poly.java",
        indoc! {r#"
            class Base {}
            class Left extends Base {
                int x;
                int y;
                int z;
            }
            class Right extends Base {
                int x;
                int y;
                int z;
            }
        "#},
    )];

    let mut plain = session(sources);
    assert_eq!(kinds(&mut plain).len(), 2);

    let mut config = DeclumpConfig::default();
    config.detection.check_fields_hierarchy = true;
    let mut checked = session_with_config(sources, config);
    assert!(kinds(&mut checked).is_empty());
}

#[test]
fn inner_class_fields_take_part_under_their_qualified_name() {
    let mut session = session(&[(
        "Outer.java",
        indoc! {r#"
            class Outer {
                class Inner {
                    int a;
                    int b;
                    int c;
                }
            }
            class Other {
                int a;
                int b;
                int c;
            }
        "#},
    )]);
    let report = declump::analyze(&mut session).unwrap();
    let fields: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.kind == SmellKind::FieldClump)
        .collect();
    assert_eq!(fields.len(), 2);
    assert!(fields.iter().any(|f| f.anchor_class == "Outer.Inner"));
}

#[test]
fn interface_implementors_never_report_against_each_other() {
    let sources = &[(
        "Iface.java",
        indoc! {r#"
            interface Mover {
                void step(int x, int y, int speed);
            }
            class Walker implements Mover {
                public void step(int x, int y, int speed) {}
            }
            class Runner implements Mover {
                public void step(int x, int y, int speed) {}
            }
        "#},
    )];

    // default: implementors carry a super declaration and are dropped
    let mut plain = session(sources);
    assert!(kinds(&mut plain).is_empty());

    // hierarchy analysis: eligible, but suppressed inside one hierarchy
    let mut config = DeclumpConfig::default();
    config.detection.check_parameters_hierarchy = true;
    let mut checked = session_with_config(sources, config);
    assert!(kinds(&mut checked).is_empty());
}

#[test]
fn hierarchy_analysis_reports_across_unrelated_hierarchies() {
    let sources = &[(
        "Cross.java",
        indoc! {r#"
            interface Mover {
                void step(int x, int y, int speed);
            }
            class Walker implements Mover {
                public void step(int x, int y, int speed) {}
            }
            class Stranger {
                void strut(int x, int y, int speed) {}
            }
        "#},
    )];
    let mut config = DeclumpConfig::default();
    config.detection.check_parameters_hierarchy = true;
    let mut session = session_with_config(sources, config);

    let report = declump::analyze(&mut session).unwrap();
    let clumps: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.kind == SmellKind::ParameterClump)
        .collect();
    assert!(!clumps.is_empty());
    assert!(clumps
        .iter()
        .any(|f| f.anchor_class == "Walker" && f.mentions("Stranger")));
}

#[test]
fn distinct_names_or_types_are_quiet() {
    let mut session = session(&[(
        "Distinct.java",
        indoc! {r#"
            class A { void f(int x, int y, int z) {} }
            class B { void g(int a, int b, int c) {} }
            class C { void h(long x, long y, long z) {} }
            class D { int p; int q; int r; }
            class E { long p; long q; long r; }
        "#},
    )]);
    assert!(kinds(&mut session).is_empty());
}

#[test]
fn same_class_pairs_follow_the_include_flag() {
    let sources = &[(
        "Self.java",
        indoc! {r#"
            class Report {
                void print(String title, int width, int height) {}
                void export(String title, int width, int height) {}
            }
        "#},
    )];

    let mut included = session(sources);
    assert_eq!(kinds(&mut included).len(), 2);

    let mut config = DeclumpConfig::default();
    config.detection.include_methods_in_same_class = false;
    let mut excluded = session_with_config(sources, config);
    assert!(kinds(&mut excluded).is_empty());
}

#[test]
fn anonymous_class_members_are_invisible() {
    let mut session = session(&[(
        "Anon.java",
        indoc! {r#"
            class Holder {
                void setup() {
                    Runnable r = new Runnable() {
                        public void run() {
                            act(1, 2, 3);
                        }
                        void act(int x, int y, int z) {}
                    };
                }
            }
            class Other {
                void go(int x, int y, int z) {}
            }
        "#},
    )]);
    assert!(kinds(&mut session).is_empty());
}

#[test]
fn already_extracted_class_is_reported_alongside_nothing_else() {
    let mut session = session(&[(
        "Extracted.java",
        indoc! {r#"
            class Caller {
                void apply(int x, int y, int speed) {}
            }
            class Motion {
                private int x;
                private int y;
                private int speed;
                Motion(int x, int y, int speed) {}
            }
        "#},
    )]);
    let report = declump::analyze(&mut session).unwrap();
    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.kind, SmellKind::AlreadyExtracted);
    assert!(finding.mentions("Motion"));
}

#[test]
fn thresholds_from_config_change_what_is_reported() {
    let sources = &[(
        "Small.java",
        "class A { int x; int y; } class B { int x; int y; }",
    )];

    let mut plain = session(sources);
    assert!(kinds(&mut plain).is_empty());

    let mut config = DeclumpConfig::default();
    config.detection.min_fields_count = 2;
    let mut lowered = session_with_config(sources, config);
    assert_eq!(kinds(&mut lowered).len(), 2);
}
