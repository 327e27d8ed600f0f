//! Supertype resolution with a memoized per-class cache.
//!
//! For each class the resolver walks `extends`/`implements` edges breadth
//! first and collects the simple names of every reachable type, the class
//! itself included. Results are cached by qualified name and are not
//! invalidated when the index changes; callers decide when to drop entries
//! or reset the cache wholesale.

use crate::core::errors::Result;
use crate::core::CancelToken;
use crate::program::java::{self, ClassRecord};
use crate::program::ProgramModel;
use im::{HashMap, Vector};
use std::collections::{HashSet, VecDeque};

/// Library marker types that say nothing about a shared domain hierarchy.
pub const HIERARCHY_DENYLIST: &[&str] = &["Object", "Observable", "Cloneable", "Serializable"];

enum WorkItem {
    Resolved(String),
    Unresolved(String),
}

#[derive(Clone, Debug, Default)]
pub struct HierarchyResolver {
    cache: HashMap<String, Vector<String>>,
    warmed: bool,
}

impl HierarchyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn is_warmed(&self) -> bool {
        self.warmed
    }

    /// Simple names of every type above `class`, itself included. Supertype
    /// names that resolve to no indexed class are kept as written, without
    /// expansion.
    pub fn resolve(&mut self, class: &ClassRecord, model: &dyn ProgramModel) -> Vector<String> {
        if let Some(cached) = self.cache.get(&class.qualified_name) {
            return cached.clone();
        }
        let computed = compute_hierarchy(class, model);
        self.cache
            .insert(class.qualified_name.clone(), computed.clone());
        computed
    }

    /// True when the two classes share any name in their hierarchies. Empty
    /// hierarchies never match.
    pub fn common_hierarchy(
        &mut self,
        a: &ClassRecord,
        b: &ClassRecord,
        model: &dyn ProgramModel,
    ) -> bool {
        let first = self.resolve(a, model);
        if first.is_empty() {
            return false;
        }
        let second = self.resolve(b, model);
        if second.is_empty() {
            return false;
        }
        second.iter().any(|name| first.contains(name))
    }

    pub fn remove_entry(&mut self, qualified_name: &str) {
        self.cache.remove(qualified_name);
    }

    pub fn reset(&mut self) {
        self.cache = HashMap::new();
        self.warmed = false;
    }

    /// Precompute the hierarchy of every indexed class.
    pub fn warm(&mut self, model: &dyn ProgramModel, cancel: &CancelToken) -> Result<usize> {
        let mut resolved = 0;
        for record in model.classes() {
            cancel.check()?;
            self.resolve(record, model);
            resolved += 1;
        }
        self.warmed = true;
        log::debug!("Hierarchy cache warmed with {resolved} classes");
        Ok(resolved)
    }
}

fn compute_hierarchy(class: &ClassRecord, model: &dyn ProgramModel) -> Vector<String> {
    let mut results: Vector<String> = Vector::new();
    let mut queue: VecDeque<WorkItem> = VecDeque::new();
    let mut done: HashSet<String> = HashSet::new();

    done.insert(class.qualified_name.clone());
    queue.push_back(WorkItem::Resolved(class.qualified_name.clone()));

    while let Some(item) = queue.pop_front() {
        match item {
            WorkItem::Resolved(qualified) => {
                let Some(record) = model.class_named(&qualified) else {
                    continue;
                };
                if HIERARCHY_DENYLIST.contains(&record.simple_name.as_str()) {
                    continue;
                }
                if !results.contains(&record.simple_name) {
                    results.push_back(record.simple_name.clone());
                }
                for supertype in &record.supertypes {
                    let simple = java::simple_type_name(supertype);
                    let candidates = model.classes_by_simple_name(&simple);
                    if candidates.is_empty() {
                        if done.insert(simple.clone()) {
                            queue.push_back(WorkItem::Unresolved(simple));
                        }
                    } else {
                        for candidate in candidates {
                            if done.insert(candidate.qualified_name.clone()) {
                                queue.push_back(WorkItem::Resolved(
                                    candidate.qualified_name.clone(),
                                ));
                            }
                        }
                    }
                }
            }
            WorkItem::Unresolved(simple) => {
                if HIERARCHY_DENYLIST.contains(&simple.as_str()) {
                    continue;
                }
                if !results.contains(&simple) {
                    results.push_back(simple);
                }
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SymbolIndex;
    use crate::program::Workspace;
    use std::path::PathBuf;

    fn index_of(sources: &[(&str, &str)]) -> SymbolIndex {
        let mut ws = Workspace::new("/project");
        for (path, text) in sources {
            ws.insert(PathBuf::from(path), text.to_string()).unwrap();
        }
        let mut index = SymbolIndex::new();
        index.build(&ws, &CancelToken::new()).unwrap();
        index
    }

    #[test]
    fn test_hierarchy_includes_self_and_ancestors() {
        let index = index_of(&[(
            "Shapes.java",
            "class Shape {} class Circle extends Shape {}",
        )]);
        let mut resolver = HierarchyResolver::new();
        let circle = index.class_named("Circle").unwrap();
        let names = resolver.resolve(circle, &index);
        assert!(names.contains(&"Circle".to_string()));
        assert!(names.contains(&"Shape".to_string()));
    }

    #[test]
    fn test_denylisted_supertypes_are_dropped() {
        let index = index_of(&[(
            "Obs.java",
            "class Watcher extends Observable implements Serializable {}",
        )]);
        let mut resolver = HierarchyResolver::new();
        let watcher = index.class_named("Watcher").unwrap();
        let names = resolver.resolve(watcher, &index);
        assert_eq!(names.len(), 1);
        assert!(names.contains(&"Watcher".to_string()));
    }

    #[test]
    fn test_unresolved_supertype_kept_without_expansion() {
        let index = index_of(&[("App.java", "class App extends LibraryBase {}")]);
        let mut resolver = HierarchyResolver::new();
        let app = index.class_named("App").unwrap();
        let names = resolver.resolve(app, &index);
        assert!(names.contains(&"LibraryBase".to_string()));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_common_hierarchy_through_shared_interface() {
        let index = index_of(&[(
            "Draw.java",
            "interface Drawable {} class Circle implements Drawable {} \
             class Square implements Drawable {} class Report {}",
        )]);
        let mut resolver = HierarchyResolver::new();
        let circle = index.class_named("Circle").unwrap();
        let square = index.class_named("Square").unwrap();
        let report = index.class_named("Report").unwrap();

        assert!(resolver.common_hierarchy(circle, square, &index));
        assert!(resolver.common_hierarchy(square, circle, &index));
        assert!(!resolver.common_hierarchy(circle, report, &index));
    }

    #[test]
    fn test_class_named_like_marker_type_has_empty_hierarchy() {
        let index = index_of(&[("O.java", "class Object {} class User extends Object {}")]);
        let mut resolver = HierarchyResolver::new();
        let object = index.class_named("Object").unwrap();
        let user = index.class_named("User").unwrap();
        assert!(resolver.resolve(object, &index).is_empty());
        assert!(!resolver.common_hierarchy(object, user, &index));
    }

    #[test]
    fn test_warm_fills_cache_for_all_classes() {
        let index = index_of(&[("S.java", "class A {} class B extends A {}")]);
        let mut resolver = HierarchyResolver::new();
        let count = resolver.warm(&index, &CancelToken::new()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(resolver.len(), 2);
        assert!(resolver.is_warmed());
    }
}
