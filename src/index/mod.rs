//! Whole-program symbol index.
//!
//! Maps every named class in the workspace by qualified name, simple name
//! and file. The index is the one [`ProgramModel`] adapter; detectors and
//! the hierarchy resolver query it instead of touching parse trees.

pub mod hierarchy;

use crate::core::errors::Result;
use crate::core::{CancelToken, SmellTimer};
use crate::program::java::{self, ClassRecord};
use crate::program::{ProgramModel, Workspace};
use im::{HashMap, Vector};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default)]
pub struct SymbolIndex {
    classes: HashMap<String, ClassRecord>,
    by_simple_name: HashMap<String, Vector<String>>,
    by_file: HashMap<PathBuf, Vector<String>>,
    building: bool,
    built: bool,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn is_building(&self) -> bool {
        self.building
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn file_count(&self) -> usize {
        self.by_file.len()
    }

    /// Index every class in the workspace. Checks the cancel token between
    /// files; a cancelled build leaves the index empty and unbuilt.
    pub fn build(&mut self, workspace: &Workspace, cancel: &CancelToken) -> Result<()> {
        self.building = true;
        let outcome = self.build_inner(workspace, cancel);
        self.building = false;
        if outcome.is_err() {
            self.reset();
        }
        outcome
    }

    fn build_inner(&mut self, workspace: &Workspace, cancel: &CancelToken) -> Result<()> {
        let mut timer = SmellTimer::new("index build");
        timer.start();

        self.clear_maps();
        for file in workspace.files() {
            cancel.check()?;
            self.index_file_records(java::extract_classes(
                &file.path,
                &file.text,
                &file.tree,
                file.revision,
            ));
            if !self.by_file.contains_key(&file.path) {
                self.by_file.insert(file.path.clone(), Vector::new());
            }
        }
        self.built = true;

        timer.stop();
        timer.report();
        log::debug!(
            "Indexed {} classes across {} files",
            self.classes.len(),
            self.by_file.len()
        );
        Ok(())
    }

    /// Re-extract one file after an edit, replacing its previous entries.
    /// Hierarchy cache entries referring to the old records are left alone.
    pub fn update_file(&mut self, workspace: &Workspace, path: &Path) -> Result<()> {
        self.remove_file(path);
        if let Some(file) = workspace.file(path) {
            self.index_file_records(java::extract_classes(
                &file.path,
                &file.text,
                &file.tree,
                file.revision,
            ));
            if !self.by_file.contains_key(&file.path) {
                self.by_file.insert(file.path.clone(), Vector::new());
            }
        }
        Ok(())
    }

    pub fn remove_file(&mut self, path: &Path) {
        let Some(qualified_names) = self.by_file.remove(path) else {
            return;
        };
        for qualified in qualified_names {
            if let Some(record) = self.classes.remove(&qualified) {
                if let Some(mut peers) = self.by_simple_name.get(&record.simple_name).cloned() {
                    peers.retain(|q| q != &qualified);
                    if peers.is_empty() {
                        self.by_simple_name.remove(&record.simple_name);
                    } else {
                        self.by_simple_name.insert(record.simple_name.clone(), peers);
                    }
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.clear_maps();
        self.built = false;
    }

    fn clear_maps(&mut self) {
        self.classes = HashMap::new();
        self.by_simple_name = HashMap::new();
        self.by_file = HashMap::new();
    }

    fn index_file_records(&mut self, records: Vec<ClassRecord>) {
        for record in records {
            let qualified = record.qualified_name.clone();
            if self.classes.contains_key(&qualified) {
                log::warn!("Duplicate class {qualified}, keeping the later definition");
            } else {
                let mut peers = self
                    .by_simple_name
                    .get(&record.simple_name)
                    .cloned()
                    .unwrap_or_default();
                let position = peers
                    .iter()
                    .position(|q| q.as_str() > qualified.as_str())
                    .unwrap_or(peers.len());
                peers.insert(position, qualified.clone());
                self.by_simple_name.insert(record.simple_name.clone(), peers);

                let mut in_file = self.by_file.get(&record.file).cloned().unwrap_or_default();
                in_file.push_back(qualified.clone());
                self.by_file.insert(record.file.clone(), in_file);
            }
            self.classes.insert(qualified, record);
        }
    }

    pub fn classes_in_file(&self, path: &Path) -> Vec<&ClassRecord> {
        let mut records: Vec<&ClassRecord> = self
            .by_file
            .get(path)
            .map(|names| names.iter().filter_map(|q| self.classes.get(q)).collect())
            .unwrap_or_default();
        records.sort_by_key(|r| r.span.start);
        records
    }
}

impl ProgramModel for SymbolIndex {
    fn classes(&self) -> Vec<&ClassRecord> {
        let mut records: Vec<&ClassRecord> = self.classes.values().collect();
        records.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        records
    }

    fn class_named(&self, qualified_name: &str) -> Option<&ClassRecord> {
        self.classes.get(qualified_name)
    }

    fn classes_by_simple_name(&self, simple_name: &str) -> Vec<&ClassRecord> {
        self.by_simple_name
            .get(simple_name)
            .map(|names| names.iter().filter_map(|q| self.classes.get(q)).collect())
            .unwrap_or_default()
    }
}
