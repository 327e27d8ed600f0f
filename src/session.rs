//! Analysis session: one workspace plus the caches built over it.
//!
//! All state that used to be reachable from anywhere lives here and is
//! threaded explicitly through the detectors and the refactoring engine.
//! Mutating operations take `&mut self`; there is no interior mutability,
//! so a session has exactly one writer at a time.

use crate::config::DeclumpConfig;
use crate::core::errors::Result;
use crate::core::CancelToken;
use crate::index::hierarchy::HierarchyResolver;
use crate::index::SymbolIndex;
use crate::program::edit::EditTransaction;
use crate::program::Workspace;
use std::path::Path;

pub struct Session {
    workspace: Workspace,
    index: SymbolIndex,
    hierarchy: HierarchyResolver,
    config: DeclumpConfig,
    cancel: CancelToken,
}

impl Session {
    pub fn new(workspace: Workspace, config: DeclumpConfig) -> Self {
        Self {
            workspace,
            index: SymbolIndex::new(),
            hierarchy: HierarchyResolver::new(),
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Load every `.java` file under `root` into a fresh session.
    pub fn open(root: &Path, config: DeclumpConfig) -> Result<Self> {
        Ok(Self::new(Workspace::load(root)?, config))
    }

    pub fn config(&self) -> &DeclumpConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    /// Build the symbol index if it is not built yet.
    pub fn ensure_indexed(&mut self) -> Result<()> {
        if !self.index.is_built() {
            self.index.build(&self.workspace, &self.cancel)?;
        }
        Ok(())
    }

    /// Build the index and precompute every class hierarchy.
    pub fn warm_up(&mut self) -> Result<()> {
        self.ensure_indexed()?;
        self.hierarchy.warm(&self.index, &self.cancel)?;
        Ok(())
    }

    /// Split borrow for hierarchy queries: the resolver mutates its cache
    /// while reading the index.
    pub fn hierarchy_and_model(&mut self) -> (&mut HierarchyResolver, &SymbolIndex) {
        (&mut self.hierarchy, &self.index)
    }

    /// Drop every cache. The next query rebuilds from the workspace.
    pub fn reset(&mut self) {
        self.index.reset();
        self.hierarchy.reset();
    }

    /// Apply an edit and re-index the touched file. Hierarchy cache entries
    /// are left as they are; callers invalidate classes they know changed.
    pub fn apply_and_refresh(&mut self, tx: &EditTransaction) -> Result<()> {
        self.workspace.apply(tx)?;
        self.index.update_file(&self.workspace, tx.file())
    }

    /// Replace a file's text wholesale and re-index it.
    pub fn set_text_and_refresh(&mut self, path: &Path, text: String) -> Result<()> {
        self.workspace.set_text(path, text)?;
        self.index.update_file(&self.workspace, path)
    }

    /// Add a new file and index its classes.
    pub fn create_file_and_index(&mut self, path: &Path, text: String) -> Result<()> {
        self.workspace.create_file(path, text)?;
        self.index.update_file(&self.workspace, path)
    }

    /// Drop a file from the workspace and the index.
    pub fn remove_file_and_index(&mut self, path: &Path) {
        self.workspace.remove_file(path);
        self.index.remove_file(path);
    }

    pub fn invalidate_hierarchy_entry(&mut self, qualified_name: &str) {
        self.hierarchy.remove_entry(qualified_name);
    }

    /// Flush every changed file to disk.
    pub fn write_back(&self) -> Result<Vec<std::path::PathBuf>> {
        self.workspace.write_back()
    }
}
