//! Linear undo/redo history over registry snapshots.
//!
//! Every step bumps the major version; rendering surfaces compare it to
//! decide on forced reloads.

use crate::registry::RegistrySnapshot;

/// Default number of undo levels kept.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Bounded undo/redo stacks plus the major version counter.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<RegistrySnapshot>,
    redo_stack: Vec<RegistrySnapshot>,
    max_levels: usize,
    major_version: u64,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    /// Create a history keeping at most `max_levels` undo steps
    /// (0 = unlimited).
    #[must_use]
    pub fn new(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            major_version: 0,
        }
    }

    /// Current major version.
    #[must_use]
    pub fn major_version(&self) -> u64 {
        self.major_version
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps available.
    #[must_use]
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps available.
    #[must_use]
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Record the state before a change that replaced content wholesale.
    /// Clears redo and bumps the major version.
    pub fn commit(&mut self, before: RegistrySnapshot) {
        self.record(before);
        self.major_version += 1;
        tracing::debug!("History commit, major version {}", self.major_version);
    }

    /// Record the state before a change that live surfaces already show
    /// (in-place edits, page list changes). Clears redo; the version stays.
    pub fn record(&mut self, before: RegistrySnapshot) {
        self.undo_stack.push(before);
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Step back. Returns the state to restore, or `None` if there is
    /// nothing to undo.
    pub fn undo(&mut self, current: RegistrySnapshot) -> Option<RegistrySnapshot> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        self.major_version += 1;
        tracing::debug!("Undo, major version {}", self.major_version);
        Some(previous)
    }

    /// Step forward. Returns the state to restore, or `None` if there is
    /// nothing to redo.
    pub fn redo(&mut self, current: RegistrySnapshot) -> Option<RegistrySnapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        self.major_version += 1;
        tracing::debug!("Redo, major version {}", self.major_version);
        Some(next)
    }

    /// Drop all history. The version is kept.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PageRegistry;

    fn registry_with(markup: &str) -> PageRegistry {
        let mut registry = PageRegistry::new();
        registry.insert("home", markup).expect("insert");
        registry
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::default();
        let mut registry = registry_with("v1");

        history.commit(registry.snapshot());
        registry.set_markup("home", "v2").expect("set");
        assert_eq!(history.major_version(), 1);

        let restored = history.undo(registry.snapshot()).expect("undo");
        registry.restore(&restored);
        assert_eq!(registry.get("home"), Some("v1"));
        assert_eq!(history.major_version(), 2);

        let restored = history.redo(registry.snapshot()).expect("redo");
        registry.restore(&restored);
        assert_eq!(registry.get("home"), Some("v2"));
        assert_eq!(history.major_version(), 3);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut history = History::default();
        let registry = registry_with("v1");
        assert!(history.undo(registry.snapshot()).is_none());
        assert!(history.redo(registry.snapshot()).is_none());
        assert_eq!(history.major_version(), 0);
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut history = History::default();
        let registry = registry_with("v1");
        history.commit(registry.snapshot());
        let _ = history.undo(registry.snapshot());
        assert!(history.can_redo());
        history.commit(registry.snapshot());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_keeps_version() {
        let mut history = History::default();
        let registry = registry_with("v1");
        history.record(registry.snapshot());
        assert!(history.can_undo());
        assert_eq!(history.major_version(), 0);
        let _ = history.undo(registry.snapshot());
        assert_eq!(history.major_version(), 1);
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut history = History::new(3);
        let registry = registry_with("v");
        for _ in 0..10 {
            history.commit(registry.snapshot());
        }
        assert_eq!(history.undo_count(), 3);
        assert_eq!(history.major_version(), 10);
    }
}
