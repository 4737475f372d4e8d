//! Ordered in-memory registry of pages.
//!
//! The registry is the single owner of page markup. Order is insertion order
//! (renames keep their slot, duplicates land right after their source) and
//! drives the left-to-right frame layout.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{CanvasError, CanvasResult};

/// A page: an id and its raw (unthemed) markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// User-visible, renameable id.
    pub id: String,
    /// Raw markup.
    pub markup: String,
}

/// A full copy of the registry, used by history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pages: Vec<Page>,
}

impl RegistrySnapshot {
    /// Pages in order.
    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Markup of one page in the snapshot.
    #[must_use]
    pub fn markup(&self, id: &str) -> Option<&str> {
        self.pages
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.markup.as_str())
    }

    /// Copy with one page's markup replaced.
    #[must_use]
    pub fn with_markup(mut self, id: &str, markup: &str) -> Self {
        if let Some(page) = self.pages.iter_mut().find(|p| p.id == id) {
            page.markup = markup.to_string();
        }
        self
    }
}

/// Ordered page-id → markup map.
#[derive(Debug, Clone, Default)]
pub struct PageRegistry {
    order: Vec<String>,
    pages: HashMap<String, String>,
    next_index: usize,
}

impl PageRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check if a page exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.pages.contains_key(id)
    }

    /// Page ids in order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Position of a page in the order.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|p| p == id)
    }

    /// Markup of a page.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.pages.get(id).map(String::as_str)
    }

    /// Iterate pages in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.pages.get(id).map(|m| (id.as_str(), m.as_str())))
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Add a page under a generated `page-N` id.
    pub fn add(&mut self, markup: impl Into<String>) -> String {
        let id = loop {
            self.next_index += 1;
            let candidate = format!("page-{}", self.next_index);
            if !self.contains(&candidate) {
                break candidate;
            }
        };
        self.order.push(id.clone());
        self.pages.insert(id.clone(), markup.into());
        tracing::debug!("Added page {id}");
        id
    }

    /// Insert a page under a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidPageId`] for an empty or whitespace id
    /// and [`CanvasError::DuplicateKey`] if the id is taken.
    pub fn insert(&mut self, id: impl Into<String>, markup: impl Into<String>) -> CanvasResult<()> {
        let id = id.into();
        validate_id(&id)?;
        if self.contains(&id) {
            return Err(CanvasError::DuplicateKey(id));
        }
        self.order.push(id.clone());
        self.pages.insert(id, markup.into());
        Ok(())
    }

    /// Rename a page, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PageNotFound`] if `old_id` is unknown,
    /// [`CanvasError::InvalidPageId`] if `new_id` is not a valid id and
    /// [`CanvasError::DuplicateKey`] if `new_id` is taken.
    pub fn rename(&mut self, old_id: &str, new_id: &str) -> CanvasResult<()> {
        if !self.contains(old_id) {
            return Err(CanvasError::PageNotFound(old_id.to_string()));
        }
        validate_id(new_id)?;
        if old_id == new_id {
            return Ok(());
        }
        if self.contains(new_id) {
            return Err(CanvasError::DuplicateKey(new_id.to_string()));
        }
        if let Some(markup) = self.pages.remove(old_id) {
            self.pages.insert(new_id.to_string(), markup);
        }
        if let Some(slot) = self.order.iter_mut().find(|p| *p == old_id) {
            *slot = new_id.to_string();
        }
        tracing::debug!("Renamed page {old_id} -> {new_id}");
        Ok(())
    }

    /// Copy a page under a fresh id placed right after the source.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PageNotFound`] if `id` is unknown.
    pub fn duplicate(&mut self, id: &str) -> CanvasResult<String> {
        let markup = self
            .get(id)
            .ok_or_else(|| CanvasError::PageNotFound(id.to_string()))?
            .to_string();

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut new_id = format!("{id}-copy-{millis}");
        while self.contains(&new_id) {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            new_id = format!("{id}-copy-{millis}-{}", &suffix[..8]);
        }

        let at = self.index_of(id).map_or(self.order.len(), |i| i + 1);
        self.order.insert(at, new_id.clone());
        self.pages.insert(new_id.clone(), markup);
        tracing::debug!("Duplicated page {id} -> {new_id}");
        Ok(new_id)
    }

    /// Remove a page, returning its markup.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PageNotFound`] if `id` is unknown.
    pub fn remove(&mut self, id: &str) -> CanvasResult<String> {
        let markup = self
            .pages
            .remove(id)
            .ok_or_else(|| CanvasError::PageNotFound(id.to_string()))?;
        self.order.retain(|p| p != id);
        tracing::debug!("Removed page {id}");
        Ok(markup)
    }

    /// Replace a page's markup.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PageNotFound`] if `id` is unknown.
    pub fn set_markup(&mut self, id: &str, markup: impl Into<String>) -> CanvasResult<()> {
        let slot = self
            .pages
            .get_mut(id)
            .ok_or_else(|| CanvasError::PageNotFound(id.to_string()))?;
        *slot = markup.into();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // History support
    // -----------------------------------------------------------------------

    /// Copy out the full registry.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            pages: self
                .iter()
                .map(|(id, markup)| Page {
                    id: id.to_string(),
                    markup: markup.to_string(),
                })
                .collect(),
        }
    }

    /// Replace the registry content with a snapshot.
    pub fn restore(&mut self, snapshot: &RegistrySnapshot) {
        self.order = snapshot.pages.iter().map(|p| p.id.clone()).collect();
        self.pages = snapshot
            .pages
            .iter()
            .map(|p| (p.id.clone(), p.markup.clone()))
            .collect();
    }
}

fn validate_id(id: &str) -> CanvasResult<()> {
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        return Err(CanvasError::InvalidPageId(id.to_string()));
    }
    Ok(())
}
