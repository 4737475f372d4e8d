//! The two-slot selection model: transient hover and sticky selection.

use crate::element::{HoverDescriptor, Rect, SelectionDescriptor};
use crate::protocol::{BridgeMessage, Mutation};

/// Hover and selection across all surfaces. At most one of each exists.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    hovered: Option<HoverDescriptor>,
    selected: Option<SelectionDescriptor>,
}

impl SelectionModel {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current hover target.
    #[must_use]
    pub fn hovered(&self) -> Option<&HoverDescriptor> {
        self.hovered.as_ref()
    }

    /// Current selection.
    #[must_use]
    pub fn selected(&self) -> Option<&SelectionDescriptor> {
        self.selected.as_ref()
    }

    /// Page of the current selection.
    #[must_use]
    pub fn selected_page(&self) -> Option<&str> {
        self.selected.as_ref().map(|s| s.page_id.as_str())
    }

    /// Apply a bridge message. Last writer wins.
    pub fn apply(&mut self, message: BridgeMessage) {
        match message {
            BridgeMessage::Hover {
                page_id,
                tag_name,
                rect,
            } => {
                self.hovered = Some(HoverDescriptor {
                    page_id,
                    tag_name,
                    rect,
                });
            }
            BridgeMessage::HoverClear { page_id } => {
                if self.hovered.as_ref().is_some_and(|h| h.page_id == page_id) {
                    self.hovered = None;
                }
            }
            BridgeMessage::Select {
                page_id,
                path,
                info,
                rect,
            } => {
                tracing::debug!("Selected <{}> at {path} in {page_id}", info.tag_name);
                self.selected = Some(SelectionDescriptor {
                    page_id,
                    path,
                    rect,
                    info,
                });
            }
        }
    }

    /// Clear the selection. Hover is untouched.
    pub fn deselect(&mut self) -> bool {
        self.selected.take().is_some()
    }

    /// Clear hover.
    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    /// Clear both slots if they reference `page_id`. Returns true if the
    /// selection was cleared.
    pub fn clear_page(&mut self, page_id: &str) -> bool {
        if self.hovered.as_ref().is_some_and(|h| h.page_id == page_id) {
            self.hovered = None;
        }
        if self.selected_page() == Some(page_id) {
            self.selected = None;
            return true;
        }
        false
    }

    /// Patch the cached snapshot after a mutation was sent.
    pub fn apply_mutation(&mut self, mutation: &Mutation) {
        if let Some(selected) = &mut self.selected {
            mutation.apply_to_snapshot(&mut selected.info);
        }
    }

    /// Update the selection rect after the node moved.
    pub fn set_selected_rect(&mut self, rect: Rect) {
        if let Some(selected) = &mut self.selected {
            selected.rect = rect;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{DomPath, ElementSnapshot};

    fn select(page: &str) -> BridgeMessage {
        BridgeMessage::Select {
            page_id: page.into(),
            path: DomPath::default(),
            info: ElementSnapshot {
                tag_name: "h1".into(),
                text: "Hi".into(),
                ..ElementSnapshot::default()
            },
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        }
    }

    fn hover(page: &str) -> BridgeMessage {
        BridgeMessage::Hover {
            page_id: page.into(),
            tag_name: "p".into(),
            rect: Rect::default(),
        }
    }

    #[test]
    fn test_last_writer_wins() {
        let mut model = SelectionModel::new();
        model.apply(select("a"));
        model.apply(select("b"));
        assert_eq!(model.selected_page(), Some("b"));
    }

    #[test]
    fn test_deselect_keeps_hover() {
        let mut model = SelectionModel::new();
        model.apply(hover("a"));
        model.apply(select("a"));
        assert!(model.deselect());
        assert!(model.selected().is_none());
        assert!(model.hovered().is_some());
    }

    #[test]
    fn test_hover_clear_from_other_page_is_ignored() {
        let mut model = SelectionModel::new();
        model.apply(hover("b"));
        model.apply(BridgeMessage::HoverClear {
            page_id: "a".into(),
        });
        assert!(model.hovered().is_some());
        model.apply(BridgeMessage::HoverClear {
            page_id: "b".into(),
        });
        assert!(model.hovered().is_none());
    }

    #[test]
    fn test_clear_page() {
        let mut model = SelectionModel::new();
        model.apply(hover("a"));
        model.apply(select("a"));
        assert!(!model.clear_page("b"));
        assert!(model.clear_page("a"));
        assert!(model.hovered().is_none());
    }

    #[test]
    fn test_optimistic_snapshot_patch() {
        let mut model = SelectionModel::new();
        model.apply(select("a"));
        model.apply_mutation(&Mutation::Text {
            text: "Hello".into(),
        });
        assert_eq!(model.selected().map(|s| s.info.text.as_str()), Some("Hello"));
    }
}
