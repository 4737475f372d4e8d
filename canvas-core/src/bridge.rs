//! Native interaction bridge.
//!
//! The in-process counterpart of the injected bridge script: it owns the
//! live document of one rendering surface, turns pointer input into
//! [`BridgeMessage`]s and applies [`HostCommand`]s to the selected node.
//! Messages queue in an outbox and are drained by the host in order.

use std::collections::VecDeque;

use crate::dom::{Document, NodeId, SerializeOptions, HOVER_MARKER, SELECTED_MARKER};
use crate::element::{ElementSnapshot, Rect};
use crate::protocol::{BridgeMessage, HostCommand, Mutation};
use crate::state::ToolMode;
use crate::style;
use crate::theme;

/// Live document plus bridge state for one surface.
#[derive(Debug, Clone)]
pub struct SurfaceBridge {
    page_id: String,
    doc: Document,
    width: f32,
    content_height: f32,
    hovered: Option<NodeId>,
    selected: Option<NodeId>,
    tool_mode: ToolMode,
    outbox: VecDeque<BridgeMessage>,
}

impl SurfaceBridge {
    /// Load themed markup into a fresh document laid out at `width`.
    #[must_use]
    pub fn load(page_id: impl Into<String>, themed_markup: &str, width: f32) -> Self {
        let mut doc = Document::parse(themed_markup);
        let content_height = doc.layout(width);
        Self {
            page_id: page_id.into(),
            doc,
            width,
            content_height,
            hovered: None,
            selected: None,
            tool_mode: ToolMode::Cursor,
            outbox: VecDeque::new(),
        }
    }

    /// Page this bridge reports for.
    #[must_use]
    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// The live document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Active tool.
    #[must_use]
    pub fn tool_mode(&self) -> ToolMode {
        self.tool_mode
    }

    /// Height of the laid-out content.
    #[must_use]
    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    /// Currently hovered node.
    #[must_use]
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Currently selected node.
    #[must_use]
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Surface-local rect of the selected node.
    #[must_use]
    pub fn selected_rect(&self) -> Option<Rect> {
        self.selected
            .filter(|&id| self.doc.is_attached(id))
            .map(|id| self.doc.rect(id))
    }

    /// Registry form of the live document.
    #[must_use]
    pub fn page_markup(&self) -> String {
        theme::page_markup(&self.doc)
    }

    /// Take all pending messages, oldest first.
    pub fn drain_messages(&mut self) -> Vec<BridgeMessage> {
        self.outbox.drain(..).collect()
    }

    // -----------------------------------------------------------------------
    // Pointer input
    // -----------------------------------------------------------------------

    /// Pointer moved to a surface-local point.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if self.tool_mode != ToolMode::Cursor {
            return;
        }
        let target = self
            .doc
            .hit_test(x, y)
            .filter(|&id| !self.doc.is_root_element(id));
        if target == self.hovered {
            return;
        }
        self.clear_hover_marker();
        match target {
            Some(id) => {
                self.doc.set_attr(id, HOVER_MARKER, "");
                self.hovered = Some(id);
                self.outbox.push_back(BridgeMessage::Hover {
                    page_id: self.page_id.clone(),
                    tag_name: self.doc.tag(id).unwrap_or_default().to_string(),
                    rect: self.doc.rect(id),
                });
            }
            None => self.send_hover_clear(),
        }
    }

    /// Pointer left the surface.
    pub fn pointer_leave(&mut self) {
        self.clear_hover_marker();
        self.send_hover_clear();
    }

    /// Click at a surface-local point.
    pub fn click(&mut self, x: f32, y: f32) {
        if self.tool_mode != ToolMode::Cursor {
            return;
        }
        let Some(id) = self.doc.hit_test(x, y) else {
            return;
        };
        self.clear_selected_marker();
        self.doc.set_attr(id, SELECTED_MARKER, "");
        self.selected = Some(id);
        self.outbox.push_back(BridgeMessage::Select {
            page_id: self.page_id.clone(),
            path: self.doc.path_of(id),
            info: self.snapshot(id),
            rect: self.doc.rect(id),
        });
    }

    /// Capture the snapshot of a node as it is now.
    #[must_use]
    pub fn snapshot(&self, id: NodeId) -> ElementSnapshot {
        let tag_name = self.doc.tag(id).unwrap_or_default().to_string();
        let attributes = self
            .doc
            .attrs(id)
            .into_iter()
            .filter(|(name, _)| name != HOVER_MARKER && name != SELECTED_MARKER)
            .collect();
        let image_src = if tag_name == "img" {
            self.doc.attr(id, "src")
        } else {
            None
        };
        ElementSnapshot {
            text: self.doc.text_content(id),
            inner_html: self.doc.inner_html_with(id, SerializeOptions::clean()),
            attributes,
            computed_style: style::computed_subset(&self.doc, id),
            image_src,
            tag_name,
        }
    }

    // -----------------------------------------------------------------------
    // Host commands
    // -----------------------------------------------------------------------

    /// Apply a host command. Returns true if the document changed.
    pub fn handle_command(&mut self, command: &HostCommand) -> bool {
        match command {
            HostCommand::SetTool { mode } => {
                self.tool_mode = *mode;
                if *mode != ToolMode::Cursor {
                    self.clear_hover_marker();
                    if let Some(id) = self.selected {
                        self.doc.remove_attr(id, SELECTED_MARKER);
                    }
                }
                false
            }
            HostCommand::Remove => {
                let Some(id) = self.selected.take() else {
                    return false;
                };
                let removed = self.doc.detach(id);
                if self.hovered.is_some_and(|h| !self.doc.is_attached(h)) {
                    self.hovered = None;
                }
                self.relayout();
                removed
            }
            HostCommand::Update { payload } => {
                let Some(id) = self.selected.filter(|&id| self.doc.is_attached(id)) else {
                    tracing::debug!("Update for {} ignored: nothing selected", self.page_id);
                    return false;
                };
                self.apply_mutation(id, payload);
                if self.hovered.is_some_and(|h| !self.doc.is_attached(h)) {
                    self.hovered = None;
                }
                self.relayout();
                true
            }
        }
    }

    fn apply_mutation(&mut self, id: NodeId, mutation: &Mutation) {
        match mutation {
            Mutation::Text { text } => self.doc.set_text(id, text),
            Mutation::Src { src } => self.doc.set_attr(id, "src", src),
            Mutation::Html { html, replace: true } => self.doc.set_inner_html(id, html),
            Mutation::Html {
                html,
                replace: false,
            } => self.doc.append_html(id, html),
            Mutation::Style { style: updates } => {
                let existing = self.doc.attr(id, "style").unwrap_or_default();
                let merged = style::merge_inline(&existing, updates);
                if merged.is_empty() {
                    self.doc.remove_attr(id, "style");
                } else {
                    self.doc.set_attr(id, "style", &merged);
                }
            }
        }
    }

    fn relayout(&mut self) {
        self.content_height = self.doc.layout(self.width);
    }

    fn clear_hover_marker(&mut self) {
        if let Some(id) = self.hovered.take() {
            self.doc.remove_attr(id, HOVER_MARKER);
        }
    }

    fn clear_selected_marker(&mut self) {
        if let Some(id) = self.selected.take() {
            self.doc.remove_attr(id, SELECTED_MARKER);
        }
    }

    fn send_hover_clear(&mut self) {
        self.outbox.push_back(BridgeMessage::HoverClear {
            page_id: self.page_id.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::DesignSystem;
    use crate::theme::apply_theme;

    const PAGE: &str = r#"<body><h1>Title</h1><p style="color: rgb(255, 0, 0)">Body text</p><img src="a.png" height="100"></body>"#;

    fn bridge() -> SurfaceBridge {
        let themed = apply_theme(&DesignSystem::default(), PAGE, "home");
        SurfaceBridge::load("home", &themed, 800.0)
    }

    #[test]
    fn test_hover_moves_single_marker() {
        let mut bridge = bridge();
        bridge.pointer_move(10.0, 10.0);
        bridge.pointer_move(10.0, 60.0);
        assert_eq!(bridge.document().elements_with_attr(HOVER_MARKER).len(), 1);

        let messages = bridge.drain_messages();
        assert_eq!(messages.len(), 2);
        match &messages[1] {
            BridgeMessage::Hover { tag_name, .. } => assert_eq!(tag_name, "p"),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_hover_same_node_sends_nothing() {
        let mut bridge = bridge();
        bridge.pointer_move(10.0, 10.0);
        bridge.pointer_move(20.0, 12.0);
        assert_eq!(bridge.drain_messages().len(), 1);
    }

    #[test]
    fn test_hover_outside_content_clears() {
        let mut bridge = bridge();
        bridge.pointer_move(10.0, 10.0);
        bridge.pointer_move(10.0, 5000.0);
        assert!(bridge.hovered().is_none());
        assert!(bridge.document().elements_with_attr(HOVER_MARKER).is_empty());
        let messages = bridge.drain_messages();
        assert!(matches!(messages[1], BridgeMessage::HoverClear { .. }));
    }

    #[test]
    fn test_pointer_leave_clears() {
        let mut bridge = bridge();
        bridge.pointer_move(10.0, 10.0);
        bridge.pointer_leave();
        assert!(bridge.document().elements_with_attr(HOVER_MARKER).is_empty());
        assert!(matches!(
            bridge.drain_messages().last(),
            Some(BridgeMessage::HoverClear { .. })
        ));
    }

    #[test]
    fn test_click_captures_snapshot() {
        let mut bridge = bridge();
        bridge.click(10.0, 60.0);
        let messages = bridge.drain_messages();
        let BridgeMessage::Select { path, info, .. } = &messages[0] else {
            panic!("expected select");
        };
        assert_eq!(info.tag_name, "p");
        assert_eq!(info.text, "Body text");
        assert_eq!(info.computed_style["color"], "#ff0000");
        assert_eq!(path.to_string(), "html:nth-of-type(1) > body:nth-of-type(1) > p:nth-of-type(1)");
        assert!(!info.attributes.contains_key(SELECTED_MARKER));
    }

    #[test]
    fn test_click_image_reports_src() {
        let mut bridge = bridge();
        bridge.click(10.0, 120.0);
        let messages = bridge.drain_messages();
        let BridgeMessage::Select { info, .. } = &messages[0] else {
            panic!("expected select");
        };
        assert!(info.is_image());
        assert_eq!(info.image_src.as_deref(), Some("a.png"));
    }

    #[test]
    fn test_update_text_then_reclick() {
        let mut bridge = bridge();
        bridge.click(10.0, 10.0);
        let changed = bridge.handle_command(&HostCommand::Update {
            payload: Mutation::Text {
                text: "Hello".into(),
            },
        });
        assert!(changed);
        bridge.drain_messages();

        bridge.click(10.0, 10.0);
        let messages = bridge.drain_messages();
        let BridgeMessage::Select { info, .. } = &messages[0] else {
            panic!("expected select");
        };
        assert_eq!(info.text, "Hello");
        assert!(bridge.page_markup().contains("<h1>Hello</h1>"));
    }

    #[test]
    fn test_style_update_merges() {
        let mut bridge = bridge();
        bridge.click(10.0, 60.0);
        bridge.handle_command(&HostCommand::Update {
            payload: Mutation::style_property("backgroundColor", "#00ff00"),
        });
        assert!(bridge
            .page_markup()
            .contains(r#"<p style="color: rgb(255, 0, 0); background-color: #00ff00;">"#));
    }

    #[test]
    fn test_remove_detaches_selected() {
        let mut bridge = bridge();
        bridge.click(10.0, 10.0);
        assert!(bridge.handle_command(&HostCommand::Remove));
        assert!(bridge.selected().is_none());
        assert!(!bridge.page_markup().contains("<h1>"));
        assert!(!bridge.handle_command(&HostCommand::Remove));
    }

    #[test]
    fn test_update_without_selection_is_ignored() {
        let mut bridge = bridge();
        let before = bridge.page_markup();
        assert!(!bridge.handle_command(&HostCommand::Update {
            payload: Mutation::Text { text: "x".into() },
        }));
        assert_eq!(bridge.page_markup(), before);
    }

    #[test]
    fn test_pan_mode_disables_pointer_and_clears_markers() {
        let mut bridge = bridge();
        bridge.pointer_move(10.0, 10.0);
        bridge.click(10.0, 10.0);
        bridge.handle_command(&HostCommand::SetTool {
            mode: ToolMode::Pan,
        });
        assert!(bridge.document().elements_with_attr(HOVER_MARKER).is_empty());
        assert!(bridge.document().elements_with_attr(SELECTED_MARKER).is_empty());

        bridge.drain_messages();
        bridge.pointer_move(10.0, 60.0);
        bridge.click(10.0, 60.0);
        assert!(bridge.drain_messages().is_empty());
    }

    #[test]
    fn test_page_markup_strips_theme_and_markers() {
        let mut bridge = bridge();
        bridge.pointer_move(10.0, 10.0);
        bridge.click(10.0, 10.0);
        assert_eq!(bridge.page_markup(), PAGE);
    }
}
