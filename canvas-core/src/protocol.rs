//! Messages crossing the boundary between a rendering surface and the host.
//!
//! Surface → host: [`BridgeMessage`] (`hover`, `hover-clear`, `select`).
//! Host → surface: [`HostCommand`] (`set-tool`, `update`, `remove`).
//!
//! Both directions are JSON objects tagged by a `type` field. The host
//! treats anything it cannot parse as noise and drops it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color;
use crate::dom::{encode_text, Document};
use crate::element::{DomPath, ElementSnapshot, Rect};
use crate::state::ToolMode;
use crate::style::camel_to_kebab;

/// A message reported by a surface's interaction bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BridgeMessage {
    /// The pointer is over a new node.
    #[serde(rename_all = "camelCase")]
    Hover {
        /// Page the surface renders.
        page_id: String,
        /// Lowercase tag name.
        tag_name: String,
        /// Surface-local rect.
        rect: Rect,
    },
    /// No eligible node is under the pointer.
    #[serde(rename_all = "camelCase")]
    HoverClear {
        /// Page the surface renders.
        page_id: String,
    },
    /// A node was clicked.
    #[serde(rename_all = "camelCase")]
    Select {
        /// Page the surface renders.
        page_id: String,
        /// Path to re-target the node.
        path: DomPath,
        /// Snapshot of the node.
        info: ElementSnapshot,
        /// Surface-local rect.
        rect: Rect,
    },
}

impl BridgeMessage {
    /// Page the message originates from.
    #[must_use]
    pub fn page_id(&self) -> &str {
        match self {
            Self::Hover { page_id, .. }
            | Self::HoverClear { page_id }
            | Self::Select { page_id, .. } => page_id,
        }
    }

    /// Parse a raw message after checking its shape.
    ///
    /// Returns `None` for anything that is not an object with a known
    /// `type` and the fields that type requires.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let kind = value.as_object()?.get("type")?.as_str()?;
        if !matches!(kind, "hover" | "hover-clear" | "select") {
            tracing::debug!("Ignoring bridge message of unknown type {kind:?}");
            return None;
        }
        match serde_json::from_value(value.clone()) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!("Ignoring malformed {kind} message: {e}");
                None
            }
        }
    }

    /// Parse a raw JSON string; see [`BridgeMessage::from_value`].
    #[must_use]
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str::<Value>(json)
            .ok()
            .and_then(|v| Self::from_value(&v))
    }
}

/// A mutation applied to the selected node.
///
/// The wire shape is the bare payload object: `{"text": ..}`, `{"src": ..}`,
/// `{"html": .., "replace": true}` or `{"style": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mutation {
    /// Replace the text content.
    Text {
        /// New text.
        text: String,
    },
    /// Replace an image source.
    Src {
        /// New source URL or data URL.
        src: String,
    },
    /// Replace or append inner markup (icon swaps use `replace`).
    Html {
        /// Markup to insert.
        html: String,
        /// Replace existing children instead of appending.
        #[serde(default)]
        replace: bool,
    },
    /// Merge inline style properties (camelCase keys).
    Style {
        /// Properties to set; empty values remove.
        style: BTreeMap<String, String>,
    },
}

impl Mutation {
    /// Set a single style property.
    #[must_use]
    pub fn style_property(name: &str, value: &str) -> Self {
        let mut style = BTreeMap::new();
        style.insert(name.to_string(), value.to_string());
        Self::Style { style }
    }

    /// Patch a cached snapshot the way the mutation will change the node.
    pub fn apply_to_snapshot(&self, snapshot: &mut ElementSnapshot) {
        match self {
            Self::Text { text } => {
                snapshot.text = text.trim().to_string();
                snapshot.inner_html = encode_text(text);
            }
            Self::Src { src } => {
                snapshot.image_src = Some(src.clone());
                snapshot.attributes.insert("src".to_string(), src.clone());
            }
            Self::Html { html, replace } => {
                let fragment = if *replace {
                    html.clone()
                } else {
                    format!("{}{html}", snapshot.inner_html)
                };
                let parsed = Document::parse(&fragment);
                snapshot.text = parsed.text_content(Document::ROOT);
                snapshot.inner_html = fragment;
            }
            Self::Style { style } => {
                for (key, value) in style {
                    let value = if camel_to_kebab(key).ends_with("color") {
                        color::to_hex(value)
                    } else {
                        value.clone()
                    };
                    snapshot.computed_style.insert(key.clone(), value);
                }
            }
        }
    }
}

/// A command sent from the host into a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostCommand {
    /// Change the active tool.
    SetTool {
        /// New tool.
        mode: ToolMode,
    },
    /// Mutate the selected node. Fire-and-forget.
    Update {
        /// The mutation.
        payload: Mutation,
    },
    /// Detach the selected node from its parent.
    Remove,
}
