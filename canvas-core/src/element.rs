//! Element-level descriptors exchanged between surfaces and the host.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle.
///
/// Rects captured by a surface are in that surface's local coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// X position (pixels from left).
    pub x: f32,
    /// Y position (pixels from top).
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Rect {
    /// Create a new rect.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if a point is within this rect (edges inclusive).
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Horizontal centre.
    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// A point in some coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

/// One step of a [`DomPath`]: a tag and its index among same-tag siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
    /// Lowercase tag name.
    pub tag: String,
    /// Zero-based index among siblings with the same tag.
    pub index: usize,
}

/// Position of a node from the document root down, by same-tag sibling index.
///
/// Stable across in-place edits that don't add or remove same-tag siblings
/// along the path. A reload invalidates it in general.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomPath(pub Vec<PathStep>);

impl DomPath {
    /// The steps from the root.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Check if the path is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DomPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{}:nth-of-type({})", step.tag, step.index + 1)?;
        }
        Ok(())
    }
}

/// A read-only capture of one node at the moment it was selected.
///
/// Not kept in sync with the document; the host patches it optimistically
/// after issuing mutations, and a fresh click re-captures it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// Lowercase tag name.
    pub tag_name: String,
    /// Text content.
    pub text: String,
    /// Serialized inner markup.
    pub inner_html: String,
    /// Element attributes.
    pub attributes: BTreeMap<String, String>,
    /// Subset of computed style properties, colors as hex.
    pub computed_style: BTreeMap<String, String>,
    /// Resolved image source for image nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_src: Option<String>,
}

impl ElementSnapshot {
    /// Check if the snapshot is of an image node.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.tag_name == "img"
    }
}

/// The sticky selection: which node of which page, where, and what it held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDescriptor {
    /// Page the node lives in.
    pub page_id: String,
    /// Path to re-target the node.
    pub path: DomPath,
    /// Surface-local bounding rect.
    pub rect: Rect,
    /// Snapshot taken at selection time.
    pub info: ElementSnapshot,
}

/// The transient hover target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverDescriptor {
    /// Page the node lives in.
    pub page_id: String,
    /// Lowercase tag name.
    pub tag_name: String,
    /// Surface-local bounding rect.
    pub rect: Rect,
}
