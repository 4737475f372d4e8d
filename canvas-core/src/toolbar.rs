//! The contextual selection toolbar.
//!
//! The toolbar only exists while something is selected. It holds which panel
//! is open plus the drafts seeded from the selection snapshot, and turns
//! panel actions into [`Mutation`]s for the workspace to dispatch.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::element::{Point, Rect, SelectionDescriptor};
use crate::error::{CanvasError, CanvasResult};
use crate::protocol::Mutation;

/// Gap between the toolbar and the top edge of the selection.
pub const TOOLBAR_OFFSET: f32 = 8.0;

/// Fixed color palette offered by the color panel.
pub const PALETTE: &[&str] = &[
    "#000000", "#ffffff", "#ef4444", "#f97316", "#eab308", "#22c55e", "#3b82f6", "#6366f1",
    "#a855f7", "#ec4899", "#64748b", "#0f172a",
];

/// Toolbar panels. At most one is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolbarPanel {
    /// Edit text.
    Text,
    /// Replace an image source; images only.
    Image,
    /// Pick an icon.
    Icon,
    /// Pick a palette color.
    Color,
}

/// Which property a palette color applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTarget {
    /// Text color.
    #[default]
    Text,
    /// Background color.
    Background,
}

impl ColorTarget {
    /// The style property the target maps to.
    #[must_use]
    pub fn property(self) -> &'static str {
        match self {
            Self::Text => "color",
            Self::Background => "backgroundColor",
        }
    }
}

/// Looks up icons by name.
///
/// Failures are local render errors: the caller reports them and keeps the
/// icon panel open.
pub trait IconSource {
    /// Names available to the picker.
    fn names(&self) -> Vec<String>;

    /// Render an icon as inline markup.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Render`] if the icon is unknown or cannot be
    /// rendered.
    fn render(&self, name: &str) -> CanvasResult<String>;
}

/// Toolbar state bound to the current selection.
#[derive(Debug, Clone, Default)]
pub struct Toolbar {
    panel: Option<ToolbarPanel>,
    text_draft: String,
    image_url_draft: String,
}

impl Toolbar {
    /// Create a closed toolbar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open panel, if any.
    #[must_use]
    pub fn panel(&self) -> Option<ToolbarPanel> {
        self.panel
    }

    /// Text draft.
    #[must_use]
    pub fn text_draft(&self) -> &str {
        &self.text_draft
    }

    /// Image URL draft.
    #[must_use]
    pub fn image_url_draft(&self) -> &str {
        &self.image_url_draft
    }

    /// Open a panel for the selection, closing any other.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidOperation`] when opening the image
    /// panel on a non-image node.
    pub fn open(&mut self, panel: ToolbarPanel, selection: &SelectionDescriptor) -> CanvasResult<()> {
        match panel {
            ToolbarPanel::Text => self.text_draft.clone_from(&selection.info.text),
            ToolbarPanel::Image => {
                if !selection.info.is_image() {
                    return Err(CanvasError::InvalidOperation(format!(
                        "image panel needs an <img>, got <{}>",
                        selection.info.tag_name
                    )));
                }
                self.image_url_draft = selection.info.image_src.clone().unwrap_or_default();
            }
            ToolbarPanel::Icon | ToolbarPanel::Color => {}
        }
        self.panel = Some(panel);
        Ok(())
    }

    /// Close the open panel.
    pub fn close(&mut self) {
        self.panel = None;
        self.text_draft.clear();
        self.image_url_draft.clear();
    }

    /// Edit the text draft.
    pub fn set_text_draft(&mut self, text: impl Into<String>) {
        self.text_draft = text.into();
    }

    /// Edit the image URL draft.
    pub fn set_image_url_draft(&mut self, url: impl Into<String>) {
        self.image_url_draft = url.into();
    }

    /// Mutation committing the text draft.
    #[must_use]
    pub fn text_mutation(&self) -> Mutation {
        Mutation::Text {
            text: self.text_draft.clone(),
        }
    }

    /// Mutation committing the image URL draft.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidOperation`] if the draft is empty.
    pub fn image_url_mutation(&self) -> CanvasResult<Mutation> {
        let src = self.image_url_draft.trim();
        if src.is_empty() {
            return Err(CanvasError::InvalidOperation("image URL is empty".into()));
        }
        Ok(Mutation::Src {
            src: src.to_string(),
        })
    }

    /// Anchor point for a toolbar of the given size above a projected rect.
    #[must_use]
    pub fn position(projected: Rect, width: f32, height: f32) -> Point {
        Point {
            x: projected.center_x() - width / 2.0,
            y: projected.y - TOOLBAR_OFFSET - height,
        }
    }
}

/// Mutation replacing an image with local file bytes.
///
/// # Errors
///
/// Returns [`CanvasError::Render`] if the bytes are empty or the MIME type is
/// not an image type.
pub fn image_file_mutation(bytes: &[u8], mime: &str) -> CanvasResult<Mutation> {
    Ok(Mutation::Src {
        src: data_url(bytes, mime)?,
    })
}

/// Encode bytes as a `data:` URL.
///
/// # Errors
///
/// Returns [`CanvasError::Render`] if the bytes are empty or the MIME type is
/// not an image type.
pub fn data_url(bytes: &[u8], mime: &str) -> CanvasResult<String> {
    if bytes.is_empty() {
        return Err(CanvasError::Render("image file is empty".into()));
    }
    if !mime.starts_with("image/") {
        return Err(CanvasError::Render(format!("not an image type: {mime}")));
    }
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// Guess an image MIME type from a file extension.
#[must_use]
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Mutation swapping the node's content for a rendered icon.
///
/// # Errors
///
/// Propagates the icon source's render error.
pub fn icon_mutation(source: &dyn IconSource, name: &str) -> CanvasResult<Mutation> {
    let html = source.render(name)?;
    Ok(Mutation::Html {
        html,
        replace: true,
    })
}

/// Mutation applying a color to the given target.
#[must_use]
pub fn color_mutation(color: &str, target: ColorTarget) -> Mutation {
    Mutation::style_property(target.property(), color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{DomPath, ElementSnapshot};

    struct OneIcon;

    impl IconSource for OneIcon {
        fn names(&self) -> Vec<String> {
            vec!["star".into()]
        }

        fn render(&self, name: &str) -> CanvasResult<String> {
            if name == "star" {
                Ok("<svg></svg>".into())
            } else {
                Err(CanvasError::Render(format!("unknown icon {name}")))
            }
        }
    }

    fn selection(tag: &str) -> SelectionDescriptor {
        SelectionDescriptor {
            page_id: "home".into(),
            path: DomPath::default(),
            rect: Rect::new(100.0, 200.0, 50.0, 20.0),
            info: ElementSnapshot {
                tag_name: tag.into(),
                text: "Seed".into(),
                image_src: (tag == "img").then(|| "a.png".to_string()),
                ..ElementSnapshot::default()
            },
        }
    }

    #[test]
    fn test_panels_are_exclusive_and_seeded() {
        let mut toolbar = Toolbar::new();
        toolbar.open(ToolbarPanel::Text, &selection("h1")).expect("open");
        assert_eq!(toolbar.text_draft(), "Seed");
        toolbar.open(ToolbarPanel::Color, &selection("h1")).expect("open");
        assert_eq!(toolbar.panel(), Some(ToolbarPanel::Color));
    }

    #[test]
    fn test_image_panel_only_for_images() {
        let mut toolbar = Toolbar::new();
        assert!(toolbar.open(ToolbarPanel::Image, &selection("p")).is_err());
        assert_eq!(toolbar.panel(), None);
        toolbar.open(ToolbarPanel::Image, &selection("img")).expect("open");
        assert_eq!(toolbar.image_url_draft(), "a.png");
    }

    #[test]
    fn test_position_above_and_centred() {
        let point = Toolbar::position(Rect::new(100.0, 200.0, 50.0, 20.0), 30.0, 10.0);
        assert!((point.x - 110.0).abs() < f32::EPSILON);
        assert!((point.y - 182.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_data_url() {
        assert_eq!(
            data_url(b"abc", "image/png").expect("encode"),
            "data:image/png;base64,YWJj"
        );
        assert!(data_url(b"", "image/png").is_err());
        assert!(data_url(b"abc", "text/plain").is_err());
        assert_eq!(mime_for_extension("JPG"), Some("image/jpeg"));
    }

    #[test]
    fn test_icon_mutation() {
        assert_eq!(
            icon_mutation(&OneIcon, "star").expect("render"),
            Mutation::Html {
                html: "<svg></svg>".into(),
                replace: true,
            }
        );
        assert!(matches!(
            icon_mutation(&OneIcon, "moon"),
            Err(CanvasError::Render(_))
        ));
    }

    #[test]
    fn test_color_mutation() {
        let mutation = color_mutation(PALETTE[2], ColorTarget::Background);
        let Mutation::Style { style } = mutation else {
            panic!("expected style");
        };
        assert_eq!(style["backgroundColor"], "#ef4444");
    }
}
