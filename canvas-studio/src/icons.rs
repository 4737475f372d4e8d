//! Built-in icon set for the toolbar's icon panel.

use canvas_core::{CanvasError, CanvasResult, IconSource};

const VIEW_BOX: &str = "0 0 24 24";

/// Name and SVG path data for each built-in icon.
const ICONS: &[(&str, &str)] = &[
    ("arrow-right", "M5 12h14M13 6l6 6-6 6"),
    ("check", "M5 13l4 4L19 7"),
    ("close", "M6 6l12 12M18 6L6 18"),
    (
        "heart",
        "M12 21s-7-4.5-9.5-9A5.5 5.5 0 0 1 12 6a5.5 5.5 0 0 1 9.5 6c-2.5 4.5-9.5 9-9.5 9z",
    ),
    ("home", "M3 11l9-8 9 8M5 10v10h14V10"),
    ("menu", "M4 6h16M4 12h16M4 18h16"),
    ("search", "M11 18a7 7 0 1 0 0-14 7 7 0 0 0 0 14zM21 21l-5-5"),
    ("star", "M12 3l2.9 6 6.1.9-4.5 4.3 1.1 6.3L12 17.8 6.4 20.5l1.1-6.3L3 9.9 9.1 9z"),
];

/// Stroke icons rendered as inline SVG in the current text color.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinIcons {
    size: u32,
}

impl BuiltinIcons {
    /// Icons rendered at `size` pixels.
    #[must_use]
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    fn size(self) -> u32 {
        if self.size == 0 {
            24
        } else {
            self.size
        }
    }
}

impl IconSource for BuiltinIcons {
    fn names(&self) -> Vec<String> {
        ICONS.iter().map(|(name, _)| (*name).to_string()).collect()
    }

    fn render(&self, name: &str) -> CanvasResult<String> {
        let (_, path) = ICONS
            .iter()
            .find(|(icon, _)| *icon == name)
            .ok_or_else(|| CanvasError::Render(format!("unknown icon: {name}")))?;
        let size = self.size();
        Ok(format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{size}\" height=\"{size}\" \
             viewBox=\"{VIEW_BOX}\" fill=\"none\" stroke=\"currentColor\" stroke-width=\"2\" \
             stroke-linecap=\"round\" stroke-linejoin=\"round\"><path d=\"{path}\"/></svg>"
        ))
    }
}
