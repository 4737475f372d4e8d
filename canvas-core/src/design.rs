//! The design system: global theming parameters applied to every page.

use serde::{Deserialize, Serialize};

/// Light or dark rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Light backgrounds (no overrides).
    #[default]
    Light,
    /// Dark backgrounds with light text.
    Dark,
}

/// Theming parameters. Compared by value to decide on reloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSystem {
    /// Accent color as hex.
    pub accent_color: String,
    /// Corner radius in pixels.
    pub corner_radius: u32,
    /// Border/stroke width in pixels.
    pub stroke_width: u32,
    /// Font family stack.
    pub font: String,
    /// Light or dark.
    pub color_mode: ColorMode,
    /// Named style variant passed to the regeneration service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl Default for DesignSystem {
    fn default() -> Self {
        Self {
            accent_color: "#3b82f6".to_string(),
            corner_radius: 8,
            stroke_width: 1,
            font: "Inter, system-ui, sans-serif".to_string(),
            color_mode: ColorMode::Light,
            variant: None,
        }
    }
}

impl DesignSystem {
    /// Set the accent color.
    #[must_use]
    pub fn with_accent(mut self, accent: impl Into<String>) -> Self {
        self.accent_color = accent.into();
        self
    }

    /// Set the color mode.
    #[must_use]
    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    /// Set the corner radius.
    #[must_use]
    pub fn with_corner_radius(mut self, radius: u32) -> Self {
        self.corner_radius = radius;
        self
    }

    /// Check if dark mode is active.
    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.color_mode == ColorMode::Dark
    }
}
