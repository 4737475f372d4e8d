//! Command-line arguments and studio configuration.

use std::path::PathBuf;

use canvas_core::history::DEFAULT_HISTORY_DEPTH;
use canvas_core::{ColorMode, DesignSystem, FrameLayout, WorkspaceConfig};
use clap::Parser;

/// Default regeneration service endpoint.
pub const DEFAULT_GENERATOR_URL: &str = "http://localhost:8787/generate";

/// A requested variant for one page, parsed from `page=variant` or `page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRequest {
    /// Page to regenerate.
    pub page_id: String,
    /// Variant name; `None` falls back to the design's variant.
    pub variant: Option<String>,
}

impl std::str::FromStr for VariantRequest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (page, variant) = match s.split_once('=') {
            Some((page, variant)) => (page.trim(), Some(variant.trim())),
            None => (s.trim(), None),
        };
        if page.is_empty() {
            return Err(format!("missing page id in {s:?}"));
        }
        Ok(Self {
            page_id: page.to_string(),
            variant: variant.filter(|v| !v.is_empty()).map(str::to_string),
        })
    }
}

/// Command-line arguments for page-canvas.
#[derive(Debug, Clone, Parser)]
#[command(name = "page-canvas")]
#[command(about = "Theme, regenerate and export a canvas of HTML pages")]
#[command(version)]
pub struct CliArgs {
    /// Directory of `*.html` pages to load
    #[arg(long, env = "PAGE_CANVAS_PAGES", default_value = "pages")]
    pub pages: PathBuf,

    /// Directory the themed pages are written to
    #[arg(long, env = "PAGE_CANVAS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Regeneration service URL
    #[arg(long, env = "PAGE_CANVAS_GENERATOR_URL", default_value = DEFAULT_GENERATOR_URL)]
    pub generator_url: String,

    /// Variant to generate, as `page` or `page=variant` (repeatable)
    #[arg(long = "variant", value_name = "PAGE[=VARIANT]")]
    pub variants: Vec<VariantRequest>,

    /// Canvas container width in pixels
    #[arg(long, env = "PAGE_CANVAS_WIDTH", default_value = "1440")]
    pub width: f32,

    /// Canvas container height in pixels
    #[arg(long, env = "PAGE_CANVAS_HEIGHT", default_value = "900")]
    pub height: f32,

    /// Page frame width in pixels
    #[arg(long, env = "PAGE_CANVAS_FRAME_WIDTH", default_value = "1024")]
    pub frame_width: f32,

    /// Page frame height in pixels
    #[arg(long, env = "PAGE_CANVAS_FRAME_HEIGHT", default_value = "768")]
    pub frame_height: f32,

    /// Undo levels kept
    #[arg(long, env = "PAGE_CANVAS_HISTORY_DEPTH", default_value_t = DEFAULT_HISTORY_DEPTH)]
    pub history_depth: usize,

    /// Accent color as hex
    #[arg(long, env = "PAGE_CANVAS_ACCENT")]
    pub accent: Option<String>,

    /// Corner radius in pixels
    #[arg(long, env = "PAGE_CANVAS_RADIUS")]
    pub radius: Option<u32>,

    /// Render pages in dark mode
    #[arg(long, env = "PAGE_CANVAS_DARK")]
    pub dark: bool,

    /// Default variant name sent to the regeneration service
    #[arg(long, env = "PAGE_CANVAS_DEFAULT_VARIANT")]
    pub default_variant: Option<String>,

    /// Copy all page markup to the clipboard when done
    #[arg(long)]
    pub copy: bool,
}

/// Studio configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Directory pages are loaded from.
    pub pages_dir: PathBuf,
    /// Directory themed pages are written to.
    pub output_dir: Option<PathBuf>,
    /// Regeneration service URL.
    pub generator_url: String,
    /// Variants to generate on startup.
    pub variants: Vec<VariantRequest>,
    /// Workspace sizing.
    pub workspace: WorkspaceConfig,
    /// Initial design system.
    pub design: DesignSystem,
    /// Copy markup to the clipboard when done.
    pub copy_to_clipboard: bool,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StudioConfig {
    /// Create a new studio configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages_dir: PathBuf::from("pages"),
            output_dir: None,
            generator_url: DEFAULT_GENERATOR_URL.to_string(),
            variants: Vec::new(),
            workspace: WorkspaceConfig::default(),
            design: DesignSystem::default(),
            copy_to_clipboard: false,
        }
    }
}

impl From<CliArgs> for StudioConfig {
    fn from(args: CliArgs) -> Self {
        let mut design = DesignSystem::default();
        if let Some(accent) = args.accent {
            design.accent_color = accent;
        }
        if let Some(radius) = args.radius {
            design.corner_radius = radius;
        }
        if args.dark {
            design.color_mode = ColorMode::Dark;
        }
        design.variant = args.default_variant;

        Self {
            pages_dir: args.pages,
            output_dir: args.output,
            generator_url: args.generator_url,
            variants: args.variants,
            workspace: WorkspaceConfig {
                frame: FrameLayout {
                    frame_width: args.frame_width,
                    frame_height: args.frame_height,
                    ..FrameLayout::default()
                },
                container_width: args.width,
                container_height: args.height,
                history_depth: args.history_depth,
            },
            design,
            copy_to_clipboard: args.copy,
        }
    }
}
