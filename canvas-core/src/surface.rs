//! Rendering surfaces and the reload policy.
//!
//! A surface hosts one page's themed markup. Between reloads its document is
//! live: edits are applied in place and never re-themed. [`RenderingSurface::sync`]
//! compares what the surface last loaded against the current inputs and
//! rebuilds only when one of the reload conditions holds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bridge::SurfaceBridge;
use crate::design::DesignSystem;
use crate::element::Rect;
use crate::protocol::{BridgeMessage, HostCommand};
use crate::state::{SurfaceState, ToolMode};
use crate::theme::apply_theme;

/// Why a surface was torn down and rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReloadReason {
    /// First load after mount.
    NeverLoaded,
    /// The surface now shows a different page id.
    PageChanged,
    /// The design system changed by value.
    DesignChanged,
    /// The history major version moved.
    VersionChanged,
    /// The page is being regenerated.
    Generating,
    /// The host discarded live content explicitly.
    Invalidated,
}

impl fmt::Display for ReloadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NeverLoaded => "never loaded",
            Self::PageChanged => "page changed",
            Self::DesignChanged => "design changed",
            Self::VersionChanged => "version changed",
            Self::Generating => "generating",
            Self::Invalidated => "invalidated",
        };
        f.write_str(s)
    }
}

/// Everything a surface's content depends on.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceInputs<'a> {
    /// Page id the surface should show.
    pub page_id: &'a str,
    /// Registry markup of that page.
    pub markup: &'a str,
    /// Current design system.
    pub design: &'a DesignSystem,
    /// Current history major version.
    pub major_version: u64,
    /// Whether the page is generating.
    pub generating: bool,
    /// Current tool mode, delivered after every load.
    pub tool_mode: ToolMode,
}

#[derive(Debug, Clone)]
struct LoadedKey {
    page_id: String,
    design: DesignSystem,
    major_version: u64,
}

/// One page's isolated rendering context.
#[derive(Debug, Clone)]
pub struct RenderingSurface {
    width: f32,
    state: SurfaceState,
    bridge: Option<SurfaceBridge>,
    loaded: Option<LoadedKey>,
    invalidated: bool,
    reload_count: u64,
}

impl RenderingSurface {
    /// Mount an empty surface of the given width.
    #[must_use]
    pub fn new(width: f32) -> Self {
        Self {
            width,
            state: SurfaceState::Idle,
            bridge: None,
            loaded: None,
            invalidated: false,
            reload_count: 0,
        }
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// Number of loads since mount (the first load counts).
    #[must_use]
    pub fn reload_count(&self) -> u64 {
        self.reload_count
    }

    /// Page id of the loaded content.
    #[must_use]
    pub fn page_id(&self) -> Option<&str> {
        self.loaded.as_ref().map(|k| k.page_id.as_str())
    }

    /// The bridge over the live document, once loaded.
    #[must_use]
    pub fn bridge(&self) -> Option<&SurfaceBridge> {
        self.bridge.as_ref()
    }

    /// Mutable access to the bridge, for pointer input.
    pub fn bridge_mut(&mut self) -> Option<&mut SurfaceBridge> {
        self.bridge.as_mut()
    }

    /// Force the next [`RenderingSurface::sync`] to reload.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    /// Decide whether the inputs require a reload, without doing it.
    #[must_use]
    pub fn reload_reason(&self, inputs: &SurfaceInputs<'_>) -> Option<ReloadReason> {
        let Some(loaded) = &self.loaded else {
            return Some(ReloadReason::NeverLoaded);
        };
        if loaded.page_id != inputs.page_id {
            Some(ReloadReason::PageChanged)
        } else if loaded.design != *inputs.design {
            Some(ReloadReason::DesignChanged)
        } else if loaded.major_version != inputs.major_version {
            Some(ReloadReason::VersionChanged)
        } else if inputs.generating {
            Some(ReloadReason::Generating)
        } else if self.invalidated {
            Some(ReloadReason::Invalidated)
        } else {
            None
        }
    }

    /// Bring the surface up to date. Returns the reason if it reloaded.
    pub fn sync(&mut self, inputs: &SurfaceInputs<'_>) -> Option<ReloadReason> {
        let Some(reason) = self.reload_reason(inputs) else {
            if self.state == SurfaceState::Reloading {
                self.state = SurfaceState::Loaded;
            }
            return None;
        };

        if self.state != SurfaceState::Idle {
            self.state = SurfaceState::Reloading;
        }
        let themed = apply_theme(inputs.design, inputs.markup, inputs.page_id);
        let mut bridge = SurfaceBridge::load(inputs.page_id, &themed, self.width);
        bridge.handle_command(&HostCommand::SetTool {
            mode: inputs.tool_mode,
        });

        self.bridge = Some(bridge);
        self.loaded = Some(LoadedKey {
            page_id: inputs.page_id.to_string(),
            design: inputs.design.clone(),
            major_version: inputs.major_version,
        });
        self.invalidated = false;
        self.reload_count += 1;
        self.state = if inputs.generating {
            SurfaceState::Reloading
        } else {
            SurfaceState::Loaded
        };
        tracing::debug!(
            "Surface {} reloaded ({reason}), count {}",
            inputs.page_id,
            self.reload_count
        );
        Some(reason)
    }

    /// Send a command into the surface. Returns true if the live document
    /// changed.
    pub fn send(&mut self, command: &HostCommand) -> bool {
        let Some(bridge) = self.bridge.as_mut() else {
            return false;
        };
        let changed = bridge.handle_command(command);
        if changed && self.state == SurfaceState::Loaded {
            self.state = SurfaceState::LiveEditing;
        }
        changed
    }

    /// Re-deliver the tool mode.
    pub fn deliver_tool_mode(&mut self, mode: ToolMode) {
        self.send(&HostCommand::SetTool { mode });
    }

    /// Take pending bridge messages in arrival order.
    pub fn drain_messages(&mut self) -> Vec<BridgeMessage> {
        self.bridge
            .as_mut()
            .map(SurfaceBridge::drain_messages)
            .unwrap_or_default()
    }

    /// Registry form of the live document.
    #[must_use]
    pub fn page_markup(&self) -> Option<String> {
        self.bridge.as_ref().map(SurfaceBridge::page_markup)
    }

    /// Surface-local rect of the bridge's selected node.
    #[must_use]
    pub fn selected_rect(&self) -> Option<Rect> {
        self.bridge.as_ref().and_then(SurfaceBridge::selected_rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs<'a>(page_id: &'a str, design: &'a DesignSystem, version: u64) -> SurfaceInputs<'a> {
        SurfaceInputs {
            page_id,
            markup: "<h1>Hi</h1>",
            design,
            major_version: version,
            generating: false,
            tool_mode: ToolMode::Cursor,
        }
    }

    #[test]
    fn test_first_sync_loads() {
        let design = DesignSystem::default();
        let mut surface = RenderingSurface::new(800.0);
        assert_eq!(surface.state(), SurfaceState::Idle);
        assert_eq!(
            surface.sync(&inputs("home", &design, 0)),
            Some(ReloadReason::NeverLoaded)
        );
        assert_eq!(surface.state(), SurfaceState::Loaded);
        assert_eq!(surface.sync(&inputs("home", &design, 0)), None);
        assert_eq!(surface.reload_count(), 1);
    }

    #[test]
    fn test_reload_conditions() {
        let design = DesignSystem::default();
        let mut surface = RenderingSurface::new(800.0);
        surface.sync(&inputs("home", &design, 0));

        assert_eq!(
            surface.sync(&inputs("index", &design, 0)),
            Some(ReloadReason::PageChanged)
        );
        let accent = design.clone().with_accent("#ff0000");
        assert_eq!(
            surface.sync(&inputs("index", &accent, 0)),
            Some(ReloadReason::DesignChanged)
        );
        assert_eq!(surface.sync(&inputs("index", &accent, 0)), None);
        assert_eq!(
            surface.sync(&inputs("index", &accent, 1)),
            Some(ReloadReason::VersionChanged)
        );
        let mut generating = inputs("index", &accent, 1);
        generating.generating = true;
        assert_eq!(surface.sync(&generating), Some(ReloadReason::Generating));
        assert_eq!(surface.state(), SurfaceState::Reloading);
        assert_eq!(surface.reload_count(), 5);
    }

    #[test]
    fn test_markup_change_alone_does_not_reload() {
        let design = DesignSystem::default();
        let mut surface = RenderingSurface::new(800.0);
        surface.sync(&inputs("home", &design, 0));
        let mut changed = inputs("home", &design, 0);
        changed.markup = "<h1>Edited elsewhere</h1>";
        assert_eq!(surface.sync(&changed), None);
        assert!(surface
            .page_markup()
            .is_some_and(|m| m.contains("<h1>Hi</h1>")));
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let design = DesignSystem::default();
        let mut surface = RenderingSurface::new(800.0);
        surface.sync(&inputs("home", &design, 0));
        surface.invalidate();
        assert_eq!(
            surface.sync(&inputs("home", &design, 0)),
            Some(ReloadReason::Invalidated)
        );
        assert_eq!(surface.sync(&inputs("home", &design, 0)), None);
    }

    #[test]
    fn test_live_edit_state_and_tool_delivery() {
        let design = DesignSystem::default();
        let mut surface = RenderingSurface::new(800.0);
        let mut pan = inputs("home", &design, 0);
        pan.tool_mode = ToolMode::Pan;
        surface.sync(&pan);
        assert_eq!(
            surface.bridge().map(SurfaceBridge::tool_mode),
            Some(ToolMode::Pan)
        );

        surface.deliver_tool_mode(ToolMode::Cursor);
        if let Some(bridge) = surface.bridge_mut() {
            bridge.click(10.0, 10.0);
        }
        assert!(surface.send(&HostCommand::Update {
            payload: crate::protocol::Mutation::Text { text: "Yo".into() },
        }));
        assert_eq!(surface.state(), SurfaceState::LiveEditing);
        assert_eq!(surface.drain_messages().len(), 1);
    }
}
