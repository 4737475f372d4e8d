//! The canvas workspace: pages, surfaces, selection and history together.
//!
//! [`CanvasWorkspace`] is the single-threaded host. Every operation leaves
//! the pieces consistent with each other before returning: deleting a page
//! clears any selection pointing into it, a forced reload clears the
//! selection for that page, and in-place edits are flushed back to the
//! registry as soon as they are applied.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::design::DesignSystem;
use crate::element::{Point, Rect, SelectionDescriptor};
use crate::error::{CanvasError, CanvasResult};
use crate::history::{History, DEFAULT_HISTORY_DEPTH};
use crate::protocol::{BridgeMessage, HostCommand, Mutation};
use crate::registry::{PageRegistry, RegistrySnapshot};
use crate::selection::SelectionModel;
use crate::state::{Notice, ToolMode};
use crate::store::{Store, SubscriptionId};
use crate::surface::{ReloadReason, RenderingSurface, SurfaceInputs};
use crate::theme::apply_theme;
use crate::toolbar::{self, ColorTarget, IconSource, Toolbar, ToolbarPanel};
use crate::viewport::{FrameLayout, Viewport};

/// Variant name used when neither the caller nor the design names one.
pub const DEFAULT_VARIANT: &str = "default";

/// Workspace sizing and limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Page frame geometry.
    pub frame: FrameLayout,
    /// Container width in parent pixels.
    pub container_width: f32,
    /// Container height in parent pixels.
    pub container_height: f32,
    /// Undo levels kept.
    pub history_depth: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            frame: FrameLayout::default(),
            container_width: 1440.0,
            container_height: 900.0,
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

/// Everything the regeneration collaborator needs for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Page being regenerated.
    pub page_id: String,
    /// Its markup when generation started.
    pub current_markup: String,
    /// Requested variant.
    pub variant_name: String,
    /// Design system at request time.
    pub design_system: DesignSystem,
}

/// The visual page canvas.
pub struct CanvasWorkspace {
    config: WorkspaceConfig,
    registry: PageRegistry,
    history: History,
    design: Store<DesignSystem>,
    tool_mode: Store<ToolMode>,
    viewport: Viewport,
    selection: SelectionModel,
    toolbar: Toolbar,
    surfaces: HashMap<String, RenderingSurface>,
    /// Generating pages and their markup from before generation started.
    generating: HashMap<String, String>,
    pointer_page: Option<String>,
    notices: VecDeque<Notice>,
}

impl fmt::Debug for CanvasWorkspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasWorkspace")
            .field("pages", &self.registry.list())
            .field("major_version", &self.history.major_version())
            .field("design", self.design.get())
            .field("tool_mode", self.tool_mode.get())
            .field("selected", &self.selection.selected_page())
            .field("generating", &self.generating.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for CanvasWorkspace {
    fn default() -> Self {
        Self::new(WorkspaceConfig::default())
    }
}

impl CanvasWorkspace {
    /// Create an empty workspace.
    #[must_use]
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            config,
            registry: PageRegistry::new(),
            history: History::new(config.history_depth),
            design: Store::default(),
            tool_mode: Store::default(),
            viewport: Viewport::new(config.container_width, config.container_height),
            selection: SelectionModel::new(),
            toolbar: Toolbar::new(),
            surfaces: HashMap::new(),
            generating: HashMap::new(),
            pointer_page: None,
            notices: VecDeque::new(),
        }
    }

    /// Create a workspace with an initial design system.
    #[must_use]
    pub fn with_design(config: WorkspaceConfig, design: DesignSystem) -> Self {
        let mut workspace = Self::new(config);
        workspace.design = Store::new(design);
        workspace
    }

    /// The page registry.
    #[must_use]
    pub fn pages(&self) -> &PageRegistry {
        &self.registry
    }

    /// The selection model.
    #[must_use]
    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    /// Current selection, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&SelectionDescriptor> {
        self.selection.selected()
    }

    /// Toolbar state. Only meaningful while something is selected.
    #[must_use]
    pub fn toolbar(&self) -> &Toolbar {
        &self.toolbar
    }

    /// Check if the toolbar is showing.
    #[must_use]
    pub fn toolbar_visible(&self) -> bool {
        self.selection.selected().is_some()
    }

    /// The viewport.
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable viewport access for pan/zoom.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// A mounted surface.
    #[must_use]
    pub fn surface(&self, page_id: &str) -> Option<&RenderingSurface> {
        self.surfaces.get(page_id)
    }

    /// Current history major version.
    #[must_use]
    pub fn major_version(&self) -> u64 {
        self.history.major_version()
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Forget all undo/redo steps, e.g. once the initial pages are loaded.
    /// The major version is kept, so no surface reloads.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // -----------------------------------------------------------------------
    // Pages
    // -----------------------------------------------------------------------

    /// Add a page under a generated id and mount it.
    pub fn add_page(&mut self, markup: impl Into<String>) -> String {
        let before = self.history_snapshot();
        let id = self.registry.add(markup);
        self.history.record(before);
        self.mount_new(&id);
        id
    }

    /// Add a page under a chosen id and mount it.
    ///
    /// # Errors
    ///
    /// See [`PageRegistry::insert`].
    pub fn insert_page(&mut self, id: &str, markup: impl Into<String>) -> CanvasResult<()> {
        let before = self.history_snapshot();
        self.registry.insert(id, markup)?;
        self.history.record(before);
        self.mount_new(id);
        Ok(())
    }

    /// Rename a page. Its surface reloads under the new id.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Generating`] while the page generates, plus
    /// the errors of [`PageRegistry::rename`].
    pub fn rename_page(&mut self, old_id: &str, new_id: &str) -> CanvasResult<()> {
        if self.generating.contains_key(old_id) {
            return Err(CanvasError::Generating(old_id.to_string()));
        }
        if old_id == new_id && self.registry.contains(old_id) {
            return Ok(());
        }
        let before = self.history_snapshot();
        self.registry.rename(old_id, new_id)?;
        self.history.record(before);

        if let Some(surface) = self.surfaces.remove(old_id) {
            self.surfaces.insert(new_id.to_string(), surface);
        }
        if self.selection.clear_page(old_id) {
            self.toolbar.close();
        }
        if self.pointer_page.as_deref() == Some(old_id) {
            self.pointer_page = None;
        }
        self.sync_page(new_id);
        tracing::info!("Renamed page {old_id} to {new_id}");
        Ok(())
    }

    /// Duplicate a page, carrying any flushed edits.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PageNotFound`] if `id` is unknown.
    pub fn duplicate_page(&mut self, id: &str) -> CanvasResult<String> {
        let before = self.history_snapshot();
        let new_id = self.registry.duplicate(id)?;
        self.history.record(before);
        self.mount_new(&new_id);
        tracing::info!("Duplicated page {id} as {new_id}");
        Ok(new_id)
    }

    /// Delete a page together with its surface and any selection in it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PageNotFound`] if `id` is unknown.
    pub fn remove_page(&mut self, id: &str) -> CanvasResult<()> {
        let before = self.history_snapshot();
        self.registry.remove(id)?;
        self.history.record(before);
        self.forget_page(id);
        self.refresh_content_size();
        tracing::info!("Removed page {id}");
        Ok(())
    }

    /// Registry state for history. Generating pages contribute their markup
    /// from before generation, never streamed partials.
    fn history_snapshot(&self) -> RegistrySnapshot {
        self.generating
            .iter()
            .fold(self.registry.snapshot(), |snapshot, (id, original)| {
                snapshot.with_markup(id, original)
            })
    }

    fn forget_page(&mut self, id: &str) {
        self.surfaces.remove(id);
        self.generating.remove(id);
        if self.selection.clear_page(id) {
            self.toolbar.close();
        }
        if self.pointer_page.as_deref() == Some(id) {
            self.pointer_page = None;
        }
    }

    /// Themed markup of a page as its surface would load it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PageNotFound`] if `id` is unknown.
    pub fn themed_markup(&self, id: &str) -> CanvasResult<String> {
        let markup = self
            .registry
            .get(id)
            .ok_or_else(|| CanvasError::PageNotFound(id.to_string()))?;
        Ok(apply_theme(self.design.get(), markup, id))
    }

    /// Markup for the clipboard: one page, or every page in order.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PageNotFound`] for an unknown page id.
    pub fn copy_code(&self, page_id: Option<&str>) -> CanvasResult<String> {
        match page_id {
            Some(id) => self
                .registry
                .get(id)
                .map(str::to_string)
                .ok_or_else(|| CanvasError::PageNotFound(id.to_string())),
            None => Ok(self
                .registry
                .iter()
                .map(|(id, markup)| format!("<!-- page: {id} -->\n{markup}\n"))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    // -----------------------------------------------------------------------
    // Design system and tool mode
    // -----------------------------------------------------------------------

    /// Current design system.
    #[must_use]
    pub fn design(&self) -> &DesignSystem {
        self.design.get()
    }

    /// Replace the design system. Every mounted surface reloads once if the
    /// value changed. Returns the number of reloads.
    pub fn set_design(&mut self, design: DesignSystem) -> usize {
        if !self.design.set(design) {
            return 0;
        }
        tracing::info!("Design system changed, reloading surfaces");
        self.sync_surfaces().len()
    }

    /// Edit the design system in place; see [`CanvasWorkspace::set_design`].
    pub fn update_design(&mut self, f: impl FnOnce(&mut DesignSystem)) -> usize {
        let mut next = self.design.get().clone();
        f(&mut next);
        self.set_design(next)
    }

    /// Observe design system changes.
    pub fn subscribe_design(
        &mut self,
        listener: impl FnMut(&DesignSystem) + Send + 'static,
    ) -> SubscriptionId {
        self.design.subscribe(listener)
    }

    /// Stop observing design system changes.
    pub fn unsubscribe_design(&mut self, id: SubscriptionId) -> bool {
        self.design.unsubscribe(id)
    }

    /// Current tool mode.
    #[must_use]
    pub fn tool_mode(&self) -> ToolMode {
        *self.tool_mode.get()
    }

    /// Set the tool mode and broadcast it to every surface. Leaving cursor
    /// mode clears hover.
    pub fn set_tool_mode(&mut self, mode: ToolMode) {
        self.tool_mode.set(mode);
        for surface in self.surfaces.values_mut() {
            surface.deliver_tool_mode(mode);
        }
        if mode != ToolMode::Cursor {
            self.selection.clear_hover();
        }
        tracing::debug!("Tool mode {mode:?} broadcast to {} surfaces", self.surfaces.len());
    }

    /// Observe tool mode changes.
    pub fn subscribe_tool_mode(
        &mut self,
        listener: impl FnMut(&ToolMode) + Send + 'static,
    ) -> SubscriptionId {
        self.tool_mode.subscribe(listener)
    }

    // -----------------------------------------------------------------------
    // Surfaces
    // -----------------------------------------------------------------------

    /// Mount (or re-mount) the surface of a page. The tool mode is
    /// delivered either way.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PageNotFound`] if `id` is unknown.
    pub fn mount(&mut self, id: &str) -> CanvasResult<()> {
        if !self.registry.contains(id) {
            return Err(CanvasError::PageNotFound(id.to_string()));
        }
        if let Some(surface) = self.surfaces.get_mut(id) {
            surface.deliver_tool_mode(*self.tool_mode.get());
            return Ok(());
        }
        self.surfaces
            .insert(id.to_string(), RenderingSurface::new(self.config.frame.frame_width));
        self.sync_page(id);
        Ok(())
    }

    /// Unmount a page's surface. Its live selection goes with it.
    pub fn unmount(&mut self, id: &str) -> bool {
        let removed = self.surfaces.remove(id).is_some();
        if removed && self.selection.clear_page(id) {
            self.toolbar.close();
        }
        removed
    }

    /// Mount every page that has no surface yet.
    pub fn mount_all(&mut self) {
        for id in self.registry.list() {
            if !self.surfaces.contains_key(&id) {
                self.surfaces
                    .insert(id.clone(), RenderingSurface::new(self.config.frame.frame_width));
            }
        }
        self.sync_surfaces();
    }

    fn mount_new(&mut self, id: &str) {
        self.surfaces
            .insert(id.to_string(), RenderingSurface::new(self.config.frame.frame_width));
        self.sync_page(id);
        self.refresh_content_size();
    }

    /// Bring every mounted surface up to date. Returns the reloads done.
    pub fn sync_surfaces(&mut self) -> Vec<(String, ReloadReason)> {
        let mut reloads = Vec::new();
        for id in self.registry.list() {
            if let Some(reason) = self.sync_page(&id) {
                reloads.push((id, reason));
            }
        }
        reloads
    }

    fn sync_page(&mut self, page_id: &str) -> Option<ReloadReason> {
        let markup = self.registry.get(page_id)?;
        let surface = self.surfaces.get_mut(page_id)?;
        let inputs = SurfaceInputs {
            page_id,
            markup,
            design: self.design.get(),
            major_version: self.history.major_version(),
            generating: self.generating.contains_key(page_id),
            tool_mode: *self.tool_mode.get(),
        };
        let reason = surface.sync(&inputs)?;
        if reason != ReloadReason::NeverLoaded && self.selection.clear_page(page_id) {
            self.toolbar.close();
        }
        Some(reason)
    }

    fn refresh_content_size(&mut self) {
        let (width, height) = self.config.frame.extent(self.registry.len());
        self.viewport.set_content_size(width, height);
    }

    // -----------------------------------------------------------------------
    // Overlay geometry
    // -----------------------------------------------------------------------

    /// Canvas origin of a page's frame.
    #[must_use]
    pub fn frame_origin(&self, page_id: &str) -> Option<Point> {
        self.registry
            .index_of(page_id)
            .map(|i| self.config.frame.origin(i))
    }

    /// Selection rect projected into parent space.
    #[must_use]
    pub fn selection_overlay(&self) -> Option<Rect> {
        let selected = self.selection.selected()?;
        let origin = self.frame_origin(&selected.page_id)?;
        Some(self.viewport.project(origin, selected.rect))
    }

    /// Hover rect projected into parent space.
    #[must_use]
    pub fn hover_overlay(&self) -> Option<Rect> {
        let hovered = self.selection.hovered()?;
        let origin = self.frame_origin(&hovered.page_id)?;
        Some(self.viewport.project(origin, hovered.rect))
    }

    /// Toolbar anchor for a toolbar of the given size.
    #[must_use]
    pub fn toolbar_anchor(&self, width: f32, height: f32) -> Option<Point> {
        self.selection_overlay()
            .map(|rect| Toolbar::position(rect, width, height))
    }

    /// Find the page frame under a parent-space point and the surface-local
    /// point inside it.
    #[must_use]
    pub fn locate(&self, x: f32, y: f32) -> Option<(String, Point)> {
        let canvas = self.viewport.to_canvas(x, y);
        let frame = self.config.frame;
        if canvas.x < 0.0 || canvas.y < 0.0 || canvas.y > frame.frame_height {
            return None;
        }
        let stride = frame.frame_width + frame.gap;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (canvas.x / stride).floor() as usize;
        let ids = self.registry.list();
        let id = ids.get(index)?;
        let origin = frame.origin(index);
        let local_x = canvas.x - origin.x;
        (local_x <= frame.frame_width).then(|| {
            (
                id.clone(),
                Point {
                    x: local_x,
                    y: canvas.y - origin.y,
                },
            )
        })
    }

    // -----------------------------------------------------------------------
    // Pointer input and bridge messages
    // -----------------------------------------------------------------------

    /// Pointer moved inside a page's surface (surface-local coordinates).
    pub fn pointer_move(&mut self, page_id: &str, x: f32, y: f32) {
        if self.pointer_page.as_deref() != Some(page_id) {
            if let Some(previous) = self.pointer_page.take() {
                self.pointer_leave(&previous);
            }
            self.pointer_page = Some(page_id.to_string());
        }
        if let Some(bridge) = self.surfaces.get_mut(page_id).and_then(RenderingSurface::bridge_mut) {
            bridge.pointer_move(x, y);
        }
        self.pump_page(page_id);
    }

    /// Pointer left a page's surface.
    pub fn pointer_leave(&mut self, page_id: &str) {
        if self.pointer_page.as_deref() == Some(page_id) {
            self.pointer_page = None;
        }
        if let Some(bridge) = self.surfaces.get_mut(page_id).and_then(RenderingSurface::bridge_mut) {
            bridge.pointer_leave();
        }
        self.pump_page(page_id);
    }

    /// Click inside a page's surface (surface-local coordinates).
    pub fn click(&mut self, page_id: &str, x: f32, y: f32) {
        if let Some(bridge) = self.surfaces.get_mut(page_id).and_then(RenderingSurface::bridge_mut) {
            bridge.click(x, y);
        }
        self.pump_page(page_id);
    }

    /// Pointer moved in parent space; routed to the frame underneath.
    pub fn canvas_pointer_move(&mut self, x: f32, y: f32) {
        match self.locate(x, y) {
            Some((page_id, local)) => self.pointer_move(&page_id, local.x, local.y),
            None => {
                if let Some(previous) = self.pointer_page.take() {
                    self.pointer_leave(&previous);
                }
            }
        }
    }

    /// Click in parent space: inside a frame it selects, on the background
    /// it deselects. Ignored in pan mode.
    pub fn canvas_click(&mut self, x: f32, y: f32) {
        if self.tool_mode() != ToolMode::Cursor {
            return;
        }
        match self.locate(x, y) {
            Some((page_id, local)) => self.click(&page_id, local.x, local.y),
            None => self.background_click(),
        }
    }

    /// Click on the canvas background: clears the selection and closes the
    /// toolbar. Hover is untouched.
    pub fn background_click(&mut self) {
        if self.selection.deselect() {
            tracing::debug!("Selection cleared by background click");
        }
        self.toolbar.close();
    }

    /// Drain and apply queued messages from every mounted surface, page by
    /// page, each in arrival order.
    pub fn pump(&mut self) {
        for id in self.registry.list() {
            self.pump_page(&id);
        }
    }

    fn pump_page(&mut self, page_id: &str) {
        let messages = self
            .surfaces
            .get_mut(page_id)
            .map(RenderingSurface::drain_messages)
            .unwrap_or_default();
        for message in messages {
            self.handle_message(message);
        }
    }

    /// Apply a raw message from an externally hosted surface. Malformed
    /// messages are dropped.
    pub fn receive_message(&mut self, raw: &Value) -> bool {
        match BridgeMessage::from_value(raw) {
            Some(message) => self.handle_message(message),
            None => false,
        }
    }

    /// Apply one bridge message. Returns false if it was ignored.
    pub fn handle_message(&mut self, message: BridgeMessage) -> bool {
        let page_id = message.page_id();
        if !self.registry.contains(page_id) {
            tracing::debug!("Ignoring message for unknown page {page_id}");
            return false;
        }
        if self.generating.contains_key(page_id) {
            tracing::debug!("Ignoring message from generating page {page_id}");
            return false;
        }
        if matches!(message, BridgeMessage::Select { .. }) {
            self.toolbar.close();
        }
        self.selection.apply(message);
        true
    }

    // -----------------------------------------------------------------------
    // Toolbar
    // -----------------------------------------------------------------------

    /// Mutable toolbar access for editing drafts.
    pub fn toolbar_mut(&mut self) -> &mut Toolbar {
        &mut self.toolbar
    }

    /// Open a toolbar panel on the current selection.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoSelection`] without a selection and
    /// [`CanvasError::InvalidOperation`] for the image panel on a non-image.
    pub fn open_panel(&mut self, panel: ToolbarPanel) -> CanvasResult<()> {
        let selected = self.selection.selected().ok_or(CanvasError::NoSelection)?;
        let result = self.toolbar.open(panel, selected);
        self.report(result)
    }

    /// Close the open toolbar panel.
    pub fn close_panel(&mut self) {
        self.toolbar.close();
    }

    /// Apply the text panel's draft.
    ///
    /// # Errors
    ///
    /// See [`CanvasWorkspace::apply_mutation`].
    pub fn commit_text(&mut self) -> CanvasResult<()> {
        let mutation = self.toolbar.text_mutation();
        self.apply_mutation(&mutation)
    }

    /// Apply the image panel's URL draft.
    ///
    /// # Errors
    ///
    /// Fails on an empty draft; see also [`CanvasWorkspace::apply_mutation`].
    pub fn commit_image_url(&mut self) -> CanvasResult<()> {
        let mutation = self.toolbar.image_url_mutation();
        let mutation = self.report(mutation)?;
        self.apply_mutation(&mutation)
    }

    /// Replace the selected image with local file bytes.
    ///
    /// # Errors
    ///
    /// Fails if the bytes are not an image; see also
    /// [`CanvasWorkspace::apply_mutation`].
    pub fn apply_image_file(&mut self, bytes: &[u8], mime: &str) -> CanvasResult<()> {
        let mutation = self.report(toolbar::image_file_mutation(bytes, mime))?;
        self.apply_mutation(&mutation)
    }

    /// Swap the selection's content for an icon. A render failure becomes
    /// a notice and the panel stays open.
    ///
    /// # Errors
    ///
    /// Returns the render error; see also [`CanvasWorkspace::apply_mutation`].
    pub fn apply_icon(&mut self, source: &dyn IconSource, name: &str) -> CanvasResult<()> {
        let mutation = self.report(toolbar::icon_mutation(source, name))?;
        self.apply_mutation(&mutation)
    }

    /// Apply a palette color immediately.
    ///
    /// # Errors
    ///
    /// See [`CanvasWorkspace::apply_mutation`].
    pub fn apply_color(&mut self, color: &str, target: ColorTarget) -> CanvasResult<()> {
        self.apply_mutation(&toolbar::color_mutation(color, target))
    }

    /// Send a mutation to the selected node, flush the result to the
    /// registry and patch the cached snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoSelection`] without a selection,
    /// [`CanvasError::Generating`] while its page generates and
    /// [`CanvasError::PageNotFound`] if its surface is not mounted.
    pub fn apply_mutation(&mut self, mutation: &Mutation) -> CanvasResult<()> {
        let page_id = self.editable_selection_page()?;
        let command = HostCommand::Update {
            payload: mutation.clone(),
        };
        let surface = self
            .surfaces
            .get_mut(&page_id)
            .ok_or_else(|| CanvasError::PageNotFound(page_id.clone()))?;
        if surface.send(&command) {
            if let Some(rect) = surface.selected_rect() {
                self.selection.set_selected_rect(rect);
            }
            self.flush(&page_id);
        }
        self.selection.apply_mutation(mutation);
        Ok(())
    }

    /// Remove the selected node and clear the selection.
    ///
    /// # Errors
    ///
    /// Same as [`CanvasWorkspace::apply_mutation`].
    pub fn delete_selected(&mut self) -> CanvasResult<()> {
        let page_id = self.editable_selection_page()?;
        let surface = self
            .surfaces
            .get_mut(&page_id)
            .ok_or_else(|| CanvasError::PageNotFound(page_id.clone()))?;
        if surface.send(&HostCommand::Remove) {
            self.flush(&page_id);
        }
        self.selection.deselect();
        self.toolbar.close();
        Ok(())
    }

    fn editable_selection_page(&self) -> CanvasResult<String> {
        let page_id = self
            .selection
            .selected_page()
            .ok_or(CanvasError::NoSelection)?
            .to_string();
        if self.generating.contains_key(&page_id) {
            let err = CanvasError::Generating(page_id);
            tracing::warn!("{err}");
            return Err(err);
        }
        Ok(page_id)
    }

    /// Write a surface's live document back to the registry.
    fn flush(&mut self, page_id: &str) {
        let Some(markup) = self.surfaces.get(page_id).and_then(RenderingSurface::page_markup)
        else {
            return;
        };
        if self.registry.get(page_id) == Some(markup.as_str()) {
            return;
        }
        let before = self.history_snapshot();
        if self.registry.set_markup(page_id, markup).is_ok() {
            self.history.record(before);
            tracing::debug!("Flushed live edits of {page_id}");
        }
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Undo one step. Every surface reloads once. Returns false if there
    /// was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(self.history_snapshot()) else {
            return false;
        };
        self.restore(&previous);
        true
    }

    /// Redo one step. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(self.history_snapshot()) else {
            return false;
        };
        self.restore(&next);
        true
    }

    fn restore(&mut self, snapshot: &RegistrySnapshot) {
        self.registry.restore(snapshot);
        let gone: Vec<String> = self
            .surfaces
            .keys()
            .filter(|id| !self.registry.contains(id))
            .cloned()
            .collect();
        for id in gone {
            self.forget_page(&id);
        }
        let width = self.config.frame.frame_width;
        for id in self.registry.list() {
            self.surfaces
                .entry(id)
                .or_insert_with(|| RenderingSurface::new(width));
        }
        self.sync_surfaces();
        self.refresh_content_size();
    }

    // -----------------------------------------------------------------------
    // Variant generation
    // -----------------------------------------------------------------------

    /// Check if a page is generating.
    #[must_use]
    pub fn is_generating(&self, page_id: &str) -> bool {
        self.generating.contains_key(page_id)
    }

    /// Flag a page as generating and describe the request to make.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::PageNotFound`] for an unknown page and
    /// [`CanvasError::Generating`] if it is already generating.
    pub fn begin_generation(
        &mut self,
        page_id: &str,
        variant_name: Option<&str>,
    ) -> CanvasResult<GenerationRequest> {
        let markup = self
            .registry
            .get(page_id)
            .ok_or_else(|| CanvasError::PageNotFound(page_id.to_string()))?
            .to_string();
        if self.generating.contains_key(page_id) {
            return Err(CanvasError::Generating(page_id.to_string()));
        }
        self.generating.insert(page_id.to_string(), markup.clone());
        if self.selection.clear_page(page_id) {
            self.toolbar.close();
        }
        self.sync_page(page_id);

        let design = self.design.get().clone();
        let variant_name = variant_name
            .map(str::to_string)
            .or_else(|| design.variant.clone())
            .unwrap_or_else(|| DEFAULT_VARIANT.to_string());
        tracing::info!("Generating variant {variant_name:?} of {page_id}");
        Ok(GenerationRequest {
            page_id: page_id.to_string(),
            current_markup: markup,
            variant_name,
            design_system: design,
        })
    }

    /// Show streamed, provisional markup for a generating page.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidOperation`] if the page is not
    /// generating.
    pub fn apply_partial_generation(&mut self, page_id: &str, markup: &str) -> CanvasResult<()> {
        if !self.generating.contains_key(page_id) {
            return Err(CanvasError::InvalidOperation(format!(
                "{page_id} is not generating"
            )));
        }
        self.registry.set_markup(page_id, markup)?;
        self.sync_page(page_id);
        Ok(())
    }

    /// Finish a generation. Success replaces the markup and commits history;
    /// failure restores the prior markup and raises a notice.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidOperation`] if the page is not
    /// generating. A page removed while generating is no longer generating,
    /// so its late result lands here and changes nothing.
    pub fn complete_generation<E: fmt::Display>(
        &mut self,
        page_id: &str,
        outcome: Result<String, E>,
    ) -> CanvasResult<()> {
        let Some(original) = self.generating.remove(page_id) else {
            return Err(CanvasError::InvalidOperation(format!(
                "{page_id} is not generating"
            )));
        };
        match outcome {
            Ok(markup) => {
                let before = self.history_snapshot().with_markup(page_id, &original);
                self.registry.set_markup(page_id, markup)?;
                self.history.commit(before);
                self.push_notice(Notice::info(format!("Generated a new variant of {page_id}")));
                tracing::info!("Generation of {page_id} succeeded");
                self.sync_surfaces();
            }
            Err(e) => {
                let streamed = self.registry.get(page_id) != Some(original.as_str());
                self.registry.set_markup(page_id, original)?;
                if streamed {
                    if let Some(surface) = self.surfaces.get_mut(page_id) {
                        surface.invalidate();
                    }
                }
                tracing::warn!("Generation of {page_id} failed: {e}");
                self.push_notice(Notice::error(format!(
                    "Could not generate a variant of {page_id}: {e}"
                )));
                self.sync_page(page_id);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Notices
    // -----------------------------------------------------------------------

    /// Queue a notice for the user.
    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    /// Pending notices, oldest first.
    pub fn notices(&self) -> impl Iterator<Item = &Notice> + '_ {
        self.notices.iter()
    }

    /// Take all pending notices.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Turn an error into a notice and pass the result through.
    fn report<T>(&mut self, result: CanvasResult<T>) -> CanvasResult<T> {
        if let Err(e) = &result {
            tracing::warn!("{e}");
            let notice = match e {
                CanvasError::Render(_) => Notice::error(e.to_string()),
                _ => Notice::warning(e.to_string()),
            };
            self.push_notice(notice);
        }
        result
    }
}
