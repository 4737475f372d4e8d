//! Viewport controller: pan/zoom over the frame strip.
//!
//! Overlays are drawn in parent (container) space while rects arrive in
//! surface-local space. [`Viewport::project`] maps one onto the other; the
//! change listeners tell overlays when to recompute.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::{Point, Rect};

/// Smallest allowed scale.
pub const MIN_SCALE: f32 = 0.05;

/// Largest allowed scale.
pub const MAX_SCALE: f32 = 3.0;

/// Multiplicative step for zoom in/out.
pub const ZOOM_STEP: f32 = 1.2;

/// Horizontal gap between page frames, in canvas units.
pub const FRAME_GAP: f32 = 80.0;

/// The current pan/zoom transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTransform {
    /// Scale factor.
    pub scale: f32,
    /// Horizontal translation in parent pixels.
    pub translate_x: f32,
    /// Vertical translation in parent pixels.
    pub translate_y: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

/// Page frames laid out left to right on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameLayout {
    /// Frame width in canvas units.
    pub frame_width: f32,
    /// Frame height in canvas units.
    pub frame_height: f32,
    /// Gap between frames.
    pub gap: f32,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            frame_width: 1024.0,
            frame_height: 768.0,
            gap: FRAME_GAP,
        }
    }
}

impl FrameLayout {
    /// Origin of the frame at `index`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Page counts fit in f32
    pub fn origin(&self, index: usize) -> Point {
        Point {
            x: index as f32 * (self.frame_width + self.gap),
            y: 0.0,
        }
    }

    /// Total extent of `count` frames.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn extent(&self, count: usize) -> (f32, f32) {
        if count == 0 {
            return (0.0, 0.0);
        }
        let n = count as f32;
        (n * self.frame_width + (n - 1.0) * self.gap, self.frame_height)
    }
}

type ChangeListener = Box<dyn FnMut(&ViewTransform) + Send>;

/// Owns the pan/zoom transform.
pub struct Viewport {
    transform: ViewTransform,
    container_width: f32,
    container_height: f32,
    content_width: f32,
    content_height: f32,
    listeners: Vec<(u64, ChangeListener)>,
    next_listener: u64,
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("transform", &self.transform)
            .field("container", &(self.container_width, self.container_height))
            .field("content", &(self.content_width, self.content_height))
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Viewport {
    /// Create a viewport for a container of the given size.
    #[must_use]
    pub fn new(container_width: f32, container_height: f32) -> Self {
        Self {
            transform: ViewTransform::default(),
            container_width,
            container_height,
            content_width: 0.0,
            content_height: 0.0,
            listeners: Vec::new(),
            next_listener: 1,
        }
    }

    /// Current transform.
    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Current scale.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.transform.scale
    }

    /// Register a change listener. Returns an id for [`Viewport::unsubscribe`].
    pub fn subscribe(&mut self, listener: impl FnMut(&ViewTransform) + Send + 'static) -> u64 {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a change listener.
    pub fn unsubscribe(&mut self, id: u64) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Pan by a delta in parent pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let mut next = self.transform;
        next.translate_x += dx;
        next.translate_y += dy;
        self.set_transform(next);
    }

    /// Zoom in one step around the container centre.
    pub fn zoom_in(&mut self) {
        self.zoom_by(ZOOM_STEP);
    }

    /// Zoom out one step around the container centre.
    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 / ZOOM_STEP);
    }

    /// Zoom by a factor keeping the container centre fixed.
    pub fn zoom_by(&mut self, factor: f32) {
        let cx = self.container_width / 2.0;
        let cy = self.container_height / 2.0;
        self.zoom_at(factor, cx, cy);
    }

    /// Zoom by a factor keeping the parent-space point `(px, py)` fixed.
    pub fn zoom_at(&mut self, factor: f32, px: f32, py: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let current = self.transform;
        let scale = (current.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = scale / current.scale;
        self.set_transform(ViewTransform {
            scale,
            translate_x: px - (px - current.translate_x) * ratio,
            translate_y: py - (py - current.translate_y) * ratio,
        });
    }

    /// Record the content extent used by [`Viewport::reset`].
    pub fn set_content_size(&mut self, width: f32, height: f32) {
        self.content_width = width;
        self.content_height = height;
    }

    /// Record a new container size. Does not move the view.
    pub fn set_container_size(&mut self, width: f32, height: f32) {
        self.container_width = width;
        self.container_height = height;
    }

    /// The initial transform: content fitted and centred, never enlarged
    /// past 1.0.
    #[must_use]
    pub fn initial_transform(&self) -> ViewTransform {
        if self.content_width <= 0.0 || self.content_height <= 0.0 {
            return ViewTransform::default();
        }
        let fit = (self.container_width / self.content_width)
            .min(self.container_height / self.content_height)
            * 0.9;
        let scale = fit.clamp(MIN_SCALE, 1.0);
        ViewTransform {
            scale,
            translate_x: (self.container_width - self.content_width * scale) / 2.0,
            translate_y: (self.container_height - self.content_height * scale) / 2.0,
        }
    }

    /// Restore the initial centred transform.
    pub fn reset(&mut self) {
        let initial = self.initial_transform();
        self.set_transform(initial);
    }

    fn set_transform(&mut self, next: ViewTransform) {
        if next == self.transform {
            return;
        }
        self.transform = next;
        tracing::trace!(
            "Viewport transform: scale={} translate=({}, {})",
            next.scale,
            next.translate_x,
            next.translate_y
        );
        for (_, listener) in &mut self.listeners {
            listener(&next);
        }
    }

    /// Project a surface-local rect into parent space.
    #[must_use]
    pub fn project(&self, frame_origin: Point, rect: Rect) -> Rect {
        let t = self.transform;
        Rect {
            x: (frame_origin.x + rect.x) * t.scale + t.translate_x,
            y: (frame_origin.y + rect.y) * t.scale + t.translate_y,
            width: rect.width * t.scale,
            height: rect.height * t.scale,
        }
    }

    /// Map a parent-space point into canvas coordinates.
    #[must_use]
    pub fn to_canvas(&self, x: f32, y: f32) -> Point {
        let t = self.transform;
        Point {
            x: (x - t.translate_x) / t.scale,
            y: (y - t.translate_y) / t.scale,
        }
    }
}
