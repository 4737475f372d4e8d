//! # Page Canvas Core
//!
//! Core logic for a visual page canvas: several independent HTML pages shown
//! side by side in a pan/zoom workspace, edited in place from the outside.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 CanvasWorkspace                 │
//! ├─────────────────────────────────────────────────┤
//! │  Page Registry   │  Viewport                    │
//! │  - Ordered pages │  - Pan / zoom transform      │
//! │  - Snapshots     │  - Frame layout, projection  │
//! ├─────────────────────────────────────────────────┤
//! │  Rendering Surfaces (one per page)              │
//! │  - Themed markup │  - Reload policy             │
//! │  - Live document │  - Interaction bridge        │
//! ├─────────────────────────────────────────────────┤
//! │  Selection Model │  Toolbar    │  History       │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Data flows down from the registry through the theming engine into the
//! surfaces; pointer activity flows back up as [`BridgeMessage`]s; edits flow
//! down again as [`HostCommand`]s and are flushed back into the registry.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bridge;
pub mod color;
pub mod design;
pub mod dom;
pub mod element;
pub mod error;
pub mod history;
pub mod protocol;
pub mod registry;
pub mod selection;
pub mod state;
pub mod store;
pub mod style;
pub mod surface;
pub mod theme;
pub mod toolbar;
pub mod viewport;
pub mod workspace;

pub use bridge::SurfaceBridge;
pub use design::{ColorMode, DesignSystem};
pub use dom::{Document, NodeId};
pub use element::{
    DomPath, ElementSnapshot, HoverDescriptor, PathStep, Point, Rect, SelectionDescriptor,
};
pub use error::{CanvasError, CanvasResult};
pub use history::History;
pub use protocol::{BridgeMessage, HostCommand, Mutation};
pub use registry::{Page, PageRegistry, RegistrySnapshot};
pub use selection::SelectionModel;
pub use state::{Notice, NoticeLevel, SurfaceState, ToolMode};
pub use store::{Store, SubscriptionId};
pub use surface::{ReloadReason, RenderingSurface, SurfaceInputs};
pub use theme::{apply_theme, strip_theme};
pub use toolbar::{ColorTarget, IconSource, Toolbar, ToolbarPanel, PALETTE};
pub use viewport::{FrameLayout, ViewTransform, Viewport};
pub use workspace::{CanvasWorkspace, GenerationRequest, WorkspaceConfig};

/// Canvas core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
