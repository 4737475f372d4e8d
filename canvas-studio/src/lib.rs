//! # Page Canvas Studio
//!
//! Host for the page canvas: configuration, logging, the variant generator,
//! the icon set, clipboard access and the async loop that ties them to a
//! [`canvas_core::CanvasWorkspace`].
//!
//! ```text
//! pages/*.html ──► Studio ──► CanvasWorkspace ──► themed output
//!                    │  ▲
//!        spawn task  ▼  │ GenerationEvent (mpsc)
//!                VariantGenerator (HTTP)
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod clipboard;
pub mod config;
pub mod generator;
pub mod icons;
pub mod studio;

#[cfg(feature = "clipboard")]
pub use clipboard::SystemClipboard;
pub use clipboard::{
    default_clipboard, ClipboardError, ClipboardSink, DisabledClipboard, MemoryClipboard,
};
pub use config::{CliArgs, StudioConfig, VariantRequest};
pub use generator::{
    GenerationError, GenerationEvent, HttpVariantGenerator, PartialSink, VariantGenerator,
};
pub use icons::BuiltinIcons;
pub use studio::{Studio, StudioError, StudioResult};
