//! # Page Canvas
//!
//! Loads a directory of HTML pages, applies the design system, runs any
//! requested variant generations, then writes and optionally copies the
//! result.

use std::sync::Arc;

use canvas_core::CanvasWorkspace;
use canvas_studio::{default_clipboard, CliArgs, HttpVariantGenerator, Studio, StudioConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,canvas_studio=debug,canvas_core=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    // Use JSON format in production (RUST_LOG_FORMAT=json)
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = StudioConfig::from(CliArgs::parse());
    tracing::info!(
        "Starting Page Canvas v{} (pages: {})",
        canvas_core::VERSION,
        config.pages_dir.display()
    );

    let generator = HttpVariantGenerator::new(&config.generator_url)?;
    tracing::debug!("Regeneration service: {}", generator.endpoint());

    let workspace = CanvasWorkspace::with_design(config.workspace, config.design.clone());
    let mut studio =
        Studio::new(workspace, Arc::new(generator)).with_clipboard(default_clipboard());

    let loaded = studio.load_pages(&config.pages_dir)?;
    if loaded.is_empty() {
        tracing::warn!("No pages found in {}", config.pages_dir.display());
    }

    for request in &config.variants {
        if let Err(e) = studio.request_variant(&request.page_id, request.variant.as_deref()) {
            tracing::warn!("Cannot generate {}: {e}", request.page_id);
        }
    }
    studio.run_until_idle().await;

    if let Some(ref output) = config.output_dir {
        studio.write_output(output)?;
    }
    if config.copy_to_clipboard {
        studio.copy_code(None);
    }

    let notices = studio.drain_notices();
    tracing::info!("Page Canvas finished with {} notices", notices.len());
    Ok(())
}
