//! Variant generation: the async collaborator that rewrites a page.
//!
//! The workspace only describes a request ([`GenerationRequest`]); a
//! [`VariantGenerator`] turns it into new markup. Results travel back to the
//! host as [`GenerationEvent`]s over an mpsc channel so that generations for
//! different pages can run concurrently.

use async_trait::async_trait;
use canvas_core::GenerationRequest;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

/// Errors from the regeneration service.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The service URL is invalid.
    #[error("invalid generator URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, body read).
    #[error("generator request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("generator returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// The response body did not carry markup.
    #[error("malformed generator response: {0}")]
    Malformed(String),
}

/// Progress of a generation, sent back to the host loop.
#[derive(Debug)]
pub enum GenerationEvent {
    /// Provisional markup streamed while generating.
    Partial {
        /// Page being generated.
        page_id: String,
        /// Markup so far.
        markup: String,
    },
    /// The generation finished.
    Finished {
        /// Page that was generated.
        page_id: String,
        /// New markup or the failure.
        result: Result<String, GenerationError>,
    },
}

/// Where a streaming generator reports partial markup.
#[derive(Debug, Clone)]
pub struct PartialSink {
    page_id: String,
    tx: Option<mpsc::UnboundedSender<GenerationEvent>>,
}

impl PartialSink {
    /// Sink reporting partials for `page_id` on `tx`.
    #[must_use]
    pub fn new(page_id: impl Into<String>, tx: mpsc::UnboundedSender<GenerationEvent>) -> Self {
        Self {
            page_id: page_id.into(),
            tx: Some(tx),
        }
    }

    /// Sink that drops everything.
    #[must_use]
    pub fn discard(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            tx: None,
        }
    }

    /// Page this sink reports for.
    #[must_use]
    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// Report provisional markup. Returns false once the host has gone away.
    pub fn send(&self, markup: impl Into<String>) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        tx.send(GenerationEvent::Partial {
            page_id: self.page_id.clone(),
            markup: markup.into(),
        })
        .is_ok()
    }
}

/// Produces a new variant of a page.
#[async_trait]
pub trait VariantGenerator: Send + Sync {
    /// Generate the full markup of the variant.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] if the variant could not be produced.
    async fn generate_variant(&self, request: &GenerationRequest)
        -> Result<String, GenerationError>;

    /// Generate while reporting provisional markup. The default reports
    /// nothing and waits for the full result.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] if the variant could not be produced.
    async fn generate_streaming(
        &self,
        request: &GenerationRequest,
        partials: PartialSink,
    ) -> Result<String, GenerationError> {
        let _ = partials;
        self.generate_variant(request).await
    }
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    markup: String,
}

/// Regeneration service over HTTP: `POST` the request as JSON and read
/// `{"markup": ...}` back.
#[derive(Debug, Clone)]
pub struct HttpVariantGenerator {
    http: Client,
    endpoint: Url,
}

impl HttpVariantGenerator {
    /// Create a client for the service at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidUrl`] if the URL is malformed.
    /// Returns [`GenerationError::Http`] if the HTTP client fails to build.
    pub fn new(endpoint: &str) -> Result<Self, GenerationError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| GenerationError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .user_agent(concat!("page-canvas/", env!("CARGO_PKG_VERSION")))
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;

        Ok(Self { http, endpoint })
    }

    /// Service endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl VariantGenerator for HttpVariantGenerator {
    async fn generate_variant(
        &self,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        tracing::debug!(
            "POST {} for {} (variant {:?})",
            self.endpoint,
            request.page_id,
            request.variant_name
        );
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerationResponse =
            serde_json::from_str(&body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
        if parsed.markup.trim().is_empty() {
            return Err(GenerationError::Malformed("empty markup".into()));
        }
        Ok(parsed.markup)
    }
}
