//! The conversion service seam.
//!
//! [`ConversionBackend`] is the one network exchange a session performs.
//! [`HttpBackend`] is the real implementation; tests plug in their own.
//!
//! ## Wire contract
//!
//! ```text
//! POST {base}/convert   multipart/form-data
//!   pdf          file  (required)
//!   articleType  text  "abstract" | "full"
//!   figures      file  (zero or more)
//!
//! 2xx      body = ZIP archive
//! non-2xx  body = {"error": "...", "request_id"?: "...", "processing_time"?: 1.2}
//! ```

use crate::config::ClientConfig;
use crate::error::ConvertError;
use crate::file::FileRef;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Message surfaced when a failure body carries no usable `error` field.
pub const GENERIC_FAILURE_MESSAGE: &str = "Conversion failed";

/// Conversion flavour requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleType {
    /// Abstract-only conversion. (default)
    #[default]
    Abstract,
    /// Full-article conversion.
    Full,
}

impl ArticleType {
    /// Value sent in the `articleType` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::Abstract => "abstract",
            ArticleType::Full => "full",
        }
    }
}

impl fmt::Display for ArticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleType {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abstract" => Ok(ArticleType::Abstract),
            "full" => Ok(ArticleType::Full),
            other => Err(ConvertError::InvalidConfig(format!(
                "article type must be 'abstract' or 'full', got '{other}'"
            ))),
        }
    }
}

/// Everything one conversion request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub article_type: ArticleType,
    pub pdf: FileRef,
    pub figures: Vec<FileRef>,
}

/// Performs the single network exchange of a conversion attempt.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Send `request`; on a 2xx answer return the raw ZIP bytes.
    async fn convert(&self, request: &ConversionRequest) -> Result<Vec<u8>, ConvertError>;
}

/// Decoded non-2xx response body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendFailure {
    pub error: String,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub processing_time: Option<f64>,
}

impl BackendFailure {
    /// Decode a failure body, falling back to [`GENERIC_FAILURE_MESSAGE`].
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|_| BackendFailure {
            error: GENERIC_FAILURE_MESSAGE.to_string(),
            request_id: None,
            processing_time: None,
        })
    }

    pub fn into_error(self, status: u16) -> ConvertError {
        ConvertError::Rejected {
            status,
            message: self.error,
            request_id: self.request_id,
        }
    }
}

/// Answer of the service health probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub components: BTreeMap<String, String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// [`ConversionBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    convert_url: Url,
    health_url: Url,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ConvertError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ConvertError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            convert_url: config.convert_url()?,
            health_url: config.health_url()?,
        })
    }

    pub fn convert_url(&self) -> &Url {
        &self.convert_url
    }

    /// Probe `GET {base}/health`.
    pub async fn health(&self) -> Result<HealthStatus, ConvertError> {
        let response = self
            .client
            .get(self.health_url.clone())
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.map_err(transport)?;
            return Err(BackendFailure::from_body(&body).into_error(status.as_u16()));
        }
        response.json::<HealthStatus>().await.map_err(transport)
    }
}

#[async_trait]
impl ConversionBackend for HttpBackend {
    async fn convert(&self, request: &ConversionRequest) -> Result<Vec<u8>, ConvertError> {
        let start = Instant::now();
        info!(
            "Uploading '{}' ({} bytes, {} figure(s), {}) to {}",
            request.pdf.name(),
            request.pdf.len(),
            request.figures.len(),
            request.article_type,
            self.convert_url
        );

        let response = self
            .client
            .post(self.convert_url.clone())
            .multipart(build_form(request)?)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        if !status.is_success() {
            let failure = BackendFailure::from_body(&body);
            warn!(
                "Conversion rejected: HTTP {} '{}' (request id {})",
                status,
                failure.error,
                failure.request_id.as_deref().unwrap_or("-")
            );
            return Err(failure.into_error(status.as_u16()));
        }

        debug!(
            "Received {} byte archive in {}ms",
            body.len(),
            start.elapsed().as_millis()
        );
        Ok(body.to_vec())
    }
}

/// Multipart body for a conversion request.
fn build_form(request: &ConversionRequest) -> Result<Form, ConvertError> {
    let mut form = Form::new()
        .part("pdf", file_part(&request.pdf)?)
        .text("articleType", request.article_type.as_str());
    for figure in &request.figures {
        form = form.part("figures", file_part(figure)?);
    }
    Ok(form)
}

fn file_part(file: &FileRef) -> Result<Part, ConvertError> {
    Part::bytes(file.data().to_vec())
        .file_name(file.name().to_string())
        .mime_str(file.content_type())
        .map_err(|e| {
            ConvertError::Internal(format!(
                "invalid content type '{}' for '{}': {e}",
                file.content_type(),
                file.name()
            ))
        })
}

fn transport(e: reqwest::Error) -> ConvertError {
    ConvertError::Transport {
        reason: e.to_string(),
    }
}
