//! Client configuration.
//!
//! Every knob the client needs lives in [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. Defaults match the conversion service as it
//! ships: listening on `http://localhost:5000`, accepting PDFs up to 50 MiB,
//! and taking as long as it needs (no request timeout).

use crate::error::ConvertError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Largest PDF the conversion service accepts (50 MiB).
pub const DEFAULT_MAX_PDF_BYTES: u64 = 50 * 1024 * 1024;

/// Configuration for talking to the conversion service.
///
/// # Example
/// ```rust
/// use pdf2pubmed::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://converter.internal:8080")
///     .request_timeout_secs(300)
///     .build()
///     .unwrap();
/// assert_eq!(config.convert_url().unwrap().path(), "/convert");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root URL of the conversion service. Default: `http://localhost:5000`.
    pub base_url: String,

    /// Whole-request timeout in seconds. Default: none.
    ///
    /// Conversions of long articles routinely take minutes on the server, so
    /// the request runs to completion unless the caller opts in.
    pub request_timeout_secs: Option<u64>,

    /// TCP connect timeout in seconds. Default: 10.
    pub connect_timeout_secs: u64,

    /// PDFs above this size are rejected before upload. Default: 50 MiB.
    pub max_pdf_bytes: u64,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: None,
            connect_timeout_secs: 10,
            max_pdf_bytes: DEFAULT_MAX_PDF_BYTES,
            user_agent: concat!("pdf2pubmed/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// `POST` target for conversions.
    pub fn convert_url(&self) -> Result<Url, ConvertError> {
        self.endpoint("convert")
    }

    /// `GET` target for the service health probe.
    pub fn health_url(&self) -> Result<Url, ConvertError> {
        self.endpoint("health")
    }

    fn endpoint(&self, path: &str) -> Result<Url, ConvertError> {
        // A trailing slash makes `join` append instead of replacing the last segment.
        let mut base = self.base_url.trim_end_matches('/').to_string();
        base.push('/');
        Url::parse(&base)
            .and_then(|u| u.join(path))
            .map_err(|e| ConvertError::InvalidConfig(format!("base URL '{}': {e}", self.base_url)))
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = secs.max(1);
        self
    }

    pub fn max_pdf_bytes(mut self, bytes: u64) -> Self {
        self.config.max_pdf_bytes = bytes;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ConvertError> {
        let c = &self.config;
        let url = c.convert_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConvertError::InvalidConfig(format!(
                "base URL must be http or https, got '{}'",
                c.base_url
            )));
        }
        if c.max_pdf_bytes == 0 {
            return Err(ConvertError::InvalidConfig(
                "max_pdf_bytes must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_service() {
        let c = ClientConfig::default();
        assert_eq!(c.convert_url().unwrap().as_str(), "http://localhost:5000/convert");
        assert_eq!(c.health_url().unwrap().as_str(), "http://localhost:5000/health");
        assert_eq!(c.request_timeout_secs, None);
        assert_eq!(c.max_pdf_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn base_url_with_path_prefix_keeps_prefix() {
        let c = ClientConfig::builder()
            .base_url("https://example.org/api/")
            .build()
            .unwrap();
        assert_eq!(c.convert_url().unwrap().as_str(), "https://example.org/api/convert");

        let c = ClientConfig::builder()
            .base_url("https://example.org/api")
            .build()
            .unwrap();
        assert_eq!(c.convert_url().unwrap().as_str(), "https://example.org/api/convert");
    }

    #[test]
    fn build_rejects_bad_urls() {
        assert!(ClientConfig::builder().base_url("not a url").build().is_err());
        assert!(ClientConfig::builder().base_url("ftp://example.org").build().is_err());
    }

    #[test]
    fn build_rejects_zero_size_limit() {
        let err = ClientConfig::builder().max_pdf_bytes(0).build().unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn timeouts_are_clamped() {
        let c = ClientConfig::builder()
            .request_timeout_secs(0)
            .connect_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.request_timeout_secs, Some(1));
        assert_eq!(c.connect_timeout_secs, 1);
    }
}
