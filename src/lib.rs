//! # pdf2pubmed
//!
//! Client for a PDF → PubMed XML conversion service.
//!
//! Select an article PDF (and optionally its figure images), send them to
//! the service, read the validation report out of the ZIP it answers with,
//! and save that ZIP. The conversion itself happens on the server; this
//! crate drives the form and its lifecycle.
//!
//! ## Flow
//!
//! ```text
//! FileIntake ──FilesSelected──▶ ConversionSession ──POST /convert──▶ service
//!                                      │                               │
//!                                      ◀──────────── ZIP ──────────────┘
//!                                      │
//!                                      ├─ validation_report.json → issues
//!                                      └─ download_to(dir) → <pdf stem>.zip
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2pubmed::{ArticleType, ClientConfig, ConversionSession, FileRef, HttpBackend};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default();
//!     let backend = Arc::new(HttpBackend::new(&config)?);
//!     let mut session = ConversionSession::new(backend, &config);
//!
//!     session.select_pdf(FileRef::from_path("article.pdf").await?)?;
//!     session.add_figures([FileRef::from_path("fig1.png").await?]);
//!     session.set_article_type(ArticleType::Full);
//!     session.submit().await?;
//!
//!     for issue in session.issues() {
//!         eprintln!("{issue}");
//!     }
//!     let saved = session.download_to(".").await?;
//!     println!("saved {}", saved.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2pubmed` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod backend;
pub mod config;
pub mod error;
pub mod file;
pub mod intake;
pub mod observer;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use archive::{decode_archive, DecodedArchive, ValidationIssue, ValidationReport};
pub use backend::{
    ArticleType, BackendFailure, ConversionBackend, ConversionRequest, HealthStatus, HttpBackend,
};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::ConvertError;
pub use file::FileRef;
pub use intake::{
    AcceptFilter, FileIntake, FilesSelected, IntakeSlot, SelectionCallback, SelectionMode,
    UploadSelection,
};
pub use observer::{NoopObserver, SessionObserver, SharedObserver};
pub use session::{ConversionSession, ConversionState, DownloadArtifact, SubmitOutcome};
