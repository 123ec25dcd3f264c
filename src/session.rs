//! The conversion session: form fields plus the `idle → converting →
//! completed` state machine.
//!
//! ```text
//!            submit (PDF selected)          success
//!   Idle ─────────────────────────▶ Converting ────────▶ Completed
//!    ▲                                  │                    │
//!    │            failure               │                    │
//!    ├──────────────────────────────────┘                    │
//!    │   download / new PDF / reset                          │
//!    └───────────────────────────────────────────────────────┘
//! ```
//!
//! `submit` takes `&mut self`, so a session cannot be submitted twice or
//! have its PDF swapped while a request is in flight. Dropping the `submit`
//! future cancels the request and leaves the session in `Converting`;
//! [`ConversionSession::reset`] is the way out of that state.

use crate::archive::{decode_archive, ValidationIssue, ValidationReport};
use crate::backend::{ArticleType, ConversionBackend, ConversionRequest};
use crate::config::ClientConfig;
use crate::error::ConvertError;
use crate::file::FileRef;
use crate::intake::{FilesSelected, IntakeSlot, SelectionMode, UploadSelection};
use crate::observer::{NoopObserver, SharedObserver};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Alert raised when submit is pressed with no PDF selected.
pub const MISSING_PDF_MESSAGE: &str = "Please select a PDF file";

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionState {
    #[default]
    Idle,
    Converting,
    Completed,
}

impl ConversionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConversionState::Idle => "idle",
            ConversionState::Converting => "converting",
            ConversionState::Completed => "completed",
        }
    }
}

impl fmt::Display for ConversionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a call to [`ConversionSession::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No PDF selected; the user was alerted and nothing was sent.
    MissingPdf,
    /// A conversion is already running; nothing was sent.
    Busy,
    /// The service returned an archive; the session is `Completed`.
    Completed,
}

/// The archive returned by the last successful conversion.
///
/// Owned by the session and dropped when it is downloaded, replaced by a
/// newer conversion, or the session resets.
#[derive(Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    file_name: String,
    bytes: Vec<u8>,
    entries: Vec<String>,
}

impl DownloadArtifact {
    /// Name to save the archive under: the PDF's name with a `.zip` extension.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Entry names inside the archive, in archive order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for DownloadArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadArtifact")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .field("entries", &self.entries)
            .finish()
    }
}

/// One conversion form and its lifecycle.
pub struct ConversionSession {
    backend: Arc<dyn ConversionBackend>,
    observer: SharedObserver,
    max_pdf_bytes: u64,
    article_type: ArticleType,
    pdf: UploadSelection,
    figures: UploadSelection,
    state: ConversionState,
    issues: Vec<ValidationIssue>,
    report: Option<ValidationReport>,
    artifact: Option<DownloadArtifact>,
}

impl ConversionSession {
    pub fn new(backend: Arc<dyn ConversionBackend>, config: &ClientConfig) -> Self {
        Self {
            backend,
            observer: Arc::new(NoopObserver),
            max_pdf_bytes: config.max_pdf_bytes,
            article_type: ArticleType::default(),
            pdf: UploadSelection::new(SelectionMode::Single),
            figures: UploadSelection::new(SelectionMode::Multiple),
            state: ConversionState::Idle,
            issues: Vec::new(),
            report: None,
            artifact: None,
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn state(&self) -> ConversionState {
        self.state
    }

    pub fn article_type(&self) -> ArticleType {
        self.article_type
    }

    pub fn pdf(&self) -> Option<&FileRef> {
        self.pdf.first()
    }

    pub fn figures(&self) -> &[FileRef] {
        self.figures.files()
    }

    /// Issues currently shown in the validation panel.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Full report of the last successful conversion, if it had one.
    pub fn report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }

    pub fn artifact(&self) -> Option<&DownloadArtifact> {
        self.artifact.as_ref()
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.pdf.first().is_some() && self.state != ConversionState::Converting
    }

    // ── Form fields ──────────────────────────────────────────────────────

    pub fn set_article_type(&mut self, article_type: ArticleType) {
        self.article_type = article_type;
    }

    /// Put `file` in the PDF slot.
    ///
    /// A new PDF starts over: state goes back to `Idle`, the previous
    /// archive is dropped and the validation panel is cleared.
    pub fn select_pdf(&mut self, file: FileRef) -> Result<(), ConvertError> {
        if self.state == ConversionState::Converting {
            return Err(self.alert(ConvertError::ConversionInProgress));
        }
        if !file.looks_like_pdf() {
            return Err(self.alert(ConvertError::NotAPdf {
                name: file.name().to_string(),
            }));
        }
        if file.len() > self.max_pdf_bytes {
            return Err(self.alert(ConvertError::PdfTooLarge {
                name: file.name().to_string(),
                size: file.len(),
                limit: self.max_pdf_bytes,
            }));
        }

        info!("Selected PDF '{}' ({} bytes)", file.name(), file.len());
        self.pdf.replace(file);
        self.artifact = None;
        self.clear_issues();
        self.set_state(ConversionState::Idle);
        Ok(())
    }

    /// Append figure images. Duplicates are kept.
    pub fn add_figures(&mut self, files: impl IntoIterator<Item = FileRef>) {
        let before = self.figures.files().len();
        self.figures.append(files);
        debug!(
            "Added {} figure(s), {} total",
            self.figures.files().len() - before,
            self.figures.files().len()
        );
    }

    /// Consume an event from a [`crate::intake::FileIntake`].
    pub fn apply(&mut self, event: FilesSelected) -> Result<(), ConvertError> {
        match event.slot {
            IntakeSlot::Pdf => match event.files.into_iter().next() {
                Some(file) => self.select_pdf(file),
                None => Ok(()),
            },
            IntakeSlot::Figures => {
                self.add_figures(event.files);
                Ok(())
            }
        }
    }

    /// Hide the validation panel.
    pub fn dismiss_issues(&mut self) {
        self.issues.clear();
    }

    // ── Conversion ───────────────────────────────────────────────────────

    /// Send the selected PDF and figures to the conversion service.
    ///
    /// A missing PDF or a conversion already in flight is not an error: the
    /// call reports it through [`SubmitOutcome`] and sends nothing. Any
    /// failure of the attempt itself is alerted, returns the session to
    /// `Idle` and is returned as `Err`.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ConvertError> {
        if self.state == ConversionState::Converting {
            debug!("Submit ignored: conversion in progress");
            return Ok(SubmitOutcome::Busy);
        }
        let Some(pdf) = self.pdf.first().cloned() else {
            self.observer.on_alert(MISSING_PDF_MESSAGE);
            return Ok(SubmitOutcome::MissingPdf);
        };

        let request = ConversionRequest {
            article_type: self.article_type,
            pdf,
            figures: self.figures.files().to_vec(),
        };
        self.set_state(ConversionState::Converting);

        let result = match self.backend.convert(&request).await {
            Ok(bytes) => decode_archive(&bytes).map(|decoded| (bytes, decoded)),
            Err(e) => Err(e),
        };

        match result {
            Ok((bytes, decoded)) => {
                // Release the superseded archive before holding the new one.
                self.artifact = None;
                self.issues = decoded
                    .report
                    .as_ref()
                    .map(|r| r.errors().to_vec())
                    .unwrap_or_default();
                if let Some(ref report) = decoded.report {
                    self.observer.on_report(report);
                }
                self.report = decoded.report;
                self.artifact = Some(DownloadArtifact {
                    file_name: request.pdf.archive_name(),
                    bytes,
                    entries: decoded.entries,
                });
                info!(
                    "Conversion of '{}' completed with {} validation issue(s)",
                    request.pdf.name(),
                    self.issues.len()
                );
                self.set_state(ConversionState::Completed);
                Ok(SubmitOutcome::Completed)
            }
            Err(e) => {
                self.artifact = None;
                self.clear_issues();
                let e = self.alert(e);
                self.set_state(ConversionState::Idle);
                Err(e)
            }
        }
    }

    // ── Download ─────────────────────────────────────────────────────────

    /// Save the archive into `dir` and start over.
    ///
    /// Writes `dir/<pdf stem>.zip` (temp file + rename, so a crash never
    /// leaves half an archive), then clears the PDF, the figures, the
    /// validation panel and the archive. On a write error nothing is reset.
    pub async fn download_to(&mut self, dir: impl AsRef<Path>) -> Result<PathBuf, ConvertError> {
        let artifact = self.completed_artifact()?;
        let dir = dir.as_ref();
        let path = dir.join(artifact.file_name());

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;

        let tmp_path = path.with_extension("zip.tmp");
        tokio::fs::write(&tmp_path, artifact.bytes())
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: path.clone(),
                source: e,
            })?;

        info!("Saved {} ({} bytes)", path.display(), artifact.len());
        self.reset();
        Ok(path)
    }

    /// Hand the archive to the caller and start over.
    pub fn take_download(&mut self) -> Result<DownloadArtifact, ConvertError> {
        self.completed_artifact()?;
        let artifact = self.artifact.take().ok_or(ConvertError::NothingToDownload)?;
        self.reset();
        Ok(artifact)
    }

    /// Start over from any state: clear every field and drop the archive.
    pub fn reset(&mut self) {
        self.pdf.clear();
        self.figures.clear();
        self.artifact = None;
        self.clear_issues();
        self.set_state(ConversionState::Idle);
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn completed_artifact(&self) -> Result<&DownloadArtifact, ConvertError> {
        match (&self.state, &self.artifact) {
            (ConversionState::Completed, Some(artifact)) => Ok(artifact),
            _ => Err(ConvertError::NothingToDownload),
        }
    }

    fn clear_issues(&mut self) {
        self.issues.clear();
        self.report = None;
    }

    fn set_state(&mut self, to: ConversionState) {
        let from = self.state;
        if from != to {
            debug!("Session state {} → {}", from, to);
            self.state = to;
            self.observer.on_state_change(from, to);
        }
    }

    /// Surface `e` to the user and hand it back for returning.
    fn alert(&self, e: ConvertError) -> ConvertError {
        warn!("{}", e);
        self.observer.on_alert(&e.to_string());
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::zip_of;
    use crate::archive::VALIDATION_REPORT_ENTRY;
    use crate::intake::FileIntake;
    use crate::observer::SessionObserver;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Backend answering from a script and recording every request.
    #[derive(Default)]
    struct ScriptedBackend {
        answers: Mutex<VecDeque<Result<Vec<u8>, ConvertError>>>,
        requests: Mutex<Vec<ConversionRequest>>,
        hang: bool,
    }

    impl ScriptedBackend {
        fn answering(answers: Vec<Result<Vec<u8>, ConvertError>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                ..Default::default()
            })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(Self {
                hang: true,
                ..Default::default()
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ConversionBackend for ScriptedBackend {
        async fn convert(&self, request: &ConversionRequest) -> Result<Vec<u8>, ConvertError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ConvertError::Internal("no scripted answer".into())))
        }
    }

    #[derive(Default)]
    struct AlertLog {
        alerts: Mutex<Vec<String>>,
        transitions: Mutex<Vec<(ConversionState, ConversionState)>>,
    }

    impl SessionObserver for AlertLog {
        fn on_alert(&self, message: &str) {
            self.alerts.lock().unwrap().push(message.to_string());
        }

        fn on_state_change(&self, from: ConversionState, to: ConversionState) {
            self.transitions.lock().unwrap().push((from, to));
        }
    }

    fn session_with(backend: Arc<ScriptedBackend>) -> (ConversionSession, Arc<AlertLog>) {
        let log = Arc::new(AlertLog::default());
        let session =
            ConversionSession::new(backend, &ClientConfig::default()).with_observer(log.clone());
        (session, log)
    }

    fn pdf(name: &str) -> FileRef {
        FileRef::from_bytes(name, b"%PDF-1.7 test".to_vec())
    }

    fn report_zip(report: &str) -> Vec<u8> {
        zip_of(&[
            ("paper.xml", b"<article/>"),
            (VALIDATION_REPORT_ENTRY, report.as_bytes()),
        ])
    }

    fn rejected(message: &str) -> ConvertError {
        ConvertError::Rejected {
            status: 500,
            message: message.into(),
            request_id: None,
        }
    }

    #[tokio::test]
    async fn submit_without_pdf_is_a_noop() {
        let backend = ScriptedBackend::answering(vec![]);
        let (mut session, log) = session_with(backend.clone());

        assert!(!session.can_submit());
        let outcome = session.submit().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::MissingPdf);
        assert_eq!(session.state(), ConversionState::Idle);
        assert_eq!(backend.calls(), 0);
        assert_eq!(*log.alerts.lock().unwrap(), [MISSING_PDF_MESSAGE]);
    }

    #[tokio::test]
    async fn successful_submit_shows_report_errors() {
        let backend = ScriptedBackend::answering(vec![Ok(report_zip(
            r#"{"errors":[{"element":"title","message":"missing"}]}"#,
        ))]);
        let (mut session, log) = session_with(backend.clone());
        session.select_pdf(pdf("paper.pdf")).unwrap();
        session.set_article_type(ArticleType::Full);
        session.add_figures([FileRef::from_bytes("f1.png", vec![1])]);

        let outcome = session.submit().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Completed);
        assert_eq!(session.state(), ConversionState::Completed);
        assert_eq!(session.issues().len(), 1);
        assert_eq!(session.issues()[0].to_string(), "title: missing");
        assert!(session.issues()[0].suggestion.is_none());

        let artifact = session.artifact().unwrap();
        assert_eq!(artifact.file_name(), "paper.zip");
        assert_eq!(artifact.entries(), ["paper.xml", VALIDATION_REPORT_ENTRY]);

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].article_type, ArticleType::Full);
        assert_eq!(requests[0].figures.len(), 1);
        assert_eq!(
            *log.transitions.lock().unwrap(),
            [
                (ConversionState::Idle, ConversionState::Converting),
                (ConversionState::Converting, ConversionState::Completed),
            ]
        );
    }

    #[tokio::test]
    async fn archive_without_report_leaves_panel_empty() {
        let backend =
            ScriptedBackend::answering(vec![Ok(zip_of(&[("paper.xml", b"<article/>")]))]);
        let (mut session, _) = session_with(backend);
        session.select_pdf(pdf("paper.pdf")).unwrap();

        session.submit().await.unwrap();

        assert_eq!(session.state(), ConversionState::Completed);
        assert!(session.issues().is_empty());
        assert!(session.report().is_none());
    }

    #[tokio::test]
    async fn null_warnings_in_report_still_complete() {
        let backend = ScriptedBackend::answering(vec![Ok(report_zip(
            r#"{"errors":[{"element":"title","message":"missing"}],"warnings":null}"#,
        ))]);
        let (mut session, log) = session_with(backend);
        session.select_pdf(pdf("paper.pdf")).unwrap();

        assert_eq!(session.submit().await.unwrap(), SubmitOutcome::Completed);
        assert_eq!(session.state(), ConversionState::Completed);
        assert_eq!(session.issues()[0].to_string(), "title: missing");
        assert!(session.artifact().is_some());
        assert!(log.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn later_conversion_without_report_clears_earlier_issues() {
        let backend = ScriptedBackend::answering(vec![
            Ok(report_zip(
                r#"{"errors":[{"element":"title","message":"missing"}]}"#,
            )),
            Ok(zip_of(&[("paper.xml", b"<article/>")])),
        ]);
        let (mut session, _) = session_with(backend.clone());
        session.select_pdf(pdf("paper.pdf")).unwrap();

        session.submit().await.unwrap();
        assert_eq!(session.issues().len(), 1);
        assert!(session.report().is_some());

        assert_eq!(session.submit().await.unwrap(), SubmitOutcome::Completed);
        assert_eq!(backend.calls(), 2);
        assert_eq!(session.state(), ConversionState::Completed);
        assert!(session.issues().is_empty());
        assert!(session.report().is_none());
        assert_eq!(session.artifact().unwrap().entries(), ["paper.xml"]);
    }

    #[tokio::test]
    async fn server_error_returns_to_idle_with_exact_message() {
        let backend = ScriptedBackend::answering(vec![Err(rejected("bad pdf"))]);
        let (mut session, log) = session_with(backend);
        session.select_pdf(pdf("paper.pdf")).unwrap();

        let err = session.submit().await.unwrap_err();

        assert_eq!(err.to_string(), "bad pdf");
        assert_eq!(session.state(), ConversionState::Idle);
        assert!(session.artifact().is_none());
        assert_eq!(*log.alerts.lock().unwrap(), ["bad pdf"]);
    }

    #[tokio::test]
    async fn failure_clears_issues_from_earlier_success() {
        let backend = ScriptedBackend::answering(vec![
            Ok(report_zip(r#"{"errors":[{"element":"title","message":"missing"}]}"#)),
            Err(rejected("Conversion failed")),
        ]);
        let (mut session, _) = session_with(backend);
        session.select_pdf(pdf("paper.pdf")).unwrap();

        session.submit().await.unwrap();
        assert_eq!(session.issues().len(), 1);

        // Resubmitting from Completed is allowed.
        assert!(session.can_submit());
        assert!(session.submit().await.is_err());
        assert!(session.issues().is_empty());
        assert!(session.report().is_none());
        assert!(session.artifact().is_none());
    }

    #[tokio::test]
    async fn malformed_archive_fails_the_attempt() {
        let backend = ScriptedBackend::answering(vec![Ok(b"not a zip".to_vec())]);
        let (mut session, log) = session_with(backend);
        session.select_pdf(pdf("paper.pdf")).unwrap();

        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, ConvertError::MalformedArchive { .. }));
        assert_eq!(session.state(), ConversionState::Idle);
        assert_eq!(log.alerts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn new_pdf_resets_completed_session() {
        let backend = ScriptedBackend::answering(vec![Ok(report_zip(
            r#"{"errors":[{"element":"title","message":"missing"}]}"#,
        ))]);
        let (mut session, _) = session_with(backend);
        session.select_pdf(pdf("first.pdf")).unwrap();
        session.submit().await.unwrap();

        session.select_pdf(pdf("second.pdf")).unwrap();

        assert_eq!(session.state(), ConversionState::Idle);
        assert!(session.issues().is_empty());
        assert!(session.artifact().is_none());
        assert_eq!(session.pdf().map(|f| f.name()), Some("second.pdf"));
    }

    #[tokio::test]
    async fn non_pdf_is_rejected_and_alerted() {
        let (mut session, log) = session_with(ScriptedBackend::answering(vec![]));
        let err = session
            .select_pdf(FileRef::from_bytes("figure.png", vec![0x89, b'P', b'N', b'G']))
            .unwrap_err();

        assert!(matches!(err, ConvertError::NotAPdf { .. }));
        assert!(session.pdf().is_none());
        assert_eq!(log.alerts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn oversized_pdf_is_rejected() {
        let config = ClientConfig::builder().max_pdf_bytes(4).build().unwrap();
        let mut session = ConversionSession::new(ScriptedBackend::answering(vec![]), &config);

        let err = session.select_pdf(pdf("big.pdf")).unwrap_err();
        assert!(matches!(err, ConvertError::PdfTooLarge { limit: 4, .. }));
    }

    #[tokio::test]
    async fn download_writes_archive_and_starts_over() {
        let zip = zip_of(&[("paper.xml", b"<article/>")]);
        let backend = ScriptedBackend::answering(vec![Ok(zip.clone())]);
        let (mut session, _) = session_with(backend.clone());
        session.select_pdf(pdf("paper.pdf")).unwrap();
        session.add_figures([FileRef::from_bytes("f1.png", vec![1])]);
        session.submit().await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = session.download_to(dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("paper.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), zip);
        assert!(!dir.path().join("paper.zip.tmp").exists());

        assert_eq!(session.state(), ConversionState::Idle);
        assert!(session.pdf().is_none());
        assert!(session.figures().is_empty());
        assert!(session.issues().is_empty());
        assert!(session.artifact().is_none());

        // Nothing selected any more: submit is a no-op again.
        assert_eq!(session.submit().await.unwrap(), SubmitOutcome::MissingPdf);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn download_before_completion_fails() {
        let (mut session, _) = session_with(ScriptedBackend::answering(vec![]));
        session.select_pdf(pdf("paper.pdf")).unwrap();

        assert!(matches!(
            session.take_download(),
            Err(ConvertError::NothingToDownload)
        ));
        let dir = tempfile::tempdir().unwrap();
        assert!(session.download_to(dir.path()).await.is_err());
        assert!(session.pdf().is_some(), "failed download must not reset");
    }

    #[tokio::test]
    async fn take_download_hands_over_bytes() {
        let zip = zip_of(&[("paper.xml", b"<article/>")]);
        let (mut session, _) = session_with(ScriptedBackend::answering(vec![Ok(zip.clone())]));
        session.select_pdf(pdf("paper.pdf")).unwrap();
        session.submit().await.unwrap();

        let artifact = session.take_download().unwrap();
        assert_eq!(artifact.into_bytes(), zip);
        assert_eq!(session.state(), ConversionState::Idle);
        assert!(session.pdf().is_none());
    }

    #[tokio::test]
    async fn dropped_submit_blocks_reselection_until_reset() {
        let backend = ScriptedBackend::hanging();
        let (mut session, _) = session_with(backend.clone());
        session.select_pdf(pdf("paper.pdf")).unwrap();

        let timed_out = tokio::time::timeout(Duration::from_millis(20), session.submit()).await;
        assert!(timed_out.is_err());
        assert_eq!(session.state(), ConversionState::Converting);
        assert!(!session.can_submit());

        assert!(matches!(
            session.select_pdf(pdf("other.pdf")),
            Err(ConvertError::ConversionInProgress)
        ));
        assert_eq!(session.submit().await.unwrap(), SubmitOutcome::Busy);
        assert_eq!(backend.calls(), 1);

        session.reset();
        assert_eq!(session.state(), ConversionState::Idle);
        session.select_pdf(pdf("other.pdf")).unwrap();
    }

    #[tokio::test]
    async fn intake_events_drive_the_session() {
        let (mut session, _) = session_with(ScriptedBackend::answering(vec![]));
        let pdf_intake = FileIntake::pdf();
        let figure_intake = FileIntake::figures();

        let f = FileRef::from_bytes("F.png", vec![1]);
        let g = FileRef::from_bytes("G.png", vec![2]);
        session.add_figures([FileRef::from_bytes("E.png", vec![0])]);
        for batch in [vec![f.clone()], vec![g.clone()]] {
            let event = figure_intake.select(batch).unwrap();
            assert_eq!(event.files.len(), 1);
            session.apply(event).unwrap();
        }
        let event = pdf_intake.select(vec![pdf("paper.pdf")]).unwrap();
        session.apply(event).unwrap();

        let names: Vec<&str> = session.figures().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["E.png", "F.png", "G.png"]);
        assert_eq!(session.pdf().map(|f| f.name()), Some("paper.pdf"));
        assert!(session.can_submit());
    }

    #[tokio::test]
    async fn dismiss_issues_hides_panel_only() {
        let backend = ScriptedBackend::answering(vec![Ok(report_zip(
            r#"{"errors":[{"element":"title","message":"missing","suggestion":"Add a title"}]}"#,
        ))]);
        let (mut session, _) = session_with(backend);
        session.select_pdf(pdf("paper.pdf")).unwrap();
        session.submit().await.unwrap();
        assert_eq!(session.issues()[0].suggestion.as_deref(), Some("Add a title"));

        session.dismiss_issues();
        assert!(session.issues().is_empty());
        assert_eq!(session.state(), ConversionState::Completed);
        assert!(session.artifact().is_some());
    }
}
