//! In-memory decoding of the archive the conversion service returns.
//!
//! A successful conversion answers with a ZIP holding the original PDF, the
//! generated XML, any figures, and usually a `validation_report.json`. Only
//! the report is examined here; every other entry is passed through to the
//! user untouched. A missing report is not an error.

use crate::error::ConvertError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// Exact entry name of the validation report inside the archive.
pub const VALIDATION_REPORT_ENTRY: &str = "validation_report.json";

/// One problem the service found in the generated XML.
///
/// Absent or null fields decode to their defaults; only JSON that does not
/// parse at all rejects the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub element: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ValidationIssue {
    pub fn new(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            message: message.into(),
            suggestion: None,
            severity: None,
            line_number: None,
            context: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.element, self.message)
    }
}

/// Contents of `validation_report.json`.
///
/// `errors` stays `None` when the field is absent so callers can tell "no
/// errors field" from "an empty list".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default)]
    pub is_valid: Option<bool>,
    #[serde(default)]
    pub errors: Option<Vec<ValidationIssue>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub warnings: Vec<ValidationIssue>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ValidationReport {
    pub fn from_json(text: &str) -> Result<Self, ConvertError> {
        serde_json::from_str(text).map_err(|e| ConvertError::MalformedReport {
            detail: e.to_string(),
        })
    }

    pub fn errors(&self) -> &[ValidationIssue] {
        self.errors.as_deref().unwrap_or_default()
    }

    /// Human-readable report, one numbered entry per issue.
    pub fn render_text(&self) -> String {
        let mut lines = vec![
            "PubMed XML Validation Report".to_string(),
            "============================".to_string(),
        ];
        if let Some(ref ts) = self.timestamp {
            lines.push(format!("Timestamp: {ts}"));
        }
        let valid = self.is_valid.unwrap_or(self.errors().is_empty());
        lines.push(format!("Valid: {}", if valid { "Yes" } else { "No" }));
        lines.push(format!("Errors: {}", self.errors().len()));
        lines.push(format!("Warnings: {}", self.warnings.len()));
        lines.push(String::new());

        render_section(&mut lines, "Errors", self.errors());
        render_section(&mut lines, "Warnings", &self.warnings);

        if self.errors().is_empty() && self.warnings.is_empty() {
            lines.push("Congratulations! The XML is valid and has no warnings.".to_string());
        }
        lines.join("\n")
    }
}

fn render_section(lines: &mut Vec<String>, title: &str, issues: &[ValidationIssue]) {
    if issues.is_empty() {
        return;
    }
    lines.push(format!("{title}:"));
    lines.push("-".repeat(title.len() + 1));
    for (i, issue) in issues.iter().enumerate() {
        lines.push(format!("{}. {issue}", i + 1));
        if let Some(line) = issue.line_number {
            lines.push(format!("   Line: {line}"));
        }
        if let Some(ref s) = issue.suggestion {
            lines.push(format!("   Suggestion: {s}"));
        }
        lines.push(String::new());
    }
}

/// What the client learned from a response archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedArchive {
    /// Entry names in archive order.
    pub entries: Vec<String>,
    /// Parsed `validation_report.json`, if the archive has one.
    pub report: Option<ValidationReport>,
}

/// Decode a response body as a ZIP and pull out the validation report.
pub fn decode_archive(bytes: &[u8]) -> Result<DecodedArchive, ConvertError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(malformed)?;
    let entries: Vec<String> = archive.file_names().map(str::to_string).collect();
    debug!("Archive holds {} entries", entries.len());

    let report = match archive.by_name(VALIDATION_REPORT_ENTRY) {
        Ok(mut entry) => {
            let mut text = String::new();
            entry
                .read_to_string(&mut text)
                .map_err(|e| ConvertError::MalformedReport {
                    detail: e.to_string(),
                })?;
            Some(ValidationReport::from_json(&text)?)
        }
        Err(ZipError::FileNotFound) => None,
        Err(e) => return Err(malformed(e)),
    };

    Ok(DecodedArchive { entries, report })
}

fn malformed(e: ZipError) -> ConvertError {
    ConvertError::MalformedArchive {
        detail: e.to_string(),
    }
}
