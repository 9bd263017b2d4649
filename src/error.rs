//! Error types for the edgequake-papersum library.
//!
//! Every failure in the pipeline is terminal for the current run, but they
//! are not all the same kind of failure. [`PaperSumError::kind`] groups the
//! variants into the buckets callers actually branch on:
//!
//! | Kind | Raised by | Typical cause |
//! |------|-----------|---------------|
//! | [`FailureKind::Extraction`] | text extractor | missing file, not a PDF, no text |
//! | [`FailureKind::Request`]    | model call     | no API key, network, quota |
//! | [`FailureKind::Parse`]      | normaliser     | model reply is not JSON |
//! | [`FailureKind::Validation`] | schema check   | JSON is fine, content breaks a constraint |
//!
//! Parse and validation failures are deliberately separate variants: the
//! first means the model ignored the output format, the second means it
//! followed the format but got the content wrong.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-papersum library.
#[derive(Debug, Error)]
pub enum PaperSumError {
    // ── Extraction errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The document opened but has no pages at all.
    #[error("PDF '{path}' has no pages")]
    EmptyDocument { path: PathBuf },

    /// Text handed to the analyser is empty or whitespace.
    #[error("Paper text is empty; nothing to summarise")]
    EmptyText,

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Request errors ────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model service call itself failed (network, auth, quota).
    #[error("LLM request failed: {message}")]
    RequestFailed { message: String },

    /// The reply carried neither a tool invocation nor any text.
    #[error("LLM returned an empty reply (finish reason: {finish_reason})")]
    EmptyReply { finish_reason: String },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// The normalised payload is not valid JSON.
    #[error("Model output is not valid JSON: {detail}{}", dump_hint(.dump))]
    ParseFailed {
        detail: String,
        /// Where the offending payload was written, if the dump succeeded.
        dump: Option<PathBuf>,
    },

    // ── Validation errors ─────────────────────────────────────────────────
    /// The payload parsed but violates the summary schema.
    #[error("Summary failed validation at `{field}`: {reason}")]
    ValidationFailed { field: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the report file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn dump_hint(dump: &Option<PathBuf>) -> String {
    match dump {
        Some(path) => format!("\nRaw payload saved to '{}' for inspection.", path.display()),
        None => String::new(),
    }
}

/// Coarse classification of a [`PaperSumError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Extraction,
    Request,
    Parse,
    Validation,
    Config,
    Output,
    /// Runtime or task failures that belong to no pipeline stage.
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Extraction => "extraction",
            FailureKind::Request => "request",
            FailureKind::Parse => "parse",
            FailureKind::Validation => "validation",
            FailureKind::Config => "config",
            FailureKind::Output => "output",
            FailureKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl PaperSumError {
    /// Which stage of the pipeline this error belongs to.
    pub fn kind(&self) -> FailureKind {
        match self {
            PaperSumError::FileNotFound { .. }
            | PaperSumError::PermissionDenied { .. }
            | PaperSumError::NotAPdf { .. }
            | PaperSumError::CorruptPdf { .. }
            | PaperSumError::PasswordRequired { .. }
            | PaperSumError::WrongPassword { .. }
            | PaperSumError::EmptyDocument { .. }
            | PaperSumError::EmptyText
            | PaperSumError::PdfiumBindingFailed(_) => FailureKind::Extraction,
            PaperSumError::ProviderNotConfigured { .. }
            | PaperSumError::RequestFailed { .. }
            | PaperSumError::EmptyReply { .. } => FailureKind::Request,
            PaperSumError::ParseFailed { .. } => FailureKind::Parse,
            PaperSumError::ValidationFailed { .. } => FailureKind::Validation,
            PaperSumError::InvalidConfig(_) => FailureKind::Config,
            PaperSumError::OutputWriteFailed { .. } => FailureKind::Output,
            PaperSumError::Internal(_) => FailureKind::Internal,
        }
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PaperSumError::ValidationFailed {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_validation_are_distinct_kinds() {
        let parse = PaperSumError::ParseFailed {
            detail: "expected value at line 1 column 1".into(),
            dump: None,
        };
        let validation = PaperSumError::validation("relevance_score", "must be 1-10, got 11");
        assert_eq!(parse.kind(), FailureKind::Parse);
        assert_eq!(validation.kind(), FailureKind::Validation);
        assert_ne!(parse.kind(), validation.kind());
    }

    #[test]
    fn parse_failed_mentions_dump_location() {
        let e = PaperSumError::ParseFailed {
            detail: "trailing characters".into(),
            dump: Some(PathBuf::from("debug_json.txt")),
        };
        let msg = e.to_string();
        assert!(msg.contains("debug_json.txt"), "got: {msg}");
    }

    #[test]
    fn parse_failed_without_dump_has_no_hint() {
        let e = PaperSumError::ParseFailed {
            detail: "eof".into(),
            dump: None,
        };
        assert!(!e.to_string().contains("saved"));
    }

    #[test]
    fn validation_display_names_field() {
        let e = PaperSumError::validation("key_findings", "expected 3-8 items, got 2");
        let msg = e.to_string();
        assert!(msg.contains("key_findings"));
        assert!(msg.contains("got 2"));
    }

    #[test]
    fn extraction_kinds() {
        let e = PaperSumError::EmptyDocument {
            path: PathBuf::from("empty.pdf"),
        };
        assert_eq!(e.kind(), FailureKind::Extraction);
        assert!(e.to_string().contains("no pages"));
    }

    #[test]
    fn internal_errors_have_their_own_kind() {
        let e = PaperSumError::Internal("Extraction task panicked".into());
        assert_eq!(e.kind(), FailureKind::Internal);
        assert_eq!(e.kind().to_string(), "internal");
    }

    #[test]
    fn request_kind_display() {
        let e = PaperSumError::ProviderNotConfigured {
            provider: "anthropic".into(),
            hint: "set ANTHROPIC_API_KEY".into(),
        };
        assert_eq!(e.kind(), FailureKind::Request);
        assert!(e.to_string().contains("anthropic"));
        assert_eq!(FailureKind::Request.to_string(), "request");
    }
}
