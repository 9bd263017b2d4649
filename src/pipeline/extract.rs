//! Text extraction: PDF file → page-tagged text blob via pdfium.
//!
//! Every page contributes a `[PAGE n]` marker (1-based) followed by whatever
//! text pdfium yields for it, in document order. A page that fails to
//! extract is logged and contributes an empty body; it never aborts the
//! others.
//!
//! pdfium is blocking and keeps thread-local state, so all document access
//! happens inside `tokio::task::spawn_blocking`. The document handle lives
//! only for the duration of that closure and is released on every path.

use crate::error::PaperSumError;
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// The accumulated text of a document, plus what was observed on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Page-tagged text, one `[PAGE n]` marker per page in ascending order.
    pub text: String,
    pub page_count: usize,
    /// Pages that yielded no text (blank, scanned, or failed).
    pub empty_pages: usize,
}

impl ExtractedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Format one page: marker line, then the page body.
pub fn page_block(page_num: usize, page_text: &str) -> String {
    format!("\n[PAGE {page_num}]\n{page_text}\n")
}

/// Concatenate `(page_num, text)` pairs into an [`ExtractedText`].
pub fn assemble_pages<I>(pages: I) -> ExtractedText
where
    I: IntoIterator<Item = (usize, String)>,
{
    let mut text = String::new();
    let mut page_count = 0;
    let mut empty_pages = 0;
    for (page_num, body) in pages {
        if body.trim().is_empty() {
            empty_pages += 1;
        }
        text.push_str(&page_block(page_num, &body));
        page_count += 1;
    }
    ExtractedText {
        text,
        page_count,
        empty_pages,
    }
}

/// Check that `path` exists, is readable, and starts with `%PDF`.
pub fn check_pdf_file(path: &Path) -> Result<(), PaperSumError> {
    if !path.exists() {
        return Err(PaperSumError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            match f.read_exact(&mut magic) {
                Ok(()) if &magic != b"%PDF" => Err(PaperSumError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                }),
                Ok(()) => Ok(()),
                Err(_) => Err(PaperSumError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: "file is shorter than a PDF header".to_string(),
                }),
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(PaperSumError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(PaperSumError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Extract page-tagged text from a PDF.
///
/// Fails when the file is missing, unreadable, not a PDF, cannot be opened
/// by pdfium, or has no pages. Pages without text still contribute markers.
pub async fn extract_pdf_text(
    path: &Path,
    password: Option<&str>,
) -> Result<ExtractedText, PaperSumError> {
    check_pdf_file(path)?;

    let path_buf = path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_blocking(&path_buf, pwd.as_deref()))
        .await
        .map_err(|e| PaperSumError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Soft-failing extraction: logs the error and returns `""` on any failure.
///
/// An empty return value means extraction failed and the run must stop.
pub async fn extract_text(path: &Path) -> String {
    match extract_pdf_text(path, None).await {
        Ok(extracted) => extracted.text,
        Err(e) => {
            error!("Error extracting text from PDF: {}", e);
            String::new()
        }
    }
}

fn extract_blocking(path: &Path, password: Option<&str>) -> Result<ExtractedText, PaperSumError> {
    let pdfium = pdfium_auto::bind_pdfium_silent()
        .map_err(|e| PaperSumError::PdfiumBindingFailed(e.to_string()))?;

    let document = pdfium
        .load_pdf_from_file(path, password)
        .map_err(|e| load_error(path, password, e))?;

    let pages = document.pages();
    let total = pages.len() as usize;
    info!("PDF loaded: {} pages", total);

    let mut bodies = Vec::with_capacity(total);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let body = match page.text() {
            Ok(text) => text.all(),
            Err(e) => {
                warn!("Page {}: text extraction failed: {:?}", page_num, e);
                String::new()
            }
        };
        debug!("Page {}: {} chars", page_num, body.chars().count());
        bodies.push((page_num, body));
    }

    finish_extraction(path, assemble_pages(bodies))
}

/// Accept an assembled document unless it has no pages at all.
///
/// Blank pages (scans, figures) keep their markers; a document where every
/// page is blank still goes to the model, with a warning.
fn finish_extraction(
    path: &Path,
    extracted: ExtractedText,
) -> Result<ExtractedText, PaperSumError> {
    if extracted.page_count == 0 {
        return Err(PaperSumError::EmptyDocument {
            path: path.to_path_buf(),
        });
    }
    if extracted.empty_pages == extracted.page_count {
        warn!(
            "No page of {} yielded text ({} pages); sending markers only",
            path.display(),
            extracted.page_count
        );
    } else if extracted.empty_pages > 0 {
        warn!(
            "{} of {} pages yielded no text",
            extracted.empty_pages, extracted.page_count
        );
    }
    Ok(extracted)
}

fn load_error(path: &Path, password: Option<&str>, e: PdfiumError) -> PaperSumError {
    let detail = format!("{:?}", e);
    let path: PathBuf = path.to_path_buf();
    if detail.contains("Password") || detail.contains("password") {
        if password.is_some() {
            PaperSumError::WrongPassword { path }
        } else {
            PaperSumError::PasswordRequired { path }
        }
    } else {
        PaperSumError::CorruptPdf { path, detail }
    }
}
