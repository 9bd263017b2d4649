//! Pipeline stages for paper summarisation.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested without the others.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ prompt ──▶ llm ──▶ normalize ──▶ validate
//! (pdfium)   (request)  (model)  (repair)      (schema)
//! ```
//!
//! 1. [`extract`]   — page-tagged text from the PDF; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 2. [`prompt`]    — inline-template or tool-schema request for the configured mode
//! 3. [`llm`]       — the single model call, and which part of the reply is the payload
//! 4. [`normalize`] — fence stripping and small JSON repairs; skipped for tool arguments
//! 5. [`validate`]  — lenient JSON parse, then the schema walk into [`crate::PaperSummary`]

pub mod extract;
pub mod llm;
pub mod normalize;
pub mod prompt;
pub mod validate;
