//! Pipeline stages for PDF-to-outline generation.
//!
//! Each submodule implements one step, so each can be tested without the
//! others (and without pdfium or a model server).
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ examples ──▶ prompt ──▶ llm/ollama ──▶ postprocess
//! (path)    (pdfium)    (few-shot)   (budget)    (model)        (LaTeX cut)
//! ```
//!
//! 1. [`input`]   : check the target path is a readable PDF
//! 2. [`extract`] : PDF → text; runs in `spawn_blocking` because pdfium is
//!    not async-safe
//! 3. [`examples`]: pair `X.pdf` with `X_outline.tex` / `X.tex`
//! 4. [`prompt`]  : assemble instructions, examples and target under a
//!    char budget
//! 5. [`llm`] / [`ollama`]: the model client seam and its implementations;
//!    the only stage with network I/O
//! 6. [`postprocess`]: recover a well-formed document from the reply and
//!    write it atomically

pub mod examples;
pub mod extract;
pub mod input;
pub mod llm;
pub mod ollama;
pub mod postprocess;
pub mod prompt;
