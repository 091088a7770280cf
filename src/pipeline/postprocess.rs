//! Outline extraction: recover a LaTeX document from a free-form completion.
//!
//! Small local models rarely answer with *only* LaTeX. Typical replies wrap
//! the document in ```` ```latex ```` fences, open with "Sure! Here is your
//! outline:", or stop mid-document when they hit the token limit. Rather
//! than trying to strip every kind of chatter, the extractor cuts on the
//! LaTeX markers themselves:
//!
//! | Reply contains | Result |
//! |----------------|--------|
//! | `\documentclass` … `\end{document}` | that span, inclusive |
//! | `\documentclass` … `\begin{document}` (no end) | span + `\end{document}` |
//! | `\begin{document}` with no `\documentclass` before it | minimal preamble + environment |
//! | neither | [`OutlineError::OutlineFormat`] |
//!
//! All rules are pure `&str → String` functions, so the same reply always
//! yields byte-identical output.

use crate::error::OutlineError;
use crate::output::GenerationResult;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

/// Preamble synthesised when the reply has a document environment only.
pub const MINIMAL_PREAMBLE: &str = "\\documentclass{article}\n";

const END_DOCUMENT: &str = "\\end{document}";

static RE_DOCUMENTCLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\documentclass\s*(?:\[[^\]]*\])?\s*\{[^}]*\}").unwrap());

static RE_BEGIN_DOCUMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\begin\s*\{document\}").unwrap());

static RE_END_DOCUMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\end\s*\{document\}").unwrap());

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

/// Recover the outline document from `raw` and pair it with the reply.
pub fn extract_generation(raw: &str) -> Result<GenerationResult, OutlineError> {
    let extracted_outline = extract_outline(raw)?;
    Ok(GenerationResult {
        raw_text: raw.to_string(),
        extracted_outline,
    })
}

/// Recover a well-formed LaTeX document from a model reply.
///
/// The result starts with `\documentclass`, ends with `\end{document}` and a
/// single newline, and has no leading or trailing blank lines.
pub fn extract_outline(raw: &str) -> Result<String, OutlineError> {
    let text = normalise_line_endings(raw);
    let text = remove_invisible_chars(&text);

    let begin = RE_BEGIN_DOCUMENT.find(&text).map(|m| m.start());
    // The preamble that opens the document is the last \documentclass before
    // the first \begin{document}; earlier mentions are chatter.
    let class = match begin {
        Some(begin) => RE_DOCUMENTCLASS
            .find_iter(&text[..begin])
            .last()
            .map(|m| m.start()),
        None => None,
    };

    let document = match (class, begin) {
        (Some(class), Some(_)) => {
            let from_class = &text[class..];
            match RE_END_DOCUMENT.find(from_class) {
                Some(end) => from_class[..end.end()].to_string(),
                None => {
                    debug!("Reply has no \\end{{document}}; closing the environment");
                    close_document(from_class)
                }
            }
        }
        (None, Some(begin)) => {
            debug!("Reply has no \\documentclass; adding a minimal preamble");
            let from_begin = &text[begin..];
            let environment = match RE_END_DOCUMENT.find(from_begin) {
                Some(end) => from_begin[..end.end()].to_string(),
                None => close_document(from_begin),
            };
            format!("{MINIMAL_PREAMBLE}\n{environment}")
        }
        (_, None) if RE_DOCUMENTCLASS.is_match(&text) => {
            return Err(OutlineError::OutlineFormat {
                detail: "found \\documentclass but no document environment".to_string(),
            });
        }
        (_, None) => {
            return Err(OutlineError::OutlineFormat {
                detail: format!(
                    "no \\documentclass or \\begin{{document}} in {} bytes of output",
                    raw.len()
                ),
            });
        }
    };

    let document = trim_trailing_whitespace(&document);
    let document = collapse_blank_lines(&document);
    Ok(ensure_final_newline(document.trim_matches('\n')))
}

/// Write `outline` to `path`, creating parent directories and replacing any
/// existing file.
///
/// Writes to a sibling temp file first and renames it into place, so a
/// failed write never leaves a half-written outline at `path`.
pub async fn write_outline(path: &Path, outline: &str) -> Result<(), OutlineError> {
    let write_err = |source: std::io::Error| OutlineError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("tex.tmp");
    if let Err(e) = tokio::fs::write(&tmp_path, outline).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }

    info!("Outline saved to: {}", path.display());
    Ok(())
}

// ── Rules ────────────────────────────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

/// Append `\end{document}` to a reply that stopped inside the environment,
/// dropping a dangling closing fence first.
fn close_document(body: &str) -> String {
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body).trim_end();
    format!("{body}\n{END_DOCUMENT}")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

fn ensure_final_newline(input: &str) -> String {
    format!("{}\n", input.trim_end())
}

// ── Tests ────────────────────────────────────────────────────────────────────
