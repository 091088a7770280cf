//! Example discovery: pair outline `.tex` files with their source PDFs.
//!
//! ## Naming convention
//!
//! ```text
//! examples/
//!   paper.pdf            ─┐ base "paper"
//!   paper_outline.tex    ─┘
//!   slides.tex           ── base "slides", no PDF → outline-only example
//! ```
//!
//! An outline is either `<base>_outline.tex` or plain `<base>.tex`; its
//! source is `<base>.pdf` in the same directory. [`pair_outline_name`] is the
//! whole convention as a pure function so it can be tested on names alone.
//!
//! When both forms exist for one base, the `_outline.tex` file wins if the
//! two have the same content; if they differ the loader refuses to guess and
//! returns [`OutlineError::AmbiguousExample`].

use crate::error::OutlineError;
use crate::output::ExamplePair;
use crate::pipeline::extract::{truncate_chars, TextExtractor};
use crate::prompts::SOURCE_TRUNCATED_MARKER;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension of source documents.
pub const SOURCE_EXTENSION: &str = "pdf";

const OUTLINE_SUFFIX: &str = "_outline.tex";
const TEX_EXTENSION: &str = ".tex";

/// Which naming form an outline file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutlineForm {
    /// `<base>_outline.tex`
    Suffixed,
    /// `<base>.tex`
    Plain,
}

/// Result of matching a file name against the outline convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineCandidate {
    pub base_name: String,
    pub form: OutlineForm,
}

impl OutlineCandidate {
    /// File name of the source document this outline pairs with.
    pub fn source_file_name(&self) -> String {
        format!("{}.{}", self.base_name, SOURCE_EXTENSION)
    }
}

/// Match `file_name` against the outline naming convention.
///
/// Returns `None` for anything that is not a `.tex` file with a non-empty
/// base name.
pub fn pair_outline_name(file_name: &str) -> Option<OutlineCandidate> {
    if let Some(base) = file_name.strip_suffix(OUTLINE_SUFFIX) {
        return (!base.is_empty()).then(|| OutlineCandidate {
            base_name: base.to_string(),
            form: OutlineForm::Suffixed,
        });
    }
    let base = file_name.strip_suffix(TEX_EXTENSION)?;
    (!base.is_empty()).then(|| OutlineCandidate {
        base_name: base.to_string(),
        form: OutlineForm::Plain,
    })
}

/// Discover example pairs in `dir`, ordered by outline file name.
///
/// Blocking: reads the directory and runs `extractor` on every source PDF.
/// A missing directory yields no examples. A source PDF that fails to
/// extract drops its example with a warning.
pub fn load_examples(
    dir: &Path,
    extractor: &dyn TextExtractor,
    max_source_chars: usize,
) -> Result<Vec<ExamplePair>, OutlineError> {
    if !dir.exists() {
        warn!(
            "Examples directory '{}' does not exist; generating zero-shot",
            dir.display()
        );
        return Ok(Vec::new());
    }

    let outlines = select_outlines(dir)?;
    let mut pairs = Vec::with_capacity(outlines.len());

    for (path, candidate) in outlines {
        let outline_text =
            std::fs::read_to_string(&path).map_err(|source| OutlineError::ExampleUnreadable {
                path: path.clone(),
                source,
            })?;
        if outline_text.trim().is_empty() {
            warn!("Skipping empty outline file '{}'", path.display());
            continue;
        }

        let source_path = dir.join(candidate.source_file_name());
        let source_text = if source_path.is_file() {
            match extractor.extract(&source_path) {
                Ok(text) if text.trim().is_empty() => {
                    warn!(
                        "No text in '{}'; using '{}' as structure-only example",
                        source_path.display(),
                        path.display()
                    );
                    None
                }
                Ok(text) => Some(truncate_chars(
                    &text,
                    max_source_chars,
                    SOURCE_TRUNCATED_MARKER,
                )),
                Err(e) => {
                    warn!("Could not process example '{}': {}", source_path.display(), e);
                    continue;
                }
            }
        } else {
            info!(
                "No PDF found for '{}' (looking for '{}'); using it as structure-only example",
                path.display(),
                source_path.display()
            );
            None
        };

        pairs.push(ExamplePair {
            base_name: candidate.base_name,
            source_text,
            outline_text,
        });
    }

    info!("Loaded {} example(s) from '{}'", pairs.len(), dir.display());
    Ok(pairs)
}

/// List outline files in `dir`, resolve duplicate base names, and order
/// the survivors by file name.
fn select_outlines(dir: &Path) -> Result<Vec<(PathBuf, OutlineCandidate)>, OutlineError> {
    let unreadable = |source: std::io::Error| OutlineError::ExampleUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut by_base: BTreeMap<String, Vec<(OutlineForm, PathBuf)>> = BTreeMap::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            debug!("Skipping non-UTF-8 file name in '{}'", dir.display());
            continue;
        };
        if let Some(candidate) = pair_outline_name(name) {
            by_base
                .entry(candidate.base_name)
                .or_default()
                .push((candidate.form, path));
        }
    }

    let mut selected = Vec::with_capacity(by_base.len());
    for (base_name, mut files) in by_base {
        files.sort();
        let (form, path) = match files.as_slice() {
            [only] => only.clone(),
            [(OutlineForm::Suffixed, suffixed), (OutlineForm::Plain, plain)] => {
                if same_content(suffixed, plain)? {
                    debug!(
                        "'{}' duplicates '{}'; keeping the _outline.tex form",
                        plain.display(),
                        suffixed.display()
                    );
                    (OutlineForm::Suffixed, suffixed.clone())
                } else {
                    return Err(OutlineError::AmbiguousExample {
                        base_name,
                        first: suffixed.clone(),
                        second: plain.clone(),
                    });
                }
            }
            _ => {
                return Err(OutlineError::Internal {
                    stage: crate::error::Stage::Examples,
                    detail: format!("unexpected outline files for base '{base_name}'"),
                })
            }
        };
        selected.push((path, OutlineCandidate { base_name, form }));
    }

    selected.sort_by(|(a, _), (b, _)| a.file_name().cmp(&b.file_name()));
    Ok(selected)
}

/// Compare two outline files, ignoring trailing whitespace.
fn same_content(a: &Path, b: &Path) -> Result<bool, OutlineError> {
    let read = |p: &Path| {
        std::fs::read_to_string(p).map_err(|source| OutlineError::ExampleUnreadable {
            path: p.to_path_buf(),
            source,
        })
    };
    Ok(read(a)?.trim_end() == read(b)?.trim_end())
}
