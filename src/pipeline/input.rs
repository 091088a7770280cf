//! Input validation: make sure the target path is a readable PDF.
//!
//! pdfium reports a missing file, a permission problem and a non-PDF all
//! as the same opaque load failure. Checking up front with plain file I/O
//! and the `%PDF` magic bytes gives the caller an actionable error instead.

use crate::error::OutlineError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn resolve_local(path: &Path) -> Result<PathBuf, OutlineError> {
    let path = path.to_path_buf();

    if !path.is_file() {
        return Err(OutlineError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(OutlineError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(OutlineError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(OutlineError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
