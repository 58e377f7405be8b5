//! Content digest of a build context.
//!
//! Files are visited in sorted order and each contributes its relative
//! path and bytes, so the digest only changes when the context does.

use crate::error::{Error, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Directories never sent to the builder.
const SKIP_DIRS: &[&str] = &[".git", "target", "node_modules", "__pycache__"];

/// Hash every file under `dir`.
pub fn context_digest(dir: &Path) -> Result<String> {
    if !dir.is_dir() {
        return Err(Error::ContextNotFound(dir.to_path_buf()));
    }

    let mut hasher = blake3::Hasher::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && e.depth() > 0
                && SKIP_DIRS.iter().any(|s| e.file_name() == *s))
        });

    let mut files = 0usize;
    for entry in walker {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        // Normalize separators so the digest is platform independent
        let name = relative.to_string_lossy().replace('\\', "/");
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
        hasher.update(&std::fs::read(entry.path())?);
        hasher.update(&[0]);
        files += 1;
    }

    log::debug!("hashed {files} files under {}", dir.display());
    Ok(hasher.finalize().to_hex().to_string())
}
