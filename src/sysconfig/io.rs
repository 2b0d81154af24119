// Network Setup - Sysconfig File I/O
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Loading and writing sysconfig documents.
//!
//! Paths are used as given. No installation-target root is prepended, so
//! these functions always act on the real on-disk files.

use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use super::document::KeyValueDocument;
use crate::models::{Error, Result};

/// Load a document from `path`.
///
/// A missing file yields [`Error::NotFound`], other read failures
/// [`Error::Io`] and malformed content [`Error::Parse`]. The content is read
/// as bytes, so a file that is not UTF-8 still loads.
pub fn load(path: &Path) -> Result<KeyValueDocument> {
    let bytes = fs::read(path).map_err(|e| Error::from_io(e, path))?;
    let document = KeyValueDocument::from_bytes(&bytes).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        line: e.line,
        reason: e.reason,
    })?;
    debug!(
        "Loaded {} entries from {:?} ({:?})",
        document.len(),
        path,
        document.encoding()
    );
    Ok(document)
}

/// Load a document, treating a missing file as empty.
pub fn load_or_default(path: &Path) -> Result<KeyValueDocument> {
    match load(path) {
        Err(Error::NotFound(_)) => Ok(KeyValueDocument::new()),
        other => other,
    }
}

/// Write `document` to `path`, replacing any existing content.
pub fn write(document: &KeyValueDocument, path: &Path) -> Result<()> {
    fs::write(path, document.to_bytes())?;
    debug!("Wrote {} entries to {:?}", document.len(), path);
    Ok(())
}

/// Write `document` to `path` readable by the owner only (0600).
///
/// The mode is in place before any content is written, also when the file
/// already existed with wider permissions.
pub fn write_private(document: &KeyValueDocument, path: &Path) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(&document.to_bytes())?;
    debug!("Wrote {} entries to {:?} (0600)", document.len(), path);
    Ok(())
}
