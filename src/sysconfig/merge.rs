// Network Setup - Sysconfig Merge
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Merging of sysconfig files.
//!
//! The merge is a union where the modified file wins: every value from the
//! modified document is written into the target, keys only present in the
//! target are kept, and the target's comments and layout stay as they are.

use std::fs;
use std::path::Path;
use tracing::{error, info};

use super::document::KeyValueDocument;
use super::io;
use crate::models::Result;

/// How [`merge_files`] brought the target up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Values were merged key by key into the existing target.
    Merged,
    /// The target could not be read, so the modified file was copied over it.
    Copied,
}

/// Apply the attributes of `modified` onto `target`.
pub fn merge(target: &mut KeyValueDocument, modified: &KeyValueDocument) -> Result<()> {
    for (key, value) in modified.attributes() {
        target.set(&key, &value)?;
    }
    Ok(())
}

/// Merge the file at `modified_path` into the file at `original_path`.
///
/// Failures reading the modified file or writing the result propagate. If
/// the original cannot be read (missing or unreadable) the modified file is
/// copied over it instead. An original that exists but does not parse is
/// left alone and its parse error returned.
pub fn merge_files(original_path: &Path, modified_path: &Path) -> Result<MergeOutcome> {
    let modified = io::load(modified_path)?;

    let mut target = match io::load(original_path) {
        Ok(target) => target,
        Err(e) if e.is_unreadable() => {
            error!(
                "Failed to load {:?} with {}. Copying just new content.",
                original_path, e
            );
            fs::copy(modified_path, original_path)?;
            return Ok(MergeOutcome::Copied);
        }
        Err(e) => return Err(e),
    };

    merge(&mut target, &modified)?;
    io::write(&target, original_path)?;
    info!("Merged {:?} into {:?}", modified_path, original_path);
    Ok(MergeOutcome::Merged)
}
