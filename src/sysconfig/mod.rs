// Network Setup - Sysconfig Files
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Sysconfig `KEY=VALUE` files: document model, file I/O and merging.

pub mod document;
pub mod io;
pub mod merge;

pub use document::KeyValueDocument;
pub use merge::{merge_files, MergeOutcome};
