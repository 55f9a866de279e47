// Copyright (C) 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Source file access

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::PathSubstitution;

/// Lines of a single source file
type Lines = Arc<[Arc<str>]>;

/// Cached reader for source files
///
/// Files are read on first access and kept for the lifetime of the reader.
/// Files which can't be read are remembered as such and not retried.
#[derive(Debug, Default)]
pub struct SourceFiles {
    substitution: Option<PathSubstitution>,
    files: RefCell<HashMap<Arc<str>, Option<Lines>>>,
}

impl SourceFiles {
    /// Create a new reader, optionally substituting path prefixes
    pub fn new(substitution: Option<PathSubstitution>) -> Self {
        Self {
            substitution,
            files: Default::default(),
        }
    }

    /// Retrieve the text of a line, numbered from `1`
    ///
    /// Trailing line terminators are not included.
    pub fn line(&self, file: &Arc<str>, line: u32) -> Option<Arc<str>> {
        let index = usize::try_from(line).ok()?.checked_sub(1)?;
        let mut files = self.files.borrow_mut();
        let lines = files
            .entry(file.clone())
            .or_insert_with(|| self.read(file))
            .as_ref()?;
        lines.get(index).cloned()
    }

    /// Number of files read or attempted to read
    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    /// Determine whether no file was accessed yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the path under which a file is read
    pub fn path(&self, file: &str) -> PathBuf {
        match self.substitution.as_ref() {
            Some(substitution) => substitution.apply(file),
            None => PathBuf::from(file),
        }
    }

    fn read(&self, file: &str) -> Option<Lines> {
        let path = self.path(file);
        match std::fs::read(&path) {
            Ok(data) => {
                let text = String::from_utf8_lossy(&data);
                Some(text.lines().map(Arc::from).collect())
            }
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "could not read source file");
                None
            }
        }
    }
}
