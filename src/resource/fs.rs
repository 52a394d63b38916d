// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Filesystem seam for the local fetch path.
//!
//! Resource files normally come from the real filesystem; policy+resource
//! bundles are served from an in-memory tree instead. Both go through
//! [`ResourceFs`] so the fetch logic never inspects which one it got.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kube::api::DynamicObject;

use super::parse_resources;
use crate::diagnostics;

pub trait ResourceFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The real filesystem.
pub struct OsFs;

impl ResourceFs for OsFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// An in-memory file tree for bundled policy/resource fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }
}

impl ResourceFs for MemoryFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

/// Read and decode resources from local paths, joined under `base` when one
/// is given (bundle layouts keep resource paths relative to the bundle
/// root).
///
/// An unreadable path is skipped with a diagnostic; malformed content is a
/// caller error and fails the whole fetch.
pub fn fetch_from_paths<W: Write>(
    out: &mut W,
    fs: &dyn ResourceFs,
    base: Option<&Path>,
    paths: &[String],
    policy_report: bool,
) -> Result<Vec<DynamicObject>> {
    let mut resources = Vec::new();
    for path in paths {
        let full = match base {
            Some(base) => base.join(path),
            None => PathBuf::from(path),
        };
        let bytes = match fs.read(&full) {
            Ok(bytes) => bytes,
            Err(err) => {
                diagnostics::emit(
                    out,
                    policy_report,
                    &format!("failed to load resources from {}: {err}", full.display()),
                );
                continue;
            }
        };
        let decoded = parse_resources(&bytes)
            .with_context(|| format!("failed to decode resources from {}", full.display()))?;
        resources.extend(decoded);
    }
    Ok(resources)
}
