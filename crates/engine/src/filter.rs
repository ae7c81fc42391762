// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Candidate file selection shared by both discovery modes

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};
use sw_core::DiscoveryConfig;

/// Decides which paths under the watched root are candidates
#[derive(Debug, Clone)]
pub struct FileFilter {
    root: PathBuf,
    extensions: Vec<String>,
    ignore: GlobSet,
    ignore_dot: bool,
}

impl FileFilter {
    pub fn new(config: &DiscoveryConfig) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.ignore_globs {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            root: config.root.clone(),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            ignore: builder.build()?,
            ignore_dot: config.ignore_dot,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True if the path (file or directory) is excluded by the dotfile rule or a glob
    pub fn is_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if self.ignore_dot
            && relative.components().any(|c| match c {
                Component::Normal(name) => name.to_string_lossy().starts_with('.'),
                _ => false,
            })
        {
            return true;
        }
        self.ignore.is_match(relative) || self.ignore.is_match(path)
    }

    pub fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .is_some_and(|e| self.extensions.iter().any(|x| *x == e))
    }

    /// True if the path is a candidate file
    pub fn accepts(&self, path: &Path) -> bool {
        self.has_extension(path) && !self.is_ignored(path)
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
