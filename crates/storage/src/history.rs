// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line journal of processed file paths
//!
//! The in-memory set is authoritative while running. The file is the crash
//! recovery snapshot: additions are appended on `flush`, and any removal
//! forces a full rewrite through a temp file and rename. Callers that must
//! not block while holding the history detach a [`JournalWrite`] and apply
//! it elsewhere.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in history persistence
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HistoryError {
    fn io(path: &Path, source: io::Error) -> Self {
        HistoryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug)]
pub struct History {
    path: PathBuf,
    entries: HashSet<PathBuf>,
    /// Added since the last flush, in insertion order
    pending: Vec<PathBuf>,
    /// A removal happened since the last flush
    needs_rewrite: bool,
}

impl History {
    /// Load the journal at `path`. A missing file yields an empty history.
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        let mut entries = HashSet::new();

        match File::open(path) {
            Ok(file) => {
                for line in BufReader::new(file).lines() {
                    let line = line.map_err(|e| HistoryError::io(path, e))?;
                    let line = line.trim_end_matches('\r');
                    if line.is_empty() {
                        continue;
                    }
                    entries.insert(PathBuf::from(line));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(HistoryError::io(path, e)),
        }

        tracing::debug!(path = %path.display(), entries = entries.len(), "history loaded");

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            pending: Vec::new(),
            needs_rewrite: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter()
    }

    /// Record a path. Returns true if it was not already present.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.entries.insert(path.clone()) {
            self.pending.push(path);
            true
        } else {
            false
        }
    }

    /// Record several paths, returning how many were new
    pub fn add_all<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = 0;
        for path in paths {
            if self.add(path) {
                added += 1;
            }
        }
        added
    }

    /// Forget a path. Returns true if it was present.
    pub fn remove(&mut self, path: &Path) -> bool {
        if self.entries.remove(path) {
            self.needs_rewrite = true;
            true
        } else {
            false
        }
    }

    pub fn remove_all<'a, I>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        paths.into_iter().filter(|p| self.remove(p)).count()
    }

    /// True if there are mutations not yet on disk
    pub fn is_dirty(&self) -> bool {
        self.needs_rewrite || !self.pending.is_empty()
    }

    /// Detach outstanding mutations so they can be written without holding
    /// the history. A removal turns the write into a full rewrite.
    pub fn take_pending(&mut self) -> Option<JournalWrite> {
        let (lines, rewrite) = if self.needs_rewrite {
            self.pending.clear();
            (self.entries.iter().cloned().collect(), true)
        } else if self.pending.is_empty() {
            return None;
        } else {
            (std::mem::take(&mut self.pending), false)
        };
        self.needs_rewrite = false;
        Some(JournalWrite {
            path: self.path.clone(),
            lines,
            rewrite,
        })
    }

    /// Put back a write that did not reach disk
    pub fn restore(&mut self, write: JournalWrite) {
        if write.rewrite {
            self.needs_rewrite = true;
            return;
        }
        let mut lines = write.lines;
        lines.append(&mut self.pending);
        self.pending = lines;
    }

    /// Persist outstanding mutations: append additions, or rewrite after a removal
    pub fn flush(&mut self) -> Result<(), HistoryError> {
        let Some(write) = self.take_pending() else {
            return Ok(());
        };
        if let Err(e) = write.apply() {
            self.restore(write);
            return Err(e);
        }
        Ok(())
    }

    /// Rewrite the whole journal from the in-memory set
    pub fn snapshot_to_disk(&mut self) -> Result<(), HistoryError> {
        self.needs_rewrite = true;
        self.flush()
    }
}

/// Mutations taken out of a [`History`], ready to be written on a blocking thread
#[derive(Debug)]
pub struct JournalWrite {
    path: PathBuf,
    lines: Vec<PathBuf>,
    rewrite: bool,
}

impl JournalWrite {
    pub fn is_rewrite(&self) -> bool {
        self.rewrite
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Blocking write to the journal file
    pub fn apply(&self) -> Result<(), HistoryError> {
        if self.rewrite {
            self.rewrite_all()
        } else {
            self.append()
        }
    }

    fn append(&self) -> Result<(), HistoryError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HistoryError::io(&self.path, e))?;
        let mut writer = BufWriter::new(file);
        for path in &self.lines {
            write_line(&mut writer, path).map_err(|e| HistoryError::io(&self.path, e))?;
        }
        finish(writer).map_err(|e| HistoryError::io(&self.path, e))?;

        tracing::trace!(appended = self.lines.len(), "history appended");
        Ok(())
    }

    fn rewrite_all(&self) -> Result<(), HistoryError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let file = File::create(&tmp).map_err(|e| HistoryError::io(&tmp, e))?;
        let mut writer = BufWriter::new(file);
        for path in &self.lines {
            write_line(&mut writer, path).map_err(|e| HistoryError::io(&tmp, e))?;
        }
        finish(writer).map_err(|e| HistoryError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| HistoryError::io(&self.path, e))?;

        tracing::debug!(entries = self.lines.len(), "history snapshot written");
        Ok(())
    }
}

fn write_line(writer: &mut impl Write, path: &Path) -> io::Result<()> {
    writeln!(writer, "{}", path.to_string_lossy())
}

fn finish(writer: BufWriter<File>) -> io::Result<()> {
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_data()
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
