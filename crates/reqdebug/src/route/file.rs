//! Flat-file log output.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use reqdebug_core::{Abstracter, LogEntry, log_output};

use super::{Route, TextRoute};
use crate::error::Result;

/// Appends text lines to a file, creating it if needed.
#[derive(Debug, Clone)]
pub struct FileRoute {
    path: PathBuf,
    text: TextRoute,
}

impl FileRoute {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            text: TextRoute::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Route for FileRoute {
    fn name(&self) -> &'static str {
        "file"
    }

    fn process(&self, entries: &[LogEntry], abstracter: &Abstracter) -> Result<String> {
        let lines = self.text.lines(entries, abstracter);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for line in &lines {
            writeln!(file, "{line}")?;
        }
        log_output!("wrote {} lines to {}", lines.len(), self.path.display());
        Ok(lines.join("\n"))
    }
}
