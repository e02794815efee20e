//! Discovery of source files by glob pattern and age.
//!
//! [`FileFilter`] produces the ordered path list fed to
//! [`crate::ingestion::LoadedRows::from_files`].

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use glob::Pattern;

use crate::error::{DataError, DataResult};

/// Selects files under a set of directories by glob pattern and, optionally, maximum age.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pattern: String,
    max_age: Option<Duration>,
    dirs: Vec<PathBuf>,
}

impl FileFilter {
    /// Filter matching every entry (`*`) with no age limit and no directories.
    pub fn new() -> Self {
        Self {
            pattern: "*".to_string(),
            ..Default::default()
        }
    }

    /// Set the glob pattern, relative to each directory.
    pub fn with_pattern(mut self, pattern: &str) -> DataResult<Self> {
        self.set_pattern(pattern)?;
        Ok(self)
    }

    /// Replace the glob pattern after checking that it parses.
    pub fn set_pattern(&mut self, pattern: &str) -> DataResult<()> {
        Pattern::new(pattern)?;
        self.pattern = pattern.to_string();
        Ok(())
    }

    /// Keep only files modified within `max_age` of now.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Add directories to search, in order.
    pub fn with_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.dirs.extend(dirs.into_iter().map(|d| d.as_ref().to_path_buf()));
        self
    }

    /// Matching files, grouped by directory in insertion order and sorted within each.
    pub fn filter(&self) -> DataResult<Vec<PathBuf>> {
        if self.dirs.is_empty() {
            return Err(DataError::NoDirectories);
        }
        let cutoff = self
            .max_age
            .and_then(|age| SystemTime::now().checked_sub(age));

        let mut out = Vec::new();
        for dir in &self.dirs {
            // The directory is literal; only the pattern carries glob syntax.
            let full = Path::new(&Pattern::escape(&dir.to_string_lossy())).join(&self.pattern);
            let mut matches = Vec::new();
            for entry in glob::glob(&full.to_string_lossy())? {
                let path = entry?;
                let meta = std::fs::metadata(&path)?;
                if !meta.is_file() {
                    continue;
                }
                if let Some(cutoff) = cutoff {
                    if meta.modified()? <= cutoff {
                        continue;
                    }
                }
                matches.push(path);
            }
            matches.sort();
            out.append(&mut matches);
        }
        Ok(out)
    }
}
