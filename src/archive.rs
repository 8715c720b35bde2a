//! Append-only log of processed items, one `source id` pair per line.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct ArchiveLog {
    path: PathBuf,
}

impl ArchiveLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `"{source} {id}\n"`, creating the file on first use.
    pub fn record(&self, source: &str, id: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening archive {}", self.path.display()))?;
        writeln!(file, "{source} {id}")
            .with_context(|| format!("writing archive entry for {id}"))?;
        Ok(())
    }

    /// Ids listed in the archive; a missing file is an empty archive.
    pub fn load_ids(&self) -> Result<HashSet<String>> {
        if !self.path.exists() {
            return Ok(HashSet::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        let mut entries = HashSet::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if let Some(id) = line.split_whitespace().last()
                && !id.is_empty()
            {
                entries.insert(id.to_owned());
            }
        }
        Ok(entries)
    }
}
