use dashmap::DashMap;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::MemoryHost;
use crate::error::{RangekitError, Result};
use crate::host::{SelectionSnapshot, name_key};
use crate::storage::{DocumentContents, parse_nrd_content, write_nrd};
use rangekit_engine::engine::parse_range_address;

const MAX_DOCUMENT_FILE_BYTES: u64 = 16 * 1_048_576; // 16 MiB

fn read_document_file(path: &Path) -> Result<String> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_DOCUMENT_FILE_BYTES {
        return Err(RangekitError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "Refusing to read {}: document too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_DOCUMENT_FILE_BYTES
            ),
        )));
    }
    Ok(std::fs::read_to_string(path)?)
}

impl MemoryHost {
    /// Open `path` if it exists, otherwise start an empty document bound to it.
    pub fn with_file(path: &Path) -> Result<Self> {
        let mut host = MemoryHost::new();
        if path.exists() {
            host.load_file(path)?;
        } else {
            host.file_path = Some(path.to_path_buf());
        }
        Ok(host)
    }

    /// Load from file, replacing every name, sheet and the selection.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let contents = parse_nrd_content(&read_document_file(path)?)?;

        // Build everything first so a bad selection leaves the document untouched.
        let selection = match &contents.selection {
            Some(address) => Some(SelectionSnapshot::from_range(&parse_range_address(address)?)),
            None => None,
        };

        let names = DashMap::new();
        for payload in contents.names {
            names.insert(name_key(&payload.name), payload);
        }

        self.names = Arc::new(names);
        self.sheets = contents.sheets;
        self.selection = selection;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        debug!("loaded {} names from {}", self.names.len(), path.display());
        Ok(())
    }

    /// Save to current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = &self.file_path else {
            return Err(RangekitError::NoFilePath);
        };
        write_nrd(path, &self.contents())?;
        self.modified = false;
        Ok(path.clone())
    }

    /// Snapshot of everything that goes to disk.
    pub fn contents(&self) -> DocumentContents {
        DocumentContents {
            sheets: self.sheets.clone(),
            selection: self.selection.as_ref().and_then(|s| s.range().ok()).map(|r| r.to_string()),
            names: self.names.iter().map(|entry| entry.value().clone()).collect(),
        }
    }
}
