//! JSON file storage
//!
//! Three pretty-printed files: the title list, the crawl state and the catalog.
//! Every write goes to a temp file in the target directory and is renamed into
//! place, so a reader never sees a half-written file.

use crate::catalog::CatalogEntry;
use crate::discovery::{TitleList, TitleRecord};
use crate::state::CrawlState;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Title files are either the annotated object or a bare record array
#[derive(Deserialize)]
#[serde(untagged)]
enum TitleFile {
    List(TitleList),
    Bare(Vec<TitleRecord>),
}

/// File-backed storage using JSON documents
#[derive(Debug, Clone)]
pub struct JsonStorage {
    titles_path: PathBuf,
    state_path: PathBuf,
    catalog_path: PathBuf,
}

impl JsonStorage {
    pub fn new(
        titles_path: impl Into<PathBuf>,
        state_path: impl Into<PathBuf>,
        catalog_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            titles_path: titles_path.into(),
            state_path: state_path.into(),
            catalog_path: catalog_path.into(),
        }
    }

    /// Storage rooted in one directory with the default file names
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(
            dir.join("eq_titles.json"),
            dir.join("eq_state.json"),
            dir.join("eq_items.json"),
        )
    }
}

impl Storage for JsonStorage {
    fn load_titles(&self) -> StorageResult<Option<TitleList>> {
        let file: Option<TitleFile> = read_json(&self.titles_path)?;
        Ok(file.map(|file| match file {
            TitleFile::List(list) => list,
            TitleFile::Bare(records) => TitleList::from_records(records),
        }))
    }

    fn save_titles(&mut self, titles: &TitleList) -> StorageResult<()> {
        write_json_atomic(&self.titles_path, titles)?;
        tracing::info!(
            "Saved {} titles to {}",
            titles.len(),
            self.titles_path.display()
        );
        Ok(())
    }

    fn load_state(&self) -> StorageResult<Option<CrawlState>> {
        read_json(&self.state_path)
    }

    fn load_catalog(&self) -> StorageResult<Vec<CatalogEntry>> {
        Ok(read_json(&self.catalog_path)?.unwrap_or_default())
    }

    fn commit(&mut self, catalog: &[CatalogEntry], state: &CrawlState) -> StorageResult<()> {
        // catalog first: a crash in between leaves the cursor behind, never ahead
        write_json_atomic(&self.catalog_path, catalog)?;
        write_json_atomic(&self.state_path, state)?;
        tracing::info!(
            "Committed {} catalog entries and cursor {}",
            catalog.len(),
            state.cursor
        );
        Ok(())
    }
}

/// Reads a JSON document; a missing file is `None`
fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::Corrupt(format!("{}: {}", path.display(), e)))
}

/// Writes pretty JSON via a sibling temp file and an atomic rename
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let temp_file = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = BufWriter::new(temp_file.as_file());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    temp_file.as_file().sync_all()?;
    temp_file.persist(path)?;
    Ok(())
}
