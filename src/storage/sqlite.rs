//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::catalog::{CatalogEntry, SlotHint};
use crate::discovery::{TitleList, TitleRecord};
use crate::state::CrawlState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    // ===== Title List =====

    fn load_titles(&self) -> StorageResult<Option<TitleList>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title, slot FROM titles ORDER BY position")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (title, slot) = row?;
            items.push(TitleRecord::new(title, parse_slot(&slot)));
        }

        if items.is_empty() {
            return Ok(None);
        }

        let meta = self
            .conn
            .query_row(
                "SELECT generated_at, source, seeds_hash FROM title_meta WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        let mut list = TitleList::from_records(items);
        if let Some((generated_at, source, seeds_hash)) = meta {
            let generated_at = generated_at
                .map(|ts| {
                    DateTime::parse_from_rfc3339(&ts)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| StorageError::Corrupt(format!("generated_at '{}': {}", ts, e)))
                })
                .transpose()?;
            list = match generated_at {
                Some(at) => TitleList::new(list.items, source, seeds_hash, at),
                None => TitleList {
                    source,
                    seeds_hash,
                    ..list
                },
            };
        }

        Ok(Some(list))
    }

    fn save_titles(&mut self, titles: &TitleList) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM titles", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO titles (position, title, slot) VALUES (?1, ?2, ?3)")?;
            for (position, record) in titles.items.iter().enumerate() {
                stmt.execute(params![
                    to_db_int(position),
                    record.title,
                    record.slot.as_str()
                ])?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO title_meta (id, generated_at, source, seeds_hash)
             VALUES (1, ?1, ?2, ?3)",
            params![
                titles.generated_at.map(|at| at.to_rfc3339()),
                titles.source,
                titles.seeds_hash
            ],
        )?;

        tx.commit()?;
        tracing::info!("Saved {} titles to database", titles.len());
        Ok(())
    }

    // ===== Crawl Progress =====

    fn load_state(&self) -> StorageResult<Option<CrawlState>> {
        let row = self
            .conn
            .query_row(
                "SELECT cursor, batch_size, created_at, last_run, last_added, last_processed,
                        last_skipped_non_item, last_failed, total_titles, total_items, failed_titles
                 FROM crawl_state WHERE id = 1",
                [],
                |row| {
                    Ok((
                        [
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, i64>(4)?,
                            row.get::<_, i64>(5)?,
                            row.get::<_, i64>(6)?,
                            row.get::<_, i64>(7)?,
                            row.get::<_, i64>(8)?,
                            row.get::<_, i64>(9)?,
                        ],
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, String>(10)?,
                    ))
                },
            )
            .optional()?;

        let Some((counters, created_at, last_run, failed_titles)) = row else {
            return Ok(None);
        };
        let [cursor, batch_size, last_added, last_processed, last_skipped_non_item, last_failed, total_titles, total_items] =
            counters;

        Ok(Some(CrawlState {
            cursor: from_db_int(cursor)?,
            batch_size: from_db_int(batch_size)?.max(1),
            created_at: from_unix(created_at)?,
            last_run: last_run.map(from_unix).transpose()?,
            last_added: from_db_int(last_added)?,
            last_processed: from_db_int(last_processed)?,
            last_skipped_non_item: from_db_int(last_skipped_non_item)?,
            last_failed: from_db_int(last_failed)?,
            total_titles: from_db_int(total_titles)?,
            total_items: from_db_int(total_items)?,
            failed_titles: serde_json::from_str(&failed_titles)?,
        }))
    }

    fn load_catalog(&self) -> StorageResult<Vec<CatalogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, slot, level, vocations, resistances, imbuement_slots, page_url
             FROM catalog_entries ORDER BY position",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<u32>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (name, slot, level, vocations, resistances, imbuement_slot_count, source) = row?;
            entries.push(CatalogEntry {
                name,
                slot: parse_slot(&slot),
                level,
                vocations: serde_json::from_str(&vocations)?,
                resistances: serde_json::from_str(&resistances)?,
                imbuement_slot_count,
                source,
            });
        }

        Ok(entries)
    }

    fn commit(&mut self, catalog: &[CatalogEntry], state: &CrawlState) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO catalog_entries
                    (source, position, name, slot, level, vocations, resistances, imbuement_slots, page_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (position, entry) in catalog.iter().enumerate() {
                stmt.execute(params![
                    entry.dedup_key(),
                    to_db_int(position),
                    entry.name,
                    entry.slot.as_str(),
                    entry.level,
                    serde_json::to_string(&entry.vocations)?,
                    serde_json::to_string(&entry.resistances)?,
                    entry.imbuement_slot_count,
                    entry.source,
                ])?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO crawl_state
                (id, cursor, batch_size, created_at, last_run, last_added, last_processed,
                 last_skipped_non_item, last_failed, total_titles, total_items, failed_titles)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                to_db_int(state.cursor),
                to_db_int(state.batch_size),
                state.created_at.timestamp(),
                state.last_run.map(|at| at.timestamp()),
                to_db_int(state.last_added),
                to_db_int(state.last_processed),
                to_db_int(state.last_skipped_non_item),
                to_db_int(state.last_failed),
                to_db_int(state.total_titles),
                to_db_int(state.total_items),
                serde_json::to_string(&state.failed_titles)?,
            ],
        )?;

        tx.commit()?;
        tracing::info!(
            "Committed {} catalog entries and cursor {}",
            catalog.len(),
            state.cursor
        );
        Ok(())
    }
}

fn parse_slot(value: &str) -> SlotHint {
    SlotHint::from_name(value).unwrap_or_else(|| {
        tracing::warn!("Unknown slot '{}' in database; reading as unknown", value);
        SlotHint::Unknown
    })
}

fn to_db_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db_int(value: i64) -> StorageResult<usize> {
    usize::try_from(value)
        .map_err(|_| StorageError::Corrupt(format!("negative counter {} in crawl_state", value)))
}

fn from_unix(secs: i64) -> StorageResult<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| StorageError::Corrupt(format!("invalid timestamp {}", secs)))
}
