//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the catalog database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Discovered titles in crawl order
CREATE TABLE IF NOT EXISTS titles (
    position INTEGER PRIMARY KEY,
    title TEXT NOT NULL UNIQUE,
    slot TEXT NOT NULL
);

-- Provenance of the title list (single row)
CREATE TABLE IF NOT EXISTS title_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    generated_at TEXT,
    source TEXT,
    seeds_hash TEXT
);

-- Resumable crawl progress (single row)
CREATE TABLE IF NOT EXISTS crawl_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    cursor INTEGER NOT NULL,
    batch_size INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    last_run INTEGER,
    last_added INTEGER NOT NULL DEFAULT 0,
    last_processed INTEGER NOT NULL DEFAULT 0,
    last_skipped_non_item INTEGER NOT NULL DEFAULT 0,
    last_failed INTEGER NOT NULL DEFAULT 0,
    total_titles INTEGER NOT NULL DEFAULT 0,
    total_items INTEGER NOT NULL DEFAULT 0,
    failed_titles TEXT NOT NULL DEFAULT '[]'
);

-- Append-only item catalog keyed by canonical source
CREATE TABLE IF NOT EXISTS catalog_entries (
    source TEXT PRIMARY KEY,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    slot TEXT NOT NULL,
    level INTEGER,
    vocations TEXT NOT NULL,
    resistances TEXT NOT NULL,
    imbuement_slots INTEGER NOT NULL DEFAULT 0,
    page_url TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_catalog_position ON catalog_entries(position);
CREATE INDEX IF NOT EXISTS idx_catalog_slot ON catalog_entries(slot);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Current schema version, stored in `PRAGMA user_version`
pub const SCHEMA_VERSION: u32 = 1;
