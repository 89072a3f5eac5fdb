//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track scrape runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    successes INTEGER NOT NULL DEFAULT 0,
    failures INTEGER NOT NULL DEFAULT 0
);

-- One row per (site, post_id)
CREATE TABLE IF NOT EXISTS posts (
    site TEXT NOT NULL,
    post_id TEXT NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    posted_at TEXT,
    view_count INTEGER NOT NULL DEFAULT 0,
    up_count INTEGER NOT NULL DEFAULT 0,
    comment_count INTEGER NOT NULL DEFAULT 0,
    content_json TEXT NOT NULL,
    flags_json TEXT NOT NULL,
    first_scraped_at TEXT NOT NULL,
    scraped_at TEXT NOT NULL,
    PRIMARY KEY (site, post_id)
);

CREATE INDEX IF NOT EXISTS idx_posts_site ON posts(site);

-- Comments in document order, replaced wholesale on every upsert
CREATE TABLE IF NOT EXISTS comments (
    site TEXT NOT NULL,
    post_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    comment_id TEXT NOT NULL,
    author TEXT NOT NULL,
    posted_at TEXT,
    body TEXT NOT NULL,
    depth INTEGER NOT NULL DEFAULT 0,
    parent_comment_id TEXT,
    PRIMARY KEY (site, post_id, position),
    FOREIGN KEY (site, post_id) REFERENCES posts(site, post_id) ON DELETE CASCADE
);
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
    Ok(())
}
