//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the PostStore trait.

use crate::model::{Comment, Metadata, Post};
use crate::sites::Site;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PostStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, UpsertOutcome};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite post store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn load_comments(&self, site: Site, post_id: &str) -> StorageResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT comment_id, author, posted_at, body, depth, parent_comment_id
             FROM comments WHERE site = ?1 AND post_id = ?2 ORDER BY position",
        )?;

        let comments = stmt
            .query_map(params![site.as_str(), post_id], |row| {
                Ok(Comment {
                    comment_id: row.get(0)?,
                    author: row.get(1)?,
                    date: row.get(2)?,
                    text: row.get(3)?,
                    depth: row.get(4)?,
                    parent_comment_id: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }
}

fn parse_site(value: &str) -> StorageResult<Site> {
    value.parse().map_err(StorageError::InvalidValue)
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        successes: row.get::<_, i64>(5)? as u64,
        failures: row.get::<_, i64>(6)? as u64,
    })
}

impl PostStore for SqliteStore {
    // ===== Posts =====

    fn upsert_post(&mut self, post: &Post) -> StorageResult<UpsertOutcome> {
        let now = Utc::now().to_rfc3339();
        let content_json = serde_json::to_string(&post.content)?;
        let flags_json = serde_json::to_string(&post.flags)?;
        let site = post.site.as_str();

        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM posts WHERE site = ?1 AND post_id = ?2",
                params![site, post.post_id],
                |row| row.get(0),
            )
            .optional()?;

        tx.execute(
            "INSERT INTO posts (site, post_id, url, title, author, posted_at, view_count,
                                up_count, comment_count, content_json, flags_json,
                                first_scraped_at, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
             ON CONFLICT(site, post_id) DO UPDATE SET
                url = excluded.url,
                title = excluded.title,
                author = excluded.author,
                posted_at = excluded.posted_at,
                view_count = excluded.view_count,
                up_count = excluded.up_count,
                comment_count = excluded.comment_count,
                content_json = excluded.content_json,
                flags_json = excluded.flags_json,
                scraped_at = excluded.scraped_at",
            params![
                site,
                post.post_id,
                post.url,
                post.metadata.title,
                post.metadata.author,
                post.metadata.date,
                post.metadata.view_count as i64,
                post.metadata.up_count as i64,
                post.metadata.comment_count as i64,
                content_json,
                flags_json,
                now,
            ],
        )?;

        tx.execute(
            "DELETE FROM comments WHERE site = ?1 AND post_id = ?2",
            params![site, post.post_id],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO comments (site, post_id, position, comment_id, author, posted_at,
                                       body, depth, parent_comment_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (position, comment) in post.comments.iter().enumerate() {
                stmt.execute(params![
                    site,
                    post.post_id,
                    position as i64,
                    comment.comment_id,
                    comment.author,
                    comment.date,
                    comment.text,
                    comment.depth,
                    comment.parent_comment_id,
                ])?;
            }
        }

        tx.commit()?;

        Ok(if existing.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn get_post(&self, site: Site, post_id: &str) -> StorageResult<Option<Post>> {
        let row = self
            .conn
            .query_row(
                "SELECT url, title, author, posted_at, view_count, up_count, comment_count,
                        content_json, flags_json
                 FROM posts WHERE site = ?1 AND post_id = ?2",
                params![site.as_str(), post_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        Metadata {
                            title: row.get(1)?,
                            author: row.get(2)?,
                            date: row.get(3)?,
                            view_count: row.get::<_, i64>(4)? as u64,
                            up_count: row.get::<_, i64>(5)? as u64,
                            comment_count: row.get::<_, i64>(6)? as u64,
                        },
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                    ))
                },
            )
            .optional()?;

        let Some((url, metadata, content_json, flags_json)) = row else {
            return Ok(None);
        };

        Ok(Some(Post {
            post_id: post_id.to_string(),
            site,
            url,
            metadata,
            content: serde_json::from_str(&content_json)?,
            comments: self.load_comments(site, post_id)?,
            flags: serde_json::from_str(&flags_json)?,
        }))
    }

    fn delete_site(&mut self, site: Site) -> StorageResult<u64> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM comments WHERE site = ?1", params![site.as_str()])?;
        let removed = tx.execute("DELETE FROM posts WHERE site = ?1", params![site.as_str()])?;
        tx.commit()?;
        Ok(removed as u64)
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        successes: u64,
        failures: u64,
        status: RunStatus,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, successes = ?3, failures = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                successes as i64,
                failures as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, successes, failures
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    // ===== Statistics =====

    fn count_posts(&self, site: Option<Site>) -> StorageResult<u64> {
        let count: i64 = match site {
            Some(site) => self.conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE site = ?1",
                params![site.as_str()],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    fn count_comments(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn posts_by_site(&self) -> StorageResult<Vec<(Site, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT site, COUNT(*) FROM posts GROUP BY site ORDER BY site")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(site, count)| Ok((parse_site(&site)?, count as u64)))
            .collect()
    }
}
