//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ArticleStore
//! trait.

use crate::article::Article;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ArticleStore, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// SQLite storage backend
///
/// File-backed stores remember their path so the watchdog can reconnect by
/// reopening the same database. In-memory stores (tests) have no path;
/// reconnecting them keeps the live connection, since reopening would
/// discard the data.
pub struct SqliteStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens or creates a SQLite store at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = open_connection(path)?;
        Ok(Self {
            conn: Some(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Some(conn),
            path: None,
        })
    }

    fn conn(&self) -> StoreResult<&Connection> {
        self.conn.as_ref().ok_or(StoreError::Closed)
    }
}

/// Opens and configures a file-backed connection
fn open_connection(path: &Path) -> StoreResult<Connection> {
    let conn = Connection::open(path)?;

    // Configure SQLite for better performance
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}

impl ArticleStore for SqliteStore {
    fn latest_id(&self) -> StoreResult<Option<u64>> {
        let max: Option<i64> =
            self.conn()?
                .query_row("SELECT MAX(id) FROM articles", [], |row| row.get(0))?;
        Ok(max.map(|id| id as u64))
    }

    fn insert_batch(&mut self, articles: &[Article]) -> StoreResult<()> {
        if articles.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        let conn = self.conn.as_mut().ok_or(StoreError::Closed)?;
        let tx = conn.transaction()?;

        for article in articles {
            tx.execute(
                "INSERT INTO articles (id, source_url, title, published_date, collected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     source_url = excluded.source_url,
                     title = excluded.title,
                     published_date = excluded.published_date,
                     collected_at = excluded.collected_at",
                params![
                    article.id as i64,
                    article.source_url,
                    article.title,
                    article.published_date,
                    article.collected_at.to_rfc3339(),
                ],
            )?;

            // Rewrite paragraphs so a re-fetched article cannot interleave
            // old and new body text
            tx.execute(
                "DELETE FROM paragraphs WHERE article_id = ?1",
                params![article.id as i64],
            )?;

            for (seq, paragraph) in article.body.iter().enumerate() {
                tx.execute(
                    "INSERT INTO paragraphs (article_id, seq, body) VALUES (?1, ?2, ?3)",
                    params![article.id as i64, seq as i64, paragraph],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn reconnect(&mut self) -> StoreResult<()> {
        match &self.path {
            Some(path) => {
                // Opening the replacement first keeps the old connection
                // alive if the reopen fails
                let fresh = open_connection(path)?;
                self.conn = Some(fresh);
            }
            None => {
                // In-memory store: reopening would discard the data, so
                // only revive a closed connection
                if self.conn.is_none() {
                    let conn = Connection::open_in_memory()?;
                    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                    initialize_schema(&conn)?;
                    self.conn = Some(conn);
                }
            }
        }
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        if let Some(conn) = self.conn.take() {
            if let Err((conn, e)) = conn.close() {
                // Keep the connection usable if close failed
                self.conn = Some(conn);
                return Err(StoreError::Sqlite(e));
            }
        }
        Ok(())
    }

    fn count_articles(&self) -> StoreResult<u64> {
        let count: i64 =
            self.conn()?
                .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn get_article(&self, id: u64) -> StoreResult<Option<Article>> {
        let conn = self.conn()?;

        let header = conn
            .query_row(
                "SELECT source_url, title, published_date, collected_at
                 FROM articles WHERE id = ?1",
                params![id as i64],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((source_url, title, published_date, collected_at)) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT body FROM paragraphs WHERE article_id = ?1 ORDER BY seq",
        )?;
        let body = stmt
            .query_map(params![id as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let collected_at = DateTime::parse_from_rfc3339(&collected_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default();

        Ok(Some(Article {
            id,
            collected_at,
            source_url,
            title,
            published_date,
            body,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_article(id: u64, paragraphs: &[&str]) -> Article {
        Article {
            id,
            collected_at: Utc::now(),
            source_url: format!("https://example.com/news.php?news={}", id),
            title: format!("Article {}", id),
            published_date: "10 January 2024".to_string(),
            body: paragraphs.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_latest_id_empty_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.latest_id().unwrap(), None);
    }

    #[test]
    fn test_insert_batch_and_latest_id() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let articles = vec![
            test_article(3, &["a"]),
            test_article(1, &["b"]),
            test_article(7, &["c"]),
        ];

        store.insert_batch(&articles).unwrap();

        assert_eq!(store.latest_id().unwrap(), Some(7));
        assert_eq!(store.count_articles().unwrap(), 3);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let result = store.insert_batch(&[]);
        assert!(matches!(result, Err(StoreError::EmptyBatch)));
    }

    #[test]
    fn test_get_article_preserves_paragraph_order() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let article = test_article(5, &["first", "second", "third"]);

        store.insert_batch(std::slice::from_ref(&article)).unwrap();

        let loaded = store.get_article(5).unwrap().unwrap();
        assert_eq!(loaded.id, 5);
        assert_eq!(loaded.title, article.title);
        assert_eq!(loaded.body, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_get_article_missing() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get_article(42).unwrap(), None);
    }

    #[test]
    fn test_reinsert_is_idempotent_upsert() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        store
            .insert_batch(&[test_article(9, &["old one", "old two"])])
            .unwrap();

        let mut updated = test_article(9, &["new one"]);
        updated.title = "Updated".to_string();
        store.insert_batch(std::slice::from_ref(&updated)).unwrap();

        // One article, fully replaced, no stale paragraphs
        assert_eq!(store.count_articles().unwrap(), 1);
        let loaded = store.get_article(9).unwrap().unwrap();
        assert_eq!(loaded.title, "Updated");
        assert_eq!(loaded.body, vec!["new one"]);
    }

    #[test]
    fn test_close_is_idempotent_and_blocks_use() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        store.close().unwrap();
        store.close().unwrap();

        assert!(matches!(store.latest_id(), Err(StoreError::Closed)));
        assert!(matches!(
            store.insert_batch(&[test_article(1, &["x"])]),
            Err(StoreError::Closed)
        ));
    }

    #[test]
    fn test_file_backed_reconnect_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("khobor.db");

        let mut store = SqliteStore::open(&db_path).unwrap();
        store.insert_batch(&[test_article(11, &["kept"])]).unwrap();

        store.reconnect().unwrap();

        assert_eq!(store.latest_id().unwrap(), Some(11));
        assert_eq!(
            store.get_article(11).unwrap().unwrap().body,
            vec!["kept"]
        );
    }

    #[test]
    fn test_reconnect_revives_closed_store() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("khobor.db");

        let mut store = SqliteStore::open(&db_path).unwrap();
        store.insert_batch(&[test_article(2, &["still here"])]).unwrap();
        store.close().unwrap();

        store.reconnect().unwrap();
        assert_eq!(store.latest_id().unwrap(), Some(2));
    }
}
