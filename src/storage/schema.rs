//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the khobor database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per harvested article, keyed by the site's sequential id
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY,
    source_url TEXT NOT NULL,
    title TEXT NOT NULL,
    published_date TEXT NOT NULL,
    collected_at TEXT NOT NULL
);

-- Body paragraphs in page order
CREATE TABLE IF NOT EXISTS paragraphs (
    article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    seq INTEGER NOT NULL,
    body TEXT NOT NULL,
    PRIMARY KEY (article_id, seq)
);

CREATE INDEX IF NOT EXISTS idx_paragraphs_article ON paragraphs(article_id);
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
