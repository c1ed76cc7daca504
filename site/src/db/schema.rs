//! Database schema definitions

use anyhow::Result;
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Create all tables if they don't exist
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Posts, written by the Micropub layer and read by webmentions
        CREATE TABLE IF NOT EXISTS post (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT NOT NULL UNIQUE,
            title TEXT,
            content TEXT NOT NULL DEFAULT '',
            post_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'public',
            published TEXT NOT NULL,
            updated TEXT,
            tags TEXT NOT NULL DEFAULT '',
            url TEXT
        );

        -- Authors of remote interactions, keyed by their home URL
        CREATE TABLE IF NOT EXISTS person (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            photo_url TEXT NOT NULL DEFAULT ''
        );

        -- One accepted webmention per source URL
        CREATE TABLE IF NOT EXISTS interaction (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type TEXT NOT NULL,
            url TEXT NOT NULL UNIQUE,
            datetime TEXT NOT NULL,
            contents TEXT NOT NULL DEFAULT '',
            person_id INTEGER NOT NULL,
            post_id INTEGER NOT NULL,
            FOREIGN KEY (person_id) REFERENCES person(id),
            FOREIGN KEY (post_id) REFERENCES post(id) ON DELETE CASCADE
        );

        -- Index for listing a post's interactions
        CREATE INDEX IF NOT EXISTS idx_interaction_post
        ON interaction(post_id, datetime);

        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}
