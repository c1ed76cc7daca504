//! Database module for posts, people and interactions
//!
//! Uses SQLite to store the site's content in ~/.microlight/microlight.db.
//! The webmention core only needs find-one, insert, update, delete and count
//! against the three tables; each submodule exposes those operations for its
//! table.

pub mod interactions;
pub mod people;
pub mod posts;
pub mod schema;

// Re-export commonly used types
pub use interactions::{Interaction, InteractionKind, InteractionWithAuthor, NewInteraction};
pub use people::{NewPerson, Person, PersonChanges};
pub use posts::{CreatePost, Post, PostStatus};

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Database connection wrapper with thread-safe access
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at a specific path
    pub fn open_at(path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        let db = Self::from_connection(conn)?;
        tracing::info!("Database opened at {:?}", path);
        Ok(db)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        schema::create_tables(&conn)?;
        Ok(())
    }
}
