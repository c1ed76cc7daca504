//! Person CRUD operations

use super::Database;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Person record, the author of one or more interactions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub photo_url: String,
}

/// Parameters for creating a new person
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPerson {
    pub url: String,
    pub name: String,
    pub photo_url: String,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonChanges {
    pub name: Option<String>,
    pub photo_url: Option<String>,
}

impl PersonChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.photo_url.is_none()
    }
}

fn row_to_person(row: &rusqlite::Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        photo_url: row.get(3)?,
    })
}

fn select_person_by_url(conn: &rusqlite::Connection, url: &str) -> Result<Option<Person>> {
    let mut stmt = conn.prepare("SELECT id, url, name, photo_url FROM person WHERE url = ?1")?;
    match stmt.query_row([url], row_to_person) {
        Ok(person) => Ok(Some(person)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Find a person by their home URL (exact match)
    pub fn find_person_by_url(&self, url: &str) -> Result<Option<Person>> {
        let conn = self.conn.lock().unwrap();
        select_person_by_url(&conn, url)
    }

    /// Insert a person, returning the stored row.
    ///
    /// If another writer stored the same URL first, its row is returned
    /// instead of creating a duplicate.
    pub fn insert_person(&self, params: &NewPerson) -> Result<Person> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO person (url, name, photo_url)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(url) DO NOTHING
            "#,
            (&params.url, &params.name, &params.photo_url),
        )
        .with_context(|| format!("Failed to insert person {}", params.url))?;

        select_person_by_url(&conn, &params.url)?
            .with_context(|| format!("Person {} missing after insert", params.url))
    }

    /// Apply a partial update, returning the refreshed row
    pub fn update_person(&self, id: i64, changes: &PersonChanges) -> Result<Option<Person>> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "UPDATE person SET name = COALESCE(?1, name), photo_url = COALESCE(?2, photo_url) WHERE id = ?3",
            (&changes.name, &changes.photo_url, id),
        )?;

        let mut stmt = conn.prepare("SELECT id, url, name, photo_url FROM person WHERE id = ?1")?;
        match stmt.query_row([id], row_to_person) {
            Ok(person) => Ok(Some(person)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Total number of people
    pub fn count_people(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(id) FROM person", [], |row| row.get(0))?;
        Ok(count)
    }
}
