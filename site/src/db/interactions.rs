//! Interaction CRUD operations
//!
//! An interaction is the stored form of one accepted webmention. Its source
//! URL is unique across the table.

use super::Database;
use anyhow::{Context, Result};
use rusqlite::types::Type;
use serde::{Deserialize, Serialize};

use super::people::Person;

/// Interaction type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    #[default]
    Reply,
    Like,
    Repost,
    Bookmark,
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionKind::Reply => write!(f, "reply"),
            InteractionKind::Like => write!(f, "like"),
            InteractionKind::Repost => write!(f, "repost"),
            InteractionKind::Bookmark => write!(f, "bookmark"),
        }
    }
}

impl std::str::FromStr for InteractionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reply" => Ok(InteractionKind::Reply),
            "like" => Ok(InteractionKind::Like),
            "repost" => Ok(InteractionKind::Repost),
            "bookmark" => Ok(InteractionKind::Bookmark),
            _ => anyhow::bail!("Unknown interaction type: {}", s),
        }
    }
}

/// Interaction record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interaction {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    /// Source URL of the webmention
    pub url: String,
    /// Published timestamp as found on the source page
    pub datetime: String,
    pub contents: String,
    pub person_id: i64,
    pub post_id: i64,
}

/// Parameters for creating or replacing an interaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewInteraction {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub url: String,
    pub datetime: String,
    pub contents: String,
    pub person_id: i64,
    pub post_id: i64,
}

impl Interaction {
    /// Whether storing `params` would leave this row as it is
    pub fn matches(&self, params: &NewInteraction) -> bool {
        self.kind == params.kind
            && self.url == params.url
            && self.datetime == params.datetime
            && self.contents == params.contents
            && self.person_id == params.person_id
            && self.post_id == params.post_id
    }
}

/// Interaction joined with its author, for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionWithAuthor {
    #[serde(flatten)]
    pub interaction: Interaction,
    pub author: Person,
}

const INTERACTION_COLUMNS: &str = "id, type, url, datetime, contents, person_id, post_id";

fn row_to_interaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Interaction> {
    let kind: String = row.get(1)?;
    Ok(Interaction {
        id: row.get(0)?,
        kind: kind
            .parse::<InteractionKind>()
            .map_err(|e: anyhow::Error| {
                rusqlite::Error::FromSqlConversionFailure(1, Type::Text, e.into())
            })?,
        url: row.get(2)?,
        datetime: row.get(3)?,
        contents: row.get(4)?,
        person_id: row.get(5)?,
        post_id: row.get(6)?,
    })
}

impl Database {
    /// Find the interaction recorded for a source URL
    pub fn find_interaction_by_url(&self, url: &str) -> Result<Option<Interaction>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM interaction WHERE url = ?1",
            INTERACTION_COLUMNS
        ))?;

        match stmt.query_row([url], row_to_interaction) {
            Ok(interaction) => Ok(Some(interaction)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert a new interaction, returning its id
    pub fn insert_interaction(&self, params: &NewInteraction) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO interaction (type, url, datetime, contents, person_id, post_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            (
                params.kind.to_string(),
                &params.url,
                &params.datetime,
                &params.contents,
                params.person_id,
                params.post_id,
            ),
        )
        .with_context(|| format!("Failed to insert interaction {}", params.url))?;

        Ok(conn.last_insert_rowid())
    }

    /// Replace every field of the interaction stored for `params.url`
    pub fn update_interaction(&self, params: &NewInteraction) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn
            .execute(
                r#"
                UPDATE interaction
                SET type = ?1, datetime = ?2, contents = ?3, person_id = ?4, post_id = ?5
                WHERE url = ?6
                "#,
                (
                    params.kind.to_string(),
                    &params.datetime,
                    &params.contents,
                    params.person_id,
                    params.post_id,
                    &params.url,
                ),
            )
            .with_context(|| format!("Failed to update interaction {}", params.url))?;
        Ok(rows > 0)
    }

    /// Delete the interaction for a source URL
    pub fn delete_interaction_by_url(&self, url: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM interaction WHERE url = ?1", [url])?;
        Ok(rows > 0)
    }

    /// Number of interactions attached to a post
    pub fn count_interactions_for_post(&self, post_id: i64) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(id) FROM interaction WHERE post_id = ?1",
            [post_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// List a post's interactions with their authors, oldest first
    pub fn list_interactions_for_post(&self, post_id: i64) -> Result<Vec<InteractionWithAuthor>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT i.id, i.type, i.url, i.datetime, i.contents, i.person_id, i.post_id,
                   p.id, p.url, p.name, p.photo_url
            FROM interaction i
            JOIN person p ON p.id = i.person_id
            WHERE i.post_id = ?1
            ORDER BY i.datetime ASC, i.id ASC
            "#,
        )?;

        let interactions = stmt
            .query_map([post_id], |row| {
                Ok(InteractionWithAuthor {
                    interaction: row_to_interaction(row)?,
                    author: Person {
                        id: row.get(7)?,
                        url: row.get(8)?,
                        name: row.get(9)?,
                        photo_url: row.get(10)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(interactions)
    }
}
