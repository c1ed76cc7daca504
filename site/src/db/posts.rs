//! Post lookups
//!
//! Posts are owned by the Micropub layer. Webmentions only read them, to
//! check that a target exists and has not been deleted.

use super::Database;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use serde::{Deserialize, Serialize};

/// Post visibility
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Public,
    Private,
    Deleted,
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostStatus::Public => write!(f, "public"),
            PostStatus::Private => write!(f, "private"),
            PostStatus::Deleted => write!(f, "deleted"),
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(PostStatus::Public),
            "private" => Ok(PostStatus::Private),
            "deleted" => Ok(PostStatus::Deleted),
            _ => anyhow::bail!("Unknown post status: {}", s),
        }
    }
}

/// Post record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub slug: String,
    pub title: Option<String>,
    pub content: String,
    pub post_type: String,
    pub status: PostStatus,
    pub published: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    /// Subject of a reply/like/repost/bookmark
    pub url: Option<String>,
}

/// Parameters for creating a new post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePost {
    pub slug: String,
    pub title: Option<String>,
    pub content: String,
    pub post_type: String,
    pub status: PostStatus,
    pub tags: Vec<String>,
    pub url: Option<String>,
}

const POST_COLUMNS: &str =
    "id, slug, title, content, post_type, status, published, updated, tags, url";

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    let status: String = row.get(5)?;
    let published: String = row.get(6)?;
    let updated: Option<String> = row.get(7)?;
    let tags: String = row.get(8)?;

    Ok(Post {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        post_type: row.get(4)?,
        status: status
            .parse::<PostStatus>()
            .map_err(|e: anyhow::Error| {
                rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into())
            })?,
        published: parse_timestamp(6, &published)?,
        updated: updated.as_deref().map(|u| parse_timestamp(7, u)).transpose()?,
        tags: tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        url: row.get(9)?,
    })
}

impl Database {
    /// Create a new post
    pub fn create_post(&self, params: CreatePost) -> Result<Post> {
        let now = Utc::now();
        let tags = params.tags.join(",");

        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO post (slug, title, content, post_type, status, published, tags, url)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            (
                &params.slug,
                &params.title,
                &params.content,
                &params.post_type,
                params.status.to_string(),
                now.to_rfc3339(),
                &tags,
                &params.url,
            ),
        )
        .with_context(|| format!("Failed to create post `{}`", params.slug))?;
        let id = conn.last_insert_rowid();

        Ok(Post {
            id,
            slug: params.slug,
            title: params.title,
            content: params.content,
            post_type: params.post_type,
            status: params.status,
            published: now,
            updated: None,
            tags: params.tags,
            url: params.url,
        })
    }

    /// Get a post by slug, whatever its status
    pub fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM post WHERE slug = ?1 LIMIT 1",
            POST_COLUMNS
        ))?;

        match stmt.query_row([slug], row_to_post) {
            Ok(post) => Ok(Some(post)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of posts stored under `slug` (0 or 1)
    pub fn count_posts_by_slug(&self, slug: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(id) FROM post WHERE slug = ?1", [slug], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    /// Change a post's status, touching its `updated` timestamp
    pub fn set_post_status(&self, slug: &str, status: PostStatus) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE post SET status = ?1, updated = ?2 WHERE slug = ?3",
            (status.to_string(), Utc::now().to_rfc3339(), slug),
        )?;
        Ok(rows > 0)
    }
}
