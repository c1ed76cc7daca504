//! Interaction store, keyed by source URL
//!
//! Per source URL an interaction moves absent → present → present' → absent.

use anyhow::Result;

use super::extract::SourceEntry;
use crate::db::{Database, NewInteraction, Person};

/// What to do with the interaction for a source
#[derive(Debug, Clone)]
pub enum StoreAction<'a> {
    Retract,
    Upsert {
        entry: &'a SourceEntry,
        person: &'a Person,
    },
}

/// What the store actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted(i64),
    Updated(i64),
    /// Re-notification with identical content; nothing written
    Unchanged(i64),
    Deleted,
    /// Retraction for a source that was never stored
    Absent,
}

pub fn store(
    db: &Database,
    source_url: &str,
    post_id: i64,
    action: StoreAction<'_>,
) -> Result<StoreOutcome> {
    let existing = db.find_interaction_by_url(source_url)?;

    let (entry, person) = match action {
        StoreAction::Retract => {
            let Some(interaction) = existing else {
                return Ok(StoreOutcome::Absent);
            };
            if interaction.post_id != post_id {
                tracing::info!(
                    source_url,
                    stored_post_id = interaction.post_id,
                    notified_post_id = post_id,
                    "Retracting interaction stored against another post"
                );
            }
            db.delete_interaction_by_url(source_url)?;
            return Ok(StoreOutcome::Deleted);
        }
        StoreAction::Upsert { entry, person } => (entry, person),
    };

    let params = NewInteraction {
        kind: entry.kind,
        url: source_url.to_string(),
        datetime: entry.datetime.clone(),
        contents: entry.contents.clone(),
        person_id: person.id,
        post_id,
    };

    match existing {
        Some(interaction) if interaction.matches(&params) => {
            Ok(StoreOutcome::Unchanged(interaction.id))
        }
        Some(interaction) => {
            db.update_interaction(&params)?;
            Ok(StoreOutcome::Updated(interaction.id))
        }
        None => Ok(StoreOutcome::Inserted(db.insert_interaction(&params)?)),
    }
}
