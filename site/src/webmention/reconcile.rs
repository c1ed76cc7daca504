//! Author reconciliation
//!
//! Matches the author of a source entry against stored people by URL,
//! creating them on first sighting and refreshing their name and photo
//! afterwards.

use anyhow::Result;

use crate::db::{Database, NewPerson, Person, PersonChanges};

pub fn reconcile(db: &Database, author: &NewPerson) -> Result<Person> {
    let Some(existing) = db.find_person_by_url(&author.url)? else {
        let person = db.insert_person(author)?;
        tracing::debug!(person_id = person.id, url = %person.url, "Stored new person");
        return Ok(person);
    };

    let changes = PersonChanges {
        name: (existing.name != author.name).then(|| author.name.clone()),
        photo_url: (existing.photo_url != author.photo_url).then(|| author.photo_url.clone()),
    };
    if changes.is_empty() {
        return Ok(existing);
    }

    tracing::debug!(person_id = existing.id, "Updating person details");
    Ok(db.update_person(existing.id, &changes)?.unwrap_or(existing))
}
