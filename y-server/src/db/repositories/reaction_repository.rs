use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use y_types::Reaction;

use super::{format_timestamp, now, parse_optional_timestamp, parse_timestamp};

const REACTION_COLUMNS: &str = "id, responding_to, poster_id, reaction_type, created_at, deleted_at";

pub struct ReactionRepository<'c> {
    conn: &'c Connection,
}

fn map_reaction(row: &Row<'_>) -> rusqlite::Result<Reaction> {
    Ok(Reaction {
        id: row.get(0)?,
        responding_to: row.get(1)?,
        poster_id: row.get(2)?,
        reaction_type: row.get(3)?,
        created_at: parse_timestamp(4, row.get(4)?)?,
        deleted_at: parse_optional_timestamp(5, row.get(5)?)?,
    })
}

impl<'c> ReactionRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, post_id: i64, poster_id: i64, reaction_type: i64) -> Result<Reaction> {
        let now = now();
        self.conn
            .execute(
                "INSERT INTO reactions (responding_to, poster_id, reaction_type, created_at)
                 VALUES (?, ?, ?, ?)",
                params![post_id, poster_id, reaction_type, format_timestamp(&now)],
            )
            .context("Failed to create reaction")?;

        Ok(Reaction {
            id: self.conn.last_insert_rowid(),
            responding_to: post_id,
            poster_id,
            reaction_type,
            created_at: now,
            deleted_at: None,
        })
    }

    pub fn get(&self, id: i64) -> Result<Option<Reaction>> {
        let sql = format!(
            "SELECT {} FROM reactions WHERE id = ? AND deleted_at IS NULL",
            REACTION_COLUMNS
        );
        let reaction = self.conn.query_row(&sql, [id], map_reaction).optional()?;
        Ok(reaction)
    }

    /// The live reaction `poster_id` left on a post, if any
    pub fn live_by_poster(&self, post_id: i64, poster_id: i64) -> Result<Option<Reaction>> {
        let sql = format!(
            "SELECT {} FROM reactions
             WHERE responding_to = ? AND poster_id = ? AND deleted_at IS NULL
             ORDER BY id LIMIT 1",
            REACTION_COLUMNS
        );
        let reaction = self
            .conn
            .query_row(&sql, [post_id, poster_id], map_reaction)
            .optional()?;
        Ok(reaction)
    }

    /// The most recently withdrawn reaction `poster_id` left on a post
    pub fn latest_deleted_by_poster(
        &self,
        post_id: i64,
        poster_id: i64,
    ) -> Result<Option<Reaction>> {
        let sql = format!(
            "SELECT {} FROM reactions
             WHERE responding_to = ? AND poster_id = ? AND deleted_at IS NOT NULL
             ORDER BY id DESC LIMIT 1",
            REACTION_COLUMNS
        );
        let reaction = self
            .conn
            .query_row(&sql, [post_id, poster_id], map_reaction)
            .optional()?;
        Ok(reaction)
    }

    /// Bring a withdrawn reaction back, possibly with a new type
    pub fn restore(&self, id: i64, reaction_type: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE reactions SET deleted_at = NULL, reaction_type = ? WHERE id = ?",
                params![reaction_type, id],
            )
            .context("Failed to restore reaction")?;
        Ok(())
    }

    pub fn live_for_post(&self, post_id: i64) -> Result<Vec<Reaction>> {
        let sql = format!(
            "SELECT {} FROM reactions WHERE responding_to = ? AND deleted_at IS NULL ORDER BY id",
            REACTION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let reactions = stmt
            .query_map([post_id], map_reaction)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reactions)
    }

    pub fn soft_delete(&self, id: i64, at: &DateTime<Utc>) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE reactions SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
            params![format_timestamp(at), id],
        )?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::create_account;
    use crate::db::repositories::{NewPost, PostRepository};
    use crate::db::Database;

    #[test]
    fn test_withdrawn_reaction_can_be_restored() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection().unwrap();
        let alice = create_account(&conn, "alice", true);
        let bob = create_account(&conn, "bob", true);
        let post = PostRepository::new(&conn)
            .create(&NewPost {
                poster_id: alice.id,
                posted_on_id: alice.id,
                text_content: Some("like me".to_string()),
                shared_post_id: None,
                associated_image_id: None,
            })
            .unwrap();

        let repo = ReactionRepository::new(&conn);
        let reaction = repo.create(post.id, bob.id, 0).unwrap();
        assert_eq!(repo.live_by_poster(post.id, bob.id).unwrap().unwrap().id, reaction.id);

        repo.soft_delete(reaction.id, &Utc::now()).unwrap();
        assert!(repo.live_by_poster(post.id, bob.id).unwrap().is_none());
        assert!(repo.live_for_post(post.id).unwrap().is_empty());

        let withdrawn = repo.latest_deleted_by_poster(post.id, bob.id).unwrap().unwrap();
        assert_eq!(withdrawn.id, reaction.id);

        repo.restore(withdrawn.id, 1).unwrap();
        let restored = repo.get(reaction.id).unwrap().unwrap();
        assert_eq!(restored.reaction_type, 1);
        assert!(restored.deleted_at.is_none());
        assert!(repo.latest_deleted_by_poster(post.id, bob.id).unwrap().is_none());
    }
}
