use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use y_types::Reply;

use super::{format_timestamp, now, parse_optional_timestamp, parse_timestamp};

const REPLY_COLUMNS: &str =
    "id, responding_to, poster_id, text_content, created_at, edited_at, deleted_at";

pub struct ReplyRepository<'c> {
    conn: &'c Connection,
}

fn map_reply(row: &Row<'_>) -> rusqlite::Result<Reply> {
    Ok(Reply {
        id: row.get(0)?,
        responding_to: row.get(1)?,
        poster_id: row.get(2)?,
        text_content: row.get(3)?,
        created_at: parse_timestamp(4, row.get(4)?)?,
        edited_at: parse_optional_timestamp(5, row.get(5)?)?,
        deleted_at: parse_optional_timestamp(6, row.get(6)?)?,
    })
}

impl<'c> ReplyRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, post_id: i64, poster_id: i64, text: &str) -> Result<Reply> {
        let now = now();
        self.conn
            .execute(
                "INSERT INTO replies (responding_to, poster_id, text_content, created_at)
                 VALUES (?, ?, ?, ?)",
                params![post_id, poster_id, text, format_timestamp(&now)],
            )
            .context("Failed to create reply")?;

        Ok(Reply {
            id: self.conn.last_insert_rowid(),
            responding_to: post_id,
            poster_id,
            text_content: text.to_string(),
            created_at: now,
            edited_at: None,
            deleted_at: None,
        })
    }

    pub fn get(&self, id: i64) -> Result<Option<Reply>> {
        let sql = format!(
            "SELECT {} FROM replies WHERE id = ? AND deleted_at IS NULL",
            REPLY_COLUMNS
        );
        let reply = self.conn.query_row(&sql, [id], map_reply).optional()?;
        Ok(reply)
    }

    /// Live replies to a post, oldest first
    pub fn live_for_post(&self, post_id: i64) -> Result<Vec<Reply>> {
        let sql = format!(
            "SELECT {} FROM replies WHERE responding_to = ? AND deleted_at IS NULL ORDER BY id",
            REPLY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let replies = stmt
            .query_map([post_id], map_reply)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(replies)
    }

    pub fn update_text(&self, id: i64, text: &str, at: &DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "UPDATE replies SET text_content = ?, edited_at = ? WHERE id = ? AND deleted_at IS NULL",
                params![text, format_timestamp(at), id],
            )
            .context("Failed to edit reply")?;
        Ok(())
    }

    pub fn soft_delete(&self, id: i64, at: &DateTime<Utc>) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE replies SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
            params![format_timestamp(at), id],
        )?;
        Ok(rows)
    }
}
