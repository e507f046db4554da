use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use y_types::Post;

use super::{format_timestamp, now, parse_optional_timestamp, parse_timestamp};

const POST_COLUMNS: &str = "id, poster_id, posted_on_id, text_content, shared_post_id, \
     associated_image_id, created_at, edited_at, deleted_at";

#[derive(Debug, Clone)]
pub struct NewPost {
    pub poster_id: i64,
    pub posted_on_id: i64,
    pub text_content: Option<String>,
    pub shared_post_id: Option<i64>,
    pub associated_image_id: Option<i64>,
}

/// Children soft-deleted along with a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeCounts {
    pub replies: usize,
    pub reactions: usize,
}

pub struct PostRepository<'c> {
    conn: &'c Connection,
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        poster_id: row.get(1)?,
        posted_on_id: row.get(2)?,
        text_content: row.get(3)?,
        shared_post_id: row.get(4)?,
        associated_image_id: row.get(5)?,
        created_at: parse_timestamp(6, row.get(6)?)?,
        edited_at: parse_optional_timestamp(7, row.get(7)?)?,
        deleted_at: parse_optional_timestamp(8, row.get(8)?)?,
    })
}

impl<'c> PostRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, post: &NewPost) -> Result<Post> {
        let now = now();
        self.conn
            .execute(
                "INSERT INTO posts (poster_id, posted_on_id, text_content, shared_post_id, \
                 associated_image_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    post.poster_id,
                    post.posted_on_id,
                    post.text_content,
                    post.shared_post_id,
                    post.associated_image_id,
                    format_timestamp(&now),
                ],
            )
            .context("Failed to create post")?;

        Ok(Post {
            id: self.conn.last_insert_rowid(),
            poster_id: post.poster_id,
            posted_on_id: post.posted_on_id,
            text_content: post.text_content.clone(),
            shared_post_id: post.shared_post_id,
            associated_image_id: post.associated_image_id,
            created_at: now,
            edited_at: None,
            deleted_at: None,
        })
    }

    /// Get a live post by id
    pub fn get(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE id = ? AND deleted_at IS NULL",
            POST_COLUMNS
        );
        let post = self.conn.query_row(&sql, [id], map_post).optional()?;
        Ok(post)
    }

    /// Get a post by id even if it has been deleted
    pub fn get_any(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS);
        let post = self.conn.query_row(&sql, [id], map_post).optional()?;
        Ok(post)
    }

    /// Live posts on an account's timeline, newest first
    pub fn timeline(&self, posted_on_id: i64) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE posted_on_id = ? AND deleted_at IS NULL ORDER BY id DESC",
            POST_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let posts = stmt
            .query_map([posted_on_id], map_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    pub fn update_text(&self, id: i64, text: Option<&str>, at: &DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "UPDATE posts SET text_content = ?, edited_at = ? WHERE id = ? AND deleted_at IS NULL",
                params![text, format_timestamp(at), id],
            )
            .context("Failed to edit post")?;
        Ok(())
    }

    /// Soft-delete a post and all of its live replies and reactions with one
    /// timestamp. Run inside a transaction so the cascade is all-or-nothing.
    pub fn soft_delete_cascade(&self, id: i64, at: &DateTime<Utc>) -> Result<CascadeCounts> {
        let stamp = format_timestamp(at);
        self.conn
            .execute(
                "UPDATE posts SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
                params![stamp, id],
            )
            .context("Failed to delete post")?;
        let replies = self.conn.execute(
            "UPDATE replies SET deleted_at = ? WHERE responding_to = ? AND deleted_at IS NULL",
            params![stamp, id],
        )?;
        let reactions = self.conn.execute(
            "UPDATE reactions SET deleted_at = ? WHERE responding_to = ? AND deleted_at IS NULL",
            params![stamp, id],
        )?;
        Ok(CascadeCounts { replies, reactions })
    }
}
