use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::{format_timestamp, now};

/// A validated upload ready to be stored
#[derive(Debug, Clone)]
pub struct NewImage {
    pub data: Vec<u8>,
    pub name: String,
    pub mimetype: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub id: i64,
    pub data: Vec<u8>,
    pub name: String,
    pub mimetype: String,
}

pub struct ImageRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ImageRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, image: &NewImage) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO images (data, name, mimetype, created_at) VALUES (?, ?, ?, ?)",
                params![
                    image.data,
                    image.name,
                    image.mimetype,
                    format_timestamp(&now())
                ],
            )
            .context("Failed to store image")?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get(&self, id: i64) -> Result<Option<StoredImage>> {
        let image = self
            .conn
            .query_row(
                "SELECT id, data, name, mimetype FROM images WHERE id = ? AND deleted_at IS NULL",
                [id],
                |row| {
                    Ok(StoredImage {
                        id: row.get(0)?,
                        data: row.get(1)?,
                        name: row.get(2)?,
                        mimetype: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(image)
    }
}
