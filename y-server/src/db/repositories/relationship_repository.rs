use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use y_types::Relationship;

use super::{format_timestamp, now, parse_optional_timestamp, parse_timestamp};

const RELATIONSHIP_COLUMNS: &str =
    "id, first_acc_id, second_acc_id, confirmed_relation, is_friend_relation, created_at, deleted_at";

pub struct RelationshipRepository<'c> {
    conn: &'c Connection,
}

fn map_relationship(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    Ok(Relationship {
        id: row.get(0)?,
        first_acc_id: row.get(1)?,
        second_acc_id: row.get(2)?,
        confirmed_relation: row.get(3)?,
        is_friend_relation: row.get(4)?,
        created_at: parse_timestamp(5, row.get(5)?)?,
        deleted_at: parse_optional_timestamp(6, row.get(6)?)?,
    })
}

impl<'c> RelationshipRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// The live edge pointing from `first` to `second`, if any
    pub fn live_edge(&self, first: i64, second: i64) -> Result<Option<Relationship>> {
        let sql = format!(
            "SELECT {} FROM relationships
             WHERE first_acc_id = ? AND second_acc_id = ? AND deleted_at IS NULL",
            RELATIONSHIP_COLUMNS
        );
        let edge = self
            .conn
            .query_row(&sql, [first, second], map_relationship)
            .optional()?;
        Ok(edge)
    }

    pub fn insert(
        &self,
        first: i64,
        second: i64,
        is_friend_relation: bool,
        confirmed: bool,
    ) -> Result<Relationship> {
        let now = now();
        self.conn
            .execute(
                "INSERT INTO relationships (first_acc_id, second_acc_id, confirmed_relation, \
                 is_friend_relation, created_at) VALUES (?, ?, ?, ?, ?)",
                params![first, second, confirmed, is_friend_relation, format_timestamp(&now)],
            )
            .context("Failed to insert relationship")?;

        Ok(Relationship {
            id: self.conn.last_insert_rowid(),
            first_acc_id: first,
            second_acc_id: second,
            confirmed_relation: confirmed,
            is_friend_relation,
            created_at: now,
            deleted_at: None,
        })
    }

    pub fn confirm(&self, id: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE relationships SET confirmed_relation = 1 WHERE id = ?",
                [id],
            )
            .context("Failed to confirm relationship")?;
        Ok(())
    }

    pub fn soft_delete(&self, id: i64, at: &DateTime<Utc>) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE relationships SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
            params![format_timestamp(at), id],
        )?;
        Ok(rows)
    }

    /// Soft-delete every live friend edge between `a` and `b`, in both
    /// directions. Block edges are left alone.
    pub fn soft_delete_friend_edges(&self, a: i64, b: i64, at: &DateTime<Utc>) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE relationships SET deleted_at = ?1
             WHERE deleted_at IS NULL AND is_friend_relation = 1
               AND ((first_acc_id = ?2 AND second_acc_id = ?3)
                 OR (first_acc_id = ?3 AND second_acc_id = ?2))",
            params![format_timestamp(at), a, b],
        )?;
        Ok(rows)
    }

    /// Soft-delete every live edge touching `account_id`
    pub fn soft_delete_all_for(&self, account_id: i64, at: &DateTime<Utc>) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE relationships SET deleted_at = ?1
             WHERE deleted_at IS NULL AND (first_acc_id = ?2 OR second_acc_id = ?2)",
            params![format_timestamp(at), account_id],
        )?;
        Ok(rows)
    }

    /// Ids of accounts `account_id` has a confirmed friend edge towards
    pub fn friend_ids(&self, account_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT second_acc_id FROM relationships
             WHERE first_acc_id = ? AND is_friend_relation = 1 AND confirmed_relation = 1
               AND deleted_at IS NULL
             ORDER BY second_acc_id",
        )?;
        let ids = stmt
            .query_map([account_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}
