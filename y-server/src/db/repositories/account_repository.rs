use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use y_types::{Account, FriendCode, ImageSlot};

use super::{format_timestamp, now, parse_optional_timestamp, parse_timestamp};

/// Attempts at drawing an unused friend code before giving up
const FRIEND_CODE_ATTEMPTS: usize = 16;

const ACCOUNT_COLUMNS: &str = "a.id, a.username, a.first_name, a.last_name, a.bio, a.is_public, \
     a.friend_code, a.profile_image_id, a.cover_image_id, a.created_at, a.deleted_at";

/// Fields supplied at registration
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub is_public: bool,
    pub profile_image_id: Option<i64>,
    pub cover_image_id: Option<i64>,
}

pub struct AccountRepository<'c> {
    conn: &'c Connection,
}

fn map_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        bio: row.get(4)?,
        is_public: row.get(5)?,
        friend_code: row.get(6)?,
        profile_image_id: row.get(7)?,
        cover_image_id: row.get(8)?,
        created_at: parse_timestamp(9, row.get(9)?)?,
        deleted_at: parse_optional_timestamp(10, row.get(10)?)?,
    })
}

impl<'c> AccountRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert a new account with a freshly drawn, unused friend code
    pub fn create(&self, account: &NewAccount) -> Result<Account> {
        let friend_code = self.unused_friend_code()?;
        let now = format_timestamp(&now());

        self.conn
            .execute(
                "INSERT INTO accounts (username, password_hash, first_name, last_name, bio, \
                 profile_image_id, cover_image_id, is_public, friend_code, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    account.username,
                    account.password_hash,
                    account.first_name,
                    account.last_name,
                    account.bio,
                    account.profile_image_id,
                    account.cover_image_id,
                    account.is_public,
                    friend_code.as_str(),
                    now,
                ],
            )
            .context("Failed to create account")?;

        let id = self.conn.last_insert_rowid();
        self.get_by_id_any(id)?
            .context("Account missing right after insert")
    }

    fn unused_friend_code(&self) -> Result<FriendCode> {
        for _ in 0..FRIEND_CODE_ATTEMPTS {
            let code = FriendCode::generate();
            let taken: bool = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM accounts WHERE friend_code = ?)",
                [code.as_str()],
                |row| row.get(0),
            )?;
            if !taken {
                return Ok(code);
            }
        }
        bail!("Could not find an unused friend code")
    }

    /// Get a live account by id
    pub fn get_by_id(&self, id: i64) -> Result<Option<Account>> {
        let sql = format!(
            "SELECT {} FROM accounts a WHERE a.id = ? AND a.deleted_at IS NULL",
            ACCOUNT_COLUMNS
        );
        let account = self.conn.query_row(&sql, [id], map_account).optional()?;
        Ok(account)
    }

    /// Get an account by id even if it has been deleted
    pub fn get_by_id_any(&self, id: i64) -> Result<Option<Account>> {
        let sql = format!("SELECT {} FROM accounts a WHERE a.id = ?", ACCOUNT_COLUMNS);
        let account = self.conn.query_row(&sql, [id], map_account).optional()?;
        Ok(account)
    }

    /// Usernames stay reserved after the account is deleted
    pub fn username_taken(&self, username: &str) -> Result<bool> {
        let taken = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = ?)",
            [username],
            |row| row.get(0),
        )?;
        Ok(taken)
    }

    pub fn get_by_friend_code(&self, code: &FriendCode) -> Result<Option<Account>> {
        let sql = format!(
            "SELECT {} FROM accounts a WHERE a.friend_code = ? AND a.deleted_at IS NULL",
            ACCOUNT_COLUMNS
        );
        let account = self
            .conn
            .query_row(&sql, [code.as_str()], map_account)
            .optional()?;
        Ok(account)
    }

    /// Password hash and id of a live account, for login
    pub fn credentials_for(&self, username: &str) -> Result<Option<(i64, String)>> {
        let creds = self
            .conn
            .query_row(
                "SELECT id, password_hash FROM accounts WHERE username = ? AND deleted_at IS NULL",
                [username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(creds)
    }

    pub fn password_hash(&self, id: i64) -> Result<Option<String>> {
        let hash = self
            .conn
            .query_row(
                "SELECT password_hash FROM accounts WHERE id = ? AND deleted_at IS NULL",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    pub fn update_bio(&self, id: i64, bio: Option<&str>) -> Result<()> {
        self.conn
            .execute("UPDATE accounts SET bio = ? WHERE id = ?", params![bio, id])
            .context("Failed to update bio")?;
        Ok(())
    }

    pub fn update_password_hash(&self, id: i64, hash: &str) -> Result<()> {
        self.conn
            .execute(
                "UPDATE accounts SET password_hash = ? WHERE id = ?",
                params![hash, id],
            )
            .context("Failed to update password")?;
        Ok(())
    }

    pub fn set_image(&self, id: i64, slot: ImageSlot, image_id: i64) -> Result<()> {
        let sql = match slot {
            ImageSlot::Profile => "UPDATE accounts SET profile_image_id = ? WHERE id = ?",
            ImageSlot::Cover => "UPDATE accounts SET cover_image_id = ? WHERE id = ?",
        };
        self.conn
            .execute(sql, params![image_id, id])
            .context("Failed to update account image")?;
        Ok(())
    }

    pub fn set_visibility(&self, id: i64, is_public: bool) -> Result<()> {
        self.conn
            .execute(
                "UPDATE accounts SET is_public = ? WHERE id = ?",
                params![is_public, id],
            )
            .context("Failed to update visibility")?;
        Ok(())
    }

    pub fn soft_delete(&self, id: i64, at: &DateTime<Utc>) -> Result<usize> {
        let rows = self
            .conn
            .execute(
                "UPDATE accounts SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
                params![format_timestamp(at), id],
            )
            .context("Failed to delete account")?;
        Ok(rows)
    }

    /// Live accounts `id` has a confirmed friendship with
    pub fn friends_of(&self, id: i64) -> Result<Vec<Account>> {
        self.accounts_on_edges(
            "JOIN relationships r ON r.second_acc_id = a.id
             WHERE r.first_acc_id = ? AND r.is_friend_relation = 1 AND r.confirmed_relation = 1",
            id,
        )
    }

    /// Live accounts waiting on `id` to answer their friend request
    pub fn pending_requests_for(&self, id: i64) -> Result<Vec<Account>> {
        self.accounts_on_edges(
            "JOIN relationships r ON r.first_acc_id = a.id
             WHERE r.second_acc_id = ? AND r.is_friend_relation = 1 AND r.confirmed_relation = 0",
            id,
        )
    }

    /// Live accounts `id` sent an unanswered friend request to
    pub fn outgoing_requests_of(&self, id: i64) -> Result<Vec<Account>> {
        self.accounts_on_edges(
            "JOIN relationships r ON r.second_acc_id = a.id
             WHERE r.first_acc_id = ? AND r.is_friend_relation = 1 AND r.confirmed_relation = 0",
            id,
        )
    }

    /// Live accounts `id` has blocked
    pub fn blocked_by(&self, id: i64) -> Result<Vec<Account>> {
        self.accounts_on_edges(
            "JOIN relationships r ON r.second_acc_id = a.id
             WHERE r.first_acc_id = ? AND r.is_friend_relation = 0",
            id,
        )
    }

    fn accounts_on_edges(&self, join_and_filter: &str, id: i64) -> Result<Vec<Account>> {
        let sql = format!(
            "SELECT {} FROM accounts a {} AND r.deleted_at IS NULL AND a.deleted_at IS NULL
             ORDER BY a.first_name, a.last_name, a.id",
            ACCOUNT_COLUMNS, join_and_filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let accounts = stmt
            .query_map([id], map_account)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }
}
