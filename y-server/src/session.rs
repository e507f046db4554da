use anyhow::{Context, Result};
use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

use crate::db::repositories::{format_timestamp, now, parse_timestamp};
use crate::db::{Database, TransientError};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "access_token_cookie";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No session found for token")]
    NotFound,

    #[error("Session has expired")]
    Expired,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for SessionError {
    fn from(err: rusqlite::Error) -> Self {
        SessionError::Storage(err.into())
    }
}

impl TransientError for SessionError {
    fn is_transient(&self) -> bool {
        match self {
            SessionError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Database-backed session manager.
///
/// Tokens are UUID v4 strings with a sliding expiry: every validated request
/// pushes `expires_at` forward by the configured TTL.
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(db: Database, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Create a new session for an account on the caller's connection
    pub fn create_session(&self, conn: &Connection, account_id: i64) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let created_at = now();
        let expires_at = created_at + self.ttl;

        conn.execute(
            "INSERT INTO sessions (token, account_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                token,
                account_id,
                format_timestamp(&created_at),
                format_timestamp(&expires_at),
            ],
        )
        .context("Failed to create session")?;

        tracing::info!("Created session for account {}", account_id);
        Ok(token)
    }

    /// Validate a token and slide its expiry forward.
    ///
    /// Sessions of deleted accounts count as missing. Expired sessions are
    /// left for the periodic purge so repeated requests keep reporting them
    /// as expired.
    pub fn validate_and_refresh(&self, token: &str) -> Result<i64, SessionError> {
        self.db.with_transaction(|tx| -> Result<i64, SessionError> {
            let row: Option<(i64, String)> = tx
                .query_row(
                    "SELECT s.account_id, s.expires_at FROM sessions s
                     JOIN accounts a ON a.id = s.account_id AND a.deleted_at IS NULL
                     WHERE s.token = ?1",
                    [token],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (account_id, expires_at) = row.ok_or(SessionError::NotFound)?;
            let expires_at: DateTime<Utc> = parse_timestamp(1, expires_at)?;
            let now = now();
            if now > expires_at {
                return Err(SessionError::Expired);
            }

            tx.execute(
                "UPDATE sessions SET expires_at = ?1 WHERE token = ?2",
                rusqlite::params![format_timestamp(&(now + self.ttl)), token],
            )?;
            Ok(account_id)
        })
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, conn: &Connection, token: &str) -> Result<()> {
        let rows_affected = conn
            .execute("DELETE FROM sessions WHERE token = ?1", [token])
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }
        Ok(())
    }

    /// Drop every session belonging to an account
    pub fn delete_sessions_for(&self, conn: &Connection, account_id: i64) -> Result<usize> {
        let rows = conn
            .execute("DELETE FROM sessions WHERE account_id = ?1", [account_id])
            .context("Failed to delete account sessions")?;
        Ok(rows)
    }

    /// Remove all sessions that have passed their expiry time
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let rows_affected = self.db.with_transaction(|tx| -> Result<usize> {
            let removed = tx
                .execute(
                    "DELETE FROM sessions WHERE expires_at < ?1",
                    [format_timestamp(&Utc::now())],
                )
                .context("Failed to cleanup expired sessions")?;
            Ok(removed)
        })?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }
        Ok(rows_affected)
    }

    /// `Set-Cookie` value that stores `token` for the session lifetime
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            self.ttl.num_seconds()
        )
    }
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Session token from `Authorization: Bearer` or the session cookie
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::create_account;
    use axum::http::HeaderValue;

    fn setup() -> (SessionManager, i64) {
        let db = Database::in_memory().expect("Failed to create test database");
        let account_id = {
            let conn = db.connection().unwrap();
            create_account(&conn, "sessionuser", true).id
        };
        (SessionManager::new(db, Duration::minutes(10)), account_id)
    }

    fn expire(manager: &SessionManager, token: &str) {
        let past = format_timestamp(&(Utc::now() - Duration::minutes(1)));
        manager
            .db
            .connection()
            .unwrap()
            .execute(
                "UPDATE sessions SET expires_at = ?1 WHERE token = ?2",
                [past.as_str(), token],
            )
            .unwrap();
    }

    fn expires_at(manager: &SessionManager, token: &str) -> String {
        manager
            .db
            .connection()
            .unwrap()
            .query_row(
                "SELECT expires_at FROM sessions WHERE token = ?1",
                [token],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_create_and_validate_session() {
        let (manager, account_id) = setup();
        let token = {
            let conn = manager.db.connection().unwrap();
            manager.create_session(&conn, account_id).unwrap()
        };

        assert!(Uuid::parse_str(&token).is_ok());
        assert_eq!(manager.validate_and_refresh(&token).unwrap(), account_id);
    }

    #[test]
    fn test_validation_slides_expiry() {
        let (manager, account_id) = setup();
        let token = {
            let conn = manager.db.connection().unwrap();
            manager.create_session(&conn, account_id).unwrap()
        };
        let before = expires_at(&manager, &token);

        std::thread::sleep(std::time::Duration::from_millis(5));
        manager.validate_and_refresh(&token).unwrap();
        assert!(expires_at(&manager, &token) > before);
    }

    #[test]
    fn test_unknown_token_is_not_found() {
        let (manager, _) = setup();
        assert!(matches!(
            manager.validate_and_refresh("not-a-token"),
            Err(SessionError::NotFound)
        ));
    }

    #[test]
    fn test_expired_session_reports_expired_until_purged() {
        let (manager, account_id) = setup();
        let token = {
            let conn = manager.db.connection().unwrap();
            manager.create_session(&conn, account_id).unwrap()
        };
        expire(&manager, &token);

        assert!(matches!(
            manager.validate_and_refresh(&token),
            Err(SessionError::Expired)
        ));
        assert!(matches!(
            manager.validate_and_refresh(&token),
            Err(SessionError::Expired)
        ));

        assert_eq!(manager.cleanup_expired_sessions().unwrap(), 1);
        assert!(matches!(
            manager.validate_and_refresh(&token),
            Err(SessionError::NotFound)
        ));
    }

    #[test]
    fn test_delete_session() {
        let (manager, account_id) = setup();
        let conn = manager.db.connection().unwrap();
        let token = manager.create_session(&conn, account_id).unwrap();
        manager.delete_session(&conn, &token).unwrap();
        let other = manager.create_session(&conn, account_id).unwrap();
        assert_eq!(manager.delete_sessions_for(&conn, account_id).unwrap(), 1);
        drop(conn);

        assert!(manager.validate_and_refresh(&token).is_err());
        assert!(manager.validate_and_refresh(&other).is_err());
    }

    #[test]
    fn test_cleanup_keeps_live_sessions() {
        let (manager, account_id) = setup();
        let (live, stale) = {
            let conn = manager.db.connection().unwrap();
            (
                manager.create_session(&conn, account_id).unwrap(),
                manager.create_session(&conn, account_id).unwrap(),
            )
        };
        expire(&manager, &stale);

        assert_eq!(manager.cleanup_expired_sessions().unwrap(), 1);
        assert!(manager.validate_and_refresh(&live).is_ok());
    }

    #[test]
    fn test_token_from_cookie_or_bearer() {
        let mut headers = HeaderMap::new();
        assert!(token_from_headers(&headers).is_none());

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token_cookie=abc-123"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc-123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_cookie_strings() {
        let (manager, _) = setup();
        let cookie = manager.session_cookie("tok");
        assert!(cookie.starts_with("access_token_cookie=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=600"));
        assert!(clear_cookie().contains("Max-Age=0"));
    }
}
