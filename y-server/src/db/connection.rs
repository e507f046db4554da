use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

use super::schema::SCHEMA;

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

/// How long a connection waits on a locked database before reporting busy
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Errors that can tell whether retrying the same transaction may succeed
pub trait TransientError {
    fn is_transient(&self) -> bool;
}

/// Busy/locked database errors clear up on their own once the other writer finishes
pub fn is_transient_sqlite(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

impl TransientError for anyhow::Error {
    fn is_transient(&self) -> bool {
        self.chain().any(|cause| {
            cause
                .downcast_ref::<rusqlite::Error>()
                .is_some_and(is_transient_sqlite)
                || cause.downcast_ref::<r2d2::Error>().is_some()
        })
    }
}

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
    retry_attempts: u32,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (manager, in_memory) = Self::create_connection_manager(path);
        let manager = manager.with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });

        // Every in-memory connection is its own database, so the pool must
        // hand out the same single connection each time
        let builder = if in_memory {
            Pool::builder().max_size(1)
        } else {
            Pool::builder()
        };
        let pool = builder
            .build(manager)
            .context("Failed to create database connection pool")?;

        Ok(Self {
            pool,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    /// Create appropriate connection manager based on path
    ///
    /// # Arguments
    /// * `path` - Database file path or ":memory:" for in-memory database
    ///
    /// # Returns
    /// * the manager and whether it is backed by memory
    fn create_connection_manager<P: AsRef<Path>>(path: P) -> (SqliteConnectionManager, bool) {
        let path_str = path.as_ref().to_string_lossy();
        let trimmed_path = path_str.trim();

        if trimmed_path.eq_ignore_ascii_case(MEMORY_DB_PATH) {
            (SqliteConnectionManager::memory(), true)
        } else {
            (SqliteConnectionManager::file(path), false)
        }
    }

    /// Create an initialized in-memory database (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let db = Self::new(MEMORY_DB_PATH)?;
        db.initialize()?;
        Ok(db)
    }

    /// Number of attempts made for a transaction hitting transient errors
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }

    /// Run `work` inside one `BEGIN IMMEDIATE` transaction.
    ///
    /// The transaction commits when `work` returns `Ok` and rolls back
    /// otherwise. Transient failures (busy/locked database, pool timeout)
    /// restart the whole transaction, up to the configured attempt count.
    pub fn with_transaction<T, E, F>(&self, mut work: F) -> Result<T, E>
    where
        E: From<anyhow::Error> + From<rusqlite::Error> + TransientError,
        F: FnMut(&Transaction<'_>) -> Result<T, E>,
    {
        self.retrying(|| {
            let mut conn = self.connection()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = work(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    /// Run read-only `work` on a pooled connection, with the same retry policy
    pub fn with_connection<T, E, F>(&self, mut work: F) -> Result<T, E>
    where
        E: From<anyhow::Error> + From<rusqlite::Error> + TransientError,
        F: FnMut(&Connection) -> Result<T, E>,
    {
        self.retrying(|| {
            let conn = self.connection()?;
            work(&conn)
        })
    }

    fn retrying<T, E, F>(&self, mut attempt: F) -> Result<T, E>
    where
        E: TransientError,
        F: FnMut() -> Result<T, E>,
    {
        let mut tries = 0;
        loop {
            tries += 1;
            match attempt() {
                Err(err) if err.is_transient() && tries < self.retry_attempts => {
                    tracing::warn!(
                        "Transient database error, retrying transaction (attempt {} of {})",
                        tries + 1,
                        self.retry_attempts
                    );
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_database_creation() {
        let db = Database::in_memory().expect("Failed to create database");

        // Verify tables exist
        let conn = db.connection().expect("Failed to get connection");
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .expect("Failed to prepare statement");

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("Failed to query tables")
            .collect::<Result<Vec<_>, _>>()
            .expect("Failed to collect tables");

        for table in ["accounts", "relationships", "posts", "replies", "reactions", "images", "sessions"] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Second initialize should succeed");
    }

    #[test]
    fn test_memory_database_detection() {
        let memory_paths = [":memory:", " :memory: ", ":MEMORY:", " :Memory: "];

        for path in &memory_paths {
            let (_, in_memory) = Database::create_connection_manager(path);
            assert!(in_memory, "{:?} should be detected as memory", path);
        }

        let (_, in_memory) = Database::create_connection_manager("/tmp/y_test.db");
        assert!(!in_memory);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::in_memory().expect("Failed to create database");
        let conn = db.connection().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::in_memory().unwrap();

        let result: Result<(), anyhow::Error> = db.with_transaction(|tx| -> Result<(), anyhow::Error> {
            tx.execute(
                "INSERT INTO images (data, name, mimetype, created_at) VALUES (x'00', 'a.png', 'image/png', '2024-01-01T00:00:00Z')",
                [],
            )?;
            anyhow::bail!("abort after insert")
        });
        assert!(result.is_err());

        let count: i64 = db
            .connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_transient_errors_are_retried() {
        let db = Database::in_memory().unwrap().with_retry_attempts(3);
        let calls = Cell::new(0);

        let result: Result<u32, anyhow::Error> = db.with_connection(|_conn| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                let busy = rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
                    None,
                );
                return Err(anyhow::Error::new(busy).context("simulated busy database"));
            }
            Ok(calls.get())
        });

        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let db = Database::in_memory().unwrap().with_retry_attempts(5);
        let calls = Cell::new(0);

        let result: Result<(), anyhow::Error> = db.with_connection(|_conn| {
            calls.set(calls.get() + 1);
            anyhow::bail!("constraint violated")
        });

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
