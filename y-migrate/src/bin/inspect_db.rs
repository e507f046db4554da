use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use y_server::db::schema::SOFT_DELETE_TABLES;

/// Soft-delete Inspector
///
/// Rows are never removed by the server; this tool reports how many rows in
/// each table are live and how many are soft-deleted, and can list the
/// deleted rows of one table.
#[derive(Parser, Debug)]
#[command(name = "inspect-db")]
#[command(about = "Audit soft-deleted rows in a Y database", long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, env = "DATABASE_PATH", default_value = "./y.db")]
    database: String,

    /// List the soft-deleted rows of this table
    #[arg(short, long)]
    table: Option<String>,

    /// Maximum number of deleted rows to list
    #[arg(short, long, default_value_t = 50)]
    limit: u32,
}

#[derive(Debug, PartialEq)]
struct TableCounts {
    name: &'static str,
    live: i64,
    deleted: i64,
}

fn check_table_exists(conn: &Connection, table_name: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table_name],
            |row| row.get(0),
        )
        .with_context(|| format!("Failed to check for table {}", table_name))?;
    Ok(count > 0)
}

fn count_rows(conn: &Connection, table: &'static str) -> Result<TableCounts> {
    let sql = format!(
        "SELECT COUNT(*) FILTER (WHERE deleted_at IS NULL), COUNT(*) FILTER (WHERE deleted_at IS NOT NULL) FROM {}",
        table
    );
    let (live, deleted) = conn
        .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
        .with_context(|| format!("Failed to count rows in {}", table))?;
    Ok(TableCounts {
        name: table,
        live,
        deleted,
    })
}

/// (id, deleted_at) of the most recently deleted rows in `table`
fn deleted_rows(conn: &Connection, table: &'static str, limit: u32) -> Result<Vec<(i64, String)>> {
    let sql = format!(
        "SELECT id, deleted_at FROM {} WHERE deleted_at IS NOT NULL ORDER BY deleted_at DESC, id DESC LIMIT ?1",
        table
    );
    let mut stmt = conn.prepare(&sql).context("Failed to prepare query")?;
    let rows = stmt
        .query_map([limit], |row| Ok((row.get(0)?, row.get(1)?)))
        .context("Failed to execute query")?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to collect rows")?;
    Ok(rows)
}

/// Map user input onto one of the known table names
fn known_table(name: &str) -> Option<&'static str> {
    SOFT_DELETE_TABLES
        .iter()
        .copied()
        .find(|table| table.eq_ignore_ascii_case(name.trim()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Y Soft-delete Inspector");
    println!("=======================");
    println!();
    println!("Database: {}", args.database);
    println!();

    // Check if database file exists
    if !std::path::Path::new(&args.database).exists() {
        println!("❌ Database file not found: {}", args.database);
        return Ok(());
    }

    let conn = Connection::open(&args.database).context("Failed to open database connection")?;

    println!("{:<15} {:>8} {:>8}", "table", "live", "deleted");
    println!("{:-<15} {:->8} {:->8}", "", "", "");
    for &table in SOFT_DELETE_TABLES {
        if !check_table_exists(&conn, table)? {
            println!("{:<15} (MISSING)", table);
            continue;
        }
        let counts = count_rows(&conn, table)?;
        println!("{:<15} {:>8} {:>8}", counts.name, counts.live, counts.deleted);
    }

    if let Some(requested) = &args.table {
        let Some(table) = known_table(requested) else {
            anyhow::bail!(
                "Unknown table '{}'. Expected one of: {}",
                requested,
                SOFT_DELETE_TABLES.join(", ")
            );
        };

        println!();
        println!("Deleted rows in {}:", table);
        let rows = deleted_rows(&conn, table, args.limit)?;
        if rows.is_empty() {
            println!("  (none)");
        }
        for (id, deleted_at) in rows {
            println!("  #{:<8} deleted {}", id, deleted_at);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use y_server::db::schema::SCHEMA;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO images (data, name, mimetype, created_at) VALUES (x'00', 'a.png', 'image/png', '2024-01-01T00:00:00.000000Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO images (data, name, mimetype, created_at, deleted_at) VALUES (x'00', 'b.png', 'image/png', '2024-01-01T00:00:00.000000Z', '2024-02-01T00:00:00.000000Z')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_counts_split_live_and_deleted() {
        let conn = setup();
        assert_eq!(
            count_rows(&conn, "images").unwrap(),
            TableCounts {
                name: "images",
                live: 1,
                deleted: 1
            }
        );
        assert_eq!(count_rows(&conn, "posts").unwrap().live, 0);
    }

    #[test]
    fn test_deleted_rows_listing() {
        let conn = setup();
        let rows = deleted_rows(&conn, "images", 10).unwrap();
        assert_eq!(rows, vec![(2, "2024-02-01T00:00:00.000000Z".to_string())]);
    }

    #[test]
    fn test_known_table_rejects_unknown_names() {
        assert_eq!(known_table(" Posts "), Some("posts"));
        assert_eq!(known_table("sessions; DROP TABLE posts"), None);
        assert!(check_table_exists(&setup(), "sessions").unwrap());
    }
}
