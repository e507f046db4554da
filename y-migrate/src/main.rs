use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use y_server::db::schema::SOFT_DELETE_TABLES;
use y_server::db::Database;

/// Y Database Setup Utility
///
/// Creates the schema in a new or existing database (every statement is
/// idempotent) and can load the demo accounts.
#[derive(Parser, Debug)]
#[command(name = "y-migrate")]
#[command(about = "Create the Y schema and optionally seed demo data", long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, env = "DATABASE_PATH", default_value = "./y.db")]
    database: String,

    /// Insert the demo accounts (alice, bob, carol) if they are missing
    #[arg(short, long)]
    seed: bool,

    /// bcrypt cost used for the demo passwords
    #[arg(long, default_value_t = 12)]
    bcrypt_cost: u32,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
}

/// Row counts collected after setup
#[derive(Debug, Default)]
struct MigrationStats {
    /// (table, live rows, soft-deleted rows)
    tables: Vec<(String, i64, i64)>,
    /// Whether this run inserted the demo data
    seeded: bool,
}

impl MigrationStats {
    fn total_live(&self) -> i64 {
        self.tables.iter().map(|(_, live, _)| live).sum()
    }
}

/// Count live and soft-deleted rows in every soft-delete table
fn collect_stats(conn: &Connection) -> Result<MigrationStats> {
    let mut stats = MigrationStats::default();
    for table in SOFT_DELETE_TABLES {
        // Table names come from a fixed list, never from input
        let sql = format!(
            "SELECT COUNT(*) FILTER (WHERE deleted_at IS NULL), COUNT(*) FILTER (WHERE deleted_at IS NOT NULL) FROM {}",
            table
        );
        let (live, deleted): (i64, i64) = conn
            .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
            .with_context(|| format!("Failed to count rows in {}", table))?;
        stats.tables.push((table.to_string(), live, deleted));
    }
    Ok(stats)
}

/// Create the schema and, when asked, the demo data
fn run(db: &Database, seed: bool, bcrypt_cost: u32) -> Result<MigrationStats> {
    db.initialize().context("Failed to initialize database schema")?;

    let seeded = if seed {
        db.seed_demo_data(bcrypt_cost)
            .context("Failed to seed demo data")?
    } else {
        false
    };

    let conn = db.connection()?;
    let mut stats = collect_stats(&conn)?;
    stats.seeded = seeded;
    Ok(stats)
}

/// Display migration statistics in a formatted way
fn display_stats(stats: &MigrationStats, seed: bool) {
    println!();
    println!("Database Summary");
    println!("================");
    println!();
    println!("{:<15} {:>8} {:>8}", "table", "live", "deleted");
    for (table, live, deleted) in &stats.tables {
        println!("{:<15} {:>8} {:>8}", table, live, deleted);
    }
    println!();
    println!("Live rows: {}", stats.total_live());

    if seed {
        if stats.seeded {
            println!("Demo data inserted (password for every demo account: \"password\").");
        } else {
            println!("Demo accounts already present - nothing seeded.");
        }
    }

    println!();
    println!("Setup completed successfully!");
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Y Database Setup Utility");
    println!("========================");
    println!();
    println!("Database: {}", args.database);
    println!("Seed demo data: {}", args.seed);
    println!();

    let exists = std::path::Path::new(&args.database).exists();

    // Show confirmation prompt before writing into an existing database
    if exists && args.seed && !args.yes {
        println!("This will add demo accounts to an existing database.");
        println!("Do you want to continue? (y/N): ");

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .context("Failed to read user input")?;

        let input = input.trim().to_lowercase();
        if input != "y" && input != "yes" {
            println!("Setup cancelled.");
            return Ok(());
        }
    }

    if !exists {
        println!("Creating new database file");
    }
    let db = Database::new(&args.database).context("Failed to open database connection")?;
    let stats = run(&db, args.seed, args.bcrypt_cost)?;

    display_stats(&stats, args.seed);
    Ok(())
}
