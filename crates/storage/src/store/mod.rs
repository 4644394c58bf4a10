#![forbid(unsafe_code)]

mod error;
mod postings;
mod stats;

pub use error::StoreError;
pub use postings::{CountryScope, DurationPages};
pub use stats::StatsRow;

use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILE: &str = "hirestats.db";
const SCHEMA_VERSION: &str = "v1";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE);
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;

        install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join(DB_FILE)
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        -- Raw hiring records. Read-only to the pipeline; created here so
        -- local and test databases can be seeded without a second tool.
        CREATE TABLE IF NOT EXISTS job_posting (
          id TEXT NOT NULL PRIMARY KEY,
          title TEXT NOT NULL,
          standard_job_id TEXT NOT NULL,
          country_code TEXT,
          days_to_hire INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_job_posting_sjid
          ON job_posting(standard_job_id);

        -- One aggregate row per (standard_job_id, country_code); NULL
        -- country_code is the job's all-countries row. Row identity (id)
        -- is distinct from the composite key and survives updates.
        CREATE TABLE IF NOT EXISTS days_to_hire_stats (
          id TEXT NOT NULL PRIMARY KEY,
          standard_job_id TEXT NOT NULL,
          country_code TEXT,
          avg_days_to_hire REAL,
          min_days_to_hire REAL,
          max_days_to_hire REAL,
          count_of_job_postings INTEGER,
          UNIQUE (standard_job_id, country_code)
        );

        CREATE INDEX IF NOT EXISTS idx_stats_sjid
          ON days_to_hire_stats(standard_job_id);
        "#,
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;
    Ok(())
}
