#![forbid(unsafe_code)]

use super::*;
use hs_core::ids::{CountryCode, JobId};
use hs_core::stats::TrimmedStats;
use rusqlite::{OptionalExtension, Row, params};
use tracing::debug;
use uuid::Uuid;

/// A persisted aggregate row. `country_code = None` is the job's
/// all-countries row; at most one row exists per (job, country) key.
#[derive(Clone, Debug, PartialEq)]
pub struct StatsRow {
    pub id: String,
    pub standard_job_id: String,
    pub country_code: Option<String>,
    pub avg_days_to_hire: Option<f64>,
    pub min_days_to_hire: Option<f64>,
    pub max_days_to_hire: Option<f64>,
    pub count_of_job_postings: Option<i64>,
}

const GET_BY_CODE: &str = "SELECT id, standard_job_id, country_code, avg_days_to_hire, \
            min_days_to_hire, max_days_to_hire, count_of_job_postings \
     FROM days_to_hire_stats \
     WHERE standard_job_id = ?1 AND country_code = ?2";

const GET_GLOBAL: &str = "SELECT id, standard_job_id, country_code, avg_days_to_hire, \
            min_days_to_hire, max_days_to_hire, count_of_job_postings \
     FROM days_to_hire_stats \
     WHERE standard_job_id = ?1 AND country_code IS NULL";

impl SqliteStore {
    /// Read-side lookup with the same key semantics as the upsert: an
    /// explicit code matches exactly, `None` matches the NULL-country row.
    pub fn get_stats(
        &self,
        job_id: &JobId,
        country_code: Option<&CountryCode>,
    ) -> Result<Option<StatsRow>, StoreError> {
        let row = match country_code {
            Some(code) => self
                .conn
                .query_row(
                    GET_BY_CODE,
                    params![job_id.as_str(), code.as_str()],
                    row_to_stats,
                )
                .optional()?,
            None => self
                .conn
                .query_row(GET_GLOBAL, params![job_id.as_str()], row_to_stats)
                .optional()?,
        };
        Ok(row)
    }

    /// Create-or-update for one (job, country) key, inside a single
    /// transaction so the lookup and the write cannot interleave with
    /// another writer on the same connection. Updates keep the row's
    /// identity; inserts mint a fresh uuid.
    pub fn upsert_stats(
        &mut self,
        job_id: &JobId,
        country_code: Option<&CountryCode>,
        stats: &TrimmedStats,
    ) -> Result<StatsRow, StoreError> {
        let tx = self.conn.transaction()?;

        let existing: Option<String> = match country_code {
            Some(code) => tx
                .query_row(
                    "SELECT id FROM days_to_hire_stats \
                     WHERE standard_job_id = ?1 AND country_code = ?2",
                    params![job_id.as_str(), code.as_str()],
                    |row| row.get(0),
                )
                .optional()?,
            None => tx
                .query_row(
                    "SELECT id FROM days_to_hire_stats \
                     WHERE standard_job_id = ?1 AND country_code IS NULL",
                    params![job_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?,
        };

        match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE days_to_hire_stats \
                     SET avg_days_to_hire = ?1, min_days_to_hire = ?2, \
                         max_days_to_hire = ?3, count_of_job_postings = ?4 \
                     WHERE id = ?5",
                    params![
                        stats.average,
                        stats.lower_bound,
                        stats.upper_bound,
                        stats.count as i64,
                        id
                    ],
                )?;
                debug!(
                    job_id = job_id.as_str(),
                    country_code = country_code.map(CountryCode::as_str),
                    "updated stats row in place"
                );
            }
            None => {
                let id = Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO days_to_hire_stats \
                       (id, standard_job_id, country_code, avg_days_to_hire, \
                        min_days_to_hire, max_days_to_hire, count_of_job_postings) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        id,
                        job_id.as_str(),
                        country_code.map(CountryCode::as_str),
                        stats.average,
                        stats.lower_bound,
                        stats.upper_bound,
                        stats.count as i64
                    ],
                )?;
                debug!(
                    job_id = job_id.as_str(),
                    country_code = country_code.map(CountryCode::as_str),
                    "inserted new stats row"
                );
            }
        }

        tx.commit()?;

        self.get_stats(job_id, country_code)?
            .ok_or(StoreError::UnknownId)
    }
}

fn row_to_stats(row: &Row<'_>) -> rusqlite::Result<StatsRow> {
    Ok(StatsRow {
        id: row.get(0)?,
        standard_job_id: row.get(1)?,
        country_code: row.get(2)?,
        avg_days_to_hire: row.get(3)?,
        min_days_to_hire: row.get(4)?,
        max_days_to_hire: row.get(5)?,
        count_of_job_postings: row.get(6)?,
    })
}
