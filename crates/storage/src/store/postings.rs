#![forbid(unsafe_code)]

use super::*;
use hs_core::ids::{CountryCode, JobId};
use rusqlite::{Connection, params};

/// Which country population a duration query covers.
///
/// `Only` and `Missing` are the per-country stream modes (a concrete code,
/// or records with no recorded country). `All` ignores the country column
/// entirely and backs the job-level global pass. The three are distinct on
/// purpose: `Missing` is not a substitute for `All`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CountryScope {
    Only(CountryCode),
    Missing,
    All,
}

const DISTINCT_JOB_IDS: &str = "SELECT DISTINCT standard_job_id \
     FROM job_posting \
     WHERE standard_job_id IS NOT NULL AND days_to_hire IS NOT NULL";

const DISTINCT_COUNTRY_CODES: &str = "SELECT DISTINCT country_code \
     FROM job_posting \
     WHERE standard_job_id = ?1 AND country_code IS NOT NULL";

// Pages advance by LIMIT/OFFSET over ORDER BY id: a stable order, so for a
// fixed snapshot no row is skipped or fetched twice across pages.
const PAGE_ONLY: &str = "SELECT days_to_hire FROM job_posting \
     WHERE standard_job_id = ?1 AND days_to_hire IS NOT NULL \
       AND country_code = ?2 \
     ORDER BY id LIMIT ?3 OFFSET ?4";

const PAGE_MISSING: &str = "SELECT days_to_hire FROM job_posting \
     WHERE standard_job_id = ?1 AND days_to_hire IS NOT NULL \
       AND country_code IS NULL \
     ORDER BY id LIMIT ?2 OFFSET ?3";

const PAGE_ALL: &str = "SELECT days_to_hire FROM job_posting \
     WHERE standard_job_id = ?1 AND days_to_hire IS NOT NULL \
     ORDER BY id LIMIT ?2 OFFSET ?3";

impl SqliteStore {
    /// Every job id with at least one record carrying a duration.
    /// Order is storage-defined; callers must not depend on it.
    pub fn distinct_job_ids(&self) -> Result<Vec<JobId>, StoreError> {
        let mut stmt = self.conn.prepare(DISTINCT_JOB_IDS)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            let id = JobId::try_new(raw)
                .map_err(|_| StoreError::InvalidInput("stored standard_job_id is malformed"))?;
            out.push(id);
        }
        Ok(out)
    }

    /// Every non-null country code co-occurring with the job id. Duration
    /// nullity is deliberately not filtered here: a code whose records all
    /// lack durations still names a group (it drains empty downstream).
    pub fn distinct_country_codes(&self, job_id: &JobId) -> Result<Vec<CountryCode>, StoreError> {
        let mut stmt = self.conn.prepare(DISTINCT_COUNTRY_CODES)?;
        let mut rows = stmt.query(params![job_id.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            let code = CountryCode::try_new(raw)
                .map_err(|_| StoreError::InvalidInput("stored country_code is malformed"))?;
            out.push(code);
        }
        Ok(out)
    }

    pub fn duration_pages(
        &self,
        job_id: &JobId,
        scope: CountryScope,
        page_size: usize,
    ) -> Result<DurationPages<'_>, StoreError> {
        if page_size == 0 {
            return Err(StoreError::InvalidInput("page_size must be > 0"));
        }
        Ok(DurationPages {
            conn: &self.conn,
            job_id: job_id.clone(),
            scope,
            page_size,
            offset: 0,
        })
    }
}

/// Restartable-per-call page cursor over one group's non-null durations.
#[derive(Debug)]
pub struct DurationPages<'a> {
    conn: &'a Connection,
    job_id: JobId,
    scope: CountryScope,
    page_size: usize,
    offset: usize,
}

impl DurationPages<'_> {
    /// `Ok(Some(page))` with a non-empty page, `Ok(None)` once a page comes
    /// back empty. A failed page query surfaces as `Err` and leaves the
    /// offset untouched, so exhaustion and fetch failure stay distinguishable.
    pub fn next_page(&mut self) -> Result<Option<Vec<i64>>, StoreError> {
        let limit = self.page_size as i64;
        let offset = self.offset as i64;
        let page = match &self.scope {
            CountryScope::Only(code) => collect_page(
                self.conn,
                PAGE_ONLY,
                params![self.job_id.as_str(), code.as_str(), limit, offset],
            )?,
            CountryScope::Missing => collect_page(
                self.conn,
                PAGE_MISSING,
                params![self.job_id.as_str(), limit, offset],
            )?,
            CountryScope::All => collect_page(
                self.conn,
                PAGE_ALL,
                params![self.job_id.as_str(), limit, offset],
            )?,
        };
        if page.is_empty() {
            return Ok(None);
        }
        self.offset += self.page_size;
        Ok(Some(page))
    }

    /// Accumulates every remaining page into one buffer.
    pub fn drain(mut self) -> Result<Vec<i64>, StoreError> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page()? {
            all.extend(page);
        }
        Ok(all)
    }
}

fn collect_page(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn.prepare_cached(sql)?;
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row.get(0)?);
    }
    Ok(out)
}
