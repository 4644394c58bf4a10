#![forbid(unsafe_code)]

//! Batch orchestrator: discovery -> paginated draining -> trimmed stats ->
//! idempotent upsert, one group at a time.
//!
//! Per job id, every discovered country code gets its own pass
//! (`CountryScope::Only`), followed by one global pass over all countries
//! combined (`CountryScope::All`). The global pass intentionally does not
//! reuse the NULL-country filter; the two stream modes stay distinct.

use hs_core::ids::{CountryCode, JobId};
use hs_core::stats::{TrimmedStats, trimmed_stats};
use hs_storage::{CountryScope, SqliteStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// What to do when a single group's page fetch or upsert fails.
/// `Abort` is the reference behavior: the whole run fails. `SkipGroup`
/// records the failure and moves on to the next group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    Abort,
    SkipGroup,
}

#[derive(Clone, Debug)]
pub struct BatchConfig {
    pub page_size: usize,
    pub on_group_failure: FailurePolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            on_group_failure: FailurePolicy::Abort,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub jobs_seen: usize,
    pub groups_written: usize,
    pub groups_skipped_empty: usize,
    pub groups_failed: usize,
    pub cancelled: bool,
}

#[derive(Debug)]
pub enum BatchError {
    InvalidConfig(&'static str),
    Discovery(StoreError),
    Group {
        job_id: String,
        country_code: Option<String>,
        source: StoreError,
    },
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(message) => write!(f, "invalid config: {message}"),
            Self::Discovery(err) => write!(f, "group discovery failed: {err}"),
            Self::Group {
                job_id,
                country_code: Some(code),
                source,
            } => write!(f, "group ({job_id}, {code}) failed: {source}"),
            Self::Group {
                job_id,
                country_code: None,
                source,
            } => write!(f, "group ({job_id}, all countries) failed: {source}"),
        }
    }
}

impl std::error::Error for BatchError {}

/// Runs one full aggregation pass over every discovered group.
///
/// No checkpoint is persisted; a run always restarts from the first job id.
/// Discovery failures abort before any write. Setting `cancel` makes the
/// run stop issuing queries at the next group boundary; upserts already
/// committed stay in place (rerunning recomputes and overwrites them).
pub fn run_batch(
    store: &mut SqliteStore,
    config: &BatchConfig,
    cancel: &AtomicBool,
) -> Result<RunSummary, BatchError> {
    if config.page_size == 0 {
        return Err(BatchError::InvalidConfig("page_size must be > 0"));
    }

    let mut summary = RunSummary::default();

    let job_ids = store.distinct_job_ids().map_err(BatchError::Discovery)?;
    info!(
        jobs = job_ids.len(),
        page_size = config.page_size,
        "starting batch aggregation"
    );

    'jobs: for job_id in &job_ids {
        if cancel.load(Ordering::Relaxed) {
            summary.cancelled = true;
            break;
        }
        summary.jobs_seen += 1;

        let codes = store
            .distinct_country_codes(job_id)
            .map_err(BatchError::Discovery)?;
        debug!(
            job_id = job_id.as_str(),
            countries = codes.len(),
            "processing job"
        );

        for code in &codes {
            if cancel.load(Ordering::Relaxed) {
                summary.cancelled = true;
                break 'jobs;
            }
            process_group(
                store,
                config,
                job_id,
                CountryScope::Only(code.clone()),
                Some(code),
                &mut summary,
            )?;
        }

        if cancel.load(Ordering::Relaxed) {
            summary.cancelled = true;
            break;
        }
        // Trailing global pass: all countries combined, NULL-country key.
        process_group(store, config, job_id, CountryScope::All, None, &mut summary)?;
    }

    info!(
        jobs_seen = summary.jobs_seen,
        groups_written = summary.groups_written,
        groups_skipped_empty = summary.groups_skipped_empty,
        groups_failed = summary.groups_failed,
        cancelled = summary.cancelled,
        "batch aggregation finished"
    );
    Ok(summary)
}

fn process_group(
    store: &mut SqliteStore,
    config: &BatchConfig,
    job_id: &JobId,
    scope: CountryScope,
    country_code: Option<&CountryCode>,
    summary: &mut RunSummary,
) -> Result<(), BatchError> {
    match aggregate_group(store, config.page_size, job_id, scope) {
        Ok(Some(stats)) => match store.upsert_stats(job_id, country_code, &stats) {
            Ok(_) => {
                summary.groups_written += 1;
                Ok(())
            }
            Err(err) => group_failure(config, job_id, country_code, err, summary),
        },
        Ok(None) => {
            debug!(
                job_id = job_id.as_str(),
                country_code = country_code.map(CountryCode::as_str),
                "no data for group, skipping"
            );
            summary.groups_skipped_empty += 1;
            Ok(())
        }
        Err(err) => group_failure(config, job_id, country_code, err, summary),
    }
}

/// Drains the group's pages into a single buffer (owned by this unit of
/// work, dropped after the upsert) and hands it to the calculator.
fn aggregate_group(
    store: &SqliteStore,
    page_size: usize,
    job_id: &JobId,
    scope: CountryScope,
) -> Result<Option<TrimmedStats>, StoreError> {
    let values = store.duration_pages(job_id, scope, page_size)?.drain()?;
    if values.is_empty() {
        return Ok(None);
    }
    Ok(trimmed_stats(&values))
}

fn group_failure(
    config: &BatchConfig,
    job_id: &JobId,
    country_code: Option<&CountryCode>,
    source: StoreError,
    summary: &mut RunSummary,
) -> Result<(), BatchError> {
    match config.on_group_failure {
        FailurePolicy::Abort => Err(BatchError::Group {
            job_id: job_id.as_str().to_string(),
            country_code: country_code.map(|c| c.as_str().to_string()),
            source,
        }),
        FailurePolicy::SkipGroup => {
            warn!(
                job_id = job_id.as_str(),
                country_code = country_code.map(CountryCode::as_str),
                error = %source,
                "skipping group after failure"
            );
            summary.groups_failed += 1;
            Ok(())
        }
    }
}
