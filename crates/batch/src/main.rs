#![forbid(unsafe_code)]

use hs_batch::{BatchConfig, DEFAULT_PAGE_SIZE, FailurePolicy, run_batch};
use hs_storage::SqliteStore;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use tracing_subscriber::EnvFilter;

fn usage() -> &'static str {
    "hs-batch — recompute days-to-hire statistics per (job, country) group\n\n\
USAGE:\n\
  hs-batch --storage-dir DIR [--page-size N] [--skip-failed-groups]\n\n\
NOTES:\n\
  - HS_STORAGE_DIR / HS_PAGE_SIZE are honored when flags are omitted.\n\
  - A run recomputes every group from scratch and overwrites rows in\n\
    place; rerunning with unchanged data is a no-op on the values.\n\
  - Default policy aborts the run on the first group failure; pass\n\
    --skip-failed-groups to log and continue instead.\n\
  - Logging is controlled via RUST_LOG (e.g. RUST_LOG=hs_batch=debug).\n"
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug)]
struct CliConfig {
    storage_dir: PathBuf,
    page_size: usize,
    skip_failed_groups: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        std::process::exit(0);
    }

    let mut storage_dir: Option<PathBuf> = env_var("HS_STORAGE_DIR").map(PathBuf::from);
    let mut page_size: usize = env_var("HS_PAGE_SIZE")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let mut skip_failed_groups = false;

    let mut i = 0usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--storage-dir requires DIR")?;
                storage_dir = Some(PathBuf::from(v));
            }
            "--page-size" => {
                i += 1;
                let v = args.get(i).ok_or("--page-size requires N")?;
                page_size = v
                    .parse::<usize>()
                    .map_err(|_| "--page-size must be a positive integer")?;
            }
            "--skip-failed-groups" => {
                skip_failed_groups = true;
            }
            other => {
                return Err(format!("unknown argument: {other}"));
            }
        }
        i += 1;
    }

    let storage_dir =
        storage_dir.ok_or("storage dir is required (--storage-dir or HS_STORAGE_DIR)")?;
    if page_size == 0 {
        return Err("--page-size must be a positive integer".to_string());
    }

    Ok(CliConfig {
        storage_dir,
        page_size,
        skip_failed_groups,
    })
}

fn run(cfg: CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = SqliteStore::open(&cfg.storage_dir)?;
    tracing::info!(storage_dir = %store.storage_dir().display(), "store opened");
    let config = BatchConfig {
        page_size: cfg.page_size,
        on_group_failure: if cfg.skip_failed_groups {
            FailurePolicy::SkipGroup
        } else {
            FailurePolicy::Abort
        },
    };
    let cancel = AtomicBool::new(false);
    let summary = run_batch(&mut store, &config, &cancel)?;
    println!(
        "jobs_seen={} groups_written={} groups_skipped_empty={} groups_failed={} cancelled={}",
        summary.jobs_seen,
        summary.groups_written,
        summary.groups_skipped_empty,
        summary.groups_failed,
        summary.cancelled
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = match parse_args() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("{err}");
            eprint!("{}", usage());
            std::process::exit(2);
        }
    };

    if let Err(err) = run(cfg) {
        tracing::error!(error = %err, "batch run failed");
        eprintln!("hs-batch: batch run failed");
        std::process::exit(1);
    }
}
