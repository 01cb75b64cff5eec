//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `huacal_core` linkage and schema bootstrap without the Flutter
//!   runtime.
//! - Keep output deterministic for quick local sanity checks.
//! - Log at `HUACAL_LOG_LEVEL` into `<temp dir>/huacal_cli_logs`.

use huacal_core::db::migrations::latest_version;
use huacal_core::{init_logging, CoreConfig, EntryRepository, SqliteEntryRepository};
use std::process::ExitCode;

const CLI_LOG_DIR_NAME: &str = "huacal_cli_logs";

fn main() -> ExitCode {
    let config = CoreConfig::from_env();
    let log_dir = std::env::temp_dir().join(CLI_LOG_DIR_NAME);
    match init_logging(&config.log_level, &log_dir.to_string_lossy()) {
        Ok(()) => println!("huacal_core log_level={}", config.log_level),
        Err(err) => eprintln!("huacal_core logging=disabled error={err}"),
    }

    println!("huacal_core ping={}", huacal_core::ping());
    println!("huacal_core version={}", huacal_core::core_version());
    println!("huacal_core schema_version={}", latest_version());

    match SqliteEntryRepository::open_in_memory().and_then(|repo| repo.list_all()) {
        Ok(entries) => {
            println!("huacal_core store=ok entries={}", entries.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("huacal_core store=error error={err}");
            ExitCode::FAILURE
        }
    }
}
