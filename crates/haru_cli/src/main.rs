//! CLI smoke entry point.
//!
//! Usage: `haru_cli [config.json]`
//!
//! Loads config, starts logging when `log_dir` is set, opens the store and
//! prints version and schema information.

use haru_core::db::migrations::current_version;
use haru_core::db::{open_db, open_db_in_memory};
use haru_core::{core_version, init_logging_from_config, CoreConfig};
use log::info;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("haru_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };

    let logging_active = init_logging_from_config(&config)?;
    let conn = match config.db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let schema_version = current_version(&conn)?;
    info!(
        "event=cli_probe module=cli status=ok schema_version={}",
        schema_version
    );

    println!("haru_core version={}", core_version());
    println!("schema_version={schema_version}");
    println!("diary_date_policy={:?}", config.diary.date_policy);
    println!("logging={}", if logging_active { "on" } else { "off" });
    Ok(())
}
