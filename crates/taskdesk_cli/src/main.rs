//! CLI smoke probe.
//!
//! Verifies `taskdesk_core` linkage and schema bootstrap against the
//! configured database (`TASKDESK_DB_PATH`, default `taskdesk.sqlite3`).

use std::process::ExitCode;
use taskdesk_core::db::migrations::{current_version, latest_version};
use taskdesk_core::CoreConfig;

fn main() -> ExitCode {
    println!("taskdesk_core ping={}", taskdesk_core::ping());
    println!("taskdesk_core version={}", taskdesk_core::core_version());

    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("taskdesk_core config=error error={err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = config.init_logging() {
        eprintln!("taskdesk_core logging=error error={err}");
        return ExitCode::FAILURE;
    }

    let conn = match config.open_database() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!(
                "taskdesk_core schema=error path={} error={err}",
                config.database_path.display()
            );
            return ExitCode::FAILURE;
        }
    };
    match current_version(&conn) {
        Ok(version) => {
            println!("taskdesk_core db={}", config.database_path.display());
            println!("taskdesk_core schema={version}/{}", latest_version());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("taskdesk_core schema=error error={err}");
            ExitCode::FAILURE
        }
    }
}
