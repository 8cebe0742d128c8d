use std::{
    error::Error,
    process::{self, Command},
};

use crate::config::{Config, DatabaseConfig};

pub fn handle_db_console_command(config: &Config) {
    if let Err(e) = handle_db_command(&config.database) {
        eprintln!("❌ Failed to open database connection: {e}");
        process::exit(1);
    }
}

/// Interactive shell for the configured database: `psql` for Postgres,
/// `sqlite3` for SQLite files.
pub fn handle_db_command(db_config: &DatabaseConfig) -> Result<(), Box<dyn Error>> {
    let (program, target) = console_for(&db_config.url)?;

    println!("🔗 Launching {program} with database connection...");
    println!();

    let status = Command::new(program).arg(target).status()?;

    if !status.success() {
        return Err(format!("{program} exited with code: {:?}", status.code()).into());
    }

    Ok(())
}

fn console_for(url: &str) -> Result<(&'static str, &str), String> {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        return Ok(("psql", url));
    }

    match url.strip_prefix("sqlite:") {
        Some(path) if path.starts_with(":memory:") || path.starts_with("memory") => {
            Err("in-memory SQLite databases have no console".to_string())
        }
        Some(path) => Ok(("sqlite3", path.trim_start_matches("//"))),
        None => Err(format!("no console known for database url {url}")),
    }
}
