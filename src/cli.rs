use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the authorization server, job API and queue listener (default)
    Serve,
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Open an interactive database console (psql or sqlite3, per database.url)
    Db,
    /// Manage the accounts the password grant authenticates against
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Publish a stored schedule job to the broker
    Publish {
        /// Identifier of the schedule job to publish
        job_id: i64,
        /// Exchange to publish to (default: amqp.exchange)
        #[arg(short, long)]
        exchange: Option<String>,
        /// Routing key to publish with (default: amqp.routing_key)
        #[arg(short, long)]
        routing_key: Option<String>,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create an account
    Add {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        /// Comma-separated granted authorities
        #[arg(short, long, default_value = "ROLE_USER")]
        authorities: String,
    },
    /// Delete an account and every token issued to it
    Remove {
        #[arg(short, long)]
        username: String,
    },
}

#[derive(Subcommand)]
pub enum MigrateAction {
    /// Run migrations up
    Up {
        /// Number of migrations to run (default: all)
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// Run migrations down
    Down {
        /// Number of migrations to rollback (default: 1)
        #[arg(short, long, default_value = "1")]
        steps: u32,
    },
    /// Show migration status
    Status,
    /// Reset database (down all, then up all)
    Reset,
    /// Reapply recent migrations (down then up)
    Reapply {
        /// Number of migrations to reapply (default: 1)
        #[arg(short, long, default_value = "1")]
        steps: u32,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn db_help_names_both_consoles() {
        let command = Cli::command();
        let about = command
            .find_subcommand("db")
            .and_then(|db| db.get_about())
            .unwrap()
            .to_string();

        assert!(about.contains("psql"));
        assert!(about.contains("sqlite3"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
