pub mod config;
pub mod records;

use clap::{Parser, Subcommand};

use ks_domain::config::Config;
use ks_sessions::SessionRegistry;

/// Inspect and maintain a kvsession store.
#[derive(Debug, Parser)]
#[command(name = "kvsession", version, about)]
pub struct Cli {
    /// Config file (defaults to `$KVSESSION_CONFIG`, then `kvsession.toml`).
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    #[command(flatten)]
    Store(StoreCommand),
    /// Print version information.
    Version,
}

/// Subcommands that open the session store.
#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    /// Report whether a session record exists.
    Check {
        id: String,
    },
    /// Print a session's attributes as JSON without touching its TTL.
    Show {
        id: String,
    },
    /// Push a session's expiry out by `--ttl` seconds.
    Touch {
        id: String,
        /// TTL in seconds (defaults to `sessions.default_ttl_secs`).
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Move a session to a new identifier.
    Rotate {
        old_id: String,
        new_id: String,
        /// TTL in seconds (defaults to `sessions.default_ttl_secs`).
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Delete a session record.
    Delete {
        id: String,
    },
    /// Remove every expired record from the store.
    Purge,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from `explicit`, else `KVSESSION_CONFIG`, else
/// `kvsession.toml`.  A missing file yields the defaults.  Returns the
/// parsed [`Config`] and the path that was used.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<(Config, String)> {
    let config_path = match explicit {
        Some(path) => path.to_owned(),
        None => std::env::var("KVSESSION_CONFIG").unwrap_or_else(|_| "kvsession.toml".into()),
    };

    let config = Config::load_or_default(&config_path)
        .map_err(|e| anyhow::anyhow!("loading {config_path}: {e}"))?;

    Ok((config, config_path))
}

// ── Store-backed dispatch ─────────────────────────────────────────────

/// Run one store subcommand and print its result.  Returns `false` when the
/// command should end with a non-zero exit status; the caller still owns
/// the registry and closes it.
pub fn run_store_command(
    registry: &SessionRegistry,
    config: &Config,
    command: StoreCommand,
) -> anyhow::Result<bool> {
    let default_ttl = config.sessions.default_ttl_secs;

    match command {
        StoreCommand::Check { id } => {
            let exists = records::check(registry, &id)?;
            println!("{}", if exists { "present" } else { "absent" });
        }
        StoreCommand::Show { id } => match records::show(registry, &id)? {
            Some(json) => println!("{json}"),
            None => {
                eprintln!("no session {id}");
                return Ok(false);
            }
        },
        StoreCommand::Touch { id, ttl } => {
            let count = records::touch(registry, &id, ttl.unwrap_or(default_ttl))?;
            println!("{id}: {count} attribute(s)");
        }
        StoreCommand::Rotate { old_id, new_id, ttl } => {
            let count = records::rotate(registry, &old_id, &new_id, ttl.unwrap_or(default_ttl))?;
            println!("{old_id} -> {new_id}: {count} attribute(s)");
        }
        StoreCommand::Delete { id } => {
            records::delete(registry, &id)?;
            println!("deleted {id}");
        }
        StoreCommand::Purge => {
            let removed = records::purge(registry)?;
            println!("purged {removed} expired record(s)");
        }
    }
    Ok(true)
}
