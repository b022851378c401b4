use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ks_cli::cli::{self, Cli, Command, ConfigCommand};
use ks_domain::config::LoggingConfig;
use ks_sessions::SessionRegistry;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Version => {
            println!("kvsession {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Config(ConfigCommand::Validate) => {
            let (config, config_path) = cli::load_config(cli.config.as_deref())?;
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let (config, _) = cli::load_config(cli.config.as_deref())?;
            cli::config::show(&config)
        }
        Command::Store(command) => {
            let (config, config_path) = cli::load_config(cli.config.as_deref())?;
            init_tracing(&config.logging);
            tracing::debug!(config_path = %config_path, store = %config.store.path, "configuration loaded");

            let registry = SessionRegistry::open(&config.store, &config.sessions)
                .with_context(|| format!("opening session store at {}", config.store.path))?;
            let result = cli::run_store_command(&registry, &config, command);
            registry.close().context("closing session store")?;
            if !result? {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

/// Initialize stderr tracing.  `RUST_LOG` wins over `[logging].filter`.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
