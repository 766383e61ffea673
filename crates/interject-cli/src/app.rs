//! The `interject` application.

use crate::cli::{BaseCommand, CliArgs};
use crate::{config_handlers, demo};
use interject_core::{RegistryConfig, Result};
use tracing_subscriber::EnvFilter;

// ============================================================================
// InterjectCli
// ============================================================================

/// CLI application holding the loaded registry configuration.
pub struct InterjectCli {
    name: String,
    config: RegistryConfig,
    version: String,
}

impl InterjectCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = RegistryConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    /// Create a new CLI application.
    pub fn new(name: impl Into<String>, config: RegistryConfig) -> Self {
        Self {
            name: name.into(),
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The loaded configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity
    /// flags. `log` records from the library crates are forwarded too.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    /// Run the CLI with the given arguments.
    pub fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);
        tracing::debug!(registry = %self.config.name, "configuration loaded");

        match args.command {
            Some(BaseCommand::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(BaseCommand::Demo { items, prices }) => {
                let registry = demo::build_registry(self.config.clone())?;
                let total = demo::run_demo(&registry, &items, prices.as_deref())?;
                println!("total: {total}");
                Ok(())
            }
            Some(BaseCommand::Inspect { json }) => {
                let registry = demo::build_registry(self.config.clone())?;
                println!("{}", demo::render_inspect(&demo::inspect(&registry), json)?);
                Ok(())
            }
            Some(BaseCommand::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("{} {}: use --help for usage", self.name, self.version);
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
