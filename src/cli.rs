use crate::config::{ConfigOverrides, Environment, StoreConfig, ENV_DB, ENV_PORT};
use crate::error::ConfigError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "redis-store")]
#[command(about = "Read and write JSON values in a Redis-backed store")]
#[command(version)]
pub struct Cli {
    /// Redis host
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Redis port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Database index
    #[arg(long)]
    pub db: Option<i64>,

    /// Username for ACL authentication
    #[arg(long)]
    pub username: Option<String>,

    /// Password (prefer REDIS_PASSWORD to keep it out of shell history)
    #[arg(long)]
    pub password: Option<String>,

    /// Connect over TLS
    #[arg(long)]
    pub ssl: bool,

    /// Configuration file path (JSON format)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the value stored under KEY
    Get { key: String },
    /// Store VALUE under KEY (parsed as JSON, otherwise stored as a string)
    Set { key: String, value: String },
    /// Exit successfully when KEY exists
    Has { key: String },
    /// Print every key and its value as one JSON object
    Items,
    /// Print the descriptor needed to rebuild this store
    Info,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Log filter directive implied by the flags.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }

    /// Options given on the command line, as overrides.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            db: self.db,
            username: self.username.clone(),
            password: self.password.clone(),
            ssl: self.ssl.then_some(true),
            ..Default::default()
        }
    }

    /// Read the `REDIS_*` environment, skipping variables the command line
    /// already sets so a malformed value there cannot abort the run.
    pub fn env_config(&self, env: &dyn Environment) -> Result<StoreConfig, ConfigError> {
        let mut shadowed = Vec::new();
        if self.port.is_some() {
            shadowed.push(ENV_PORT);
        }
        if self.db.is_some() {
            shadowed.push(ENV_DB);
        }

        StoreConfig::from_env_with(&Shadowed { env, shadowed })
    }

    /// Resolve the store config.
    ///
    /// Precedence: CLI > File > Environment > Defaults
    pub fn resolve_config(&self, env_config: StoreConfig) -> Result<StoreConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                let mut from_file = StoreConfig::load_from_file(path)?;
                // Saved config files carry no password; fall back to the environment.
                if from_file.username.is_none() {
                    from_file.username = env_config.username;
                }
                if from_file.password.is_none() {
                    from_file.password = env_config.password;
                }
                from_file
            }
            None => env_config,
        };

        config.apply(self.overrides());
        Ok(config)
    }
}

struct Shadowed<'a> {
    env: &'a dyn Environment,
    shadowed: Vec<&'static str>,
}

impl Environment for Shadowed<'_> {
    fn var(&self, name: &str) -> Option<String> {
        if self.shadowed.iter().any(|shadowed| *shadowed == name) {
            None
        } else {
            self.env.var(name)
        }
    }
}

/// Interpret a command line value: JSON when it parses, a plain string otherwise.
pub fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}
