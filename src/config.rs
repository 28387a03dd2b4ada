use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use url::Url;

pub const ENV_HOST: &str = "REDIS_HOST";
pub const ENV_PORT: &str = "REDIS_PORT";
pub const ENV_DB: &str = "REDIS_DB";
pub const ENV_USERNAME: &str = "REDIS_USERNAME";
pub const ENV_PASSWORD: &str = "REDIS_PASSWORD";
pub const ENV_SSL: &str = "REDIS_SSL";

const REDACTED: &str = "<redacted>";

/// Connection settings for a Redis-backed store.
///
/// Every field has a default, so an empty JSON object (or `StoreConfig::default()`)
/// describes `redis://localhost:6379/0` without TLS. Keys the struct does not know
/// are kept in `extra` so backend-specific options survive a round trip.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub db: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Read from files and descriptors, never written back out.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub ssl_cert_reqs: CertRequirement,
    #[serde(default = "default_decode_responses")]
    pub decode_responses: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_decode_responses() -> bool {
    true
}

/// How strictly the server certificate is checked when TLS is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertRequirement {
    #[default]
    Required,
    Optional,
    None,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: 0,
            username: None,
            password: None,
            ssl: false,
            ssl_cert_reqs: CertRequirement::default(),
            decode_responses: default_decode_responses(),
            extra: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db", &self.db)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("ssl", &self.ssl)
            .field("ssl_cert_reqs", &self.ssl_cert_reqs)
            .field("decode_responses", &self.decode_responses)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Source of environment variables.
///
/// Lets callers feed a fake environment instead of touching process state.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl StoreConfig {
    /// Build a config from the `REDIS_*` variables of `env`.
    ///
    /// Missing variables fall back to the defaults. A numeric variable that is
    /// present but not an integer is an error.
    pub fn from_env_with(env: &dyn Environment) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = env.var(ENV_HOST) {
            config.host = host;
        }

        if let Some(port) = env.var(ENV_PORT) {
            config.port = parse_int(ENV_PORT, &port)?;
        }

        if let Some(db) = env.var(ENV_DB) {
            config.db = parse_int(ENV_DB, &db)?;
        }

        config.username = env.var(ENV_USERNAME);
        config.password = env.var(ENV_PASSWORD);
        config.ssl = env
            .var(ENV_SSL)
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        config.decode_responses = true;

        Ok(config)
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(&ProcessEnv)
    }

    /// Interpret a flat mapping of constructor fields as a config.
    pub fn from_map(fields: &Map<String, Value>) -> Result<Self, ConfigError> {
        let config = serde_json::from_value(Value::Object(fields.clone()))?;
        Ok(config)
    }

    /// Replace every field the overrides carry; extra options merge key by key.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            host,
            port,
            db,
            username,
            password,
            ssl,
            ssl_cert_reqs,
            decode_responses,
            extra,
        } = overrides;

        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(db) = db {
            self.db = db;
        }
        if username.is_some() {
            self.username = username;
        }
        if password.is_some() {
            self.password = password;
        }
        if let Some(ssl) = ssl {
            self.ssl = ssl;
        }
        if let Some(reqs) = ssl_cert_reqs {
            self.ssl_cert_reqs = reqs;
        }
        if let Some(decode) = decode_responses {
            self.decode_responses = decode;
        }
        self.extra.extend(extra);
    }

    /// Render the config as a `redis://` or `rediss://` connection URL.
    pub fn connection_url(&self) -> Result<Url, ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Validation("host must not be empty".to_string()));
        }

        let scheme = if self.ssl { "rediss" } else { "redis" };
        let mut url = Url::parse(&format!("{}://localhost", scheme))?;

        url.set_host(Some(self.host.as_str()))?;
        url.set_port(Some(self.port))
            .map_err(|_| ConfigError::Validation(format!("cannot set port {}", self.port)))?;

        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|_| ConfigError::Validation("cannot set username".to_string()))?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password.as_str()))
                .map_err(|_| ConfigError::Validation("cannot set password".to_string()))?;
        }

        url.set_path(&format!("/{}", self.db));

        if self.ssl && self.ssl_cert_reqs == CertRequirement::None {
            url.set_fragment(Some("insecure"));
        }

        Ok(url)
    }

    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn parse_int<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr<Err = ParseIntError>,
{
    value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidInteger {
            var: var.to_string(),
            value: value.to_string(),
            source,
        })
}

/// Fields to lay over a config built elsewhere (usually the environment).
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub db: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ssl: Option<bool>,
    #[serde(default)]
    pub ssl_cert_reqs: Option<CertRequirement>,
    #[serde(default)]
    pub decode_responses: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn db(mut self, db: i64) -> Self {
        self.db = Some(db);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn ssl(mut self, ssl: bool) -> Self {
        self.ssl = Some(ssl);
        self
    }

    pub fn ssl_cert_reqs(mut self, reqs: CertRequirement) -> Self {
        self.ssl_cert_reqs = Some(reqs);
        self
    }

    pub fn decode_responses(mut self, decode: bool) -> Self {
        self.decode_responses = Some(decode);
        self
    }

    /// Add a backend-specific option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db", &self.db)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("ssl", &self.ssl)
            .field("ssl_cert_reqs", &self.ssl_cert_reqs)
            .field("decode_responses", &self.decode_responses)
            .field("extra", &self.extra)
            .finish()
    }
}
