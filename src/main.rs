use redis_store::cli::{parse_value, Cli, Command};
use redis_store::config::ProcessEnv;
use redis_store::error::{Result, StoreError};
use redis_store::telemetry::{init_telemetry, TelemetryConfig};
use redis_store::{RedisStore, StoredValue};
use serde_json::{Map, Value};
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_telemetry(&TelemetryConfig {
        enable_metrics: true,
        log_level: cli.log_level(),
    });

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.resolve_config(cli.env_config(&ProcessEnv)?)?;
    let store = RedisStore::new(config)?;

    match &cli.command {
        Command::Get { key } => match store.get(key).await? {
            Some(value) => println!("{}", render(value)),
            None => return Ok(ExitCode::from(1)),
        },
        Command::Set { key, value } => store.set(key, &parse_value(value)).await?,
        Command::Has { key } => {
            if !store.has(key).await? {
                return Ok(ExitCode::from(1));
            }
        }
        Command::Items => {
            let items: Map<String, Value> = store
                .items()
                .await?
                .into_iter()
                .map(|(key, value)| (key, to_json(value)))
                .collect();
            println!("{}", pretty(&Value::Object(items))?);
        }
        Command::Info => {
            let info = Value::Object(store.to_reconstruction_info());
            println!("{}", pretty(&info)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn render(value: StoredValue) -> String {
    match value {
        StoredValue::Json(json) => json.to_string(),
        StoredValue::Text(text) => text,
        StoredValue::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

fn to_json(value: StoredValue) -> Value {
    match value {
        StoredValue::Bytes(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        other => other.into_json().unwrap_or(Value::Null),
    }
}

fn pretty(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value).map_err(StoreError::Serialization)?)
}
