use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use aurum_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", "AURUM_DATABASE_URL"),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", "AURUM_DATABASE_MAX_CONNECTIONS"),
    ));
    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "AURUM_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "AURUM_SERVER_PORT"),
    ));

    lines.push(render_line(
        "channel.provider",
        &format!("{:?}", config.channel.provider),
        source("channel.provider", "AURUM_CHANNEL_PROVIDER"),
    ));
    lines.push(render_line(
        "channel.account_sid",
        &redact_secret(config.channel.account_sid.expose_secret()),
        source("channel.account_sid", "AURUM_CHANNEL_ACCOUNT_SID"),
    ));
    lines.push(render_line(
        "channel.auth_token",
        &redact_secret(config.channel.auth_token.expose_secret()),
        source("channel.auth_token", "AURUM_CHANNEL_AUTH_TOKEN"),
    ));
    lines.push(render_line(
        "channel.sender_number",
        &config.channel.sender_number,
        source("channel.sender_number", "AURUM_CHANNEL_SENDER_NUMBER"),
    ));

    lines.push(render_line(
        "rates.provider",
        &format!("{:?}", config.rates.provider),
        source("rates.provider", "AURUM_RATES_PROVIDER"),
    ));
    lines.push(render_line(
        "rates.fetch_program",
        &config.rates.fetch_program.display().to_string(),
        source("rates.fetch_program", "AURUM_RATES_FETCH_PROGRAM"),
    ));
    lines.push(render_line(
        "rates.api_key",
        if config.rates.api_key.is_some() { "<redacted>" } else { "<unset>" },
        source("rates.api_key", "AURUM_RATES_API_KEY"),
    ));
    lines.push(render_line(
        "rates.cache_secs",
        &config.rates.cache_secs.to_string(),
        source("rates.cache_secs", "AURUM_RATES_CACHE_SECS"),
    ));

    lines.push(render_line(
        "bot.handoff_fail_open",
        &config.bot.handoff_fail_open.to_string(),
        source("bot.handoff_fail_open", "AURUM_BOT_HANDOFF_FAIL_OPEN"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "AURUM_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "AURUM_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("aurum.toml"), PathBuf::from("config/aurum.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    if secret.trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
