use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process-level configuration. Runtime store settings (location, owner
/// number, threshold, manual rates) live in the database instead; see
/// `domain::settings`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub channel: ChannelConfig,
    pub rates: RatesConfig,
    pub bot: BotConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub provider: ChannelProvider,
    pub account_sid: SecretString,
    pub auth_token: SecretString,
    pub sender_number: String,
    pub api_base_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RatesConfig {
    pub provider: RateProviderKind,
    pub fetch_program: PathBuf,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub cache_secs: u64,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct BotConfig {
    /// When the handoff gate cannot be read, `true` keeps the automated
    /// flow answering; `false` silences it until the store recovers.
    pub handoff_fail_open: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelProvider {
    /// REST provider API (Twilio-compatible form posts).
    Rest,
    /// Drop outbound messages; lets the system run without credentials.
    Noop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateProviderKind {
    Subprocess,
    Http,
    Static,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub channel_provider: Option<ChannelProvider>,
    pub rates_provider: Option<RateProviderKind>,
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub sender_number: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://aurum.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            channel: ChannelConfig {
                provider: ChannelProvider::Noop,
                account_sid: String::new().into(),
                auth_token: String::new().into(),
                sender_number: String::new(),
                api_base_url: None,
            },
            rates: RatesConfig {
                provider: RateProviderKind::Subprocess,
                fetch_program: PathBuf::from("scripts/fetch_rates.py"),
                api_key: None,
                base_url: Some("https://www.goldapi.io/api".to_string()),
                cache_secs: 60,
                timeout_secs: 20,
            },
            bot: BotConfig { handoff_fail_open: true },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for ChannelProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "noop" => Ok(Self::Noop),
            other => Err(ConfigError::Validation(format!(
                "unsupported channel provider `{other}` (expected rest|noop)"
            ))),
        }
    }
}

impl std::str::FromStr for RateProviderKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "subprocess" => Ok(Self::Subprocess),
            "http" => Ok(Self::Http),
            "static" => Ok(Self::Static),
            other => Err(ConfigError::Validation(format!(
                "unsupported rates provider `{other}` (expected subprocess|http|static)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("aurum.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(channel) = patch.channel {
            if let Some(provider) = channel.provider {
                self.channel.provider = provider;
            }
            if let Some(account_sid_value) = channel.account_sid {
                self.channel.account_sid = account_sid_value.into();
            }
            if let Some(auth_token_value) = channel.auth_token {
                self.channel.auth_token = auth_token_value.into();
            }
            if let Some(sender_number) = channel.sender_number {
                self.channel.sender_number = sender_number;
            }
            if let Some(api_base_url) = channel.api_base_url {
                self.channel.api_base_url = Some(api_base_url);
            }
        }

        if let Some(rates) = patch.rates {
            if let Some(provider) = rates.provider {
                self.rates.provider = provider;
            }
            if let Some(fetch_program) = rates.fetch_program {
                self.rates.fetch_program = PathBuf::from(fetch_program);
            }
            if let Some(api_key_value) = rates.api_key {
                self.rates.api_key = Some(api_key_value.into());
            }
            if let Some(base_url) = rates.base_url {
                self.rates.base_url = Some(base_url);
            }
            if let Some(cache_secs) = rates.cache_secs {
                self.rates.cache_secs = cache_secs;
            }
            if let Some(timeout_secs) = rates.timeout_secs {
                self.rates.timeout_secs = timeout_secs;
            }
        }

        if let Some(bot) = patch.bot {
            if let Some(handoff_fail_open) = bot.handoff_fail_open {
                self.bot.handoff_fail_open = handoff_fail_open;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("AURUM_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("AURUM_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("AURUM_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("AURUM_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("AURUM_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("AURUM_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("AURUM_SERVER_PORT") {
            self.server.port = parse_u16("AURUM_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("AURUM_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("AURUM_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("AURUM_CHANNEL_PROVIDER") {
            self.channel.provider = value.parse()?;
        }
        if let Some(value) = read_env("AURUM_CHANNEL_ACCOUNT_SID") {
            self.channel.account_sid = value.into();
        }
        if let Some(value) = read_env("AURUM_CHANNEL_AUTH_TOKEN") {
            self.channel.auth_token = value.into();
        }
        if let Some(value) = read_env("AURUM_CHANNEL_SENDER_NUMBER") {
            self.channel.sender_number = value;
        }
        if let Some(value) = read_env("AURUM_CHANNEL_API_BASE_URL") {
            self.channel.api_base_url = Some(value);
        }

        if let Some(value) = read_env("AURUM_RATES_PROVIDER") {
            self.rates.provider = value.parse()?;
        }
        if let Some(value) = read_env("AURUM_RATES_FETCH_PROGRAM") {
            self.rates.fetch_program = PathBuf::from(value);
        }
        if let Some(value) = read_env("AURUM_RATES_API_KEY") {
            self.rates.api_key = Some(value.into());
        }
        if let Some(value) = read_env("AURUM_RATES_BASE_URL") {
            self.rates.base_url = Some(value);
        }
        if let Some(value) = read_env("AURUM_RATES_CACHE_SECS") {
            self.rates.cache_secs = parse_u64("AURUM_RATES_CACHE_SECS", &value)?;
        }
        if let Some(value) = read_env("AURUM_RATES_TIMEOUT_SECS") {
            self.rates.timeout_secs = parse_u64("AURUM_RATES_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("AURUM_BOT_HANDOFF_FAIL_OPEN") {
            self.bot.handoff_fail_open = parse_bool("AURUM_BOT_HANDOFF_FAIL_OPEN", &value)?;
        }

        let log_level = read_env("AURUM_LOGGING_LEVEL").or_else(|| read_env("AURUM_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("AURUM_LOGGING_FORMAT").or_else(|| read_env("AURUM_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(channel_provider) = overrides.channel_provider {
            self.channel.provider = channel_provider;
        }
        if let Some(rates_provider) = overrides.rates_provider {
            self.rates.provider = rates_provider;
        }
        if let Some(account_sid) = overrides.account_sid {
            self.channel.account_sid = account_sid.into();
        }
        if let Some(auth_token) = overrides.auth_token {
            self.channel.auth_token = auth_token.into();
        }
        if let Some(sender_number) = overrides.sender_number {
            self.channel.sender_number = sender_number;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_channel(&self.channel)?;
        validate_rates(&self.rates)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("aurum.toml"), PathBuf::from("config/aurum.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replaces `${VAR}` expressions with environment values before TOML parsing.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(ConfigError::UnterminatedInterpolation);
        };
        let key = &after[..end];
        let value = env::var(key)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_channel(channel: &ChannelConfig) -> Result<(), ConfigError> {
    if channel.provider == ChannelProvider::Noop {
        return Ok(());
    }

    if channel.account_sid.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "channel.account_sid is required for the rest provider".to_string(),
        ));
    }
    if channel.auth_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "channel.auth_token is required for the rest provider".to_string(),
        ));
    }
    if channel.sender_number.trim().is_empty() {
        return Err(ConfigError::Validation(
            "channel.sender_number is required for the rest provider".to_string(),
        ));
    }
    if let Some(base_url) = &channel.api_base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "channel.api_base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_rates(rates: &RatesConfig) -> Result<(), ConfigError> {
    if rates.cache_secs == 0 || rates.cache_secs > 3600 {
        return Err(ConfigError::Validation(
            "rates.cache_secs must be in range 1..=3600".to_string(),
        ));
    }
    if rates.timeout_secs == 0 || rates.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "rates.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    match rates.provider {
        RateProviderKind::Subprocess => {
            if rates.fetch_program.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "rates.fetch_program is required for the subprocess provider".to_string(),
                ));
            }
        }
        RateProviderKind::Http => {
            let missing_key = rates
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing_key {
                return Err(ConfigError::Validation(
                    "rates.api_key is required for the http provider".to_string(),
                ));
            }
            let base_ok = rates
                .base_url
                .as_ref()
                .map(|url| url.starts_with("http://") || url.starts_with("https://"))
                .unwrap_or(false);
            if !base_ok {
                return Err(ConfigError::Validation(
                    "rates.base_url must be an http(s) URL for the http provider".to_string(),
                ));
            }
        }
        RateProviderKind::Static => {}
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    channel: Option<ChannelPatch>,
    rates: Option<RatesPatch>,
    bot: Option<BotPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelPatch {
    provider: Option<ChannelProvider>,
    account_sid: Option<String>,
    auth_token: Option<String>,
    sender_number: Option<String>,
    api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RatesPatch {
    provider: Option<RateProviderKind>,
    fetch_program: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    cache_secs: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BotPatch {
    handoff_fail_open: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ChannelProvider, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate_without_any_input() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.database.url == "sqlite://aurum.db", "default database url")?;
        ensure(config.channel.provider == ChannelProvider::Noop, "default channel is noop")?;
        ensure(config.rates.cache_secs == 60, "default rate cache is one minute")?;
        ensure(config.bot.handoff_fail_open, "handoff gate fails open by default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_AURUM_AUTH_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("aurum.toml");
            fs::write(
                &path,
                r#"
[channel]
provider = "rest"
account_sid = "AC-test"
auth_token = "${TEST_AURUM_AUTH_TOKEN}"
sender_number = "whatsapp:+919876543210"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.channel.auth_token.expose_secret() == "token-from-env",
                "auth token should be loaded from environment",
            )
        })();

        clear_vars(&["TEST_AURUM_AUTH_TOKEN"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("AURUM_DATABASE_URL", "sqlite://from-env.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("aurum.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "programmatic override should win over env and file",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")
        })();

        clear_vars(&["AURUM_DATABASE_URL"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("AURUM_LOG_LEVEL", "warn");
        env::set_var("AURUM_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "log level should come from alias var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "log format should come from alias var",
            )
        })();

        clear_vars(&["AURUM_LOG_LEVEL", "AURUM_LOG_FORMAT"]);
        result
    }

    #[test]
    fn rest_channel_requires_credentials() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("AURUM_CHANNEL_PROVIDER", "rest");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("channel.account_sid")
            );
            ensure(has_message, "validation failure should mention channel.account_sid")
        })();

        clear_vars(&["AURUM_CHANNEL_PROVIDER"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("AURUM_CHANNEL_AUTH_TOKEN", "super-secret-token");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("super-secret-token"),
                "debug output should not contain the auth token",
            )
        })();

        clear_vars(&["AURUM_CHANNEL_AUTH_TOKEN"]);
        result
    }
}
