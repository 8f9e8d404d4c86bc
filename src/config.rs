//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::invoice::BusinessProfile;

/// Bot configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token. Telegram is disabled when absent.
    pub telegram_token: Option<SecretString>,
    /// Telegram usernames or numeric ids allowed to talk to the bot (`*` = everyone).
    pub telegram_allowed_users: Vec<String>,
    /// Whether the stdin/stdout channel is enabled.
    pub cli_enabled: bool,
    /// Where the CLI channel drops delivered documents.
    pub output_dir: PathBuf,
    /// Optional logo drawn in the invoice header.
    pub logo_path: PathBuf,
    /// Upper bound accepted at the product count step.
    pub max_products: usize,
    /// Sessions idle for longer than this are dropped.
    pub session_idle_timeout: Duration,
    /// How often the idle-session sweep runs.
    pub prune_interval: Duration,
    /// Directory for the rolling log file, if file logging is wanted.
    pub log_dir: Option<PathBuf>,
    /// Seller details printed on every invoice.
    pub business: BusinessProfile,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            telegram_allowed_users: vec!["*".to_string()],
            cli_enabled: true,
            output_dir: PathBuf::from("./bills"),
            logo_path: PathBuf::from("logo.png"),
            max_products: 50,
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            prune_interval: Duration::from_secs(600),        // 10 minutes
            log_dir: None,
            business: BusinessProfile::default(),
        }
    }
}

impl BotConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let telegram_token = lookup("TELEGRAM_BOT_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        let telegram_allowed_users: Vec<String> = lookup("TELEGRAM_ALLOWED_USERS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let cli_enabled = match lookup("INVOICE_BOT_CLI") {
            Some(v) => parse_bool("INVOICE_BOT_CLI", &v)?,
            None => telegram_token.is_none(),
        };
        if telegram_token.is_none() && !cli_enabled {
            return Err(ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".into()));
        }

        let output_dir = lookup("INVOICE_BOT_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let logo_path = lookup("INVOICE_BOT_LOGO")
            .map(PathBuf::from)
            .unwrap_or(defaults.logo_path);

        let max_products = match lookup("INVOICE_BOT_MAX_PRODUCTS") {
            Some(v) => {
                let n: usize = parse_number("INVOICE_BOT_MAX_PRODUCTS", &v)?;
                if n == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "INVOICE_BOT_MAX_PRODUCTS".into(),
                        message: "must be at least 1".into(),
                    });
                }
                n
            }
            None => defaults.max_products,
        };

        let session_idle_timeout = match lookup("INVOICE_BOT_SESSION_IDLE_SECS") {
            Some(v) => Duration::from_secs(parse_number("INVOICE_BOT_SESSION_IDLE_SECS", &v)?),
            None => defaults.session_idle_timeout,
        };

        let prune_interval = match lookup("INVOICE_BOT_PRUNE_INTERVAL_SECS") {
            Some(v) => {
                let secs: u64 = parse_number("INVOICE_BOT_PRUNE_INTERVAL_SECS", &v)?;
                // tokio::time::interval panics on a zero period
                Duration::from_secs(secs.max(1))
            }
            None => defaults.prune_interval,
        };

        let log_dir = lookup("INVOICE_BOT_LOG_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let mut business = defaults.business;
        if let Some(name) = lookup("INVOICE_BOT_BUSINESS_NAME").filter(|s| !s.trim().is_empty()) {
            business.footer = format!("Thank you for shopping with {}!", name.trim());
            business.name = name.trim().to_string();
        }
        if let Some(address) = lookup("INVOICE_BOT_FROM_ADDRESS").filter(|s| !s.trim().is_empty()) {
            business.from_address = address.replace("\\n", "\n");
        }
        if let Some(currency) = lookup("INVOICE_BOT_CURRENCY").filter(|s| !s.trim().is_empty()) {
            business.currency = currency.trim().to_string();
        }

        Ok(Self {
            telegram_token,
            telegram_allowed_users,
            cli_enabled,
            output_dir,
            logo_path,
            max_products,
            session_idle_timeout,
            prune_interval,
            log_dir,
            business,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{value:?}: {e}"),
        })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
