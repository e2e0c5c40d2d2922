use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::auth::password::{DEFAULT_COST, MIN_COST};

const DEV_TOKEN_SECRET: &str = "campaign-dialer-development-secret";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub embedding: EmbeddingConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
    pub follow_up: FollowUpConfig,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://campaign-dialer.db?mode=rwc".to_string());

        let webhook_url = clean_webhook_url(
            &env::var("WEBHOOK_URL").unwrap_or_else(|_| "http://localhost:3000/webhook".to_string()),
        );
        if !(webhook_url.starts_with("http://") || webhook_url.starts_with("https://")) {
            return Err(ConfigError::InvalidWebhookUrl(webhook_url));
        }

        let provider = ProviderConfig {
            api_key: non_empty_var("BLAND_API_KEY"),
            base_url: env::var("BLAND_API_URL")
                .unwrap_or_else(|_| "https://api.bland.ai".to_string())
                .trim_end_matches('/')
                .to_string(),
            webhook_url,
            timeout: Duration::from_secs(30),
        };

        let embedding = EmbeddingConfig {
            api_key: non_empty_var("GOOGLE_API_KEY"),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        };

        let token_secret = match non_empty_var("AUTH_TOKEN_SECRET") {
            Some(secret) => secret,
            None if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingSecret("AUTH_TOKEN_SECRET"))
            }
            None => DEV_TOKEN_SECRET.to_string(),
        };
        let token_ttl_minutes = parse_var("AUTH_TOKEN_TTL_MINUTES", 30)?;
        let password_cost = parse_var("AUTH_PASSWORD_COST", DEFAULT_COST)?;
        if !(MIN_COST..=31).contains(&password_cost) {
            return Err(ConfigError::InvalidNumber("AUTH_PASSWORD_COST"));
        }

        let pagination = PaginationConfig {
            default_page_size: parse_var("DEFAULT_PAGE_SIZE", 50)?,
            max_page_size: parse_var("MAX_PAGE_SIZE", 1000)?,
        };

        let follow_up = FollowUpConfig {
            default_delay: Duration::from_secs(parse_var("FOLLOW_UP_DEFAULT_DELAY_SECS", 3600)?),
        };

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            database: DatabaseConfig { url: database_url },
            provider,
            embedding,
            auth: AuthConfig {
                token_secret,
                token_ttl_minutes,
                password_cost,
            },
            pagination,
            follow_up,
            allowed_origins,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidNumber(key)),
        None => Ok(default),
    }
}

/// Collapses accidental double slashes in the path part of a webhook URL.
pub fn clean_webhook_url(raw: &str) -> String {
    let raw = raw.trim();
    let (scheme, rest) = match raw.find("://") {
        Some(index) => raw.split_at(index + 3),
        None => ("", raw),
    };

    let mut cleaned = String::with_capacity(rest.len());
    let mut previous_slash = false;
    for ch in rest.chars() {
        if ch == '/' && previous_slash {
            continue;
        }
        previous_slash = ch == '/';
        cleaned.push(ch);
    }

    format!("{scheme}{cleaned}")
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Calling provider credentials and the callback URL handed to it.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub webhook_url: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// A loopback webhook URL cannot be reached by the hosted provider.
    pub fn webhook_is_local(&self) -> bool {
        self.webhook_url.contains("localhost") || self.webhook_url.contains("127.0.0.1")
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token_secret: String,
    pub token_ttl_minutes: i64,
    pub password_cost: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FollowUpConfig {
    pub default_delay: Duration,
}

impl Default for FollowUpConfig {
    fn default() -> Self {
        Self {
            default_delay: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber(&'static str),
    InvalidWebhookUrl(String),
    MissingSecret(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber(key) => write!(f, "{key} must be a valid number"),
            ConfigError::InvalidWebhookUrl(url) => {
                write!(f, "WEBHOOK_URL must start with http:// or https:// (got '{url}')")
            }
            ConfigError::MissingSecret(key) => write!(f, "{key} is required in production"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "DATABASE_URL",
            "BLAND_API_KEY",
            "BLAND_API_URL",
            "WEBHOOK_URL",
            "GOOGLE_API_KEY",
            "AUTH_TOKEN_SECRET",
            "AUTH_TOKEN_TTL_MINUTES",
            "AUTH_PASSWORD_COST",
            "DEFAULT_PAGE_SIZE",
            "MAX_PAGE_SIZE",
            "ALLOWED_ORIGINS",
            "FOLLOW_UP_DEFAULT_DELAY_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.provider.base_url, "https://api.bland.ai");
        assert_eq!(config.pagination.default_page_size, 50);
        assert_eq!(config.pagination.max_page_size, 1000);
        assert_eq!(config.auth.token_ttl_minutes, 30);
        assert_eq!(config.auth.password_cost, DEFAULT_COST);
        assert!(config.provider.webhook_is_local());
        assert_eq!(config.follow_up.default_delay, Duration::from_secs(3600));
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn production_requires_token_secret() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        let err = AppConfig::load().expect_err("secret is mandatory");
        assert!(matches!(err, ConfigError::MissingSecret("AUTH_TOKEN_SECRET")));
        reset_env();
    }

    #[test]
    fn rejects_webhook_without_scheme() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WEBHOOK_URL", "example.com/webhook");
        let err = AppConfig::load().expect_err("scheme is mandatory");
        assert!(matches!(err, ConfigError::InvalidWebhookUrl(_)));
        reset_env();
    }

    #[test]
    fn password_cost_must_be_within_bcrypt_range() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("AUTH_PASSWORD_COST", "2");
        let err = AppConfig::load().expect_err("cost too low");
        assert!(matches!(err, ConfigError::InvalidNumber("AUTH_PASSWORD_COST")));
        env::set_var("AUTH_PASSWORD_COST", "10");
        assert_eq!(AppConfig::load().expect("cost in range").auth.password_cost, 10);
        reset_env();
    }

    #[test]
    fn public_webhook_is_not_local() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WEBHOOK_URL", "https://dialer.example.com/webhook");
        let config = AppConfig::load().expect("config loads");
        assert!(!config.provider.webhook_is_local());
        reset_env();
    }

    #[test]
    fn splits_allowed_origins() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ALLOWED_ORIGINS", "https://a.example, https://b.example,");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        reset_env();
    }

    #[test]
    fn webhook_cleanup_collapses_double_slashes() {
        assert_eq!(
            clean_webhook_url("https://dialer.example.com//webhook"),
            "https://dialer.example.com/webhook"
        );
        assert_eq!(
            clean_webhook_url("http://host:8000///bland//postcall"),
            "http://host:8000/bland/postcall"
        );
        assert_eq!(
            clean_webhook_url("https://ok.example/webhook"),
            "https://ok.example/webhook"
        );
    }
}
