use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEVELOPMENT_SECRET: &str = "ecodata-development-secret-change-me";

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

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub version: String,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub extraction: ExtractionConfig,
    pub knowledge: KnowledgeConfig,
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
        let upload_limit_bytes = parse_var("UPLOAD_LIMIT_BYTES", 25 * 1024 * 1024)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let version =
            env::var("APP_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

        let secret = match env::var("AUTH_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment.is_production() => return Err(ConfigError::MissingSecret),
            _ => DEVELOPMENT_SECRET.to_string(),
        };

        let auth = AuthConfig {
            secret,
            session_ttl: Duration::from_secs(parse_var("SESSION_TTL_SECS", 60 * 60 * 24 * 7)?),
            cookie_name: "session".to_string(),
            secure_cookie: environment.is_production(),
            bcrypt_cost: parse_var("BCRYPT_COST", 12)?,
        };

        let extraction = ExtractionConfig {
            tesseract_binary: PathBuf::from(
                env::var("TESSERACT_BIN").unwrap_or_else(|_| "tesseract".to_string()),
            ),
            ocr_language: env::var("OCR_LANGUAGE").unwrap_or_else(|_| "por".to_string()),
            ocr_timeout: Duration::from_secs(parse_var("OCR_TIMEOUT_SECS", 60)?),
        };

        let knowledge = KnowledgeConfig {
            api_token: non_empty_var("NOTION_API_TOKEN"),
            knowledge_base_id: non_empty_var("NOTION_KNOWLEDGE_BASE_ID"),
        };

        Ok(Self {
            environment,
            version,
            server: ServerConfig {
                host,
                port,
                upload_limit_bytes,
            },
            telemetry: TelemetryConfig { log_level },
            auth,
            extraction,
            knowledge,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { variable: name }),
        Err(_) => Ok(default),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub upload_limit_bytes: usize,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Session signing and password hashing settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub session_ttl: Duration,
    pub cookie_name: String,
    pub secure_cookie: bool,
    pub bcrypt_cost: u32,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookie", &self.secure_cookie)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// OCR subprocess settings.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub tesseract_binary: PathBuf,
    pub ocr_language: String,
    pub ocr_timeout: Duration,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tesseract_binary: PathBuf::from("tesseract"),
            ocr_language: "por".to_string(),
            ocr_timeout: Duration::from_secs(60),
        }
    }
}

/// Credentials for the external knowledge base.
#[derive(Clone, Default)]
pub struct KnowledgeConfig {
    pub api_token: Option<String>,
    pub knowledge_base_id: Option<String>,
}

impl fmt::Debug for KnowledgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("knowledge_base_id", &self.knowledge_base_id)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
    MissingSecret,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
            ConfigError::MissingSecret => {
                write!(f, "AUTH_SECRET must be set when APP_ENV is production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::MissingSecret => None,
        }
    }
}
