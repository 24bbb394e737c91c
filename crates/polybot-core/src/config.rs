use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use polybot_imgproc::ImageConfig;

use crate::error::{PolybotError, Result};

pub const DEFAULT_WEBHOOK_PORT: u16 = 8443;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_DETECTION_URL: &str = "http://yolo5:8081";
pub const DEFAULT_UPLOAD_PREFIX: &str = "telegram_photos";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_PHOTO_BYTES: u64 = 20 * 1024 * 1024; // Bot API download cap

/// Top-level config (polybot.toml + POLYBOT_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolybotConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    /// File holding the token; takes precedence over `bot_token`.
    pub bot_token_file: Option<String>,
    /// Directory photos are downloaded into.
    #[serde(default = "default_photos_dir")]
    pub photos_dir: String,
    #[serde(default = "default_max_photo_bytes")]
    pub max_photo_bytes: u64,
    /// When set, updates arrive over an HTTPS webhook instead of long polling.
    pub webhook: Option<WebhookConfig>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            bot_token_file: None,
            photos_dir: default_photos_dir(),
            max_photo_bytes: default_max_photo_bytes(),
            webhook: None,
        }
    }
}

impl TelegramConfig {
    /// Resolve the bot token from `bot_token_file` or `bot_token`.
    pub fn token(&self) -> Result<String> {
        resolve_secret("telegram.bot_token", self.bot_token.as_deref(), self.bot_token_file.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Public base URL Telegram posts to, e.g. `https://bot.example.com`.
    pub public_url: Option<String>,
    pub public_url_file: Option<String>,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_webhook_port")]
    pub port: u16,
}

impl WebhookConfig {
    pub fn public_url(&self) -> Result<String> {
        let url = resolve_secret(
            "telegram.webhook.public_url",
            self.public_url.as_deref(),
            self.public_url_file.as_deref(),
        )?;
        Ok(url.trim_end_matches('/').to_string())
    }
}

/// Which behavior a deployed bot instance runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BotMode {
    Echo,
    Quote,
    #[default]
    ImageProcessing,
    ObjectDetection,
}

impl std::fmt::Display for BotMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Echo => write!(f, "echo"),
            Self::Quote => write!(f, "quote"),
            Self::ImageProcessing => write!(f, "image-processing"),
            Self::ObjectDetection => write!(f, "object-detection"),
        }
    }
}

impl std::str::FromStr for BotMode {
    type Err = PolybotError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "echo" => Ok(Self::Echo),
            "quote" => Ok(Self::Quote),
            "image-processing" => Ok(Self::ImageProcessing),
            "object-detection" => Ok(Self::ObjectDetection),
            other => Err(PolybotError::Config(format!("unknown bot mode: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub mode: BotMode,
    /// Upper bound on handling one message. The session guard is released
    /// when it expires.
    #[serde(default = "default_processing_timeout_secs")]
    pub processing_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            mode: BotMode::default(),
            processing_timeout_secs: DEFAULT_PROCESSING_TIMEOUT_SECS,
        }
    }
}

/// Object-detection backend (`[detection]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_detection_url")]
    pub backend_url: String,
    /// Key prefix for uploaded photos, e.g. `telegram_photos/photos/file_1.jpg`.
    #[serde(default = "default_upload_prefix")]
    pub upload_prefix: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            backend_url: default_detection_url(),
            upload_prefix: default_upload_prefix(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// S3 bucket photos are uploaded to before detection (`[storage]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub bucket_file: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    /// S3-compatible endpoint (path-style addressing). Unset means AWS.
    pub endpoint: Option<String>,
    /// Profile in ~/.aws/credentials when env credentials are absent.
    pub profile: Option<String>,
}

impl StorageConfig {
    pub fn bucket(&self) -> Result<String> {
        resolve_secret("storage.bucket", self.bucket.as_deref(), self.bucket_file.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_photos_dir() -> String {
    ".".to_string()
}
fn default_max_photo_bytes() -> u64 {
    DEFAULT_MAX_PHOTO_BYTES
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_webhook_port() -> u16 {
    DEFAULT_WEBHOOK_PORT
}
fn default_processing_timeout_secs() -> u64 {
    DEFAULT_PROCESSING_TIMEOUT_SECS
}
fn default_detection_url() -> String {
    DEFAULT_DETECTION_URL.to_string()
}
fn default_upload_prefix() -> String {
    DEFAULT_UPLOAD_PREFIX.to_string()
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_region() -> String {
    DEFAULT_REGION.to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.polybot/polybot.db", home)
}

/// Read a value from `file` (trimmed) when given, else take `inline`.
fn resolve_secret(name: &str, inline: Option<&str>, file: Option<&str>) -> Result<String> {
    if let Some(path) = file {
        let raw = std::fs::read_to_string(path).map_err(|source| PolybotError::Secret {
            path: path.to_string(),
            source,
        })?;
        return Ok(raw.trim_end().to_string());
    }
    inline
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PolybotError::Config(format!("{name} is not configured")))
}

impl PolybotConfig {
    /// Load config from a TOML file with POLYBOT_* env var overrides.
    ///
    /// Nested keys are separated by a double underscore:
    /// `POLYBOT_BOT__MODE=echo` sets `bot.mode`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::from_figment(
            Figment::new()
                .merge(Toml::file(&path))
                .merge(Env::prefixed("POLYBOT_").split("__")),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| PolybotError::Config(e.to_string()))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.polybot/polybot.toml", home)
}
