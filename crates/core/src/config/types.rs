use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin allowed to call the API from a browser
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Key rate limits on `X-Forwarded-For`/`X-Real-IP` instead of the peer
    /// address. Only enable behind a proxy that sets these headers.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            trust_forwarded_headers: false,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// SQLite database holding job results
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,
    /// Directory for transient media downloads
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            temp_dir: default_temp_dir(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("reeldigest.db")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

/// Metadata resolver (Apify actor) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Apify API token
    pub api_token: String,
    /// Actor that scrapes reel metadata
    #[serde(default = "default_actor_id")]
    pub actor_id: String,
    /// Apify API base URL
    #[serde(default = "default_apify_base")]
    pub api_base: String,
    /// Maximum time to wait for the actor run (default: 300)
    #[serde(default = "default_resolver_timeout")]
    pub timeout_secs: u64,
}

fn default_actor_id() -> String {
    "apify~instagram-reel-scraper".to_string()
}

fn default_apify_base() -> String {
    "https://api.apify.com".to_string()
}

fn default_resolver_timeout() -> u64 {
    300
}

/// Media download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Largest accepted media payload in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Request timeout in seconds (default: 120)
    #[serde(default = "default_download_timeout")]
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            timeout_secs: default_download_timeout(),
        }
    }
}

fn default_max_bytes() -> u64 {
    25 * 1024 * 1024
}

fn default_download_timeout() -> u64 {
    120
}

/// OpenAI configuration (transcription and summarization)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    #[serde(default = "default_openai_base")]
    pub api_base: String,
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    #[serde(default = "default_summarization_model")]
    pub summarization_model: String,
    /// Largest file the transcription endpoint accepts
    #[serde(default = "default_max_bytes")]
    pub max_upload_bytes: u64,
    /// Request timeout in seconds (default: 300)
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
}

fn default_openai_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_summarization_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_timeout() -> u64 {
    300
}

/// Ingest rate limiting
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Ingest requests allowed per client per minute
    #[serde(default = "default_ingest_rpm")]
    pub ingest_requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            ingest_requests_per_minute: default_ingest_rpm(),
        }
    }
}

fn default_ingest_rpm() -> u32 {
    10
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub resolver: SanitizedResolverConfig,
    pub download: DownloadConfig,
    pub openai: SanitizedOpenAiConfig,
    pub rate_limit: RateLimitConfig,
}

/// Resolver config with the API token hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedResolverConfig {
    pub actor_id: String,
    pub api_base: String,
    pub api_token_configured: bool,
    pub timeout_secs: u64,
}

/// OpenAI config with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedOpenAiConfig {
    pub api_base: String,
    pub api_key_configured: bool,
    pub transcription_model: String,
    pub summarization_model: String,
    pub max_upload_bytes: u64,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: config.storage.clone(),
            resolver: SanitizedResolverConfig {
                actor_id: config.resolver.actor_id.clone(),
                api_base: config.resolver.api_base.clone(),
                api_token_configured: !config.resolver.api_token.is_empty(),
                timeout_secs: config.resolver.timeout_secs,
            },
            download: config.download.clone(),
            openai: SanitizedOpenAiConfig {
                api_base: config.openai.api_base.clone(),
                api_key_configured: !config.openai.api_key.is_empty(),
                transcription_model: config.openai.transcription_model.clone(),
                summarization_model: config.openai.summarization_model.clone(),
                max_upload_bytes: config.openai.max_upload_bytes,
                timeout_secs: config.openai.timeout_secs,
            },
            rate_limit: config.rate_limit.clone(),
        }
    }
}
