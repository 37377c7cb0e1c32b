use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    database: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub clips: ClipStrategyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prefix for URLs handed to clients, e.g. extracted clip URLs.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Origin allowed by CORS in release builds.
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "default_clip_seconds")]
    pub clip_seconds: u32,
    /// How long an extracted clip stays on disk, in humantime format ("60s", "2m").
    #[serde(default = "default_clip_retention")]
    pub clip_retention: String,
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: u64,
}

/// Which clip resolver the server builds at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ClipStrategyConfig {
    /// Hand out the song's clip URL or track URL unchanged.
    #[default]
    Direct,
    /// Presign object-storage keys.
    SignedUrl(StorageConfig),
    /// Hand out the full track plus a random offset for the client to seek to.
    FullTrack {
        #[serde(default)]
        storage: Option<StorageConfig>,
    },
    /// Cut clips from local files with ffmpeg into `directory`.
    Extract { directory: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom S3-compatible endpoint; defaults to the AWS virtual-host endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default = "default_expires_in_seconds")]
    pub expires_in_seconds: u64,
}

fn default_port() -> u16 {
    5000
}

fn default_clip_seconds() -> u32 {
    7
}

fn default_clip_retention() -> String {
    "60s".to_string()
}

fn default_leaderboard_size() -> u64 {
    10
}

fn default_expires_in_seconds() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            public_base_url: None,
            allowed_origin: None,
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            clip_seconds: default_clip_seconds(),
            clip_retention: default_clip_retention(),
            leaderboard_size: default_leaderboard_size(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "~/.local/share/song-quiz/song-quiz.db".to_string(),
            server: ServerConfig::default(),
            quiz: QuizConfig::default(),
            clips: ClipStrategyConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Credentials from the config file, falling back to the standard AWS environment variables.
    pub fn credentials(&self) -> Result<(String, String)> {
        let access_key_id = self
            .access_key_id
            .clone()
            .or_else(|| std::env::var("AWS_ACCESS_KEY_ID").ok())
            .ok_or_else(|| eyre!("No storage access key configured (set AWS_ACCESS_KEY_ID)"))?;
        let secret_access_key = self
            .secret_access_key
            .clone()
            .or_else(|| std::env::var("AWS_SECRET_ACCESS_KEY").ok())
            .ok_or_else(|| {
                eyre!("No storage secret key configured (set AWS_SECRET_ACCESS_KEY)")
            })?;
        Ok((access_key_id, secret_access_key))
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.clip_retention()?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("song-quiz").join("config.toml"))
    }

    /// Load config from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path().ok_or(eyre!("Config file not found"))?;

        Self::from_file(&config_path)
    }

    /// Write a default config file, leaving an existing one untouched
    pub fn create_default() -> Result<PathBuf> {
        let config_path = Self::config_path().ok_or(eyre!("No config directory available"))?;
        if config_path.exists() {
            log::info!("Config already exists at: {}", config_path.display());
            return Ok(config_path);
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents =
            toml::to_string_pretty(&Config::default()).wrap_err("Failed to serialize config")?;
        std::fs::write(&config_path, contents)
            .wrap_err_with(|| format!("Failed to write config: {}", config_path.display()))?;
        Ok(config_path)
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    /// Get expanded database path
    pub fn database_path(&self) -> PathBuf {
        self.expand_path(&self.database)
    }

    /// Get expanded clip cache directory, when clips are extracted locally
    pub fn clips_directory(&self) -> Option<PathBuf> {
        match &self.clips {
            ClipStrategyConfig::Extract { directory } => Some(self.expand_path(directory)),
            _ => None,
        }
    }

    pub fn clip_retention(&self) -> Result<Duration> {
        humantime::parse_duration(&self.quiz.clip_retention).wrap_err_with(|| {
            format!(
                "Invalid clip_retention duration: {}",
                self.quiz.clip_retention
            )
        })
    }

    /// Base URL clients reach this server on
    pub fn public_base_url(&self) -> String {
        self.server
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.server.port))
            .trim_end_matches('/')
            .to_string()
    }
}
