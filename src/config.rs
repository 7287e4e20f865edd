use chrono::Timelike;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::models::{Catalog, Category, ProductEntry, VendorPattern, VendorTable};
use crate::utils::error::{AppError, Result};

pub const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Accepted page fetch timeout, in seconds.
pub const FETCH_TIMEOUT_RANGE: RangeInclusive<u64> = 20..=30;
/// Accepted Bot API timeout, in seconds.
pub const NOTIFY_TIMEOUT_RANGE: RangeInclusive<u64> = 10..=15;
/// Accepted pause between product requests, in milliseconds.
pub const PAUSE_MS_RANGE: RangeInclusive<u64> = 100..=5000;
/// Accepted message cap, in characters.
pub const MAX_LENGTH_RANGE: RangeInclusive<usize> = 200..=4096;
/// Longest report title that still leaves the header and summary room under
/// the smallest accepted cap.
pub const MAX_TITLE_CHARS: usize = 40;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub counting: CountingConfig,
    pub report: ReportConfig,
    pub telegram: TelegramConfig,
    pub rotation: RotationConfig,
    pub catalog: Option<Vec<ProductEntry>>,
    pub vendors: Option<Vec<VendorPattern>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Seconds.
    pub request_timeout: u64,
    pub user_agent: String,
    pub accept_language: String,
    /// Pause between two product requests, in milliseconds.
    pub pause_ms: u64,
    pub retry_on_failure: bool,
    pub allowed_hosts: Vec<String>,
    pub require_https: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_timeout: 25,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "de-DE,de;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
            pause_ms: 1000,
            retry_on_failure: true,
            allowed_hosts: vec!["www.gold.de".to_string()],
            require_https: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CountingConfig {
    /// Also attribute hyperlink targets to dealers, on top of the plain text count.
    pub match_links: bool,
    /// Upper bound on the text count contributed by a single token.
    pub max_per_token: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    /// Characters, matching the chat transport's message ceiling.
    pub max_length: usize,
    pub top_products: usize,
    pub top_vendors: usize,
    pub show_links: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Availability Report".to_string(),
            max_length: 3800,
            top_products: 5,
            top_vendors: 5,
            show_links: true,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_base: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// Seconds.
    pub request_timeout: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            bot_token: None,
            chat_id: None,
            request_timeout: 15,
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_base", &self.api_base)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramConfig {
    /// Both values must be present and non-blank.
    pub fn credentials(&self) -> Result<Credentials> {
        let bot_token = non_blank(self.bot_token.as_deref()).ok_or_else(|| AppError::ConfigMissing {
            name: BOT_TOKEN_VAR.to_string(),
        })?;
        let chat_id = non_blank(self.chat_id.as_deref()).ok_or_else(|| AppError::ConfigMissing {
            name: CHAT_ID_VAR.to_string(),
        })?;

        Ok(Credentials {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Coins every run, bars only in a short window every few hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub enabled: bool,
    pub bars_every_hours: u32,
    pub window_minutes: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bars_every_hours: 3,
            window_minutes: 10,
        }
    }
}

impl RotationConfig {
    pub fn active_categories<T: Timelike>(&self, now: &T) -> Vec<Category> {
        if !self.enabled {
            return Category::ALL.to_vec();
        }

        let mut active = vec![Category::Priority, Category::Coins];
        if now.hour() % self.bars_every_hours == 0 && now.minute() < self.window_minutes {
            active.push(Category::Bars);
        }
        active
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::load(Path::new("config"), |key| env::var(key).ok())
    }

    /// Layers: serde defaults, `default.toml`, `local.toml`, `GOLDWATCH_*` variables.
    /// Credentials missing from those layers are taken from `lookup`.
    pub fn load<F>(config_dir: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let s = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Local overrides (ignored by git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("GOLDWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("scraper.allowed_hosts"),
            )
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.telegram.bot_token.is_none() {
            config.telegram.bot_token = lookup(BOT_TOKEN_VAR);
        }
        if config.telegram.chat_id.is_none() {
            config.telegram.chat_id = lookup(CHAT_ID_VAR);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn catalog(&self) -> Catalog {
        self.catalog
            .clone()
            .map(Catalog::new)
            .unwrap_or_default()
    }

    pub fn vendor_table(&self) -> VendorTable {
        self.vendors
            .clone()
            .map(VendorTable::new)
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if !FETCH_TIMEOUT_RANGE.contains(&self.scraper.request_timeout) {
            return Err(AppError::Validation(format!(
                "Scraper request_timeout must be between {} and {} seconds",
                FETCH_TIMEOUT_RANGE.start(),
                FETCH_TIMEOUT_RANGE.end()
            )));
        }

        if !PAUSE_MS_RANGE.contains(&self.scraper.pause_ms) {
            return Err(AppError::Validation(format!(
                "Scraper pause_ms must be between {} and {} milliseconds",
                PAUSE_MS_RANGE.start(),
                PAUSE_MS_RANGE.end()
            )));
        }

        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::Validation("Scraper user_agent must not be empty".into()));
        }

        if !NOTIFY_TIMEOUT_RANGE.contains(&self.telegram.request_timeout) {
            return Err(AppError::Validation(format!(
                "Telegram request_timeout must be between {} and {} seconds",
                NOTIFY_TIMEOUT_RANGE.start(),
                NOTIFY_TIMEOUT_RANGE.end()
            )));
        }

        if !MAX_LENGTH_RANGE.contains(&self.report.max_length) {
            return Err(AppError::Validation(format!(
                "Report max_length must be between {} and {}",
                MAX_LENGTH_RANGE.start(),
                MAX_LENGTH_RANGE.end()
            )));
        }

        if self.report.title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "Report title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }

        if self.report.top_products == 0 || self.report.top_vendors == 0 {
            return Err(AppError::Validation(
                "Report top_products and top_vendors must be greater than 0".into(),
            ));
        }

        if self.rotation.bars_every_hours == 0 {
            return Err(AppError::Validation(
                "Rotation bars_every_hours must be greater than 0".into(),
            ));
        }

        if self.vendor_table().is_empty() {
            return Err(AppError::Validation("Vendor table must not be empty".into()));
        }
        if self
            .vendor_table()
            .patterns()
            .iter()
            .any(|p| p.token.trim().is_empty())
        {
            return Err(AppError::Validation("Vendor tokens must not be empty".into()));
        }

        let catalog = self.catalog();
        if catalog.is_empty() {
            return Err(AppError::Validation("Catalog must not be empty".into()));
        }
        catalog.validate(&self.scraper.allowed_hosts, self.scraper.require_https)?;

        Ok(())
    }
}
