// config.rs - Configuration Module
// Loads botconfig.txt (KEY=VALUE) with multi-path fallback and turns it into
// typed settings for the bot and the preview compositor.
//
// Key Features:
// - Searches ., .., ../.. and src/ for the config file, first hit wins
// - Skips blank lines and # comments, strips a UTF-8 BOM
// - Defaults for every preview setting except the Discord token
//
// Used by: main.rs (startup), preview/ (PreviewConfig)

use std::collections::HashMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::preview::layout::{GridLayout, MAX_COLUMNS};

pub const CONFIG_FILE: &str = "botconfig.txt";

const CONFIG_PATHS: [&str; 4] = [
    "botconfig.txt",
    "../botconfig.txt",
    "../../botconfig.txt",
    "src/botconfig.txt",
];

const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN_HERE";

/// Upper bound for thumbnail sides and the caption/title bands, in pixels
pub const MAX_CELL_SIDE: u32 = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No {0} file found in any expected location (., .., ../.., src/)")]
    NotFound(&'static str),
    #[error("{0} not found in botconfig.txt")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the search preview pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewConfig {
    pub font_path: PathBuf,
    pub tmp_path: PathBuf,
    pub thumb_width: u32,
    pub thumb_height: u32,
    pub caption_height: u32,
    pub title_height: u32,
    pub columns: u32,
    pub fetch_concurrency: usize,
    /// Seconds
    pub http_timeout: u64,
    pub referer: Option<String>,
    pub user_agent: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let layout = GridLayout::default();
        Self {
            font_path: PathBuf::from("resources/fonts/DejaVuSans.ttf"),
            tmp_path: PathBuf::from("tmp"),
            thumb_width: layout.cell_width,
            thumb_height: layout.cell_height,
            caption_height: layout.caption_height,
            title_height: layout.title_height,
            columns: layout.columns,
            fetch_concurrency: 20,
            http_timeout: 30,
            referer: Some("https://www.pixiv.net/".to_string()),
            user_agent: concat!("meri_preview_bot/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl PreviewConfig {
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let referer = match map.get("THUMB_REFERER") {
            Some(value) if value.is_empty() => None,
            Some(value) => Some(value.clone()),
            None => defaults.referer,
        };

        Ok(Self {
            font_path: map.get("FONT_PATH").map(PathBuf::from).unwrap_or(defaults.font_path),
            tmp_path: map.get("TMP_PATH").map(PathBuf::from).unwrap_or(defaults.tmp_path),
            thumb_width: in_range(map, "THUMB_WIDTH", defaults.thumb_width, 1..=MAX_CELL_SIDE)?,
            thumb_height: in_range(map, "THUMB_HEIGHT", defaults.thumb_height, 1..=MAX_CELL_SIDE)?,
            caption_height: in_range(map, "CAPTION_HEIGHT", defaults.caption_height, 0..=MAX_CELL_SIDE)?,
            title_height: in_range(map, "TITLE_HEIGHT", defaults.title_height, 0..=MAX_CELL_SIDE)?,
            columns: in_range(map, "PREVIEW_COLUMNS", defaults.columns, 1..=MAX_COLUMNS)?,
            fetch_concurrency: positive(map, "FETCH_CONCURRENCY", defaults.fetch_concurrency)?,
            http_timeout: positive(map, "HTTP_TIMEOUT", defaults.http_timeout)?,
            referer,
            user_agent: map.get("USER_AGENT").cloned().unwrap_or(defaults.user_agent),
        })
    }

    pub fn layout(&self) -> GridLayout {
        GridLayout {
            cell_width: self.thumb_width,
            cell_height: self.thumb_height,
            caption_height: self.caption_height,
            title_height: self.title_height,
            columns: self.columns,
        }
    }
}

/// Discord connection settings
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub prefix: String,
}

impl BotConfig {
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let token = map
            .get("DISCORD_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        if token == TOKEN_PLACEHOLDER {
            return Err(ConfigError::Invalid {
                key: "DISCORD_TOKEN",
                value: token.clone(),
            });
        }

        Ok(Self {
            token: token.clone(),
            prefix: map.get("PREFIX").cloned().unwrap_or_else(|| "^".to_string()),
        })
    }
}

/// Parse KEY=VALUE lines into a map
pub fn parse_config(content: &str) -> HashMap<String, String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut config = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(equals_pos) = line.find('=') {
            let key = line[..equals_pos].trim().to_string();
            let value = line[equals_pos + 1..].trim().to_string();
            config.insert(key, value);
        }
    }

    config
}

/// Read botconfig.txt from the first location that has it.
/// Returns the path used and the parsed map.
pub fn load_config_file() -> Result<(String, HashMap<String, String>), ConfigError> {
    for config_path in &CONFIG_PATHS {
        if let Ok(content) = fs::read_to_string(config_path) {
            return Ok((config_path.to_string(), parse_config(&content)));
        }
    }
    Err(ConfigError::NotFound(CONFIG_FILE))
}

fn parse_or<T: FromStr>(map: &HashMap<String, String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match map.get(key) {
        Some(value) => value.parse::<T>().map_err(|_| ConfigError::Invalid {
            key,
            value: value.clone(),
        }),
        None => Ok(default),
    }
}

fn positive<T>(map: &HashMap<String, String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    let value = parse_or(map, key, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: map.get(key).cloned().unwrap_or_default(),
        });
    }
    Ok(value)
}

fn in_range(
    map: &HashMap<String, String>,
    key: &'static str,
    default: u32,
    range: RangeInclusive<u32>,
) -> Result<u32, ConfigError> {
    let value = parse_or(map, key, default)?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid {
            key,
            value: map.get(key).cloned().unwrap_or_default(),
        });
    }
    Ok(value)
}
