use crate::error::Result;
use crate::model::ViewMode;
pub use crate::reconcile::Expansion;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tree: TreeConfig,
    pub colors: ColorConfig,
    pub keybindings: KeybindingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Minimum run of resources sharing a prefix before a folder node is created
    pub nesting_threshold: usize,
    pub default_expansion: Expansion,
    pub view_mode: ViewMode,
    pub refresh_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub active_border: String,
    pub selected_fg: String,
    pub selected_bg: String,
    pub group: String,
    pub folder: String,
    pub hunk_header: String,
    pub added_line: String,
    pub removed_line: String,
    pub current_hunk_bg: String,
    pub status_bar_bg: String,
    pub status_bar_fg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindingConfig {
    pub quit: char,
    pub toggle_view: char,
    pub refresh: char,
    pub next_change: char,
    pub previous_change: char,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            nesting_threshold: 1,
            default_expansion: Expansion::Expanded,
            view_mode: ViewMode::Flat,
            refresh_interval_ms: 2000,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            active_border: "yellow".to_string(),
            selected_fg: "black".to_string(),
            selected_bg: "white".to_string(),
            group: "white".to_string(),
            folder: "blue".to_string(),
            hunk_header: "cyan".to_string(),
            added_line: "green".to_string(),
            removed_line: "red".to_string(),
            current_hunk_bg: "darkgray".to_string(),
            status_bar_bg: "darkgray".to_string(),
            status_bar_fg: "white".to_string(),
        }
    }
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            quit: 'q',
            toggle_view: 'v',
            refresh: 'r',
            next_change: 'n',
            previous_change: 'p',
        }
    }
}

impl ColorConfig {
    /// Parse a color name, falling back to the terminal default
    pub fn parse(name: &str) -> Color {
        Color::from_str(name).unwrap_or(Color::Reset)
    }
}

impl Config {
    /// Defaults when no path is given, otherwise the JSON file at `path`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
