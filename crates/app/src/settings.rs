//! Persistent settings

use anyhow::Context;
use capture::CropPolicy;
use overlay::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Handling of a confirmed region that reaches past the image edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfBounds {
    #[default]
    Clamp,
    Reject,
}

impl From<OutOfBounds> for CropPolicy {
    fn from(value: OutOfBounds) -> Self {
        match value {
            OutOfBounds::Clamp => CropPolicy::Clamp,
            OutOfBounds::Reject => CropPolicy::Reject,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Program that prints `tag<TAB>score` lines for the image path it is given
    pub tagger_command: String,
    pub tagger_args: Vec<String>,
    pub threshold: f32,
    /// Keep underscores in tags instead of turning them into spaces
    pub use_underscore: bool,
    pub exclusion_list: Vec<String>,
    pub copy_to_clipboard: bool,
    pub out_of_bounds: OutOfBounds,
    pub resize_handles: bool,
    pub movable: bool,
    /// One overlay per monitor; otherwise a single capture of the primary screen
    pub per_monitor: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tagger_command: "snaptag-tagger".to_string(),
            tagger_args: Vec::new(),
            threshold: 0.35,
            use_underscore: false,
            exclusion_list: Vec::new(),
            copy_to_clipboard: true,
            out_of_bounds: OutOfBounds::Clamp,
            resize_handles: true,
            movable: true,
            per_monitor: true,
        }
    }
}

impl AppConfig {
    /// `<config dir>/snaptag/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snaptag")
            .join("config.json")
    }

    /// Settings from the default location, defaults when missing or unreadable
    pub fn load() -> Self {
        Self::load_or_default(&Self::default_path())
    }

    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No settings at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::load_from(path) {
            Ok(config) => {
                log::info!("Settings loaded from {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("Ignoring settings at {:?}: {:#}", path, e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        log::info!("Settings saved to {:?}", path);
        Ok(())
    }

    pub fn crop_policy(&self) -> CropPolicy {
        self.out_of_bounds.into()
    }

    pub fn engine(&self) -> EngineConfig {
        let engine = match (self.resize_handles, self.movable) {
            (false, false) => EngineConfig::draw_only(),
            (resize_handles, movable) => EngineConfig {
                resize_handles,
                movable,
                ..EngineConfig::full()
            },
        };
        if self.per_monitor {
            engine.per_monitor()
        } else {
            engine
        }
    }
}
