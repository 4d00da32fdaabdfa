use crate::classify::DEFAULT_MAX_DISPLAY_CHARS;
use crate::metadata::DEFAULT_METADATA_FIELDS;
use anyhow::{Context, Result};
use jsongraph_core::LayoutDirection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_DEPTH: usize = 50;

/// How array children are labeled in `field_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArrayLabelStyle {
    /// `[3]`
    #[default]
    Index,
    /// `item 3`
    Ordinal,
}

impl ArrayLabelStyle {
    pub fn label(self, index: usize) -> String {
        match self {
            ArrayLabelStyle::Index => format!("[{}]", index),
            ArrayLabelStyle::Ordinal => format!("item {}", index),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub max_depth: usize,
    pub safe_display: bool,
    pub max_display_chars: usize,
    pub metadata_fields: Vec<String>,
    pub array_label: ArrayLabelStyle,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            safe_display: true,
            max_display_chars: DEFAULT_MAX_DISPLAY_CHARS,
            metadata_fields: DEFAULT_METADATA_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            array_label: ArrayLabelStyle::Index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LayoutAlgorithm {
    /// Breadth-first bands, one per level.
    #[default]
    Level,
    /// Offsets handed out in traversal order.
    Traversal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub algorithm: LayoutAlgorithm,
    pub direction: LayoutDirection,
    /// Distance between consecutive levels along the main axis.
    pub level_spacing: f32,
    /// Distance between siblings along the cross axis.
    pub node_spacing: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            algorithm: LayoutAlgorithm::Level,
            direction: LayoutDirection::Horizontal,
            level_spacing: 250.0,
            node_spacing: 80.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub build: BuildOptions,
    pub layout: LayoutSettings,
}

impl EngineSettings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("jsongraph").join("settings.json"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {:?}", path))?;
        let settings = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse settings file {:?}", path))?;
        Ok(settings)
    }

    /// Loads from the user config dir, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            tracing::info!("Settings file not found, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => {
                tracing::info!("Settings loaded from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::error!("{:#}", e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create settings dir {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write settings file {:?}", path))?;
        Ok(())
    }
}
