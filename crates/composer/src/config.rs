use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::command::{CommandProfile, WaveformStyle};
use crate::engine::local::EngineConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub ffmpeg_path: PathBuf,
    pub scratch_root: PathBuf,
    pub output_name: String,
    pub mapping_policy: MappingPolicy,
    pub waveform: WaveformStyle,
}

/// How output streams are selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingPolicy {
    /// `-map` the composite video and, when present, the music audio
    Explicit,
    /// No `-map`; audio is stream-copied from whatever the engine selects
    StreamCopy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformMode {
    Point,
    Line,
    P2p,
    Cline,
}

impl WaveformMode {
    pub fn as_filter_value(self) -> &'static str {
        match self {
            WaveformMode::Point => "point",
            WaveformMode::Line => "line",
            WaveformMode::P2p => "p2p",
            WaveformMode::Cline => "cline",
        }
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            scratch_root: std::env::temp_dir().join("vidlay"),
            output_name: "output.mp4".to_string(),
            mapping_policy: MappingPolicy::Explicit,
            waveform: WaveformStyle::default(),
        }
    }
}

impl ComposerConfig {
    pub fn profile(&self) -> CommandProfile {
        CommandProfile {
            output_name: self.output_name.clone(),
            waveform: self.waveform.clone(),
            mapping: self.mapping_policy,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            ffmpeg_path: self.ffmpeg_path.clone(),
            scratch_root: self.scratch_root.clone(),
        }
    }
}

pub fn load_config(path: Option<&std::path::Path>) -> Result<ComposerConfig> {
    let config = if let Some(config_path) = path {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

            toml::from_str::<ComposerConfig>(&contents)
                .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", config_path);
            ComposerConfig::default()
        }
    } else {
        tracing::debug!("No config path provided, using defaults");
        ComposerConfig::default()
    };

    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &ComposerConfig) -> Result<()> {
    if config.output_name.trim().is_empty() {
        anyhow::bail!("output_name cannot be empty");
    }

    if config.output_name.contains(|c: char| c == '/' || c == '\\') || config.output_name == ".." {
        anyhow::bail!("output_name must be a plain file name, got {:?}", config.output_name);
    }

    let size = Regex::new(r"^[1-9]\d*x[1-9]\d*$")?;
    if !size.is_match(&config.waveform.size) {
        anyhow::bail!(
            "waveform.size must look like WIDTHxHEIGHT, got {:?}",
            config.waveform.size
        );
    }

    if config.waveform.colors.split('|').any(|c| c.trim().is_empty()) {
        anyhow::bail!("waveform.colors must list at least one colour");
    }

    if config.ffmpeg_path.as_os_str().is_empty() {
        anyhow::bail!("ffmpeg_path cannot be empty");
    }

    Ok(())
}
