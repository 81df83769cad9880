use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Logical role of an uploaded media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaRole {
    Background,
    Foreground,
    Music,
}

impl MediaRole {
    /// Fixed name the asset is staged under in engine storage
    pub fn storage_name(self) -> &'static str {
        match self {
            MediaRole::Background => "background.mp4",
            MediaRole::Foreground => "foreground.mp4",
            MediaRole::Music => "music.mp3",
        }
    }

    /// Position of the asset in the engine's input list
    pub fn input_index(self) -> usize {
        match self {
            MediaRole::Background => 0,
            MediaRole::Foreground => 1,
            MediaRole::Music => 2,
        }
    }
}

impl fmt::Display for MediaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaRole::Background => "background",
            MediaRole::Foreground => "foreground",
            MediaRole::Music => "music",
        };
        f.write_str(name)
    }
}

/// An uploaded file held in memory for the lifetime of one submission
#[derive(Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub role: MediaRole,
    pub bytes: Vec<u8>,
    pub source_name: Option<String>,
}

impl MediaAsset {
    pub fn new(role: MediaRole, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            role,
            bytes: bytes.into(),
            source_name: None,
        }
    }

    /// Read an asset from disk
    pub async fn load(role: MediaRole, path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {} file {:?}", role, path))?;

        Ok(Self {
            role,
            bytes,
            source_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Payloads can be hundreds of megabytes; keep them out of debug output.
impl fmt::Debug for MediaAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaAsset")
            .field("role", &self.role)
            .field("len", &self.bytes.len())
            .field("source_name", &self.source_name)
            .finish()
    }
}

/// Which optional assets a submission carries.
///
/// Background and foreground are required, so only the music track is
/// described here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetsPresent {
    pub music: bool,
}

impl AssetsPresent {
    pub fn with_music() -> Self {
        Self { music: true }
    }

    pub fn without_music() -> Self {
        Self { music: false }
    }
}
