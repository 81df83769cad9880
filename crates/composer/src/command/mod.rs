pub mod common;
pub mod mapped;
pub mod stream_copy;

use crate::assets::AssetsPresent;
use crate::config::{MappingPolicy, WaveformMode};
use serde::{Deserialize, Serialize};

/// User toggles for one submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionOptions {
    pub mute_foreground: bool,
    pub mute_background: bool,
    pub add_waveform: bool,
}

/// Look of the waveform overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformStyle {
    /// Frame size of the rendered waveform, `WxH`
    pub size: String,
    pub mode: WaveformMode,
    /// `|`-separated colour list, one per channel
    pub colors: String,
}

impl Default for WaveformStyle {
    fn default() -> Self {
        Self {
            size: "1280x200".to_string(),
            mode: WaveformMode::Cline,
            colors: "cyan".to_string(),
        }
    }
}

/// Fixed parts of the generated command that do not vary per submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProfile {
    pub output_name: String,
    pub waveform: WaveformStyle,
    pub mapping: MappingPolicy,
}

impl Default for CommandProfile {
    fn default() -> Self {
        Self {
            output_name: "output.mp4".to_string(),
            waveform: WaveformStyle::default(),
            mapping: MappingPolicy::Explicit,
        }
    }
}

/// Build the engine argument list with the default profile
pub fn build_command(options: &CompositionOptions, assets: AssetsPresent) -> Vec<String> {
    build_command_with(options, assets, &CommandProfile::default())
}

/// Build the engine argument list.
///
/// Pure and deterministic: the same inputs always yield the same tokens, and
/// the music input (index 2) is only referenced when music is present.
pub fn build_command_with(
    options: &CompositionOptions,
    assets: AssetsPresent,
    profile: &CommandProfile,
) -> Vec<String> {
    match profile.mapping {
        MappingPolicy::Explicit => mapped::build_mapped_command(options, assets, profile),
        MappingPolicy::StreamCopy => {
            stream_copy::build_stream_copy_command(options, assets, profile)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_command_exact_tokens() {
        let command = build_command(&CompositionOptions::default(), AssetsPresent::without_music());
        assert_eq!(
            command,
            vec![
                "-i",
                "background.mp4",
                "-i",
                "foreground.mp4",
                "-filter_complex",
                "[1:v][0:v]scale2ref[fg][bg];[bg][fg]overlay=(W-w)/2:(H-h)/2:shortest=1[vout]",
                "-map",
                "[vout]",
                "-shortest",
                "output.mp4",
            ]
        );
    }

    #[test]
    fn test_full_command_exact_tokens() {
        let options = CompositionOptions {
            mute_foreground: true,
            mute_background: true,
            add_waveform: true,
        };
        let command = build_command(&options, AssetsPresent::with_music());
        assert_eq!(
            command,
            vec![
                "-i",
                "background.mp4",
                "-i",
                "foreground.mp4",
                "-i",
                "music.mp3",
                "-filter_complex",
                "[1:v][0:v]scale2ref[fg][bg];[bg][fg]overlay=(W-w)/2:(H-h)/2:shortest=1[base];\
                 [2:a]showwaves=s=1280x200:mode=cline:colors=cyan[waveform];\
                 [base][waveform]overlay=W-w:H-h[vout]",
                "-filter_complex",
                "[1:a]anullsink;[0:a]anullsink",
                "-map",
                "[vout]",
                "-map",
                "2:a",
                "-shortest",
                "output.mp4",
            ]
        );
    }

    #[test]
    fn test_stream_copy_has_no_map() {
        let profile = CommandProfile {
            mapping: MappingPolicy::StreamCopy,
            ..Default::default()
        };
        let command =
            build_command_with(&CompositionOptions::default(), AssetsPresent::with_music(), &profile);

        assert!(!command.contains(&"-map".to_string()));
        let joined = command.join(" ");
        assert!(joined.contains("-c:a copy"));
        assert!(!joined.contains("[vout]"));
        assert_eq!(command.last().map(String::as_str), Some("output.mp4"));
    }

    #[test]
    fn test_custom_output_name() {
        let profile = CommandProfile {
            output_name: "composited.mp4".to_string(),
            ..Default::default()
        };
        let command =
            build_command_with(&CompositionOptions::default(), AssetsPresent::default(), &profile);
        assert_eq!(command.last().map(String::as_str), Some("composited.mp4"));
    }
}
