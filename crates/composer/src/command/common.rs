// Shared FFmpeg command components

use super::{CompositionOptions, WaveformStyle};
use crate::assets::{AssetsPresent, MediaRole};

/// Label of the final video pad when the graph output is mapped explicitly
pub const VIDEO_OUT_LABEL: &str = "vout";

/// Label of the composite when a waveform is layered on top of it
const COMPOSITE_LABEL: &str = "base";

const WAVEFORM_LABEL: &str = "waveform";

/// Returns one `-i <name>` pair per supplied asset, in input index order
pub fn input_flags(assets: AssetsPresent) -> Vec<String> {
    let mut roles = vec![MediaRole::Background, MediaRole::Foreground];
    if assets.music {
        roles.push(MediaRole::Music);
    }

    roles
        .into_iter()
        .flat_map(|role| ["-i".to_string(), role.storage_name().to_string()])
        .collect()
}

/// Scales the foreground to the background's frame size and centres it on top.
///
/// The composite ends with the shorter of the two video streams.
pub fn composite_clause(output_label: Option<&str>) -> String {
    let bg = MediaRole::Background.input_index();
    let fg = MediaRole::Foreground.input_index();
    format!(
        "[{fg}:v][{bg}:v]scale2ref[fg][bg];[bg][fg]overlay=(W-w)/2:(H-h)/2:shortest=1{}",
        pad(output_label)
    )
}

/// Renders the music track as a waveform and pins it to the bottom-right corner
pub fn waveform_clause(style: &WaveformStyle, input_label: &str, output_label: Option<&str>) -> String {
    let music = MediaRole::Music.input_index();
    let wave = WAVEFORM_LABEL;
    format!(
        "[{music}:a]showwaves=s={}:mode={}:colors={}[{wave}];[{input_label}][{wave}]overlay=W-w:H-h{}",
        style.size,
        style.mode.as_filter_value(),
        style.colors,
        pad(output_label)
    )
}

/// Whether the waveform overlay applies; it needs music as its signal source
pub fn wants_waveform(options: &CompositionOptions, assets: AssetsPresent) -> bool {
    options.add_waveform && assets.music
}

/// Full video filter graph, with the last pad optionally labelled
pub fn video_graph(
    options: &CompositionOptions,
    assets: AssetsPresent,
    style: &WaveformStyle,
    output_label: Option<&str>,
) -> String {
    if wants_waveform(options, assets) {
        format!(
            "{};{}",
            composite_clause(Some(COMPOSITE_LABEL)),
            waveform_clause(style, COMPOSITE_LABEL, output_label)
        )
    } else {
        composite_clause(output_label)
    }
}

/// One clause per muted source. Each sends that input's audio into a null
/// sink so it cannot be picked up by the output.
pub fn mute_clauses(options: &CompositionOptions) -> Vec<String> {
    let mut clauses = Vec::new();
    if options.mute_foreground {
        clauses.push(format!("[{}:a]anullsink", MediaRole::Foreground.input_index()));
    }
    if options.mute_background {
        clauses.push(format!("[{}:a]anullsink", MediaRole::Background.input_index()));
    }
    clauses
}

/// Returns the audio filter graph flags, or nothing when no source is muted
pub fn mute_flags(options: &CompositionOptions) -> Vec<String> {
    let clauses = mute_clauses(options);
    if clauses.is_empty() {
        return Vec::new();
    }
    vec!["-filter_complex".to_string(), clauses.join(";")]
}

/// Whether any source has its audio muted
pub fn any_muted(options: &CompositionOptions) -> bool {
    options.mute_foreground || options.mute_background
}

/// Audio source to carry into the output once selection has to be explicit:
/// music when present, then the first unmuted video's own audio.
pub fn unmuted_audio_source(options: &CompositionOptions, assets: AssetsPresent) -> Option<MediaRole> {
    if assets.music {
        Some(MediaRole::Music)
    } else if !options.mute_background {
        Some(MediaRole::Background)
    } else if !options.mute_foreground {
        Some(MediaRole::Foreground)
    } else {
        None
    }
}

/// Stops the output when the shortest contributing stream ends
pub fn shortest_flag() -> String {
    "-shortest".to_string()
}

fn pad(label: Option<&str>) -> String {
    label.map(|l| format!("[{}]", l)).unwrap_or_default()
}
