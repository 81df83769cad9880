// Explicitly mapped command: composite video plus the music track as audio

use super::common::{input_flags, mute_flags, shortest_flag, video_graph, VIDEO_OUT_LABEL};
use super::{CommandProfile, CompositionOptions};
use crate::assets::{AssetsPresent, MediaRole};

pub fn build_mapped_command(
    options: &CompositionOptions,
    assets: AssetsPresent,
    profile: &CommandProfile,
) -> Vec<String> {
    let mut command = input_flags(assets);

    command.push("-filter_complex".to_string());
    command.push(video_graph(options, assets, &profile.waveform, Some(VIDEO_OUT_LABEL)));

    command.extend(mute_flags(options));

    // Video comes from the composite, whose base layer is the background input
    command.push("-map".to_string());
    command.push(format!("[{}]", VIDEO_OUT_LABEL));

    if assets.music {
        command.push("-map".to_string());
        command.push(format!("{}:a", MediaRole::Music.input_index()));
    }

    command.push(shortest_flag());
    command.push(profile.output_name.clone());

    command
}
