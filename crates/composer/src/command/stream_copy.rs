// Stream-copy command: audio passed through untouched, mapped only when a
// mute forces the choice

use super::common::{
    any_muted, input_flags, mute_flags, shortest_flag, unmuted_audio_source, video_graph,
    VIDEO_OUT_LABEL,
};
use super::{CommandProfile, CompositionOptions};
use crate::assets::AssetsPresent;

pub fn build_stream_copy_command(
    options: &CompositionOptions,
    assets: AssetsPresent,
    profile: &CommandProfile,
) -> Vec<String> {
    let mut command = input_flags(assets);

    // Automatic stream selection ignores audio consumed by a filter graph, so
    // a mute has to pin every output stream explicitly.
    let explicit = any_muted(options);
    let output_label = explicit.then_some(VIDEO_OUT_LABEL);

    // Unlabelled otherwise so the engine picks the composite up as the output video
    command.push("-filter_complex".to_string());
    command.push(video_graph(options, assets, &profile.waveform, output_label));

    command.extend(mute_flags(options));

    if explicit {
        command.push("-map".to_string());
        command.push(format!("[{}]", VIDEO_OUT_LABEL));

        match unmuted_audio_source(options, assets) {
            Some(role) => {
                command.push("-map".to_string());
                // `?`: the source may carry no audio at all
                command.push(format!("{}:a?", role.input_index()));
                command.push("-c:a".to_string());
                command.push("copy".to_string());
            }
            None => command.push("-an".to_string()),
        }
    } else {
        command.push("-c:a".to_string());
        command.push("copy".to_string());
    }

    command.push(shortest_flag());
    command.push(profile.output_name.clone());

    command
}
