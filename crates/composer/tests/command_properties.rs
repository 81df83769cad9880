use proptest::prelude::*;
use vidlay_composer::assets::AssetsPresent;
use vidlay_composer::command::{build_command, build_command_with, CommandProfile, CompositionOptions};
use vidlay_composer::config::MappingPolicy;

fn arb_options() -> impl Strategy<Value = CompositionOptions> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(mute_foreground, mute_background, add_waveform)| CompositionOptions {
            mute_foreground,
            mute_background,
            add_waveform,
        },
    )
}

fn arb_assets() -> impl Strategy<Value = AssetsPresent> {
    any::<bool>().prop_map(|music| AssetsPresent { music })
}

fn arb_profile() -> impl Strategy<Value = CommandProfile> {
    prop_oneof![Just(MappingPolicy::Explicit), Just(MappingPolicy::StreamCopy)].prop_map(
        |mapping| CommandProfile {
            mapping,
            ..Default::default()
        },
    )
}

fn count(command: &[String], token: &str) -> usize {
    command.iter().filter(|t| t.as_str() == token).count()
}

fn map_targets(command: &[String]) -> Vec<&str> {
    command
        .windows(2)
        .filter(|w| w[0] == "-map")
        .map(|w| w[1].as_str())
        .collect()
}

fn filter_graphs(command: &[String]) -> Vec<&str> {
    command
        .windows(2)
        .filter(|w| w[0] == "-filter_complex")
        .map(|w| w[1].as_str())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Identical inputs always produce byte-identical token lists.
    #[test]
    fn prop_build_is_deterministic(
        options in arb_options(),
        assets in arb_assets(),
        profile in arb_profile(),
    ) {
        let first = build_command_with(&options, assets, &profile);
        let second = build_command_with(&options, assets, &profile);
        prop_assert_eq!(first, second);
    }

    /// Without music no token refers to input 2 or the music file.
    #[test]
    fn prop_no_music_reference_without_music(options in arb_options(), profile in arb_profile()) {
        let command = build_command_with(&options, AssetsPresent::without_music(), &profile);
        for token in &command {
            prop_assert!(!token.contains("2:a"), "unexpected music reference in {:?}", token);
            prop_assert!(!token.contains("music.mp3"));
            prop_assert!(!token.contains("showwaves"));
        }
        prop_assert_eq!(count(&command, "-i"), 2);
    }

    /// The waveform toggle does nothing when there is no music to draw.
    #[test]
    fn prop_waveform_without_music_is_noop(
        mute_foreground in any::<bool>(),
        mute_background in any::<bool>(),
        profile in arb_profile(),
    ) {
        let with_waveform = CompositionOptions { mute_foreground, mute_background, add_waveform: true };
        let without_waveform = CompositionOptions { add_waveform: false, ..with_waveform };

        prop_assert_eq!(
            build_command_with(&with_waveform, AssetsPresent::without_music(), &profile),
            build_command_with(&without_waveform, AssetsPresent::without_music(), &profile)
        );
    }

    /// Mute clauses are independent: one per muted source.
    #[test]
    fn prop_one_mute_clause_per_muted_source(
        options in arb_options(),
        assets in arb_assets(),
        profile in arb_profile(),
    ) {
        let command = build_command_with(&options, assets, &profile);
        let joined = command.join(" ");

        prop_assert_eq!(joined.contains("[1:a]anullsink"), options.mute_foreground);
        prop_assert_eq!(joined.contains("[0:a]anullsink"), options.mute_background);
        prop_assert_eq!(joined.matches("anullsink").count(),
            options.mute_foreground as usize + options.mute_background as usize);

        let expected_graphs = if options.mute_foreground || options.mute_background { 2 } else { 1 };
        prop_assert_eq!(filter_graphs(&command).len(), expected_graphs);
    }

    /// Inputs come first, in background, foreground, music order; the
    /// output name comes last, right after -shortest.
    #[test]
    fn prop_token_layout(
        options in arb_options(),
        assets in arb_assets(),
        profile in arb_profile(),
    ) {
        let command = build_command_with(&options, assets, &profile);

        prop_assert_eq!(&command[0..4], &["-i", "background.mp4", "-i", "foreground.mp4"]);
        if assets.music {
            prop_assert_eq!(&command[4..6], &["-i", "music.mp3"]);
        }

        let n = command.len();
        prop_assert_eq!(command[n - 1].as_str(), "output.mp4");
        prop_assert_eq!(command[n - 2].as_str(), "-shortest");
        prop_assert_eq!(count(&command, "-shortest"), 1);
    }

    /// A muted source's audio can never be selected for the output, under
    /// either mapping policy.
    #[test]
    fn prop_muted_audio_never_selected(
        options in arb_options(),
        assets in arb_assets(),
        profile in arb_profile(),
    ) {
        let command = build_command_with(&options, assets, &profile);
        let maps = map_targets(&command);

        if options.mute_background {
            prop_assert!(!maps.iter().any(|m| m.starts_with("0:a")));
        }
        if options.mute_foreground {
            prop_assert!(!maps.iter().any(|m| m.starts_with("1:a")));
        }
        // Without explicit maps the engine would choose audio on its own
        if options.mute_foreground || options.mute_background {
            prop_assert!(maps.contains(&"[vout]"));
        }
    }

    /// Every graph starts with the centred composite clause.
    #[test]
    fn prop_composite_clause_always_present(
        options in arb_options(),
        assets in arb_assets(),
        profile in arb_profile(),
    ) {
        let command = build_command_with(&options, assets, &profile);
        let graphs = filter_graphs(&command);
        prop_assert!(graphs[0].starts_with("[1:v][0:v]scale2ref[fg][bg];[bg][fg]overlay=(W-w)/2:(H-h)/2:shortest=1"));
        prop_assert_eq!(graphs[0].contains("showwaves"), options.add_waveform && assets.music);
    }
}

#[test]
fn test_two_inputs_no_flags() {
    let command = build_command(&CompositionOptions::default(), AssetsPresent::without_music());

    assert_eq!(count(&command, "-i"), 2);
    assert_eq!(filter_graphs(&command).len(), 1);
    assert_eq!(count(&command, "-map"), 1);
    assert!(command.contains(&"[vout]".to_string()));
    assert!(command.contains(&"-shortest".to_string()));
    assert_eq!(command.last().unwrap(), "output.mp4");
    assert!(!command.iter().any(|t| t.starts_with("2:")));
}

#[test]
fn test_three_inputs_with_waveform() {
    let options = CompositionOptions {
        add_waveform: true,
        ..Default::default()
    };
    let command = build_command(&options, AssetsPresent::with_music());

    assert_eq!(count(&command, "-i"), 3);
    let graphs = filter_graphs(&command);
    assert_eq!(graphs.len(), 1);
    assert!(graphs[0].contains("overlay=(W-w)/2:(H-h)/2:shortest=1[base]"));
    assert!(graphs[0].contains("[2:a]showwaves=s=1280x200:mode=cline:colors=cyan[waveform]"));
    assert!(graphs[0].ends_with("[base][waveform]overlay=W-w:H-h[vout]"));

    assert_eq!(map_targets(&command), vec!["[vout]", "2:a"]);
}

#[test]
fn test_music_without_waveform_still_maps_music_audio() {
    let command = build_command(&CompositionOptions::default(), AssetsPresent::with_music());
    let joined = command.join(" ");
    assert!(joined.contains("-map 2:a"));
    assert!(!joined.contains("showwaves"));
}

#[test]
fn test_both_mutes_produce_two_clauses() {
    let options = CompositionOptions {
        mute_foreground: true,
        mute_background: true,
        add_waveform: false,
    };
    let command = build_command(&options, AssetsPresent::without_music());
    let graphs = filter_graphs(&command);
    assert_eq!(graphs[1], "[1:a]anullsink;[0:a]anullsink");
}

#[test]
fn test_stream_copy_policy_tokens() {
    let profile = CommandProfile {
        mapping: MappingPolicy::StreamCopy,
        ..Default::default()
    };
    let options = CompositionOptions {
        add_waveform: true,
        ..Default::default()
    };
    let command = build_command_with(&options, AssetsPresent::with_music(), &profile);

    assert_eq!(count(&command, "-map"), 0);
    let graphs = filter_graphs(&command);
    assert!(graphs[0].ends_with("[base][waveform]overlay=W-w:H-h"));
    let joined = command.join(" ");
    assert!(joined.ends_with("-c:a copy -shortest output.mp4"));
}

#[test]
fn test_stream_copy_mute_background_keeps_foreground_audio() {
    let profile = CommandProfile {
        mapping: MappingPolicy::StreamCopy,
        ..Default::default()
    };
    let options = CompositionOptions {
        mute_background: true,
        ..Default::default()
    };
    let command = build_command_with(&options, AssetsPresent::without_music(), &profile);

    assert_eq!(map_targets(&command), vec!["[vout]", "1:a?"]);
    assert!(filter_graphs(&command)[0].ends_with("shortest=1[vout]"));
    assert!(command.join(" ").ends_with("-c:a copy -shortest output.mp4"));
}

#[test]
fn test_stream_copy_with_every_source_muted_drops_audio() {
    let profile = CommandProfile {
        mapping: MappingPolicy::StreamCopy,
        ..Default::default()
    };
    let options = CompositionOptions {
        mute_foreground: true,
        mute_background: true,
        add_waveform: false,
    };
    let command = build_command_with(&options, AssetsPresent::without_music(), &profile);

    assert_eq!(map_targets(&command), vec!["[vout]"]);
    assert!(command.contains(&"-an".to_string()));
    assert!(!command.contains(&"copy".to_string()));
}

#[test]
fn test_stream_copy_mute_with_music_maps_music() {
    let profile = CommandProfile {
        mapping: MappingPolicy::StreamCopy,
        ..Default::default()
    };
    let options = CompositionOptions {
        mute_foreground: true,
        ..Default::default()
    };
    let command = build_command_with(&options, AssetsPresent::with_music(), &profile);

    assert_eq!(map_targets(&command), vec!["[vout]", "2:a?"]);
}
