use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vidlay_composer::config::load_config;
use vidlay_composer::report::{save_report, SubmissionReport};
use vidlay_composer::{
    CompositionOptions, CompositionOutput, Compositor, LocalEngine, MediaAsset, MediaRole,
    SubmissionRequest,
};

#[derive(Parser, Debug)]
#[command(name = "vidlay")]
#[command(about = "Overlay a foreground video on a background video", long_about = None)]
#[command(version)]
struct Args {
    /// Background video file
    #[arg(long, value_name = "FILE")]
    background: Option<PathBuf>,

    /// Foreground video file, scaled to the background and centred
    #[arg(long, value_name = "FILE")]
    foreground: Option<PathBuf>,

    /// Background music file (MP3)
    #[arg(long, value_name = "FILE")]
    music: Option<PathBuf>,

    /// Mute the foreground video's audio
    #[arg(long)]
    mute_foreground: bool,

    /// Mute the background video's audio
    #[arg(long)]
    mute_background: bool,

    /// Draw the music's waveform in the bottom-right corner
    #[arg(long)]
    waveform: bool,

    /// Where to write the composited video
    #[arg(short, long, value_name = "FILE", default_value = "output.mp4")]
    output: PathBuf,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a JSON report of the submission
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Print the ffmpeg command and exit
    #[arg(long)]
    print_command: bool,
}

impl Args {
    fn options(&self) -> CompositionOptions {
        CompositionOptions {
            mute_foreground: self.mute_foreground,
            mute_background: self.mute_background,
            add_waveform: self.waveform,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let request = SubmissionRequest {
        background: load_asset(MediaRole::Background, args.background.as_deref()).await?,
        foreground: load_asset(MediaRole::Foreground, args.foreground.as_deref()).await?,
        music: load_asset(MediaRole::Music, args.music.as_deref()).await?,
        options: args.options(),
    };

    let engine = LocalEngine::new(config.engine_config());
    let compositor = Compositor::new(engine, config.profile());

    // The command only exists once both required videos are known
    let command = if request.missing_roles().is_empty() {
        compositor.preview_command(&request)
    } else {
        Vec::new()
    };

    if args.print_command {
        if command.is_empty() {
            anyhow::bail!("--background and --foreground are required to build a command");
        }
        let ffmpeg = config.ffmpeg_path.to_string_lossy();
        let quoted = shlex::try_join(
            std::iter::once(&*ffmpeg).chain(command.iter().map(String::as_str)),
        )
        .context("Command contains characters that cannot be quoted")?;
        println!("{}", quoted);
        return Ok(());
    }

    info!("vidlay v{}", env!("CARGO_PKG_VERSION"));

    // Submission reports EngineNotReady if this fails
    if let Err(e) = compositor.engine().load().await {
        error!("Failed to load ffmpeg: {:#}", e);
    }

    let mut report = SubmissionReport::begin(request.options, request.assets_present(), command);

    let progress_task = {
        let mut updates = compositor.progress().subscribe();
        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let pct = *updates.borrow_and_update();
                if pct > 0 {
                    info!("Processing video... {}%", pct);
                }
            }
        })
    };

    let outcome = compositor.submit(request).await;
    progress_task.abort();

    let result = match outcome {
        Ok(output) => deliver(&output, &args.output, &mut report).await,
        Err(e) => {
            report.fail(&e);
            error!("{}", e.user_message());
            Err(anyhow::anyhow!(e))
        }
    };

    if let Some(report_path) = &args.report {
        if let Err(e) = save_report(&report, report_path) {
            warn!("Failed to write report to {:?}: {}", report_path, e);
        }
    }

    result
}

/// Write the output and record the outcome, so a failed write still
/// leaves a report behind
async fn deliver(
    output: &CompositionOutput,
    path: &Path,
    report: &mut SubmissionReport,
) -> Result<()> {
    let written = tokio::fs::write(path, &output.bytes)
        .await
        .with_context(|| format!("Failed to write output to {:?}", path));

    match written {
        Ok(()) => {
            report.succeed(output);
            info!(
                "Wrote {} ({} bytes, {})",
                path.display(),
                output.bytes.len(),
                output.mime_type
            );
            Ok(())
        }
        Err(e) => {
            report.fail_with(format!("{:#}", e));
            error!("{:#}", e);
            Err(e)
        }
    }
}

async fn load_asset(role: MediaRole, path: Option<&Path>) -> Result<Option<MediaAsset>> {
    match path {
        Some(path) => Ok(Some(MediaAsset::load(role, path).await?)),
        None => Ok(None),
    }
}
