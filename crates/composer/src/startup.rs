use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::path::Path;
use tokio::process::Command;

/// Oldest FFmpeg major release known to ship every filter we rely on
pub const MIN_FFMPEG_MAJOR: u32 = 5;

/// Filters the generated commands reference
pub const REQUIRED_FILTERS: [&str; 4] = ["scale2ref", "overlay", "showwaves", "anullsink"];

pub async fn check_ffmpeg_version(binary: &Path) -> Result<(u32, u32, u32)> {
    let output = Command::new(binary)
        .arg("-version")
        .output()
        .await
        .with_context(|| {
            format!(
                "Failed to execute {} -version. Is ffmpeg installed and in PATH?",
                binary.display()
            )
        })?;

    if !output.status.success() {
        return Err(anyhow!("{} -version command failed", binary.display()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let (major, minor, patch) = parse_ffmpeg_version(&stdout).ok_or_else(|| {
        anyhow!("Failed to parse ffmpeg version from output: {}", stdout)
    })?;

    if major < MIN_FFMPEG_MAJOR {
        return Err(anyhow!(
            "FFmpeg version {}.{}.{} is too old. Version {}.0 or higher is required.",
            major,
            minor,
            patch,
            MIN_FFMPEG_MAJOR
        ));
    }

    Ok((major, minor, patch))
}

/// Parse a banner like "ffmpeg version 6.1.1" or "ffmpeg version n7.0".
/// A missing patch component reads as 0.
pub fn parse_ffmpeg_version(banner: &str) -> Option<(u32, u32, u32)> {
    let re = Regex::new(r"ffmpeg version[^\d]*(\d+)\.(\d+)(?:\.(\d+))?").ok()?;
    let caps = re.captures(banner)?;

    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    let patch = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    Some((major, minor, patch))
}

pub async fn detect_missing_filters(binary: &Path) -> Result<Vec<&'static str>> {
    let output = Command::new(binary)
        .arg("-hide_banner")
        .arg("-filters")
        .output()
        .await
        .with_context(|| format!("Failed to execute {} -filters", binary.display()))?;

    if !output.status.success() {
        return Err(anyhow!("{} -filters command failed", binary.display()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(missing_filters(&stdout))
}

/// Required filters absent from an `ffmpeg -filters` listing
pub fn missing_filters(listing: &str) -> Vec<&'static str> {
    let available: Vec<&str> = listing
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .collect();

    REQUIRED_FILTERS
        .iter()
        .copied()
        .filter(|name| !available.contains(name))
        .collect()
}
