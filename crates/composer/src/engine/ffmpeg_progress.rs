// Parsers for FFmpeg's `-progress` records and stderr headers

use regex::Regex;
use std::sync::OnceLock;

/// A single `key=value` record from `-progress pipe:1`
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressRecord {
    /// Output timestamp reached so far, in seconds
    OutTime(f64),
    /// `progress=end`
    End,
    Other,
}

pub fn parse_progress_line(line: &str) -> ProgressRecord {
    let trimmed = line.trim();
    let Some((key, value)) = trimmed.split_once('=') else {
        return ProgressRecord::Other;
    };

    match key {
        // Both keys carry microseconds despite the name of the second
        "out_time_us" | "out_time_ms" => value
            .parse::<i64>()
            .ok()
            .filter(|us| *us >= 0)
            .map(|us| ProgressRecord::OutTime(us as f64 / 1_000_000.0))
            .unwrap_or(ProgressRecord::Other),
        "out_time" => parse_out_time(value)
            .map(ProgressRecord::OutTime)
            .unwrap_or(ProgressRecord::Other),
        "progress" if value == "end" => ProgressRecord::End,
        _ => ProgressRecord::Other,
    }
}

/// Parse `HH:MM:SS.fraction` into seconds
pub fn parse_out_time(val: &str) -> Option<f64> {
    let parts: Vec<&str> = val.trim().split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let h = parts.first()?.parse::<f64>().ok()?;
    let m = parts.get(1)?.parse::<f64>().ok()?;
    let s = parts.get(2)?.parse::<f64>().ok()?;
    if h < 0.0 || m < 0.0 || s < 0.0 {
        return None;
    }
    Some(h * 3600.0 + m * 60.0 + s)
}

fn duration_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Duration:\s*(\d+:\d{2}:\d{2}(?:\.\d+)?)").ok())
        .as_ref()
}

/// Extract the input duration from a stderr line such as
/// `  Duration: 00:00:12.34, start: 0.000000, bitrate: 1205 kb/s`.
/// Returns `None` for `Duration: N/A` and unrelated lines.
pub fn parse_duration_line(line: &str) -> Option<f64> {
    let caps = duration_regex()?.captures(line)?;
    parse_out_time(&caps[1])
}

/// Completed fraction of a job, clamped to `[0, 1]`
pub fn fraction(out_time_secs: f64, total_secs: f64) -> Option<f64> {
    if total_secs <= 0.0 || !total_secs.is_finite() || !out_time_secs.is_finite() {
        return None;
    }
    Some((out_time_secs / total_secs).clamp(0.0, 1.0))
}
