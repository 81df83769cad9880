// Engine backed by a local ffmpeg binary and a private scratch directory

use super::ffmpeg_progress::{fraction, parse_duration_line, parse_progress_line, ProgressRecord};
use super::{Engine, EngineEvent};
use crate::startup::{check_ffmpeg_version, detect_missing_filters};
use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

/// Number of stderr lines kept for error reports
const STDERR_TAIL_LINES: usize = 20;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub ffmpeg_path: PathBuf,
    /// Parent directory for per-instance storage
    pub scratch_root: PathBuf,
}

pub struct LocalEngine {
    config: EngineConfig,
    storage_dir: PathBuf,
    loaded: AtomicBool,
    events: broadcast::Sender<EngineEvent>,
}

impl LocalEngine {
    /// Create an engine handle. Nothing touches the disk until `load`.
    pub fn new(config: EngineConfig) -> Self {
        let storage_dir = config.scratch_root.join(Uuid::new_v4().to_string());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            storage_dir,
            loaded: AtomicBool::new(false),
            events,
        }
    }

    /// Verify the ffmpeg installation and prepare engine storage
    pub async fn load(&self) -> Result<()> {
        let binary = &self.config.ffmpeg_path;

        let (major, minor, patch) = check_ffmpeg_version(binary).await?;
        info!("FFmpeg version: {}.{}.{}", major, minor, patch);

        let missing = detect_missing_filters(binary).await?;
        if !missing.is_empty() {
            bail!(
                "ffmpeg at {} lacks required filters: {}",
                binary.display(),
                missing.join(", ")
            );
        }

        self.prepare_storage().await?;
        self.loaded.store(true, Ordering::SeqCst);
        info!("Engine storage ready at {:?}", self.storage_dir);
        Ok(())
    }

    /// Create the storage directory without running any startup checks
    pub async fn prepare_storage(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .with_context(|| format!("Failed to create engine storage {:?}", self.storage_dir))
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Names currently held in engine storage, sorted
    pub fn stored_files(&self) -> Result<Vec<String>> {
        if !self.storage_dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.storage_dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        validate_storage_name(name)?;
        Ok(self.storage_dir.join(name))
    }

    fn publish(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Engine storage is flat: plain file names only
pub fn validate_storage_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." {
        bail!("Invalid engine storage name {:?}", name);
    }
    if name.contains(|c: char| c == '/' || c == '\\' || c == '\0') {
        bail!("Engine storage names cannot contain path separators: {:?}", name);
    }
    Ok(())
}

impl Engine for LocalEngine {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write {} to engine storage", name))
    }

    async fn exec(&self, args: &[String]) -> Result<()> {
        let mut cmd = Command::new(&self.config.ffmpeg_path);
        cmd.current_dir(&self.storage_dir)
            .args(["-hide_banner", "-y", "-nostats", "-progress", "pipe:1"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| anyhow!("Failed to spawn ffmpeg: {}", e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("Failed to capture stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("Failed to capture stderr"))?;

        // Shortest input duration seen so far; the output stops there
        let (duration_tx, duration_rx) = watch::channel::<Option<f64>>(None);

        let log_events = self.events.clone();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail: Vec<String> = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(secs) = parse_duration_line(&line) {
                    duration_tx.send_if_modified(|current| {
                        let shorter = current.map_or(true, |existing| secs < existing);
                        if shorter {
                            *current = Some(secs);
                        }
                        shorter
                    });
                }
                debug!(target: "ffmpeg", "{}", line);
                let _ = log_events.send(EngineEvent::Log(line.clone()));
                if tail.len() == STDERR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }
            tail
        });

        let mut reader = BufReader::new(stdout).lines();
        let mut read_error = None;
        loop {
            let line = match reader.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            };
            match parse_progress_line(&line) {
                ProgressRecord::OutTime(secs) => {
                    let total = *duration_rx.borrow();
                    if let Some(f) = total.and_then(|total| fraction(secs, total)) {
                        self.publish(EngineEvent::Progress(f));
                    }
                }
                ProgressRecord::End => {
                    self.publish(EngineEvent::Progress(1.0));
                    break;
                }
                ProgressRecord::Other => {}
            }
        }

        if read_error.is_some() {
            // Progress is lost; don't leave ffmpeg running unobserved
            if let Err(e) = child.start_kill() {
                debug!("ffmpeg already exited: {}", e);
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| anyhow!("Failed to wait for ffmpeg: {}", e))?;

        let stderr_tail = stderr_task
            .await
            .map_err(|e| anyhow!("Failed to read stderr: {}", e))?;

        if let Some(e) = read_error {
            return Err(anyhow!(
                "Failed to read ffmpeg progress from stdout: {}: {}",
                e,
                stderr_tail.join("\n")
            ));
        }

        if !status.success() {
            return Err(anyhow!(
                "FFmpeg failed with exit code {:?}: {}",
                status.code(),
                stderr_tail.join("\n")
            ));
        }

        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {} from engine storage", name))
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to delete {} from engine storage", name))
    }
}

impl Drop for LocalEngine {
    fn drop(&mut self) {
        if self.storage_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.storage_dir) {
                warn!("Failed to remove engine storage {:?}: {}", self.storage_dir, e);
            }
        }
    }
}
