pub mod ffmpeg_progress;
pub mod local;

use anyhow::Result;
use tokio::sync::broadcast;

pub use local::{EngineConfig, LocalEngine};

/// Notification published by an engine while it runs
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Fraction of the job completed, 0.0..=1.0
    Progress(f64),
    /// One diagnostic line
    Log(String),
}

/// A transcoding engine with its own flat file namespace.
///
/// Callers stage inputs with `write_file`, run `exec`, collect results with
/// `read_file` and remove everything they wrote with `delete_file`. Two
/// `exec` calls must not overlap on one instance since they share names.
#[allow(async_fn_in_trait)]
pub trait Engine {
    /// Whether the engine finished its own initialisation
    fn is_loaded(&self) -> bool;

    /// Subscribe to progress and log events
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<()>;

    async fn exec(&self, args: &[String]) -> Result<()>;

    async fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    async fn delete_file(&self, name: &str) -> Result<()>;
}
