use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, info, warn};

use crate::assets::{AssetsPresent, MediaAsset, MediaRole};
use crate::command::{build_command_with, CommandProfile, CompositionOptions};
use crate::engine::{Engine, EngineEvent};
use crate::error::SubmitError;
use crate::progress::ProgressState;

/// Inputs of one submission, as picked by the user
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    pub background: Option<MediaAsset>,
    pub foreground: Option<MediaAsset>,
    pub music: Option<MediaAsset>,
    pub options: CompositionOptions,
}

impl SubmissionRequest {
    pub fn assets_present(&self) -> AssetsPresent {
        AssetsPresent {
            music: self.music.is_some(),
        }
    }

    /// Required roles that were not supplied
    pub fn missing_roles(&self) -> Vec<MediaRole> {
        let mut missing = Vec::new();
        if self.background.is_none() {
            missing.push(MediaRole::Background);
        }
        if self.foreground.is_none() {
            missing.push(MediaRole::Foreground);
        }
        missing
    }
}

/// The finished video, ready to be handed to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionOutput {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: &'static str,
    pub command: Vec<String>,
}

/// Runs submissions against one engine instance, one at a time
pub struct Compositor<E: Engine> {
    engine: E,
    profile: CommandProfile,
    progress: ProgressState,
    gate: Semaphore,
}

impl<E: Engine> Compositor<E> {
    pub fn new(engine: E, profile: CommandProfile) -> Self {
        Self {
            engine,
            profile,
            progress: ProgressState::new(),
            gate: Semaphore::new(1),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn profile(&self) -> &CommandProfile {
        &self.profile
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    /// Whether a submission currently holds the engine
    pub fn is_busy(&self) -> bool {
        self.gate.available_permits() == 0
    }

    /// Command a request would run, without touching the engine
    pub fn preview_command(&self, request: &SubmissionRequest) -> Vec<String> {
        build_command_with(&request.options, request.assets_present(), &self.profile)
    }

    /// Stage the assets, run the engine and collect the output.
    ///
    /// Engine storage is emptied of everything this call wrote on every
    /// path, so the next submission starts clean. Concurrent callers queue.
    pub async fn submit(&self, request: SubmissionRequest) -> Result<CompositionOutput, SubmitError> {
        let missing = request.missing_roles();
        if !missing.is_empty() {
            return Err(SubmitError::MissingInput { missing });
        }

        if !self.engine.is_loaded() {
            return Err(SubmitError::EngineNotReady(
                "engine has not finished loading".to_string(),
            ));
        }

        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| SubmitError::EngineNotReady(e.to_string()))?;

        self.progress.reset();
        let command = self.preview_command(&request);

        let mut written: Vec<&'static str> = Vec::new();
        let result = self.run(&request, &command, &mut written).await;

        self.cleanup(&written).await;
        self.progress.reset();

        match &result {
            Ok(output) => info!(
                "Composition finished: {} ({} bytes)",
                output.file_name,
                output.bytes.len()
            ),
            Err(e) => warn!("Composition failed: {}", e),
        }

        result
    }

    async fn run(
        &self,
        request: &SubmissionRequest,
        command: &[String],
        written: &mut Vec<&'static str>,
    ) -> Result<CompositionOutput, SubmitError> {
        let assets = [&request.background, &request.foreground, &request.music];
        for asset in assets.into_iter().flatten() {
            let name = asset.role.storage_name();
            debug!("Writing {} ({} bytes) to engine storage", name, asset.len());
            self.engine
                .write_file(name, &asset.bytes)
                .await
                .map_err(SubmitError::execution)?;
            written.push(name);
        }

        info!("Running engine: {}", command.join(" "));
        self.exec_with_progress(command)
            .await
            .map_err(SubmitError::execution)?;

        let output_name = self.profile.output_name.as_str();
        debug!("Reading {} from engine storage", output_name);
        let bytes = self
            .engine
            .read_file(output_name)
            .await
            .map_err(SubmitError::execution)?;

        if bytes.is_empty() {
            return Err(SubmitError::EngineExecution(format!(
                "engine produced an empty {}",
                output_name
            )));
        }

        Ok(CompositionOutput {
            bytes,
            file_name: self.profile.output_name.clone(),
            mime_type: "video/mp4",
            command: command.to_vec(),
        })
    }

    /// Run the engine while feeding its events into the progress state.
    /// Event handling never waits, so it cannot hold the engine back.
    async fn exec_with_progress(&self, command: &[String]) -> anyhow::Result<()> {
        let mut events = self.engine.subscribe();
        let mut events_open = true;

        let exec = self.engine.exec(command);
        tokio::pin!(exec);

        let result = loop {
            // Pending events are applied before the engine is polled again
            tokio::select! {
                biased;
                event = events.recv(), if events_open => {
                    events_open = apply_event(event, &self.progress);
                }
                result = &mut exec => break result,
            }
        };

        // Events published just before exec returned
        while let Ok(event) = events.try_recv() {
            apply_event(Ok(event), &self.progress);
        }

        result
    }

    /// Best effort: failures are logged, never surfaced
    async fn cleanup(&self, written: &[&'static str]) {
        for name in written {
            if let Err(e) = self.engine.delete_file(name).await {
                warn!("Failed to remove {} from engine storage: {:#}", name, e);
            }
        }

        // The output only exists if the engine got far enough to create it
        let output_name = self.profile.output_name.as_str();
        if let Err(e) = self.engine.delete_file(output_name).await {
            debug!("No {} to remove from engine storage: {:#}", output_name, e);
        }
    }
}

/// Returns false once the engine's event stream is closed
fn apply_event(
    event: Result<EngineEvent, broadcast::error::RecvError>,
    progress: &ProgressState,
) -> bool {
    match event {
        Ok(EngineEvent::Progress(fraction)) => {
            progress.advance(fraction);
        }
        Ok(EngineEvent::Log(line)) => debug!(target: "engine", "{}", line),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            debug!("Progress listener skipped {} engine events", skipped);
        }
        Err(broadcast::error::RecvError::Closed) => return false,
    }
    true
}
