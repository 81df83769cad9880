use crate::assets::MediaRole;
use thiserror::Error;

/// Why a submission failed. Every variant stops at the submission boundary
/// and is shown to the user through `user_message`.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("missing required input: {}", join_roles(.missing))]
    MissingInput { missing: Vec<MediaRole> },

    #[error("engine not ready: {0}")]
    EngineNotReady(String),

    #[error("engine execution failed: {0}")]
    EngineExecution(String),
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::MissingInput { .. } => {
                "Please provide both a background and a foreground video.".to_string()
            }
            SubmitError::EngineNotReady(_) => {
                "The transcoding engine is not loaded. Check the ffmpeg installation and try again."
                    .to_string()
            }
            SubmitError::EngineExecution(message) => {
                format!("An error occurred: {}. Please try again.", message)
            }
        }
    }

    pub(crate) fn execution(err: anyhow::Error) -> Self {
        SubmitError::EngineExecution(format!("{:#}", err))
    }
}

fn join_roles(roles: &[MediaRole]) -> String {
    roles
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
