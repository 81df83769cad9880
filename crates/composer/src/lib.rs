// Video compositing library: command building, engine plumbing, submission

pub mod assets;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod report;
pub mod startup;
pub mod submit;

// Re-export commonly used types
pub use assets::{AssetsPresent, MediaAsset, MediaRole};
pub use command::{build_command, build_command_with, CommandProfile, CompositionOptions};
pub use config::ComposerConfig;
pub use engine::{Engine, EngineEvent, LocalEngine};
pub use error::SubmitError;
pub use progress::ProgressState;
pub use submit::{CompositionOutput, Compositor, SubmissionRequest};
