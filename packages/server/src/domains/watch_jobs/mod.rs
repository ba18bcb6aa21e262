//! Watch jobs domain - timer-driven page checks and their lifecycle

pub mod engine;
pub mod errors;
pub mod matcher;
pub mod models;
pub mod notification;
pub mod pipeline;
pub mod probes;

pub use engine::{SyncReport, WatchEngine};
pub use errors::{EngineError, NotificationError, PipelineError};
pub use matcher::{ExtractionPattern, PatternError};
pub use models::{Job, JobInput, PatternStatus, RunStatus};
pub use pipeline::PipelineOutcome;
pub use probes::{PatternProbe, REGEX_PATTERN_TYPE};
