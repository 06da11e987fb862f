// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod orchestrator;
mod outcome;
mod progress;

pub use orchestrator::SearchPipeline;
pub use outcome::{PipelineOutput, PipelineStage, RunStats, StatusSignal};
pub use progress::{StageObserver, StageSpinner};
