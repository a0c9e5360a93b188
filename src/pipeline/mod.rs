pub mod orchestrator;
mod types;

pub use orchestrator::run_pipeline;
pub use types::{ImageSelection, PipelineInput, PipelineOutcome};
