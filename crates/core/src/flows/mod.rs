pub mod engine;
pub mod states;

pub use engine::{PipelineFlow, PipelineTransitionError};
pub use states::{PipelineEvent, PipelineStage, TransitionOutcome};
