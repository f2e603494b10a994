use thiserror::Error;

use crate::flows::states::{PipelineEvent, PipelineStage, TransitionOutcome};

/// Fixed linear order: no skips, no retries, any failure is terminal.
#[derive(Clone, Debug, Default)]
pub struct PipelineFlow;

impl PipelineFlow {
    pub fn initial_stage(&self) -> PipelineStage {
        PipelineStage::QuestionGeneration
    }

    pub fn apply(
        &self,
        current: PipelineStage,
        event: PipelineEvent,
    ) -> Result<TransitionOutcome, PipelineTransitionError> {
        transition(current, event)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineTransitionError {
    #[error("stage {stage} is terminal and accepts no {event:?} event")]
    Terminal { stage: PipelineStage, event: PipelineEvent },
}

fn transition(
    current: PipelineStage,
    event: PipelineEvent,
) -> Result<TransitionOutcome, PipelineTransitionError> {
    use PipelineEvent::{StageFailed, StageSucceeded};
    use PipelineStage::{
        ComparisonDrafting, Done, Failed, FaqAnswering, ProductPageDrafting, QuestionGeneration,
    };

    let to = match (current, event) {
        (Done | Failed, _) => {
            return Err(PipelineTransitionError::Terminal { stage: current, event });
        }
        (_, StageFailed) => Failed,
        (QuestionGeneration, StageSucceeded) => FaqAnswering,
        (FaqAnswering, StageSucceeded) => ProductPageDrafting,
        (ProductPageDrafting, StageSucceeded) => ComparisonDrafting,
        (ComparisonDrafting, StageSucceeded) => Done,
    };

    Ok(TransitionOutcome { from: current, to, event })
}
