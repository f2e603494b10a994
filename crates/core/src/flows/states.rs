use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    QuestionGeneration,
    FaqAnswering,
    ProductPageDrafting,
    ComparisonDrafting,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuestionGeneration => "question_generation",
            Self::FaqAnswering => "faq_answering",
            Self::ProductPageDrafting => "product_page_drafting",
            Self::ComparisonDrafting => "comparison_drafting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineEvent {
    StageSucceeded,
    StageFailed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: PipelineStage,
    pub to: PipelineStage,
    pub event: PipelineEvent,
}
