use std::future::Future;
use std::path::PathBuf;

use pagegen_core::{
    ArtifactKind, ArtifactWriteError, ArtifactWriter, ComparisonPage, FaqPage, PipelineEvent,
    PipelineFlow, PipelineStage, PipelineTransitionError, ProductPage, ProductRecord,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::steps::{PageSteps, StepError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage {stage} failed: {source}")]
    Step {
        stage: PipelineStage,
        #[source]
        source: StepError,
    },
    #[error(transparent)]
    Transition(#[from] PipelineTransitionError),
}

impl PipelineError {
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Step { stage, .. } => Some(*stage),
            Self::Transition(PipelineTransitionError::Terminal { stage, .. }) => Some(*stage),
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Step { source, .. } => source.error_class(),
            Self::Transition(_) => "transition",
        }
    }
}

#[derive(Debug)]
pub struct ArtifactOutcome {
    pub kind: ArtifactKind,
    pub result: Result<PathBuf, ArtifactWriteError>,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: String,
    pub questions_generated: usize,
    pub faq_page: FaqPage,
    pub product_page: ProductPage,
    pub comparison_page: ComparisonPage,
    pub artifacts: Vec<ArtifactOutcome>,
}

impl PipelineReport {
    pub fn write_failures(&self) -> impl Iterator<Item = &ArtifactWriteError> {
        self.artifacts.iter().filter_map(|outcome| outcome.result.as_ref().err())
    }

    pub fn all_artifacts_written(&self) -> bool {
        self.artifacts.iter().all(|outcome| outcome.result.is_ok())
    }
}

/// Runs the four steps in order, writing each artifact as soon as its step
/// finishes. A failed step ends the run; a failed write does not.
pub struct Pipeline {
    steps: PageSteps,
    writer: ArtifactWriter,
    flow: PipelineFlow,
}

impl Pipeline {
    pub fn new(steps: PageSteps, writer: ArtifactWriter) -> Self {
        Self { steps, writer, flow: PipelineFlow }
    }

    pub async fn run(&self, product: &ProductRecord) -> Result<PipelineReport, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        let mut stage = self.flow.initial_stage();
        let mut artifacts = Vec::with_capacity(3);

        info!(
            event_name = "pipeline.run.started",
            run_id = %run_id,
            product = %product.name,
            "generation run started"
        );

        let questions =
            self.run_stage(&run_id, &mut stage, self.steps.generate_questions(product)).await?;
        info!(
            event_name = "pipeline.questions.generated",
            run_id = %run_id,
            count = questions.len(),
            "questions ready"
        );

        let faq_page = self
            .run_stage(&run_id, &mut stage, self.steps.answer_questions(product, &questions))
            .await?;
        artifacts.push(self.write_artifact(&run_id, ArtifactKind::Faq, &faq_page));

        let product_page =
            self.run_stage(&run_id, &mut stage, self.steps.draft_product_page(product)).await?;
        artifacts.push(self.write_artifact(&run_id, ArtifactKind::ProductPage, &product_page));

        let comparison_page =
            self.run_stage(&run_id, &mut stage, self.steps.draft_comparison(product)).await?;
        artifacts.push(self.write_artifact(&run_id, ArtifactKind::ComparisonPage, &comparison_page));

        info!(
            event_name = "pipeline.run.completed",
            run_id = %run_id,
            stage = %stage,
            write_failures = artifacts.iter().filter(|outcome| outcome.result.is_err()).count(),
            "generation run completed"
        );

        Ok(PipelineReport {
            run_id,
            questions_generated: questions.len(),
            faq_page,
            product_page,
            comparison_page,
            artifacts,
        })
    }

    async fn run_stage<T, F>(
        &self,
        run_id: &str,
        stage: &mut PipelineStage,
        step: F,
    ) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, StepError>>,
    {
        let current = *stage;
        info!(event_name = "pipeline.stage.started", run_id, stage = %current, "stage started");

        match step.await {
            Ok(output) => {
                let next = self.flow.apply(current, PipelineEvent::StageSucceeded)?.to;
                *stage = next;
                info!(
                    event_name = "pipeline.stage.completed",
                    run_id,
                    stage = %current,
                    next = %next,
                    "stage completed"
                );
                Ok(output)
            }
            Err(source) => {
                *stage = self.flow.apply(current, PipelineEvent::StageFailed)?.to;
                error!(
                    event_name = "pipeline.stage.failed",
                    run_id,
                    stage = %current,
                    error_class = source.error_class(),
                    error = %source,
                    "stage failed; aborting run"
                );
                Err(PipelineError::Step { stage: current, source })
            }
        }
    }

    fn write_artifact<T: Serialize>(
        &self,
        run_id: &str,
        kind: ArtifactKind,
        record: &T,
    ) -> ArtifactOutcome {
        let result = self.writer.write(kind, record);
        match &result {
            Ok(path) => info!(
                event_name = "pipeline.artifact.written",
                run_id,
                artifact = %kind,
                path = %path.display(),
                "artifact written"
            ),
            Err(write_error) => warn!(
                event_name = "pipeline.artifact.write_failed",
                run_id,
                artifact = %kind,
                error = %write_error,
                "artifact write failed; continuing with remaining artifacts"
            ),
        }
        ArtifactOutcome { kind, result }
    }
}
