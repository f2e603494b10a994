//! The four generation steps. Each takes the records it needs and returns
//! its own typed output, or a [`StepError`] the caller treats as fatal.

use pagegen_core::extract::{extract_list, extract_typed, format_instructions, Shaped};
use pagegen_core::{ComparisonPage, ExtractionError, FaqPage, ProductPage, ProductRecord, QuestionList};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::ServiceError;
use crate::prompts::{PromptError, PromptLibrary};
use crate::service::CompletionService;

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("model returned no usable questions ({dropped} entries without a question mark)")]
    NoQuestions { dropped: usize },
    #[error("received {answers} answers for {questions} questions")]
    AnswerCountMismatch { questions: usize, answers: usize },
}

impl StepError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Service(_) => "service",
            Self::Extraction(error) => error.error_class(),
            Self::Prompt(_) => "prompt",
            Self::NoQuestions { .. } => "no_questions",
            Self::AnswerCountMismatch { .. } => "answer_count_mismatch",
        }
    }
}

pub struct PageSteps {
    service: CompletionService,
    prompts: PromptLibrary,
    target_question_count: usize,
}

impl PageSteps {
    pub fn new(service: CompletionService, prompts: PromptLibrary, target_question_count: usize) -> Self {
        Self { service, prompts, target_question_count }
    }

    /// Asks for `target_question_count` questions. Fewer is a warning; none is an error.
    pub async fn generate_questions(&self, product: &ProductRecord) -> Result<QuestionList, StepError> {
        let prompt =
            self.prompts.question_generation(&product.to_prompt_json(), self.target_question_count)?;
        let raw = self.service.complete(&prompt).await?;
        let (questions, dropped) = QuestionList::from_candidates(extract_list(&raw)?);

        if dropped > 0 {
            warn!(
                event_name = "pipeline.questions.dropped",
                dropped,
                "ignored list entries that are not questions"
            );
        }
        if questions.is_empty() {
            return Err(StepError::NoQuestions { dropped });
        }
        if let Some(missing) = questions.shortfall(self.target_question_count) {
            warn!(
                event_name = "pipeline.questions.short",
                received = questions.len(),
                target = self.target_question_count,
                missing,
                "model returned fewer questions than requested; continuing"
            );
        }

        Ok(questions)
    }

    /// Answers every question concurrently; all answers or none.
    pub async fn answer_questions(
        &self,
        product: &ProductRecord,
        questions: &QuestionList,
    ) -> Result<FaqPage, StepError> {
        let product_json = product.to_prompt_json();
        let prompts = questions
            .iter()
            .map(|question| self.prompts.faq_answer(&product_json, question))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            event_name = "pipeline.faq.dispatch",
            questions = questions.len(),
            "answering questions concurrently"
        );
        let answers = self.service.complete_batch(prompts).await?;
        let answer_count = answers.len();

        FaqPage::from_answers(questions, answers).ok_or(StepError::AnswerCountMismatch {
            questions: questions.len(),
            answers: answer_count,
        })
    }

    pub async fn draft_product_page(&self, product: &ProductRecord) -> Result<ProductPage, StepError> {
        let instructions = format_instructions(&ProductPage::shape());
        let prompt = self.prompts.product_page(&product.to_prompt_json(), &instructions)?;
        let raw = self.service.complete(&prompt).await?;
        Ok(extract_typed::<ProductPage>(&raw)?)
    }

    /// Invents a competitor as free text, then builds the comparison from it.
    pub async fn draft_comparison(&self, product: &ProductRecord) -> Result<ComparisonPage, StepError> {
        let competitor_prompt = self.prompts.competitor(&product.name)?;
        let competitor_text = self.service.complete(&competitor_prompt).await?;
        info!(
            event_name = "pipeline.comparison.competitor_drafted",
            competitor_chars = competitor_text.len(),
            "fictional competitor drafted"
        );

        let instructions = format_instructions(&ComparisonPage::shape());
        let prompt =
            self.prompts.comparison(&product.to_prompt_json(), competitor_text.trim(), &instructions)?;
        let raw = self.service.complete(&prompt).await?;
        Ok(extract_typed::<ComparisonPage>(&raw)?)
    }
}
