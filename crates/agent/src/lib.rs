//! Generation runtime: talks to the completion backend and drives the
//! fixed four-step pipeline that turns one product record into pages.
//!
//! # Flow
//!
//! 1. **Question generation** (`steps`) - one call, parsed as a JSON list
//! 2. **FAQ answering** - one call per question, fanned out concurrently
//! 3. **Product page drafting** - one call, validated against the page shape
//! 4. **Comparison drafting** - a free-text competitor, then a validated matrix
//!
//! `pipeline::Pipeline` runs the steps in order and writes the artifacts.
//! `service::CompletionService` owns timeouts, retries and batch fan-out so
//! that `llm::LlmClient` implementations stay a single request/response.

pub mod chat;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod service;
pub mod steps;

pub use chat::ChatCompletionsClient;
pub use llm::{LlmClient, ServiceError, ServiceErrorKind};
pub use pipeline::{ArtifactOutcome, Pipeline, PipelineError, PipelineReport};
pub use prompts::{PromptError, PromptLibrary};
pub use service::{CallLimits, CompletionService, RetryPolicy};
pub use steps::{PageSteps, StepError};
