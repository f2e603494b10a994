//! Core records and rules for generating product marketing pages.
//!
//! - `domain`: the product input and the three page records
//! - `extract`: validation and parsing of model output into typed records
//! - `flows`: the fixed stage order of a generation run
//! - `artifacts`: JSON file output
//! - `config`: layered configuration with fail-fast validation

pub mod artifacts;
pub mod config;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod flows;

pub use artifacts::{ArtifactKind, ArtifactWriter};
pub use domain::pages::{ComparisonItem, ComparisonPage, FaqItem, FaqPage, ProductPage};
pub use domain::product::ProductRecord;
pub use domain::questions::QuestionList;
pub use errors::{ArtifactWriteError, ExtractionError, TypeMismatch};
pub use extract::{extract_list, extract_record, extract_typed, RecordShape, Shaped};
pub use flows::{PipelineEvent, PipelineFlow, PipelineStage, PipelineTransitionError};
