use std::fmt;
use std::io;

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeMismatch {
    pub field: String,
    pub expected: String,
    pub found: String,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` expected {} but found {}", self.field, self.expected, self.found)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("model output is not a JSON array of strings: {reason}")]
    MalformedList { reason: String },
    #[error(
        "model output does not match `{shape}`: missing fields {missing_fields:?}, type mismatches [{}]",
        render_mismatches(.type_mismatches)
    )]
    SchemaValidation {
        shape: String,
        missing_fields: Vec<String>,
        type_mismatches: Vec<TypeMismatch>,
    },
}

impl ExtractionError {
    pub fn malformed_list(reason: impl Into<String>) -> Self {
        Self::MalformedList { reason: reason.into() }
    }

    pub fn missing_fields(&self) -> &[String] {
        match self {
            Self::SchemaValidation { missing_fields, .. } => missing_fields,
            Self::MalformedList { .. } => &[],
        }
    }

    pub fn type_mismatches(&self) -> &[TypeMismatch] {
        match self {
            Self::SchemaValidation { type_mismatches, .. } => type_mismatches,
            Self::MalformedList { .. } => &[],
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::MalformedList { .. } => "malformed_list",
            Self::SchemaValidation { .. } => "schema_validation",
        }
    }
}

fn render_mismatches(mismatches: &[TypeMismatch]) -> String {
    mismatches.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Error)]
#[error("could not write artifact `{filename}`: {cause}")]
pub struct ArtifactWriteError {
    pub filename: String,
    #[source]
    pub cause: io::Error,
}

impl ArtifactWriteError {
    pub fn new(filename: impl Into<String>, cause: impl Into<io::Error>) -> Self {
        Self { filename: filename.into(), cause: cause.into() }
    }
}
