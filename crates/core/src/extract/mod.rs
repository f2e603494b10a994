//! Structured extraction of model output.
//!
//! Model text is never trusted to be pure JSON. The extractor locates the
//! payload, validates it against a declared [`RecordShape`], and only then
//! hands a typed value back. Failures are returned, never retried here.

pub mod format;
pub mod locate;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::{ExtractionError, TypeMismatch};
pub use format::format_instructions;
pub use locate::{locate_json, JsonKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    StringList,
    RecordList(RecordShape),
}

impl FieldType {
    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::StringList => "array of strings".to_string(),
            Self::RecordList(shape) => format!("array of {} objects", shape.name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub field_type: FieldType,
}

/// Required fields of an object the model must return. Unknown fields are tolerated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordShape {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl RecordShape {
    pub fn new(name: &'static str) -> Self {
        Self { name, fields: Vec::new() }
    }

    pub fn string(self, name: &'static str, description: &'static str) -> Self {
        self.field(name, description, FieldType::String)
    }

    pub fn string_list(self, name: &'static str, description: &'static str) -> Self {
        self.field(name, description, FieldType::StringList)
    }

    pub fn record_list(
        self,
        name: &'static str,
        description: &'static str,
        item: RecordShape,
    ) -> Self {
        self.field(name, description, FieldType::RecordList(item))
    }

    fn field(mut self, name: &'static str, description: &'static str, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec { name, description, field_type });
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }
}

/// Records that declare the shape the model must produce for them.
pub trait Shaped: DeserializeOwned {
    fn shape() -> RecordShape;
}

/// Parses `raw` as a JSON array of strings.
pub fn extract_list(raw: &str) -> Result<Vec<String>, ExtractionError> {
    let value = locate_json(raw, JsonKind::Array)
        .ok_or_else(|| ExtractionError::malformed_list("no JSON array found in model output"))?;

    let Value::Array(items) = value else {
        return Err(ExtractionError::malformed_list(format!(
            "expected array, found {}",
            locate::kind_name(&value)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(text) => Ok(text),
            other => Err(ExtractionError::malformed_list(format!(
                "element {index} is {}, expected string",
                locate::kind_name(&other)
            ))),
        })
        .collect()
}

/// Parses `raw` as a JSON object and validates it against `shape`.
///
/// Every missing field and every type mismatch is reported at once.
pub fn extract_record(raw: &str, shape: &RecordShape) -> Result<Map<String, Value>, ExtractionError> {
    let value = locate_json(raw, JsonKind::Object).ok_or_else(|| {
        schema_error(shape, Vec::new(), vec![mismatch("$", "object", "no JSON object")])
    })?;

    let Value::Object(object) = value else {
        let found = locate::kind_name(&value);
        return Err(schema_error(shape, Vec::new(), vec![mismatch("$", "object", found)]));
    };

    let mut missing_fields = Vec::new();
    let mut type_mismatches = Vec::new();
    validate_object(&object, shape, "", &mut missing_fields, &mut type_mismatches);

    if missing_fields.is_empty() && type_mismatches.is_empty() {
        Ok(object)
    } else {
        Err(schema_error(shape, missing_fields, type_mismatches))
    }
}

/// Extracts and validates a record, then decodes it into `T`.
pub fn extract_typed<T: Shaped>(raw: &str) -> Result<T, ExtractionError> {
    let shape = T::shape();
    let object = extract_record(raw, &shape)?;
    serde_json::from_value(Value::Object(object)).map_err(|error| {
        schema_error(&shape, Vec::new(), vec![mismatch("$", shape.name, &error.to_string())])
    })
}

fn validate_object(
    object: &Map<String, Value>,
    shape: &RecordShape,
    prefix: &str,
    missing_fields: &mut Vec<String>,
    type_mismatches: &mut Vec<TypeMismatch>,
) {
    for field in &shape.fields {
        let path = format!("{prefix}{}", field.name);
        let Some(value) = object.get(field.name) else {
            missing_fields.push(path);
            continue;
        };

        match (&field.field_type, value) {
            (FieldType::String, Value::String(_)) => {}
            (FieldType::StringList, Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        let found = locate::kind_name(item);
                        type_mismatches.push(mismatch(&format!("{path}[{index}]"), "string", found));
                    }
                }
            }
            (FieldType::RecordList(item_shape), Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{index}]");
                    match item {
                        Value::Object(item_object) => validate_object(
                            item_object,
                            item_shape,
                            &format!("{item_path}."),
                            missing_fields,
                            type_mismatches,
                        ),
                        other => type_mismatches.push(mismatch(
                            &item_path,
                            item_shape.name,
                            locate::kind_name(other),
                        )),
                    }
                }
            }
            (expected, other) => {
                type_mismatches.push(mismatch(&path, &expected.describe(), locate::kind_name(other)));
            }
        }
    }
}

fn mismatch(field: &str, expected: &str, found: &str) -> TypeMismatch {
    TypeMismatch { field: field.to_string(), expected: expected.to_string(), found: found.to_string() }
}

fn schema_error(
    shape: &RecordShape,
    missing_fields: Vec<String>,
    type_mismatches: Vec<TypeMismatch>,
) -> ExtractionError {
    ExtractionError::SchemaValidation { shape: shape.name.to_string(), missing_fields, type_mismatches }
}
