use serde_json::{json, Map, Value};

use super::{FieldType, RecordShape};

/// Human-readable schema for `shape`, to embed in a prompt.
///
/// Advisory only: the extractor still validates whatever comes back.
pub fn format_instructions(shape: &RecordShape) -> String {
    let schema = serde_json::to_string(&schema_for(shape)).unwrap_or_default();
    format!(
        "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\n\
         As an example, for the schema {{\"properties\": {{\"foo\": {{\"title\": \"Foo\", \"description\": \"a list of strings\", \"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}}\n\
         the object {{\"foo\": [\"bar\", \"baz\"]}} is a well-formatted instance of the schema. \
         The object {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} is not well-formatted.\n\n\
         Here is the output schema:\n```\n{schema}\n```"
    )
}

fn schema_for(shape: &RecordShape) -> Value {
    let mut properties = Map::new();
    for field in &shape.fields {
        let mut property = field_schema(&field.field_type);
        if let Value::Object(entries) = &mut property {
            entries.insert("title".to_string(), Value::String(title_case(field.name)));
            if !field.description.is_empty() {
                entries.insert("description".to_string(), Value::String(field.description.to_string()));
            }
        }
        properties.insert(field.name.to_string(), property);
    }

    json!({
        "title": shape.name,
        "type": "object",
        "properties": properties,
        "required": shape.field_names().collect::<Vec<_>>(),
    })
}

fn field_schema(field_type: &FieldType) -> Value {
    match field_type {
        FieldType::String => json!({ "type": "string" }),
        FieldType::StringList => json!({ "type": "array", "items": { "type": "string" } }),
        FieldType::RecordList(item) => json!({ "type": "array", "items": schema_for(item) }),
    }
}

fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
