use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonKind {
    Array,
    Object,
}

impl JsonKind {
    fn opener(self) -> char {
        match self {
            Self::Array => '[',
            Self::Object => '{',
        }
    }
}

/// Finds the JSON value a model meant to return.
///
/// The whole response (minus any code fence) wins when it parses on its own,
/// whatever its kind. Otherwise the first `kind` span that parses as a
/// complete value is taken, so prose before and after the payload is ignored.
pub fn locate_json(raw: &str, kind: JsonKind) -> Option<Value> {
    let cleaned = strip_code_fences(raw);
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Some(value);
    }

    let opener = kind.opener();
    cleaned.char_indices().filter(|(_, ch)| *ch == opener).find_map(|(idx, _)| {
        let mut deserializer = serde_json::Deserializer::from_str(&cleaned[idx..]);
        Value::deserialize(&mut deserializer).ok()
    })
}

fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.first().is_some_and(|first| first.trim_start().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|last| last.trim_start().starts_with("```")) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
