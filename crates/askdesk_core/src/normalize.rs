use serde_json::{Map, Value};

/// Fields that carry the answer text directly, in lookup order.
const TEXT_FIELDS: [&str; 4] = ["answer", "text", "content", "output"];
/// Text fields that often hold a status note instead of the answer. Consulted
/// only after the wrapper fields came up empty.
const WEAK_TEXT_FIELDS: [&str; 1] = ["message"];
/// Fields that wrap the real payload, either as an object or as encoded JSON.
const WRAPPER_FIELDS: [&str; 4] = ["response", "result", "data", "body"];
/// Deepest wrapping that is searched for a text field.
const MAX_WRAPPING: usize = 2;

/// Known answer envelopes. Backend deployments disagree on the shape; this is
/// where that drift is absorbed.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    /// The payload is a JSON string.
    Bare(String),
    /// An object with a text field at the top level.
    Direct(String),
    /// A wrapper field holding a JSON document as a string, already decoded once.
    /// `original` is the payload the string came from.
    Encoded { decoded: Value, original: Value },
    /// A text field found under one or two wrapper objects.
    Nested(String),
    /// None of the above.
    Unknown(Value),
}

impl ResponseEnvelope {
    pub fn classify(payload: &Value) -> Self {
        classify_with(payload, true)
    }

    pub fn into_text(self) -> String {
        match self {
            ResponseEnvelope::Bare(text)
            | ResponseEnvelope::Direct(text)
            | ResponseEnvelope::Nested(text) => text,
            // Exactly one extra decode step: the decoded document may not decode again.
            ResponseEnvelope::Encoded { decoded, original } => {
                match classify_with(&decoded, false) {
                    ResponseEnvelope::Unknown(_) => original.to_string(),
                    envelope => envelope.into_text(),
                }
            }
            ResponseEnvelope::Unknown(payload) => payload.to_string(),
        }
    }
}

/// Reduces any decoded backend payload to the canonical answer string.
pub fn normalize_response(payload: &Value) -> String {
    ResponseEnvelope::classify(payload).into_text()
}

fn classify_with(payload: &Value, allow_decode: bool) -> ResponseEnvelope {
    let map = match payload {
        Value::String(text) => return ResponseEnvelope::Bare(text.clone()),
        Value::Object(map) => map,
        other => return ResponseEnvelope::Unknown(other.clone()),
    };

    if let Some(text) = field_text(map, &TEXT_FIELDS) {
        return ResponseEnvelope::Direct(text);
    }

    for field in WRAPPER_FIELDS {
        match map.get(field) {
            Some(Value::String(raw)) => {
                if allow_decode {
                    if let Ok(decoded) = serde_json::from_str::<Value>(raw) {
                        if decoded.is_object() || decoded.is_string() {
                            return ResponseEnvelope::Encoded {
                                decoded,
                                original: payload.clone(),
                            };
                        }
                    }
                }
                return ResponseEnvelope::Direct(raw.clone());
            }
            Some(Value::Object(inner)) => {
                if let Some(text) = nested_text(inner, 1) {
                    return ResponseEnvelope::Nested(text);
                }
            }
            _ => {}
        }
    }

    match field_text(map, &WEAK_TEXT_FIELDS) {
        Some(text) => ResponseEnvelope::Direct(text),
        None => ResponseEnvelope::Unknown(payload.clone()),
    }
}

fn field_text(map: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| map.get(*field).and_then(Value::as_str))
        .map(ToOwned::to_owned)
}

fn nested_text(map: &Map<String, Value>, depth: usize) -> Option<String> {
    if let Some(text) = field_text(map, &TEXT_FIELDS) {
        return Some(text);
    }
    WRAPPER_FIELDS
        .iter()
        .find_map(|field| match map.get(*field) {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Object(inner)) if depth < MAX_WRAPPING => nested_text(inner, depth + 1),
            _ => None,
        })
        .or_else(|| field_text(map, &WEAK_TEXT_FIELDS))
}
