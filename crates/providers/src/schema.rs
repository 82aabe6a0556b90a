//! Response-shape constraints for structured-output models.
//!
//! Gemini expects its own `Type.*` dialect (upper-case type names) while
//! OpenAI-compatible servers take plain JSON Schema, so the shape is kept
//! backend-neutral here and rendered per provider.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseSchema {
    String,
    Array(Box<ResponseSchema>),
    Object {
        properties: Vec<(String, ResponseSchema)>,
        required: Vec<String>,
    },
}

impl ResponseSchema {
    pub fn array_of(items: ResponseSchema) -> Self {
        ResponseSchema::Array(Box::new(items))
    }

    /// Object whose listed properties are all required.
    pub fn object(properties: Vec<(&str, ResponseSchema)>) -> Self {
        let required = properties.iter().map(|(k, _)| k.to_string()).collect();
        ResponseSchema::Object {
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            required,
        }
    }

    pub fn to_gemini(&self) -> Value {
        match self {
            ResponseSchema::String => json!({ "type": "STRING" }),
            ResponseSchema::Array(items) => json!({
                "type": "ARRAY",
                "items": items.to_gemini(),
            }),
            ResponseSchema::Object {
                properties,
                required,
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_gemini()))
                    .collect();
                json!({
                    "type": "OBJECT",
                    "properties": props,
                    "required": required,
                })
            }
        }
    }

    pub fn to_json_schema(&self) -> Value {
        match self {
            ResponseSchema::String => json!({ "type": "string" }),
            ResponseSchema::Array(items) => json!({
                "type": "array",
                "items": items.to_json_schema(),
            }),
            ResponseSchema::Object {
                properties,
                required,
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_schema()))
                    .collect();
                json!({
                    "type": "object",
                    "properties": props,
                    "required": required,
                    "additionalProperties": false,
                })
            }
        }
    }
}
