//! Plan payload classification
//!
//! The retrieval service hands over either a fragment map, plain plan text,
//! or a JSON-encoded plan. Only the first two are parsed into a tree.

use crate::services::plan_analyzer::parser::error::{InputError, InputResult};
use serde_json::{Map, Value};

/// A classified plan payload
#[derive(Debug, Clone, PartialEq)]
pub enum PlanPayload<'a> {
    /// `QUERY_PLAN_<n>` -> line fragments
    Fragments(&'a Map<String, Value>),
    /// Whole plan as text
    Text(&'a str),
    /// JSON-encoded plan, kept opaque
    Json(String),
}

impl<'a> PlanPayload<'a> {
    /// Classify a transport value
    pub fn from_value(value: Option<&'a Value>) -> InputResult<Self> {
        match value.ok_or(InputError::Missing)? {
            Value::Object(map) if map.contains_key("Plan") => {
                Ok(PlanPayload::Json(Self::pretty(&Value::Object(map.clone()))))
            }
            Value::Object(map) => Ok(PlanPayload::Fragments(map)),
            array @ Value::Array(_) => Ok(PlanPayload::Json(Self::pretty(array))),
            Value::String(text) => Ok(Self::from_text(text)),
            Value::Null => Err(InputError::UnexpectedType("null")),
            Value::Bool(_) => Err(InputError::UnexpectedType("boolean")),
            Value::Number(_) => Err(InputError::UnexpectedType("number")),
        }
    }

    /// Classify raw text; JSON documents take the opaque path
    pub fn from_text(text: &'a str) -> Self {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
                if value.is_array() || value.is_object() {
                    return PlanPayload::Json(Self::pretty(&value));
                }
            }
        }
        PlanPayload::Text(text)
    }

    fn pretty(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_fragment_map() {
        let value = json!({"QUERY_PLAN_1": "Result"});
        assert!(matches!(PlanPayload::from_value(Some(&value)), Ok(PlanPayload::Fragments(_))));
    }

    #[test]
    fn test_classify_json_plan() {
        let value = json!([{"Plan": {"Node Type": "Seq Scan"}}]);
        assert!(matches!(PlanPayload::from_value(Some(&value)), Ok(PlanPayload::Json(_))));

        let value = json!({"Plan": {"Node Type": "Seq Scan"}});
        assert!(matches!(PlanPayload::from_value(Some(&value)), Ok(PlanPayload::Json(_))));

        let value = json!(r#"[{"Plan": {"Node Type": "Seq Scan"}}]"#);
        assert!(matches!(PlanPayload::from_value(Some(&value)), Ok(PlanPayload::Json(_))));
    }

    #[test]
    fn test_classify_text() {
        let value = json!("Seq Scan on t");
        assert_eq!(PlanPayload::from_value(Some(&value)), Ok(PlanPayload::Text("Seq Scan on t")));
    }

    #[test]
    fn test_invalid_inputs_are_distinct_errors() {
        assert_eq!(PlanPayload::from_value(None), Err(InputError::Missing));
        assert_eq!(
            PlanPayload::from_value(Some(&json!(42))),
            Err(InputError::UnexpectedType("number"))
        );
        assert_eq!(
            PlanPayload::from_value(Some(&Value::Null)),
            Err(InputError::UnexpectedType("null"))
        );
    }
}
