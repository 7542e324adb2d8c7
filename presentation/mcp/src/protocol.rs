//! Wire format for the stdio tool-call protocol: one `ToolCall` JSON object
//! per input line, one `ToolResult` JSON object per output line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub id: Value,
    pub tool: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub code: i32,
    pub message: String,
}

impl ToolResult {
    pub fn ok(id: Value, result: Value) -> Self {
        Self { id, result: Some(result), error: None }
    }

    pub fn err(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self { id, result: None, error: Some(ToolError { code, message: message.into() }) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_deserializes_with_default_params() {
        let call: ToolCall = serde_json::from_str(r#"{"id":1,"tool":"get_status"}"#).unwrap();
        assert_eq!(call.tool, "get_status");
        assert!(call.params.is_null());
    }

    #[test]
    fn tool_result_error_omits_result_field() {
        let result = ToolResult::err(Value::from(1), 404, "not found");
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], 404);
    }
}
