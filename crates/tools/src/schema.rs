//! Tool trait, schemas and validation
//!
//! Tools are declared to the agent in JSON Schema form and validated
//! against that schema before execution.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Tool error with JSON-RPC compatible error codes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl ToolError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidParams,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InternalError,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::MethodNotFound,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ToolError {}

/// JSON-RPC 2.0 error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    Custom(i32),
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::Custom(c) => c,
        }
    }
}

impl TryFrom<i32> for ErrorCode {
    type Error = &'static str;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            -32700 => ErrorCode::ParseError,
            -32600 => ErrorCode::InvalidRequest,
            -32601 => ErrorCode::MethodNotFound,
            -32602 => ErrorCode::InvalidParams,
            -32603 => ErrorCode::InternalError,
            c => ErrorCode::Custom(c),
        })
    }
}

/// Tool output sent back to the agent as the function response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Response payload for the agent
    pub response: Value,
    /// Is this an error response?
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    /// A success response with the canonical `{"result": "ok"}` payload
    pub fn ok() -> Self {
        Self {
            response: json!({ "result": "ok" }),
            is_error: false,
        }
    }

    /// A success response with an arbitrary payload
    pub fn json(value: impl Serialize) -> Self {
        Self {
            response: serde_json::to_value(value).unwrap_or(Value::Null),
            is_error: false,
        }
    }

    /// An error response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            response: json!({ "error": message.into() }),
            is_error: true,
        }
    }
}

/// Tool schema (JSON Schema format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name, as the agent invokes it
    pub name: String,
    /// Tool description, shown to the agent
    pub description: String,
    /// Input schema
    pub input_schema: InputSchema,
}

/// Input schema for tool parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: HashMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl InputSchema {
    /// Create an empty object schema
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: Vec::new(),
        }
    }

    /// Add a property to the schema
    pub fn property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }
}

/// Property schema for input parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub prop_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertySchema {
    /// Create a string property
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: Some(description.into()),
            enum_values: None,
        }
    }

    /// Create a string property restricted to an enum of values
    pub fn enum_type(description: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: Some(description.into()),
            enum_values: Some(values),
        }
    }
}

/// Tool trait
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used for invocation)
    fn name(&self) -> &str;

    /// Tool description (shown to the agent)
    fn description(&self) -> &str;

    /// Input schema
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with validated input
    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError>;

    /// Validate input against the schema.
    ///
    /// Checks required fields, basic types and enum membership. Unknown
    /// properties pass through.
    fn validate(&self, input: &Value) -> Result<(), ToolError> {
        let schema = self.schema();

        let Value::Object(obj) = input else {
            if schema.input_schema.properties.is_empty() {
                return Ok(());
            }
            return Err(ToolError::invalid_params("Input must be an object"));
        };

        for required in &schema.input_schema.required {
            if !obj.contains_key(required) {
                return Err(ToolError::invalid_params(format!(
                    "Missing required field: {}",
                    required
                )));
            }
        }

        for (name, value) in obj {
            if let Some(prop_schema) = schema.input_schema.properties.get(name) {
                validate_property(name, value, prop_schema)?;
            }
        }

        Ok(())
    }
}

/// Validate a property value against its schema
pub fn validate_property(
    name: &str,
    value: &Value,
    schema: &PropertySchema,
) -> Result<(), ToolError> {
    let type_valid = match schema.prop_type.as_str() {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    };

    if !type_valid {
        return Err(ToolError::invalid_params(format!(
            "Field '{}' must be of type '{}'",
            name, schema.prop_type
        )));
    }

    if let (Some(enum_values), Some(s)) = (&schema.enum_values, value.as_str()) {
        if !enum_values.iter().any(|v| v == s) {
            return Err(ToolError::invalid_params(format!(
                "Field '{}' must be one of: [{}], got '{}'",
                name,
                enum_values.join(", "),
                s
            )));
        }
    }

    Ok(())
}

/// Render tool schemas in the function-declaration wire shape the live
/// session's setup message expects.
pub fn function_declarations(schemas: &[ToolSchema]) -> Value {
    let declarations: Vec<Value> = schemas
        .iter()
        .map(|schema| {
            let properties: serde_json::Map<String, Value> = schema
                .input_schema
                .properties
                .iter()
                .map(|(name, prop)| {
                    let mut p = serde_json::Map::new();
                    p.insert(
                        "type".to_string(),
                        json!(prop.prop_type.to_ascii_uppercase()),
                    );
                    if let Some(desc) = &prop.description {
                        p.insert("description".to_string(), json!(desc));
                    }
                    if let Some(values) = &prop.enum_values {
                        p.insert("enum".to_string(), json!(values));
                    }
                    (name.clone(), Value::Object(p))
                })
                .collect();

            json!({
                "name": schema.name,
                "description": schema.description,
                "parameters": {
                    "type": "OBJECT",
                    "properties": properties,
                    "required": schema.input_schema.required,
                },
            })
        })
        .collect();

    json!(declarations)
}
