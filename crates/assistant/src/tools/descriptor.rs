//! Tool descriptors and argument validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::openai::FunctionDefinition;

/// A tool call's arguments did not match the descriptor.
///
/// Never fatal: the dispatcher logs it and degrades to the raw message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("{tool}: missing required argument '{argument}'")]
    Missing { tool: String, argument: String },

    #[error("{tool}: argument '{argument}' should be {expected}, got {found}")]
    WrongType {
        tool: String,
        argument: String,
        expected: ParamType,
        found: &'static str,
    },

    #[error("{tool}: undeclared argument '{argument}'")]
    Undeclared { tool: String, argument: String },
}

/// JSON type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub description: String,
    /// Element schema for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParameterSpec>>,
}

impl ParameterSpec {
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            param_type: ParamType::String,
            description: description.into(),
            items: None,
        }
    }

    #[must_use]
    pub fn string_array(description: impl Into<String>) -> Self {
        Self {
            param_type: ParamType::Array,
            description: description.into(),
            items: Some(Box::new(Self::string("Item"))),
        }
    }

    fn check(&self, value: &Value) -> Result<(), (ParamType, &'static str)> {
        if !self.param_type.matches(value) {
            return Err((self.param_type, json_type(value)));
        }
        if let (Some(items), Value::Array(values)) = (&self.items, value) {
            for item in values {
                items.check(item)?;
            }
        }
        Ok(())
    }
}

fn default_schema_type() -> String {
    "object".to_string()
}

/// JSON-Schema object describing a tool's arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type", default = "default_schema_type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, ParameterSpec>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self {
            schema_type: default_schema_type(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

impl ParameterSchema {
    /// Add an optional property.
    #[must_use]
    pub fn property(mut self, name: &str, spec: ParameterSpec) -> Self {
        self.properties.insert(name.to_string(), spec);
        self
    }

    /// Add a required property.
    #[must_use]
    pub fn required_property(mut self, name: &str, spec: ParameterSpec) -> Self {
        self.required.push(name.to_string());
        self.property(name, spec)
    }
}

/// A tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: ParameterSchema,
}

impl ToolDescriptor {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Check arguments against the schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`ArgumentError`] found: a missing required
    /// argument, an argument of the wrong JSON type, or an argument the schema
    /// does not declare.
    pub fn validate_arguments(&self, arguments: &Map<String, Value>) -> Result<(), ArgumentError> {
        for required in &self.parameters.required {
            if !arguments.contains_key(required) {
                return Err(ArgumentError::Missing {
                    tool: self.name.clone(),
                    argument: required.clone(),
                });
            }
        }

        for (name, value) in arguments {
            let spec = self
                .parameters
                .properties
                .get(name)
                .ok_or_else(|| ArgumentError::Undeclared {
                    tool: self.name.clone(),
                    argument: name.clone(),
                })?;
            spec.check(value)
                .map_err(|(expected, found)| ArgumentError::WrongType {
                    tool: self.name.clone(),
                    argument: name.clone(),
                    expected,
                    found,
                })?;
        }

        Ok(())
    }

    /// The function definition sent to the model.
    #[must_use]
    pub fn to_function(&self) -> FunctionDefinition {
        FunctionDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: serde_json::to_value(&self.parameters).unwrap_or_else(|_| {
                serde_json::json!({"type": "object", "properties": {}})
            }),
        }
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
