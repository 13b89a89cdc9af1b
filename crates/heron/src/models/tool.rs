use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A capability the model backend may ask to have invoked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool, unique within a registry
    pub name: String,
    /// What the tool does, written for the model
    pub description: String,
    /// JSON schema describing the accepted arguments
    pub input_schema: Value,
}

impl Tool {
    /// Create a tool from a hand-written JSON schema.
    pub fn new<N, D>(name: N, description: D, input_schema: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Declare the tool's parameters one by one instead of writing the schema
    /// out by hand.
    pub fn builder<N, D>(name: N, description: D) -> ToolBuilder
    where
        N: Into<String>,
        D: Into<String>,
    {
        ToolBuilder {
            name: name.into(),
            description: description.into(),
            properties: Map::new(),
            required: Vec::new(),
        }
    }
}

/// The JSON types a declared parameter can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }
}

/// Builds the input schema for a [`Tool`] from typed parameter declarations.
#[derive(Debug)]
pub struct ToolBuilder {
    name: String,
    description: String,
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ToolBuilder {
    /// Declare a required parameter.
    pub fn param(mut self, name: &str, kind: ParamType, description: &str) -> Self {
        self.properties.insert(
            name.to_string(),
            json!({ "type": kind.as_str(), "description": description }),
        );
        self.required.push(name.to_string());
        self
    }

    /// Declare an optional parameter. A non-null `default` is filled in when
    /// the model omits the argument.
    pub fn optional_param(
        mut self,
        name: &str,
        kind: ParamType,
        description: &str,
        default: Option<Value>,
    ) -> Self {
        self.properties.insert(
            name.to_string(),
            json!({
                "type": kind.as_str(),
                "description": description,
                "default": default.unwrap_or(Value::Null),
            }),
        );
        self
    }

    pub fn build(self) -> Tool {
        Tool {
            name: self.name,
            description: self.description,
            input_schema: json!({
                "type": "object",
                "properties": self.properties,
                "required": self.required,
            }),
        }
    }
}

/// A request from the model backend to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// The name of the tool to execute
    pub name: String,
    /// The arguments for the execution
    pub arguments: Value,
}

impl ToolCall {
    pub fn new<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}
