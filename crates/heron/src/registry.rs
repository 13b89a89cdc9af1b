use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{RegistryError, ToolError, ToolResult};
use crate::models::tool::{Tool, ToolCall};
use crate::providers::utils::is_valid_function_name;

/// A tool implementation: JSON arguments in, JSON value out.
pub type ToolHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ToolResult<Value>> + Send + Sync>;

#[derive(Clone)]
struct RegisteredTool {
    tool: Tool,
    handler: ToolHandler,
}

/// The catalogue of capabilities an agent can dispatch to by name.
///
/// Registration happens at setup time only; afterwards the registry is
/// effectively immutable. Handlers sit behind `Arc`, so cloning a registry
/// shares them, and one registry can back any number of concurrently running
/// agents without locks.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async tool.
    pub fn register<F, Fut>(&mut self, tool: Tool, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult<Value>> + Send + 'static,
    {
        let handler: ToolHandler = Arc::new(move |arguments| handler(arguments).boxed());
        self.insert(tool, handler)
    }

    /// Register a synchronous tool.
    pub fn register_fn<F>(&mut self, tool: Tool, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(Value) -> ToolResult<Value> + Send + Sync + 'static,
    {
        let handler: ToolHandler = Arc::new(move |arguments| {
            let result = handler(arguments);
            async move { result }.boxed()
        });
        self.insert(tool, handler)
    }

    /// Register several pre-boxed tools at once.
    pub fn register_all(
        &mut self,
        tools: impl IntoIterator<Item = (Tool, ToolHandler)>,
    ) -> Result<(), RegistryError> {
        for (tool, handler) in tools {
            self.insert(tool, handler)?;
        }
        Ok(())
    }

    fn insert(&mut self, tool: Tool, handler: ToolHandler) -> Result<(), RegistryError> {
        if !is_valid_function_name(&tool.name) {
            return Err(RegistryError::InvalidToolName(tool.name));
        }
        if self.tools.contains_key(&tool.name) {
            return Err(RegistryError::DuplicateToolName(tool.name));
        }
        self.order.push(tool.name.clone());
        self.tools
            .insert(tool.name.clone(), RegisteredTool { tool, handler });
        Ok(())
    }

    /// The schemas to advertise to the model backend, in registration order.
    pub fn descriptors(&self) -> Vec<Tool> {
        self.order
            .iter()
            .map(|name| self.tools[name].tool.clone())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool call and serialize its outcome to text.
    ///
    /// Every failure mode comes back as a `ToolError` value: an unknown name,
    /// rejected arguments, a handler error, or a timeout all become tool
    /// results the loop feeds back to the model, never errors that unwind the
    /// host program.
    pub async fn invoke(&self, call: ToolCall, timeout: Option<Duration>) -> ToolResult<String> {
        let entry = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        let arguments = check_arguments(&entry.tool.input_schema, call.arguments)?;
        debug!(tool = %call.name, "invoking tool");

        let invocation = (entry.handler)(arguments);
        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, invocation)
                .await
                .map_err(|_| ToolError::Timeout(limit.as_millis() as u64))??,
            None => invocation.await?,
        };

        Ok(render_value(output))
    }
}

/// Validate the supplied arguments against the tool's schema: fill in
/// declared defaults, reject unknown and missing-required parameters, and
/// coerce values where the conversion is unambiguous.
fn check_arguments(schema: &Value, arguments: Value) -> ToolResult<Value> {
    let properties = match schema.get("properties").and_then(Value::as_object) {
        Some(properties) => properties,
        // No declared parameters: pass the payload through untouched.
        None => return Ok(arguments),
    };

    let mut supplied = match arguments {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(ToolError::InvalidParameters(format!(
                "Expected a JSON object of arguments, got {}",
                json_type_name(&other)
            )))
        }
    };

    let mut checked = Map::new();
    for (name, spec) in properties {
        match supplied.remove(name) {
            Some(value) => {
                checked.insert(name.clone(), coerce_value(name, spec, value)?);
            }
            None => {
                if let Some(default) = spec.get("default") {
                    if !default.is_null() {
                        checked.insert(name.clone(), default.clone());
                    }
                }
            }
        }
    }

    if let Some(unknown) = supplied.keys().next() {
        return Err(ToolError::InvalidParameters(format!(
            "Unknown parameter: {}",
            unknown
        )));
    }

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !checked.contains_key(name) {
                return Err(ToolError::InvalidParameters(format!(
                    "Missing required parameter: {}",
                    name
                )));
            }
        }
    }

    Ok(Value::Object(checked))
}

fn coerce_value(name: &str, spec: &Value, value: Value) -> ToolResult<Value> {
    let declared = match spec.get("type").and_then(Value::as_str) {
        Some(declared) => declared,
        // Untyped property: accept anything.
        None => return Ok(value),
    };

    let coerced = match (declared, value) {
        ("string", Value::String(s)) => Value::String(s),
        ("string", Value::Number(n)) => Value::String(n.to_string()),
        ("string", Value::Bool(b)) => Value::String(b.to_string()),
        ("integer", Value::Number(n)) if n.is_i64() || n.is_u64() => Value::Number(n),
        ("integer", Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(parsed) => Value::Number(parsed.into()),
            Err(_) => {
                return Err(ToolError::InvalidParameters(format!(
                    "Parameter {} expected an integer, got {:?}",
                    name, s
                )))
            }
        },
        ("number", Value::Number(n)) => Value::Number(n),
        ("number", Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(parsed) => serde_json::Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| {
                    ToolError::InvalidParameters(format!(
                        "Parameter {} is not a finite number",
                        name
                    ))
                })?,
            Err(_) => {
                return Err(ToolError::InvalidParameters(format!(
                    "Parameter {} expected a number, got {:?}",
                    name, s
                )))
            }
        },
        ("boolean", Value::Bool(b)) => Value::Bool(b),
        ("boolean", Value::String(s)) if s == "true" || s == "false" => Value::Bool(s == "true"),
        ("array", value @ Value::Array(_)) => value,
        ("object", value @ Value::Object(_)) => value,
        (declared, value) => {
            return Err(ToolError::InvalidParameters(format!(
                "Parameter {} expected {}, got {}",
                name,
                declared,
                json_type_name(&value)
            )))
        }
    };

    Ok(coerced)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Tool output becomes a single text string: bare strings verbatim, anything
/// else rendered as JSON.
fn render_value(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tool::ParamType;
    use serde_json::json;

    fn add_tool() -> Tool {
        Tool::builder("add", "Add two integers.")
            .param("a", ParamType::Integer, "First addend")
            .param("b", ParamType::Integer, "Second addend")
            .build()
    }

    fn registry_with_add() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register_fn(add_tool(), |args| {
                let a = args["a"].as_i64().unwrap_or_default();
                let b = args["b"].as_i64().unwrap_or_default();
                Ok(json!(a + b))
            })
            .unwrap();
        registry
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = registry_with_add();
        let result = registry.register_fn(add_tool(), |_| Ok(json!(null)));
        assert_eq!(
            result,
            Err(RegistryError::DuplicateToolName("add".to_string()))
        );
    }

    #[test]
    fn test_invalid_name_rejected() {
        let mut registry = ToolRegistry::new();
        let result = registry.register_fn(
            Tool::builder("bad name", "Spaces are not allowed.").build(),
            |_| Ok(json!(null)),
        );
        assert!(matches!(result, Err(RegistryError::InvalidToolName(_))));
    }

    #[test]
    fn test_descriptors_preserve_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register_fn(Tool::builder(name, "noop").build(), |_| Ok(json!(null)))
                .unwrap();
        }
        let names: Vec<String> = registry
            .descriptors()
            .into_iter()
            .map(|tool| tool.name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn test_invoke_serializes_result() {
        let registry = registry_with_add();
        let result = registry
            .invoke(ToolCall::new("add", json!({"a": 2, "b": 3})), None)
            .await
            .unwrap();
        assert_eq!(result, "5");
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let registry = ToolRegistry::new();
        let result = registry.invoke(ToolCall::new("missing", json!({})), None).await;
        assert_eq!(result, Err(ToolError::NotFound("missing".to_string())));
    }

    #[tokio::test]
    async fn test_invoke_missing_required_parameter() {
        let registry = registry_with_add();
        let result = registry
            .invoke(ToolCall::new("add", json!({"a": 2})), None)
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParameters(ref msg)) if msg.contains("b")));
    }

    #[tokio::test]
    async fn test_invoke_unknown_parameter() {
        let registry = registry_with_add();
        let result = registry
            .invoke(ToolCall::new("add", json!({"a": 1, "b": 2, "c": 3})), None)
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParameters(ref msg)) if msg.contains("c")));
    }

    #[tokio::test]
    async fn test_invoke_coerces_string_integers() {
        let registry = registry_with_add();
        let result = registry
            .invoke(ToolCall::new("add", json!({"a": "2", "b": "3"})), None)
            .await
            .unwrap();
        assert_eq!(result, "5");
    }

    #[tokio::test]
    async fn test_invoke_rejects_wrong_type() {
        let registry = registry_with_add();
        let result = registry
            .invoke(ToolCall::new("add", json!({"a": true, "b": 3})), None)
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParameters(_))));
    }

    #[tokio::test]
    async fn test_defaults_filled_for_omitted_parameters() {
        let mut registry = ToolRegistry::new();
        let tool = Tool::builder("greet", "Greet someone.")
            .param("name", ParamType::String, "Who to greet")
            .optional_param(
                "greeting",
                ParamType::String,
                "The greeting word",
                Some(json!("hello")),
            )
            .build();
        registry
            .register_fn(tool, |args| {
                Ok(json!(format!(
                    "{} {}",
                    args["greeting"].as_str().unwrap_or_default(),
                    args["name"].as_str().unwrap_or_default()
                )))
            })
            .unwrap();

        let result = registry
            .invoke(ToolCall::new("greet", json!({"name": "world"})), None)
            .await
            .unwrap();
        assert_eq!(result, "hello world");
    }

    #[tokio::test]
    async fn test_handler_error_becomes_tool_error() {
        let mut registry = ToolRegistry::new();
        registry
            .register_fn(Tool::builder("explode", "Always fails.").build(), |_| {
                Err(ToolError::ExecutionError("boom".to_string()))
            })
            .unwrap();

        let result = registry.invoke(ToolCall::new("explode", json!({})), None).await;
        assert_eq!(result, Err(ToolError::ExecutionError("boom".to_string())));
    }

    #[tokio::test]
    async fn test_object_results_render_as_json() {
        let mut registry = ToolRegistry::new();
        registry
            .register_fn(Tool::builder("stats", "Return stats.").build(), |_| {
                Ok(json!({"count": 3}))
            })
            .unwrap();

        let result = registry.invoke(ToolCall::new("stats", json!({})), None).await;
        assert_eq!(result.unwrap(), r#"{"count":3}"#);
    }

    #[tokio::test]
    async fn test_slow_handler_times_out() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Tool::builder("slow", "Sleeps.").build(), |_| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(json!("done"))
            })
            .unwrap();

        let result = registry
            .invoke(
                ToolCall::new("slow", json!({})),
                Some(Duration::from_millis(10)),
            )
            .await;
        assert_eq!(result, Err(ToolError::Timeout(10)));
    }

    #[tokio::test]
    async fn test_cloned_registry_shares_handlers() {
        let registry = registry_with_add();
        let clone = registry.clone();
        let result = clone
            .invoke(ToolCall::new("add", json!({"a": 1, "b": 1})), None)
            .await
            .unwrap();
        assert_eq!(result, "2");
        assert_eq!(registry.len(), clone.len());
    }
}
