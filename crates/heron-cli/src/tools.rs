use chrono::Local;
use heron::errors::{RegistryError, ToolError, ToolResult};
use heron::models::tool::{ParamType, Tool};
use heron::registry::ToolRegistry;
use serde_json::{json, Value};

/// The built-in demonstration tools available in every session.
pub fn builtin_registry() -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();

    let add = Tool::builder("add", "Add two numbers and return their sum.")
        .param("a", ParamType::Number, "First addend")
        .param("b", ParamType::Number, "Second addend")
        .build();
    registry.register_fn(add, |args| {
        let a = number(&args, "a")?;
        let b = number(&args, "b")?;
        Ok(json!(a + b))
    })?;

    let divide = Tool::builder("divide", "Divide the first number by the second.")
        .param("a", ParamType::Number, "Dividend")
        .param("b", ParamType::Number, "Divisor")
        .build();
    registry.register_fn(divide, |args| {
        let a = number(&args, "a")?;
        let b = number(&args, "b")?;
        if b == 0.0 {
            return Err(ToolError::ExecutionError("Division by zero".to_string()));
        }
        Ok(json!(a / b))
    })?;

    let current_time = Tool::builder(
        "current_time",
        "Get the current local date and time in RFC 3339 format.",
    )
    .build();
    registry.register_fn(current_time, |_| {
        Ok(json!(Local::now().to_rfc3339()))
    })?;

    Ok(registry)
}

fn number(args: &Value, name: &str) -> ToolResult<f64> {
    args.get(name).and_then(Value::as_f64).ok_or_else(|| {
        ToolError::InvalidParameters(format!("Parameter {} must be a number", name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron::models::tool::ToolCall;

    #[tokio::test]
    async fn test_add() {
        let registry = builtin_registry().unwrap();
        let result = registry
            .invoke(ToolCall::new("add", json!({"a": 2, "b": 3})), None)
            .await
            .unwrap();
        assert_eq!(result, "5.0");
    }

    #[tokio::test]
    async fn test_divide_by_zero_is_a_tool_error() {
        let registry = builtin_registry().unwrap();
        let result = registry
            .invoke(ToolCall::new("divide", json!({"a": 1, "b": 0})), None)
            .await;
        assert_eq!(
            result,
            Err(ToolError::ExecutionError("Division by zero".to_string()))
        );
    }

    #[tokio::test]
    async fn test_current_time_returns_a_timestamp() {
        let registry = builtin_registry().unwrap();
        let result = registry
            .invoke(ToolCall::new("current_time", json!({})), None)
            .await
            .unwrap();
        assert!(result.contains('T'));
    }
}
