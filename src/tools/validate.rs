// src/tools/validate.rs

use serde_json::{Map, Value};

use super::{ParamSpec, ParamType, ToolDefinition};
use crate::solscan::models::{ToolError, UpstreamRequest};

impl ToolDefinition {
    /// Validates `arguments` against the declared parameters and builds the
    /// upstream request. All problems are collected before failing so the
    /// caller sees every missing and malformed field at once.
    ///
    /// Arguments that match no declared parameter are ignored and never
    /// forwarded upstream.
    pub fn build_request(&self, arguments: &Map<String, Value>) -> Result<UpstreamRequest, ToolError> {
        let mut missing = Vec::new();
        let mut malformed = Vec::new();
        let mut query = Vec::with_capacity(self.params.len() + self.fixed_query.len());

        for param in self.params {
            match find_argument(param, arguments) {
                Some(value) => match render_value(param, value) {
                    Ok(rendered) => query.push((param.upstream_key.to_string(), rendered)),
                    Err(reason) => malformed.push(format!("{}: {}", param.name, reason)),
                },
                None if param.required => missing.push(param.name.to_string()),
                None => {
                    if let Some(default) = param.default {
                        query.push((param.upstream_key.to_string(), default.to_query()));
                    }
                }
            }
        }

        if !missing.is_empty() || !malformed.is_empty() {
            return Err(ToolError::InvalidParameters {
                tool: self.name.to_string(),
                missing,
                malformed,
            });
        }

        query.extend(
            self.fixed_query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );

        Ok(UpstreamRequest {
            tool: self.kind,
            path: self.endpoint.to_string(),
            query,
        })
    }
}

// Explicit nulls count as absent.
fn find_argument<'a>(param: &ParamSpec, arguments: &'a Map<String, Value>) -> Option<&'a Value> {
    std::iter::once(param.name)
        .chain(param.aliases.iter().copied())
        .filter_map(|key| arguments.get(key))
        .find(|value| !value.is_null())
}

fn render_value(param: &ParamSpec, value: &Value) -> Result<String, String> {
    match param.kind {
        ParamType::String => match value.as_str().map(str::trim) {
            Some("") => Err("must not be empty".to_string()),
            Some(s) => Ok(s.to_string()),
            None => Err(format!("expected string, got {}", type_name(value))),
        },
        ParamType::Integer { min, max } => {
            let n = value
                .as_i64()
                .ok_or_else(|| format!("expected integer, got {}", type_name(value)))?;
            if n < min {
                return Err(format!("must be at least {}", min));
            }
            if let Some(max) = max {
                if n > max {
                    return Err(format!("must be at most {}", max));
                }
            }
            Ok(n.to_string())
        }
        ParamType::Enum(allowed) => {
            let s = value
                .as_str()
                .ok_or_else(|| format!("expected string, got {}", type_name(value)))?;
            if allowed.contains(&s) {
                Ok(s.to_string())
            } else {
                Err(format!("must be one of {}", allowed.join(", ")))
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
