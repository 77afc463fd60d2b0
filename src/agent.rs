//! Agent response extraction.
//!
//! The hosted agent returns a loosely structured payload (JSON text or a
//! decoded value). [`extract_answer`] pulls out the best human-readable
//! answer using these rules, first match wins:
//!
//! 1. The call failed → `"Agent call failed: <error>"`.
//! 2. No rows came back → `"Agent returned no result."`.
//! 3. The payload is decoded; JSON text is parsed, other values used as-is.
//! 4. `message.content`, when non-empty.
//! 5. The last turn with non-empty `content` in `messages` (or `output`),
//!    scanning from the end.
//! 6. The decoded value as indented JSON.
//!
//! The function is total: every input produces a string.

use serde_json::Value;

use crate::error::QueryError;
use crate::warehouse::{SqlParam, Warehouse};

pub const NO_RESULT: &str = "Agent returned no result.";

const EXECUTE_AGENT_SQL: &str =
    "SELECT SNOWFLAKE.CORTEX.EXECUTE_AGENT(?, OBJECT_CONSTRUCT('input', ?)) AS R";

/// Sends `prompt` to the named agent and returns its answer text.
///
/// Never fails: warehouse errors come back as a failure message.
pub async fn ask_agent(warehouse: &dyn Warehouse, agent: &str, prompt: &str) -> String {
    let params = [SqlParam::from(agent), SqlParam::from(prompt)];
    let outcome = warehouse.scalar(EXECUTE_AGENT_SQL, &params).await;
    if let Err(ref e) = outcome {
        tracing::warn!(agent, error = %e, "agent call failed");
    }
    extract_answer(outcome)
}

/// Answer text for the outcome of an agent call.
pub fn extract_answer(outcome: Result<Option<Value>, QueryError>) -> String {
    match outcome {
        Err(e) => format!("Agent call failed: {}", e),
        Ok(None) => NO_RESULT.to_string(),
        Ok(Some(payload)) => extract_from_payload(&payload),
    }
}

/// Answer text for an already-fetched agent payload (rules 3–6).
pub fn extract_from_payload(payload: &Value) -> String {
    let decoded = match payload {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(v) => v,
            // Plain text is already readable.
            Err(_) => return text.clone(),
        },
        other => other.clone(),
    };

    if let Some(obj) = decoded.as_object() {
        if let Some(content) = obj
            .get("message")
            .and_then(Value::as_object)
            .and_then(|m| m.get("content"))
            .filter(|c| is_truthy(c))
        {
            return render_content(content);
        }

        let turns = obj
            .get("messages")
            .filter(|v| is_truthy(v))
            .or_else(|| obj.get("output"));
        if let Some(turns) = turns.and_then(Value::as_array) {
            let last = turns
                .iter()
                .rev()
                .filter_map(|t| t.as_object()?.get("content"))
                .find(|c| is_truthy(c));
            if let Some(content) = last {
                return render_content(content);
            }
        }
    }

    pretty(&decoded)
}

/// JSON truthiness: null, false, 0, "", [] and {} are empty.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Content as display text. Arrays of content blocks contribute their
/// `text` fields; anything else falls back to JSON.
fn render_content(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => {
            let texts: Vec<&str> = blocks
                .iter()
                .filter_map(|b| match b {
                    Value::String(s) => Some(s.as_str()),
                    other => other.get("text").and_then(Value::as_str),
                })
                .filter(|s| !s.is_empty())
                .collect();
            if texts.is_empty() {
                pretty(content)
            } else {
                texts.join("\n")
            }
        }
        other => pretty(other),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
