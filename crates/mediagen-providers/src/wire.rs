//! KIE response envelopes and task-record parsing.
//!
//! Every KIE endpoint answers `{code, msg, data}`. Task records come in two
//! dialects: a string `state` (`waiting` / `success` / `fail`) and the older
//! numeric `successFlag` (0 waiting, 1 success, 2 submission failed,
//! 3 generation failed). Both are read; a terminal `state` wins.

use serde_json::Value;

/// The `{code, msg, data}` wrapper.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub code: Option<i64>,
    pub msg: Option<String>,
    pub data: Value,
}

impl Envelope {
    pub fn parse(body: &Value) -> Self {
        Self {
            code: body.get("code").and_then(as_i64),
            msg: body.get("msg").and_then(as_text),
            data: body.get("data").cloned().unwrap_or(Value::Null),
        }
    }

    /// Envelopes without a code are treated as accepted.
    pub fn is_ok(&self) -> bool {
        self.code.map_or(true, |c| c == 200)
    }

    pub fn task_id(&self) -> Option<String> {
        self.data
            .get("taskId")
            .or_else(|| self.data.get("task_id"))
            .and_then(as_text)
            .filter(|id| !id.is_empty())
    }
}

/// Provider-side status of one task.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskStatus {
    /// Not terminal yet; carries the raw state label if any.
    Pending(Option<String>),
    Succeeded,
    Failed {
        code: Option<String>,
        message: Option<String>,
    },
}

/// Read a task record (`data` of a status envelope).
pub fn task_status(data: &Value) -> TaskStatus {
    let state = data
        .get("state")
        .or_else(|| data.get("status"))
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase);

    match state.as_deref() {
        Some("success" | "succeeded" | "completed") => return TaskStatus::Succeeded,
        Some("fail" | "failed" | "error") => return failed(data),
        _ => {}
    }

    match data.get("successFlag").and_then(as_i64) {
        Some(1) => TaskStatus::Succeeded,
        Some(2) | Some(3) => failed(data),
        _ => TaskStatus::Pending(state),
    }
}

fn failed(data: &Value) -> TaskStatus {
    let code = ["failCode", "errorCode"]
        .iter()
        .find_map(|k| data.get(*k).and_then(as_text));
    let message = ["failMsg", "errorMessage", "error"]
        .iter()
        .find_map(|k| data.get(*k).and_then(as_text));
    TaskStatus::Failed { code, message }
}

/// Integer from a JSON number or numeric string.
fn as_i64(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Non-empty text from a JSON string or number.
fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
