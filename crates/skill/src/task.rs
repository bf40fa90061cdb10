use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Result, SkillError};

/// Unique task identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::generate()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Status of a task. Informational only, the runner never transitions it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Success,
    Failed,
}

/// A unit of requested work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Which operation is requested
    #[serde(rename = "type")]
    pub task_type: String,
    /// Untyped parameters, interpreted by whichever skill claims the task
    #[serde(default)]
    pub payload: Map<String, Value>,
    /// Provenance tag ("cli", "api", "worker", ...)
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub status: TaskStatus,
}

fn default_source() -> String {
    "cli".to_string()
}

impl Task {
    pub fn new(task_type: impl Into<String>) -> Self {
        Self {
            id: TaskId::generate(),
            task_type: task_type.into(),
            payload: Map::new(),
            source: default_source(),
            status: TaskStatus::Pending,
        }
    }

    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// String field from the payload. Empty strings count as absent.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.payload
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Typed field from the payload; `None` when absent or of the wrong shape.
    pub fn param<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.payload
            .get(key)
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Field that must be present. Numbers are accepted and rendered as text,
    /// since ids arrive both ways from callers.
    pub fn require_str(&self, key: &str) -> Result<String> {
        match self.payload.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(SkillError::InvalidInput(format!(
                "Missing required field: '{}'",
                key
            ))),
        }
    }
}

/// Follow-up operation for the external worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    /// Risk classification; 0 = auto-apply, higher tiers need approval downstream
    #[serde(default)]
    pub tier: u8,
    #[serde(default)]
    pub payload: Value,
}

impl Action {
    pub fn new(action_type: &str, tier: u8, payload: Value) -> Self {
        Self {
            action_type: action_type.to_string(),
            tier,
            payload,
        }
    }
}

/// Outcome of attempting a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
    /// How the result was derived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Value>,
    /// Entities consulted while deriving it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Value>,
}

impl TaskResult {
    pub fn success(task_id: &TaskId, message: impl Into<String>) -> Self {
        Self::new(task_id, true, message.into())
    }

    pub fn failure(task_id: &TaskId, message: impl Into<String>) -> Self {
        Self::new(task_id, false, message.into())
    }

    fn new(task_id: &TaskId, success: bool, message: String) -> Self {
        Self {
            task_id: task_id.clone(),
            success,
            message,
            data: None,
            actions: None,
            reasoning: None,
            evidence: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn with_reasoning(mut self, reasoning: Value) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    pub fn with_evidence(mut self, evidence: Value) -> Self {
        self.evidence = Some(evidence);
        self
    }
}
