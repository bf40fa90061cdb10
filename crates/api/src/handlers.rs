use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use otto_skill::{Task, TaskResult};

use crate::{AppState, SERVICE_NAME, VERSION};

/// Tokens whose presence `/capabilities` reports
const CAPABILITY_TOKENS: &[(&str, &str)] = &[
    ("github_token", "GITHUB_TOKEN"),
    ("vercel_token", "VERCEL_TOKEN"),
    ("render_api_key", "RENDER_API_KEY"),
];

const PROMPT_PREVIEW_CHARS: usize = 100;

fn api_source() -> String {
    "api".to_string()
}

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default = "api_source")]
    pub source: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
    /// Falls back to "prompt" when absent
    pub task_type: Option<String>,
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
    #[serde(default = "api_source")]
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_id: String,
    /// "success", "failed" or "queued"
    pub status: String,
    pub message: String,
    pub result: Option<Value>,
    pub actions: Option<Value>,
    pub reasoning: Option<Value>,
    pub evidence: Option<Value>,
}

impl TaskResponse {
    /// Some skills put their actions under `data.actions`; surface those at
    /// the top level and strip them from `result`.
    fn from_result(result: TaskResult) -> Self {
        let mut data = result.data;
        let lifted = match data.as_mut().and_then(Value::as_object_mut) {
            Some(obj) if has_actions(obj.get("actions")) => obj.remove("actions"),
            _ => None,
        };
        let actions = lifted.or_else(|| result.actions.map(|a| json!(a)));

        Self {
            task_id: result.task_id.to_string(),
            status: if result.success { "success" } else { "failed" }.to_string(),
            message: result.message,
            result: data,
            actions,
            reasoning: result.reasoning,
            evidence: result.evidence,
        }
    }
}

fn has_actions(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "status": "running",
        "version": VERSION,
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn capabilities() -> Json<Map<String, Value>> {
    let caps = CAPABILITY_TOKENS
        .iter()
        .map(|(key, var)| {
            let present = std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false);
            (key.to_string(), Value::Bool(present))
        })
        .collect();
    Json(caps)
}

pub async fn list_skills(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "skills": state.registry.list_info() }))
}

pub async fn skill_health(State(state): State<AppState>) -> Json<Value> {
    let report = state.registry.run_health_checks(&state.context).await;
    Json(json!({
        "healthy": !report.has_issues(),
        "total_issues": report.total_issues(),
        "issues": report.issues,
    }))
}

pub async fn submit_task(
    State(state): State<AppState>,
    Json(request): Json<TaskRequest>,
) -> Json<TaskResponse> {
    let task = Task::new(request.task_type)
        .with_payload(request.payload)
        .with_source(&request.source);
    info!("📥 Task {} ({}) from {}", task.id, task.task_type, task.source);

    let result = state.registry.run_task(&task, &state.context).await;
    Json(TaskResponse::from_result(result))
}

pub async fn submit_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Json<TaskResponse> {
    let mut payload = Map::new();
    payload.insert("prompt".to_string(), Value::String(request.prompt.clone()));
    payload.extend(request.payload.unwrap_or_default());

    let task = Task::new(request.task_type.unwrap_or_else(|| "prompt".to_string()))
        .with_payload(payload)
        .with_source(&request.source);

    if state.registry.find_handler(&task).is_none() {
        warn!("No skill claims prompt task {} ({}), queueing", task.id, task.task_type);
        let preview: String = request.prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        return Json(TaskResponse {
            task_id: task.id.to_string(),
            status: "queued".to_string(),
            message: format!(
                "Prompt received: '{}...'. Will be processed when LLM integration is available.",
                preview
            ),
            result: Some(json!({ "note": "LLM integration not yet available" })),
            actions: None,
            reasoning: None,
            evidence: None,
        });
    }

    let result = state.registry.run_task(&task, &state.context).await;
    Json(TaskResponse::from_result(result))
}
