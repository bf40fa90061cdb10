use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::SkillContext;
use crate::task::{Task, TaskResult};

/// A problem found by a skill's self-test. Purely diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillHealthIssue {
    /// Short machine-readable code
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl SkillHealthIssue {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

/// Name and description of a registered skill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillInfo {
    pub name: String,
    pub description: String,
}

/// A handler for one family of task types
#[async_trait]
pub trait Skill: Send + Sync {
    /// Unique name within a registry
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        "No description available"
    }

    /// Whether this skill claims the task. Must not perform I/O.
    fn can_handle(&self, task: &Task) -> bool;

    /// Execute the task.
    ///
    /// Expected failures (bad payload, downstream errors) are reported as
    /// `Ok` with a failed [`TaskResult`]. `Err` is reserved for the
    /// unexpected and is turned into a failed result by the runner.
    async fn run(&self, task: &Task, ctx: &SkillContext) -> crate::Result<TaskResult>;

    /// Probe whatever this skill depends on. Never fails; empty when healthy.
    async fn self_test(&self, _ctx: &SkillContext) -> Vec<SkillHealthIssue> {
        Vec::new()
    }

    fn info(&self) -> SkillInfo {
        SkillInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}
