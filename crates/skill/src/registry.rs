use std::sync::Arc;
use tracing::info;

use crate::context::SkillContext;
use crate::definition::{Skill, SkillInfo};
use crate::error::{Result, SkillError};
use crate::executor;
use crate::health::{self, HealthReport};
use crate::task::{Task, TaskResult};

/// Ordered set of skills.
///
/// Registration order matters: when two skills claim the same task type the
/// earlier one always wins.
#[derive(Clone, Default)]
pub struct SkillRegistry {
    skills: Vec<Arc<dyn Skill>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self { skills: Vec::new() }
    }

    /// Register a skill; names must be unique
    pub fn register(&mut self, skill: Arc<dyn Skill>) -> Result<()> {
        if self.get(skill.name()).is_some() {
            return Err(SkillError::DuplicateSkill(skill.name().to_string()));
        }
        info!("Registered skill: {}", skill.name());
        self.skills.push(skill);
        Ok(())
    }

    pub fn with_skill(mut self, skill: Arc<dyn Skill>) -> Result<Self> {
        self.register(skill)?;
        Ok(self)
    }

    /// Look up a skill by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Skill>> {
        self.skills.iter().find(|s| s.name() == name)
    }

    pub fn find_handler(&self, task: &Task) -> Option<&Arc<dyn Skill>> {
        executor::find_handler(&self.skills, task)
    }

    pub fn skills(&self) -> &[Arc<dyn Skill>] {
        &self.skills
    }

    pub fn list_info(&self) -> Vec<SkillInfo> {
        self.skills.iter().map(|s| s.info()).collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub async fn run_tasks(&self, tasks: &[Task], ctx: &SkillContext) -> Vec<TaskResult> {
        executor::run_tasks(tasks, &self.skills, ctx).await
    }

    /// Run a single task
    pub async fn run_task(&self, task: &Task, ctx: &SkillContext) -> TaskResult {
        executor::execute_task(task, &self.skills, ctx).await
    }

    pub async fn run_health_checks(&self, ctx: &SkillContext) -> HealthReport {
        health::run_skill_health_checks(&self.skills, ctx).await
    }
}
