use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::context::SkillContext;
use crate::definition::Skill;
use crate::task::{Task, TaskResult};

/// First registered skill that claims the task
pub fn find_handler<'a>(skills: &'a [Arc<dyn Skill>], task: &Task) -> Option<&'a Arc<dyn Skill>> {
    skills.iter().find(|skill| skill.can_handle(task))
}

/// Run a batch of tasks against the registered skills.
///
/// Returns exactly one result per task, in input order. Tasks run one after
/// another; a failure in one never affects the others.
pub async fn run_tasks(
    tasks: &[Task],
    skills: &[Arc<dyn Skill>],
    ctx: &SkillContext,
) -> Vec<TaskResult> {
    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(execute_task(task, skills, ctx).await);
    }
    results
}

/// Dispatch a single task to its handler
pub async fn execute_task(task: &Task, skills: &[Arc<dyn Skill>], ctx: &SkillContext) -> TaskResult {
    let Some(skill) = find_handler(skills, task) else {
        warn!("No skill found to handle task {} of type {}", task.id, task.task_type);
        return TaskResult::failure(
            &task.id,
            format!("No skill found to handle task type: {}", task.task_type),
        );
    };

    let span = info_span!(
        parent: ctx.span(),
        "task",
        id = %task.id,
        task_type = %task.task_type,
        skill = skill.name()
    );
    let start = Instant::now();

    debug!("Executing task {} with skill {}", task.id, skill.name());

    let outcome = AssertUnwindSafe(skill.run(task, ctx))
        .catch_unwind()
        .instrument(span)
        .await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(result)) => {
            debug!(
                "Task {} finished in {}ms (success: {})",
                task.id, duration_ms, result.success
            );
            result
        }
        Ok(Err(e)) => {
            error!("Skill {} failed on task {}: {:?}", skill.name(), task.id, e);
            TaskResult::failure(&task.id, format!("Error executing task: {}", e))
        }
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            error!("Skill {} panicked on task {}: {}", skill.name(), task.id, reason);
            TaskResult::failure(&task.id, format!("Error executing task: {}", reason))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "skill panicked".to_string()
    }
}
