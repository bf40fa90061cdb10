//! Built-in skills and the composition root that registers them

pub mod env_status;
pub mod life_os;
pub mod repo_audit;
pub mod repo_lister;
pub mod task_management;

use std::path::PathBuf;
use std::sync::Arc;

use otto_skill::{AppConfig, SkillRegistry, Task};

pub use env_status::EnvStatusSkill;
pub use life_os::{LifeOsClient, LifeOsError};
pub use repo_audit::RepoAuditSkill;
pub use repo_lister::RepoListerSkill;
pub use task_management::TaskManagementSkill;

/// Assemble every built-in skill in dispatch order
pub fn default_registry(config: &AppConfig) -> otto_skill::Result<SkillRegistry> {
    SkillRegistry::new()
        .with_skill(Arc::new(RepoListerSkill::new()))?
        .with_skill(Arc::new(RepoAuditSkill::new()))?
        .with_skill(Arc::new(EnvStatusSkill::new(&config.services)))?
        .with_skill(Arc::new(TaskManagementSkill::new(
            &config.services.life_os_api_url,
        )))
}

/// Repository named by the task, falling back to the configured default.
/// `Err` carries the path that could not be found, made absolute.
pub(crate) fn resolve_repo(task: &Task, config: &AppConfig) -> Result<PathBuf, PathBuf> {
    let target = task
        .param_str("target_repo")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.storage.default_repo_root.clone());
    match target.canonicalize() {
        Ok(found) => Ok(found),
        Err(_) => Err(std::path::absolute(&target).unwrap_or(target)),
    }
}
