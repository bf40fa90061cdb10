pub mod config;
pub mod context;
pub mod definition;
pub mod error;
pub mod executor;
pub mod health;
pub mod registry;
pub mod task;

pub use config::{AppConfig, SafetyConfig, ServicesConfig, StorageConfig};
pub use context::SkillContext;
pub use definition::{Skill, SkillHealthIssue, SkillInfo};
pub use error::{Result, SkillError};
pub use executor::{execute_task, find_handler, run_tasks};
pub use health::{run_skill_health_checks, HealthReport};
pub use registry::SkillRegistry;
pub use task::{Action, Task, TaskId, TaskResult, TaskStatus};
