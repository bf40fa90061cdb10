use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillError {
    #[error("Invalid task input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    ExecutionFailed(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Skill already registered: {0}")]
    DuplicateSkill(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SkillError>;
