//! Subcommand bodies. Each returns whether the process should exit successfully.

use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use serde_json::{Map, Value};

use otto_skill::{SkillContext, SkillRegistry, Task, TaskResult};

pub fn sample_task(ctx: &SkillContext) -> Task {
    let storage = &ctx.config().storage;
    Task::new("repo_list")
        .with_param(
            "target_repo",
            storage.default_repo_root.display().to_string(),
        )
        .with_param(
            "output_path",
            storage.reports_dir.join("repo_tree_sample.md").display().to_string(),
        )
}

pub fn audit_task(ctx: &SkillContext, target: Option<PathBuf>) -> Task {
    let output = ctx
        .config()
        .storage
        .reports_dir
        .join("audits")
        .join(format!("otto_audit_{}.md", Local::now().format("%Y-%m-%d")));

    let task = Task::new("repo_audit").with_param("output_path", output.display().to_string());
    match target {
        Some(target) => task.with_param("target_repo", target.display().to_string()),
        None => task,
    }
}

pub fn parse_payload(raw: &str) -> anyhow::Result<Map<String, Value>> {
    serde_json::from_str(raw).context("--payload must be a JSON object")
}

pub async fn run_sample(registry: &SkillRegistry, ctx: &SkillContext) -> bool {
    let result = registry.run_task(&sample_task(ctx), ctx).await;
    report(&result, "Success", "Failed", "Output")
}

pub async fn audit(registry: &SkillRegistry, ctx: &SkillContext, target: Option<PathBuf>) -> bool {
    let result = registry.run_task(&audit_task(ctx, target), ctx).await;
    report(&result, "Audit complete", "Audit failed", "Report")
}

pub async fn run(
    registry: &SkillRegistry,
    ctx: &SkillContext,
    task_type: String,
    payload: Map<String, Value>,
) -> bool {
    let task = Task::new(task_type).with_payload(payload);
    let result = registry.run_task(&task, ctx).await;
    if result.success {
        println!("✅ {}", result.message);
    } else {
        println!("❌ {}", result.message);
    }
    if let Some(data) = &result.data {
        println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
    }
    for action in result.actions.iter().flatten() {
        println!("   → action {} (tier {})", action.action_type, action.tier);
    }
    result.success
}

pub async fn health(registry: &SkillRegistry, ctx: &SkillContext) -> bool {
    let report = registry.run_health_checks(ctx).await;
    if !report.has_issues() {
        println!("✅ All skills are healthy!");
        return true;
    }

    println!("⚠️  Found {} issue(s) across skills:\n", report.total_issues());
    for (skill, issues) in &report.issues {
        println!("**{}:**", skill);
        for issue in issues {
            println!("  - [{}] {}", issue.code, issue.message);
            if let Some(suggestion) = &issue.suggestion {
                println!("    Suggestion: {}", suggestion);
            }
        }
        println!();
    }
    false
}

pub fn list_skills(registry: &SkillRegistry) {
    println!("📚 {} skill(s) registered:", registry.len());
    for info in registry.list_info() {
        println!("  - {}: {}", info.name, info.description);
    }
}

fn report(result: &TaskResult, ok_label: &str, fail_label: &str, path_label: &str) -> bool {
    if !result.success {
        println!("❌ {}: {}", fail_label, result.message);
        return false;
    }
    println!("✅ {}: {}", ok_label, result.message);
    if let Some(path) = result
        .data
        .as_ref()
        .and_then(|d| d.get("output_path"))
        .and_then(Value::as_str)
    {
        println!("   {}: {}", path_label, path);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use otto_skill::{AppConfig, StorageConfig};
    use std::sync::Arc;

    fn ctx() -> SkillContext {
        let config = AppConfig {
            storage: StorageConfig {
                default_repo_root: PathBuf::from("/srv/repo"),
                reports_dir: PathBuf::from("/tmp/reports"),
            },
            ..Default::default()
        };
        SkillContext::new(Arc::new(config))
    }

    #[test]
    fn test_sample_task_targets_default_repo() {
        let task = sample_task(&ctx());
        assert_eq!(task.task_type, "repo_list");
        assert_eq!(task.source, "cli");
        assert_eq!(task.param_str("target_repo"), Some("/srv/repo"));
        assert_eq!(
            task.param_str("output_path"),
            Some("/tmp/reports/repo_tree_sample.md")
        );
    }

    #[test]
    fn test_audit_task_output_and_target() {
        let task = audit_task(&ctx(), None);
        assert!(task.param_str("target_repo").is_none());
        let output = task.param_str("output_path").unwrap();
        assert!(output.starts_with("/tmp/reports/audits/otto_audit_"));
        assert!(output.ends_with(".md"));

        let task = audit_task(&ctx(), Some(PathBuf::from("apps/otto")));
        assert_eq!(task.param_str("target_repo"), Some("apps/otto"));
    }

    #[test]
    fn test_parse_payload() {
        let payload = parse_payload(r#"{"title": "Pay rent", "limit": 5}"#).unwrap();
        assert_eq!(payload["title"], "Pay rent");
        assert!(parse_payload("[1, 2]").is_err());
        assert!(parse_payload("not json").is_err());
    }

    #[tokio::test]
    async fn test_run_sample_writes_tree() {
        let repo = tempfile::tempdir().unwrap();
        std::fs::write(repo.path().join("Cargo.toml"), "").unwrap();
        let reports = tempfile::tempdir().unwrap();
        let config = AppConfig {
            storage: StorageConfig {
                default_repo_root: repo.path().to_path_buf(),
                reports_dir: reports.path().to_path_buf(),
            },
            ..Default::default()
        };
        let registry = otto_skills::default_registry(&config).unwrap();
        let ctx = SkillContext::new(Arc::new(config));

        assert!(run_sample(&registry, &ctx).await);
        assert!(reports.path().join("repo_tree_sample.md").exists());
    }

    #[tokio::test]
    async fn test_unknown_task_type_fails() {
        let registry = otto_skills::default_registry(&AppConfig::default()).unwrap();
        let ok = run(&registry, &SkillContext::default(), "nope".to_string(), Map::new()).await;
        assert!(!ok);
    }
}
