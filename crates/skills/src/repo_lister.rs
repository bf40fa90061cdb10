//! Renders a repository's directory tree as Markdown

use async_trait::async_trait;
use chrono::Local;
use serde_json::json;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use otto_skill::{Skill, SkillContext, SkillHealthIssue, Task, TaskResult};

use crate::resolve_repo;

pub struct RepoListerSkill;

impl RepoListerSkill {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RepoListerSkill {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Skill for RepoListerSkill {
    fn name(&self) -> &str {
        "repo_lister"
    }

    fn description(&self) -> &str {
        "Lists repository structure and writes it to Markdown"
    }

    fn can_handle(&self, task: &Task) -> bool {
        task.task_type == "repo_list"
    }

    async fn run(&self, task: &Task, ctx: &SkillContext) -> otto_skill::Result<TaskResult> {
        let config = ctx.config();
        let repo_path = match resolve_repo(task, config) {
            Ok(path) => path,
            Err(missing) => {
                return Ok(TaskResult::failure(
                    &task.id,
                    format!("Repository path does not exist: {}", missing.display()),
                ))
            }
        };

        let output_path = task
            .param_str("output_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| config.storage.reports_dir.join("repo_tree.md"));

        let job = {
            let output_path = output_path.clone();
            tokio::task::spawn_blocking(move || write_tree_report(&repo_path, &output_path))
        };
        match job.await {
            Ok(written) => written?,
            Err(e) => {
                return Ok(TaskResult::failure(
                    &task.id,
                    format!("Repository listing did not complete: {}", e),
                ))
            }
        }

        info!("Repository tree written to {}", output_path.display());

        Ok(TaskResult::success(
            &task.id,
            format!("Repository tree written to {}", output_path.display()),
        )
        .with_data(json!({ "output_path": output_path.display().to_string() })))
    }

    async fn self_test(&self, ctx: &SkillContext) -> Vec<SkillHealthIssue> {
        let default_repo = &ctx.config().storage.default_repo_root;
        if default_repo.exists() {
            return Vec::new();
        }
        vec![SkillHealthIssue::new(
            "default_repo_missing",
            format!("Default repo root does not exist: {}", default_repo.display()),
        )
        .with_suggestion("Update otto_config.yaml with a valid default_repo_root")]
    }
}

/// Render the tree document for `repo_path` and write it to `output_path`.
/// Blocking; callers on the runtime go through `spawn_blocking`.
fn write_tree_report(repo_path: &Path, output_path: &Path) -> io::Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let name = repo_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| repo_path.display().to_string());

    let mut doc = String::new();
    doc.push_str(&format!("# Repository Tree: {}\n\n", name));
    doc.push_str(&format!("**Generated:** {}\n\n", Local::now().to_rfc3339()));
    doc.push_str(&format!("**Root Path:** `{}`\n\n", repo_path.display()));
    doc.push_str("## Directory Structure\n\n```\n");
    doc.push_str(&render_tree(repo_path).join("\n"));
    doc.push_str("\n```\n");
    fs::write(output_path, doc)
}

/// Tree lines below `root`, directories first, names compared case-insensitively
pub fn render_tree(root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    render_level(root, "", &mut lines);
    lines
}

fn render_level(dir: &Path, prefix: &str, lines: &mut Vec<String>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            lines.push(format!("{}└── [Permission Denied]", prefix));
            return;
        }
    };

    // Symlinks are listed but never followed.
    let mut items: Vec<(bool, String, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .map(|e| {
            let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
            (is_dir, e.file_name().to_string_lossy().into_owned(), e.path())
        })
        .collect();
    items.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase()))
    });

    let count = items.len();
    for (i, (is_dir, name, path)) in items.into_iter().enumerate() {
        let last = i + 1 == count;
        lines.push(format!("{}{}{}", prefix, if last { "└── " } else { "├── " }, name));
        if is_dir {
            let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
            render_level(&path, &child_prefix, lines);
        }
    }
}
