//! Structural audit of a repository. Advisory only, nothing is changed.

use async_trait::async_trait;
use chrono::Local;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use otto_skill::{Skill, SkillContext, SkillHealthIssue, Task, TaskResult};

use crate::resolve_repo;

/// Files whose estimated line count exceeds this are reported
const LARGE_FILE_LINES: u64 = 1000;
const BYTES_PER_LINE: u64 = 50;

const SKIPPED_DIRS: &[&str] = &["__pycache__", ".git", "node_modules", "target"];

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AuditFindings {
    pub issues: Vec<String>,
    pub empty_dirs: Vec<String>,
    pub large_files: Vec<LargeFile>,
    pub missing_init: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LargeFile {
    pub path: String,
    pub size: u64,
}

pub struct RepoAuditSkill;

impl RepoAuditSkill {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RepoAuditSkill {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Skill for RepoAuditSkill {
    fn name(&self) -> &str {
        "repo_audit"
    }

    fn description(&self) -> &str {
        "Audits repository structure and writes an advisory report"
    }

    fn can_handle(&self, task: &Task) -> bool {
        task.task_type == "repo_audit"
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

        let output_path = task.param_str("output_path").map(PathBuf::from).unwrap_or_else(|| {
            config
                .storage
                .reports_dir
                .join("audits")
                .join(format!("otto_audit_{}.md", Local::now().format("%Y-%m-%d")))
        });

        let job = {
            let output_path = output_path.clone();
            tokio::task::spawn_blocking(move || write_audit(&repo_path, &output_path))
        };
        let findings = match job.await {
            Ok(written) => written?,
            Err(e) => {
                return Ok(TaskResult::failure(
                    &task.id,
                    format!("Repository audit did not complete: {}", e),
                ))
            }
        };

        info!(
            "Audit report written to {} ({} issue(s))",
            output_path.display(),
            findings.issues.len()
        );

        Ok(TaskResult::success(
            &task.id,
            format!("Audit report written to {}", output_path.display()),
        )
        .with_data(json!({
            "output_path": output_path.display().to_string(),
            "findings": findings,
        })))
    }

    async fn self_test(&self, ctx: &SkillContext) -> Vec<SkillHealthIssue> {
        let reports_dir = &ctx.config().storage.reports_dir;
        match check_reports_dir(reports_dir) {
            Ok(()) => Vec::new(),
            Err(reason) => vec![SkillHealthIssue::new(
                "reports_dir_unwritable",
                format!("Cannot write reports to {}: {}", reports_dir.display(), reason),
            )
            .with_suggestion("Point storage.reports_dir at a writable location")],
        }
    }
}

/// Whether reports could be written under `dir`, without creating anything.
/// A missing directory is judged by its nearest existing ancestor.
fn check_reports_dir(dir: &Path) -> Result<(), String> {
    let existing = dir
        .ancestors()
        .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
        .find(|p| p.exists())
        .ok_or_else(|| "no existing parent directory".to_string())?;

    let meta = fs::metadata(existing).map_err(|e| e.to_string())?;
    if !meta.is_dir() {
        return Err(format!("{} is not a directory", existing.display()));
    }
    if meta.permissions().readonly() {
        return Err(format!("{} is read-only", existing.display()));
    }
    Ok(())
}

/// Audit `repo_path` and write the report. Blocking.
fn write_audit(repo_path: &Path, output_path: &Path) -> io::Result<AuditFindings> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let findings = audit_repo(repo_path);
    fs::write(output_path, render_report(repo_path, &findings))?;
    Ok(findings)
}

/// Walk the repository and collect findings
pub fn audit_repo(root: &Path) -> AuditFindings {
    let mut findings = AuditFindings::default();
    audit_dir(root, root, &mut findings);

    findings.issues = findings
        .empty_dirs
        .iter()
        .cloned()
        .chain(findings.large_files.iter().map(|f| f.path.clone()))
        .chain(findings.missing_init.iter().cloned())
        .collect();
    findings
}

fn audit_dir(root: &Path, dir: &Path, findings: &mut AuditFindings) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping unreadable {}: {}", dir.display(), e);
            return;
        }
    };

    let mut subdirs = Vec::new();
    let mut file_names = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            subdirs.push(path);
        } else if file_type.is_file() {
            if let Ok(meta) = entry.metadata() {
                if meta.len() > LARGE_FILE_LINES * BYTES_PER_LINE {
                    findings.large_files.push(LargeFile {
                        path: relative(root, &path),
                        size: meta.len(),
                    });
                }
            }
            file_names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    if dir != root {
        let only_init = subdirs.is_empty() && file_names.iter().all(|n| n == "__init__.py");
        if only_init {
            findings.empty_dirs.push(relative(root, dir));
        }
    }

    let has_py = file_names.iter().any(|n| n.ends_with(".py"));
    if has_py && !file_names.iter().any(|n| n == "__init__.py") {
        findings.missing_init.push(relative(root, dir));
    }

    subdirs.sort();
    for sub in subdirs {
        let skipped = sub
            .file_name()
            .map(|n| SKIPPED_DIRS.iter().any(|s| n == *s))
            .unwrap_or(false);
        if !skipped {
            audit_dir(root, &sub, findings);
        }
    }
}

fn relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    if rel.as_os_str().is_empty() {
        ".".to_string()
    } else {
        rel.display().to_string()
    }
}

fn render_report(repo_path: &Path, findings: &AuditFindings) -> String {
    let mut out = String::new();
    out.push_str("# Otto Repository Audit\n\n");
    out.push_str(&format!("**Generated:** {}\n\n", Local::now().to_rfc3339()));
    out.push_str(&format!("**Target:** `{}`\n\n", repo_path.display()));

    out.push_str("## Summary\n\n");
    out.push_str(&format!("- **Total Issues Found:** {}\n", findings.issues.len()));
    out.push_str(&format!("- **Empty Directories:** {}\n", findings.empty_dirs.len()));
    out.push_str(&format!("- **Large Files:** {}\n", findings.large_files.len()));
    out.push_str(&format!(
        "- **Missing __init__.py:** {}\n\n",
        findings.missing_init.len()
    ));

    if !findings.empty_dirs.is_empty() {
        out.push_str("## Empty or Suspicious Directories\n\n");
        for dir in &findings.empty_dirs {
            out.push_str(&format!("- `{}`\n", dir));
        }
        out.push('\n');
    }

    if !findings.large_files.is_empty() {
        out.push_str(&format!(
            "## Large Files (>{} lines estimated)\n\n",
            LARGE_FILE_LINES
        ));
        for file in &findings.large_files {
            out.push_str(&format!("- `{}` ({} bytes)\n", file.path, file.size));
        }
        out.push('\n');
    }

    if !findings.missing_init.is_empty() {
        out.push_str("## Missing __init__.py Files\n\n");
        for dir in &findings.missing_init {
            out.push_str(&format!(
                "- `{}` (Python package directory missing __init__.py)\n",
                dir
            ));
        }
        out.push('\n');
    }

    out.push_str("## Proposed Changes (Advisory Only)\n\n");
    out.push_str("The following changes are suggested but will not be applied automatically:\n\n");
    if !findings.empty_dirs.is_empty() {
        out.push_str("- Consider removing empty directories or adding placeholder files\n");
    }
    if !findings.large_files.is_empty() {
        out.push_str("- Review large files for potential refactoring or splitting\n");
    }
    if !findings.missing_init.is_empty() {
        out.push_str("- Add `__init__.py` files to Python package directories\n");
    }
    if findings.issues.is_empty() {
        out.push_str("- No issues detected. Repository structure looks good!\n");
    }
    out
}
