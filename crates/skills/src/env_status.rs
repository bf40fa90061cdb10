//! Environment diagnosis: toolchain presence and service reachability

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use otto_skill::{Action, ServicesConfig, Skill, SkillContext, Task, TaskResult};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const HANDLED_TYPES: &[&str] = &["env_status", "otto_doctor", "check_dependencies", "diagnose_env"];

/// Outcome of one check
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Check {
    pub ok: bool,
    /// Version string on success, reason on failure
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvChecks {
    pub python: Check,
    pub node: Check,
    pub cargo: Check,
    pub otto_api: Check,
    pub life_os_backend: Check,
    pub needs_setup: bool,
    pub setup_script: String,
}

pub struct EnvStatusSkill {
    http: reqwest::Client,
    otto_api_url: String,
    life_os_api_url: String,
}

impl EnvStatusSkill {
    pub fn new(services: &ServicesConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            otto_api_url: services.otto_api_url.trim_end_matches('/').to_string(),
            life_os_api_url: services.life_os_api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn run_checks(&self) -> EnvChecks {
        let python = probe_tool(&["python3", "python"]).await;
        let node = probe_tool(&["node"]).await;
        let cargo = probe_tool(&["cargo"]).await;
        let otto_api = self.probe_service("Otto API", &self.otto_api_url).await;
        let life_os_backend = self.probe_service("Life OS Backend", &self.life_os_api_url).await;

        EnvChecks {
            needs_setup: !python.ok,
            setup_script: setup_script().to_string(),
            python,
            node,
            cargo,
            otto_api,
            life_os_backend,
        }
    }

    async fn probe_service(&self, label: &str, base_url: &str) -> Check {
        let url = format!("{}/health", base_url);
        match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => Check {
                ok: true,
                detail: base_url.to_string(),
            },
            Ok(response) => Check {
                ok: false,
                detail: format!(
                    "{} returned status {} at {}",
                    label,
                    response.status().as_u16(),
                    base_url
                ),
            },
            Err(e) => {
                debug!("{} probe failed: {}", label, e);
                Check {
                    ok: false,
                    detail: format!("{} not reachable at {}", label, base_url),
                }
            }
        }
    }
}

#[async_trait]
impl Skill for EnvStatusSkill {
    fn name(&self) -> &str {
        "env_status"
    }

    fn description(&self) -> &str {
        "Diagnoses environment setup, dependencies, and service health"
    }

    fn can_handle(&self, task: &Task) -> bool {
        HANDLED_TYPES.contains(&task.task_type.as_str())
    }

    async fn run(&self, task: &Task, _ctx: &SkillContext) -> otto_skill::Result<TaskResult> {
        let checks = self.run_checks().await;
        let report = format_report(&checks);

        let mut result = TaskResult::success(&task.id, report)
            .with_data(json!({ "checks": checks }));
        if checks.needs_setup {
            result = result.with_actions(vec![Action::new(
                "otto.log",
                0,
                json!({
                    "message": format!("Run {} to fix missing dependencies", checks.setup_script),
                    "level": "warning",
                }),
            )]);
        }
        Ok(result)
    }
}

/// First candidate binary that answers `--version`
async fn probe_tool(candidates: &[&str]) -> Check {
    for bin in candidates {
        let mut cmd = Command::new(bin);
        cmd.arg("--version");
        if let Some(output) = run_probe(cmd, PROBE_TIMEOUT).await {
            // Older Pythons print the version on stderr
            let text = if output.stdout.is_empty() {
                output.stderr
            } else {
                output.stdout
            };
            return Check {
                ok: true,
                detail: String::from_utf8_lossy(&text).trim().to_string(),
            };
        }
    }
    Check {
        ok: false,
        detail: format!("{} not found", candidates.join("/")),
    }
}

/// Output of a successful run; the child is killed if it outlives `limit`
async fn run_probe(mut cmd: Command, limit: Duration) -> Option<Output> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(limit, cmd.output()).await {
        Ok(Ok(output)) if output.status.success() => Some(output),
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            debug!("probe failed to start: {}", e);
            None
        }
        Err(_) => {
            debug!("probe timed out after {:?}", limit);
            None
        }
    }
}

fn setup_script() -> &'static str {
    if cfg!(windows) {
        "setup_otto_windows.bat"
    } else {
        "setup_otto_unix.sh"
    }
}

pub fn format_report(checks: &EnvChecks) -> String {
    fn line(mark_fail: &str, label: &str, check: &Check) -> String {
        let mark = if check.ok { "✓" } else { mark_fail };
        format!("{} {}: {}", mark, label, check.detail)
    }

    let mut lines = vec![
        "Environment Status Report".to_string(),
        "=".repeat(50),
        String::new(),
        line("✗", "Python", &checks.python),
        line("○", "Node.js (optional)", &checks.node),
        line("○", "Cargo (optional)", &checks.cargo),
        String::new(),
        "Services:".to_string(),
        line("✗", "Otto API", &checks.otto_api),
        line("✗", "Life OS Backend", &checks.life_os_backend),
    ];

    if checks.needs_setup {
        lines.push(String::new());
        lines.push(format!(
            "⚠ Setup needed: run {} to install missing dependencies",
            checks.setup_script
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_services() -> ServicesConfig {
        ServicesConfig {
            life_os_api_url: "http://127.0.0.1:1".to_string(),
            otto_api_url: "http://127.0.0.1:1/".to_string(),
        }
    }

    #[tokio::test]
    async fn test_report_always_succeeds() {
        let skill = EnvStatusSkill::new(&unreachable_services());
        let task = Task::new("otto_doctor");

        let result = skill.run(&task, &SkillContext::default()).await.unwrap();

        assert!(result.success);
        assert!(result.message.starts_with("Environment Status Report"));
        let checks = &result.data.unwrap()["checks"];
        assert_eq!(checks["otto_api"]["ok"], false);
        assert_eq!(
            checks["life_os_backend"]["detail"],
            "Life OS Backend not reachable at http://127.0.0.1:1"
        );
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let check = probe_tool(&["definitely-not-a-real-binary-otto"]).await;
        assert!(!check.ok);
        assert_eq!(check.detail, "definitely-not-a-real-binary-otto not found");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timed_out_probe_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("still_running");
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(format!("sleep 1 && touch '{}'", marker.display()));

        let output = run_probe(cmd, Duration::from_millis(100)).await;
        assert!(output.is_none());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "timed-out child kept running");
    }

    #[test]
    fn test_setup_hint_in_report() {
        let missing = Check {
            ok: false,
            detail: "python3/python not found".to_string(),
        };
        let up = Check {
            ok: true,
            detail: "v1".to_string(),
        };
        let checks = EnvChecks {
            python: missing,
            node: up.clone(),
            cargo: up.clone(),
            otto_api: up.clone(),
            life_os_backend: up,
            needs_setup: true,
            setup_script: "setup_otto_unix.sh".to_string(),
        };

        let report = format_report(&checks);
        assert!(report.contains("✗ Python: python3/python not found"));
        assert!(report.contains("✓ Node.js (optional): v1"));
        assert!(report.contains("Setup needed: run setup_otto_unix.sh"));
    }

    #[test]
    fn test_handles_doctor_aliases() {
        let skill = EnvStatusSkill::new(&unreachable_services());
        for t in HANDLED_TYPES {
            assert!(skill.can_handle(&Task::new(*t)));
        }
        assert!(!skill.can_handle(&Task::new("repo_list")));
    }
}
