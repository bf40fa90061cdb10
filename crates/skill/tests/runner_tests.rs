use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use otto_skill::{
    run_skill_health_checks, run_tasks, Skill, SkillContext, SkillError, SkillHealthIssue,
    SkillRegistry, Task, TaskResult,
};

/// Claims a fixed set of task types and counts how often it runs
struct EchoSkill {
    name: &'static str,
    handles: &'static [&'static str],
    runs: AtomicUsize,
}

impl EchoSkill {
    fn new(name: &'static str, handles: &'static [&'static str]) -> Arc<Self> {
        Arc::new(Self {
            name,
            handles,
            runs: AtomicUsize::new(0),
        })
    }

    fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Skill for EchoSkill {
    fn name(&self) -> &str {
        self.name
    }

    fn can_handle(&self, task: &Task) -> bool {
        self.handles.contains(&task.task_type.as_str())
    }

    async fn run(&self, task: &Task, _ctx: &SkillContext) -> otto_skill::Result<TaskResult> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(TaskResult::success(&task.id, format!("handled by {}", self.name))
            .with_data(json!({"skill": self.name})))
    }
}

/// Fails every task it claims
struct BoomSkill {
    panics: bool,
}

#[async_trait]
impl Skill for BoomSkill {
    fn name(&self) -> &str {
        "boom"
    }

    fn can_handle(&self, task: &Task) -> bool {
        task.task_type == "explode"
    }

    async fn run(&self, _task: &Task, _ctx: &SkillContext) -> otto_skill::Result<TaskResult> {
        if self.panics {
            panic!("boom");
        }
        Err(SkillError::ExecutionFailed("boom".to_string()))
    }
}

/// Reports a configurable set of health issues
struct ProbeSkill {
    name: &'static str,
    issues: Vec<SkillHealthIssue>,
}

#[async_trait]
impl Skill for ProbeSkill {
    fn name(&self) -> &str {
        self.name
    }

    fn can_handle(&self, _task: &Task) -> bool {
        false
    }

    async fn run(&self, task: &Task, _ctx: &SkillContext) -> otto_skill::Result<TaskResult> {
        Ok(TaskResult::failure(&task.id, "unreachable"))
    }

    async fn self_test(&self, _ctx: &SkillContext) -> Vec<SkillHealthIssue> {
        self.issues.clone()
    }
}

#[tokio::test]
async fn test_first_registered_skill_wins() {
    let a = EchoSkill::new("a", &["ping"]);
    let b = EchoSkill::new("b", &["ping", "pong"]);
    let skills: Vec<Arc<dyn Skill>> = vec![a.clone(), b.clone()];
    let ctx = SkillContext::default();

    let results = run_tasks(&[Task::new("ping")], &skills, &ctx).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].message, "handled by a");
    assert_eq!(a.runs(), 1);
    assert_eq!(b.runs(), 0);
}

#[tokio::test]
async fn test_unmatched_task_reports_type() {
    let a = EchoSkill::new("a", &["ping"]);
    let skills: Vec<Arc<dyn Skill>> = vec![a.clone()];
    let ctx = SkillContext::default();
    let task = Task::new("pong").with_id("t-pong");

    let results = run_tasks(&[task], &skills, &ctx).await;

    assert_eq!(results[0].task_id.as_str(), "t-pong");
    assert!(!results[0].success);
    assert_eq!(results[0].message, "No skill found to handle task type: pong");
    assert_eq!(a.runs(), 0);
}

#[tokio::test]
async fn test_skill_error_becomes_failed_result() {
    let skills: Vec<Arc<dyn Skill>> = vec![Arc::new(BoomSkill { panics: false })];
    let ctx = SkillContext::default();

    let results = run_tasks(&[Task::new("explode")], &skills, &ctx).await;

    assert!(!results[0].success);
    assert_eq!(results[0].message, "Error executing task: boom");
}

#[tokio::test]
async fn test_skill_panic_becomes_failed_result() {
    let skills: Vec<Arc<dyn Skill>> = vec![Arc::new(BoomSkill { panics: true })];
    let ctx = SkillContext::default();

    let results = run_tasks(&[Task::new("explode")], &skills, &ctx).await;

    assert!(!results[0].success);
    assert_eq!(results[0].message, "Error executing task: boom");
}

#[tokio::test]
async fn test_failure_is_isolated_within_batch() {
    let a = EchoSkill::new("a", &["ping"]);
    let skills: Vec<Arc<dyn Skill>> = vec![a.clone(), Arc::new(BoomSkill { panics: true })];
    let ctx = SkillContext::default();

    let tasks = vec![
        Task::new("ping").with_id("1"),
        Task::new("explode").with_id("2"),
        Task::new("ping").with_id("3"),
    ];
    let results = run_tasks(&tasks, &skills, &ctx).await;

    let ids: Vec<_> = results.iter().map(|r| r.task_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[1].message.ends_with("boom"));
    assert!(results[2].success);
    assert_eq!(a.runs(), 2);
}

#[tokio::test]
async fn test_one_result_per_task_in_order() {
    let skills: Vec<Arc<dyn Skill>> = vec![
        EchoSkill::new("a", &["ping"]),
        EchoSkill::new("b", &["pong"]),
    ];
    let ctx = SkillContext::default();

    let types = ["pong", "nothing", "ping", "pong", "ping", "other"];
    let tasks: Vec<_> = types
        .iter()
        .enumerate()
        .map(|(i, t)| Task::new(*t).with_id(i.to_string()))
        .collect();
    let results = run_tasks(&tasks, &skills, &ctx).await;

    assert_eq!(results.len(), tasks.len());
    for (task, result) in tasks.iter().zip(&results) {
        assert_eq!(task.id, result.task_id);
    }
    let succeeded: Vec<_> = results.iter().map(|r| r.success).collect();
    assert_eq!(succeeded, vec![true, false, true, true, true, false]);
}

#[tokio::test]
async fn test_empty_skill_list() {
    let ctx = SkillContext::default();
    let tasks = vec![Task::new("ping"), Task::new("pong")];

    let results = run_tasks(&tasks, &[], &ctx).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| !r.success));
    assert!(results[1].message.contains("pong"));
}

#[tokio::test]
async fn test_can_handle_is_stable() {
    let a = EchoSkill::new("a", &["ping"]);
    let task = Task::new("ping");

    let first = a.can_handle(&task);
    for _ in 0..5 {
        assert_eq!(a.can_handle(&task), first);
    }
    assert_eq!(a.runs(), 0);
}

#[tokio::test]
async fn test_healthy_skills_yield_empty_report() {
    let skills: Vec<Arc<dyn Skill>> = vec![
        EchoSkill::new("a", &["ping"]),
        Arc::new(ProbeSkill {
            name: "probe",
            issues: Vec::new(),
        }),
    ];
    let ctx = SkillContext::default();

    let report = run_skill_health_checks(&skills, &ctx).await;

    assert!(!report.has_issues());
    assert_eq!(report.total_issues(), 0);
    assert!(report.issues.is_empty());
}

#[tokio::test]
async fn test_report_only_keys_skills_with_issues() {
    let skills: Vec<Arc<dyn Skill>> = vec![
        Arc::new(ProbeSkill {
            name: "one",
            issues: Vec::new(),
        }),
        Arc::new(ProbeSkill {
            name: "d",
            issues: vec![SkillHealthIssue::new("x", "y")],
        }),
        Arc::new(ProbeSkill {
            name: "three",
            issues: Vec::new(),
        }),
    ];
    let ctx = SkillContext::default();

    let report = run_skill_health_checks(&skills, &ctx).await;

    assert!(report.has_issues());
    assert_eq!(report.total_issues(), 1);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues["d"][0].code, "x");
    assert_eq!(report.issues["d"][0].message, "y");
}

#[tokio::test]
async fn test_registry_rejects_duplicate_names() {
    let mut registry = SkillRegistry::new();
    registry.register(EchoSkill::new("a", &["ping"])).unwrap();

    let err = registry.register(EchoSkill::new("a", &["pong"])).unwrap_err();
    assert!(matches!(err, SkillError::DuplicateSkill(name) if name == "a"));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_registry_preserves_order() {
    let registry = SkillRegistry::new()
        .with_skill(EchoSkill::new("a", &["ping"]))
        .unwrap()
        .with_skill(EchoSkill::new("b", &["ping", "pong"]))
        .unwrap();
    let ctx = SkillContext::default();

    let names: Vec<_> = registry.list_info().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(registry.find_handler(&Task::new("ping")).unwrap().name(), "a");
    assert_eq!(registry.find_handler(&Task::new("pong")).unwrap().name(), "b");

    let result = registry.run_task(&Task::new("pong"), &ctx).await;
    assert_eq!(result.message, "handled by b");
}
