use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::SkillContext;
use crate::definition::{Skill, SkillHealthIssue};

/// Health issues keyed by skill name.
///
/// Only skills that reported at least one issue have an entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthReport {
    pub issues: BTreeMap<String, Vec<SkillHealthIssue>>,
}

impl HealthReport {
    pub fn has_issues(&self) -> bool {
        self.issues.values().any(|issues| !issues.is_empty())
    }

    pub fn total_issues(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }
}

/// Call every skill's self-test in registration order
pub async fn run_skill_health_checks(skills: &[Arc<dyn Skill>], ctx: &SkillContext) -> HealthReport {
    let mut report = HealthReport::default();

    for skill in skills {
        let issues = skill.self_test(ctx).await;
        if issues.is_empty() {
            debug!("Skill {} is healthy", skill.name());
            continue;
        }
        warn!("Skill {} reported {} issue(s)", skill.name(), issues.len());
        report.issues.insert(skill.name().to_string(), issues);
    }

    report
}
