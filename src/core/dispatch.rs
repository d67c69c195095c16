// src/core/dispatch.rs

use crate::{
    models::{Configuration, MatrixRecord, WorkflowGroups},
    system::github::{TriggerRequest, WorkflowTrigger},
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no matrices generated from your selections")]
    NoCombinations,
    #[error("workflow trigger errors: {}", format_failures(.0))]
    Failed(Vec<WorkflowFailure>),
}

/// One workflow that could not be triggered, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowFailure {
    pub workflow: String,
    pub reason: String,
}

fn format_failures(failures: &[WorkflowFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("'{}': {}", f.workflow, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The matrices bound for a single workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchJob {
    pub workflow_key: String,
    /// `None` when the workflow key is not declared in the configuration.
    pub workflow_file: Option<String>,
    pub matrices: Vec<MatrixRecord>,
}

/// A self-contained description of a dispatch run. It owns all its data so it
/// can be moved onto a background task.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPlan {
    pub repository: String,
    pub branch_name: String,
    pub change_log: String,
    pub jobs: Vec<DispatchJob>,
}

impl DispatchPlan {
    /// Builds a plan from purified groups. Empty groups are dropped.
    pub fn from_groups(
        config: &Configuration,
        groups: WorkflowGroups,
        branch_name: &str,
        change_log: &str,
    ) -> Result<Self, DispatchError> {
        let jobs: Vec<DispatchJob> = groups
            .into_iter()
            .filter(|(_, matrices)| !matrices.is_empty())
            .map(|(workflow_key, matrices)| DispatchJob {
                workflow_file: config
                    .github
                    .workflows
                    .get(&workflow_key)
                    .map(|wf| wf.file.clone()),
                workflow_key,
                matrices,
            })
            .collect();

        if jobs.is_empty() {
            return Err(DispatchError::NoCombinations);
        }

        Ok(Self {
            repository: config.github.repository.clone(),
            branch_name: branch_name.trim().to_string(),
            change_log: change_log.trim().to_string(),
            jobs,
        })
    }

    /// Total number of matrix records across every job.
    pub fn total_matrices(&self) -> usize {
        self.jobs.iter().map(|job| job.matrices.len()).sum()
    }
}

/// What happened to each workflow of a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub triggered: Vec<String>,
    pub failures: Vec<WorkflowFailure>,
}

impl DispatchReport {
    /// Collapses the report: any failure makes the whole run an error, even
    /// though the workflows listed in `triggered` did start.
    pub fn into_result(self) -> Result<Vec<String>, DispatchError> {
        if self.failures.is_empty() {
            Ok(self.triggered)
        } else {
            Err(DispatchError::Failed(self.failures))
        }
    }
}

/// Triggers every job of the plan in order.
///
/// A failing workflow does not stop the remaining ones, and workflows that
/// were already triggered are not rolled back. Running the same plan twice
/// triggers every workflow twice.
pub fn run_plan(trigger: &dyn WorkflowTrigger, plan: &DispatchPlan) -> DispatchReport {
    let mut report = DispatchReport::default();

    for job in &plan.jobs {
        let Some(workflow_file) = job.workflow_file.as_deref() else {
            log::warn!("Workflow '{}' is not declared; skipping", job.workflow_key);
            report.failures.push(WorkflowFailure {
                workflow: job.workflow_key.clone(),
                reason: format!("workflow '{}' not found in configuration", job.workflow_key),
            });
            continue;
        };

        let request = TriggerRequest {
            repository: &plan.repository,
            workflow_key: &job.workflow_key,
            workflow_file,
            matrices: &job.matrices,
            change_log: &plan.change_log,
            branch_name: &plan.branch_name,
        };

        match trigger.trigger(&request) {
            Ok(()) => report.triggered.push(job.workflow_key.clone()),
            Err(e) => {
                log::warn!("Triggering '{}' failed: {}", job.workflow_key, e);
                report.failures.push(WorkflowFailure {
                    workflow: job.workflow_key.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::system::{executor::ExecutionError, github::TriggerError};
    use std::sync::Mutex;

    /// A trigger that records every request and fails for the configured workflows.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingTrigger {
        pub(crate) calls: Mutex<Vec<(String, String, usize)>>,
        pub(crate) failing: Vec<String>,
    }

    impl RecordingTrigger {
        pub(crate) fn failing_for(workflows: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failing: workflows.iter().map(|s| s.to_string()).collect(),
            }
        }

        pub(crate) fn calls(&self) -> Vec<(String, String, usize)> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    impl WorkflowTrigger for RecordingTrigger {
        fn trigger(&self, request: &TriggerRequest<'_>) -> Result<(), TriggerError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((
                    request.workflow_key.to_string(),
                    request.workflow_file.to_string(),
                    request.matrices.len(),
                ));
            }
            if self.failing.iter().any(|w| w == request.workflow_key) {
                return Err(TriggerError::Execution(ExecutionError::NotFound("gh".into())));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingTrigger;
    use super::*;
    use serde_json::Value;

    fn config() -> Configuration {
        serde_yaml::from_str(
            r#"
github:
  repository: acme/mobile
  workflows:
    deploy: { name: Deploy, file: deploy.yml }
    beta: { name: Beta, file: beta.yml }
"#,
        )
        .unwrap()
    }

    fn groups(entries: &[(&str, usize)]) -> WorkflowGroups {
        entries
            .iter()
            .map(|(key, count)| {
                let records = (0..*count)
                    .map(|i| {
                        let mut r = MatrixRecord::new();
                        r.insert("n".to_string(), Value::from(i));
                        r
                    })
                    .collect();
                (key.to_string(), records)
            })
            .collect()
    }

    #[test]
    fn test_plan_drops_empty_groups_and_trims_text() {
        let plan = DispatchPlan::from_groups(
            &config(),
            groups(&[("deploy", 2), ("beta", 0)]),
            " main ",
            "notes\n",
        )
        .unwrap();

        assert_eq!(plan.jobs.len(), 1);
        assert_eq!(plan.jobs[0].workflow_file.as_deref(), Some("deploy.yml"));
        assert_eq!(plan.branch_name, "main");
        assert_eq!(plan.change_log, "notes");
        assert_eq!(plan.total_matrices(), 2);
    }

    #[test]
    fn test_plan_without_records_is_an_error() {
        let result = DispatchPlan::from_groups(&config(), groups(&[("deploy", 0)]), "main", "x");
        assert_eq!(result, Err(DispatchError::NoCombinations));
    }

    #[test]
    fn test_run_plan_triggers_each_workflow_once() {
        let plan =
            DispatchPlan::from_groups(&config(), groups(&[("deploy", 2), ("beta", 1)]), "main", "x")
                .unwrap();
        let trigger = RecordingTrigger::default();

        let report = run_plan(&trigger, &plan);

        assert_eq!(report.triggered, vec!["deploy", "beta"]);
        assert_eq!(
            trigger.calls(),
            vec![
                ("deploy".to_string(), "deploy.yml".to_string(), 2),
                ("beta".to_string(), "beta.yml".to_string(), 1),
            ]
        );
        assert_eq!(report.into_result(), Ok(vec!["deploy".into(), "beta".into()]));
    }

    #[test]
    fn test_partial_failure_continues_and_aggregates() {
        let plan =
            DispatchPlan::from_groups(&config(), groups(&[("deploy", 1), ("beta", 1)]), "main", "x")
                .unwrap();
        let trigger = RecordingTrigger::failing_for(&["deploy"]);

        let report = run_plan(&trigger, &plan);

        assert_eq!(trigger.calls().len(), 2);
        assert_eq!(report.triggered, vec!["beta"]);
        let err = report.into_result().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("workflow trigger errors: 'deploy': "));
        assert!(!message.contains("'beta'"));
    }

    #[test]
    fn test_undeclared_workflow_is_reported() {
        let plan =
            DispatchPlan::from_groups(&config(), groups(&[("ghost", 1)]), "main", "x").unwrap();
        let trigger = RecordingTrigger::default();

        let report = run_plan(&trigger, &plan);

        assert!(trigger.calls().is_empty());
        assert_eq!(
            report.into_result().unwrap_err().to_string(),
            "workflow trigger errors: 'ghost': workflow 'ghost' not found in configuration"
        );
    }
}
