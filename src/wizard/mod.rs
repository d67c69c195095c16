// src/wizard/mod.rs

//! # Selection Wizard
//!
//! The linear state machine behind the interactive flow:
//!
//! `AppSelect → PlatformSelect → EnvironmentSelect → InputCollection → Confirm`
//!
//! The wizard owns the single `SelectionState`. Stages are rebuilt from it on
//! every transition and only write back to it when they are left (forward, or
//! backward for the select stages). The wizard never talks to a terminal and
//! never starts processes: the interactive layer renders `stage()`, feeds user
//! actions back through the methods below, and runs the `DispatchPlan` returned
//! by `begin_dispatch()` wherever it likes, reporting the outcome with
//! `handle_event`.

pub mod stage;

use crate::{
    constants::CHANGE_LOG_MAX_CHARS,
    core::{
        dispatch::{self, DispatchError, DispatchPlan},
        matrix::MatrixEngine,
    },
    models::Configuration,
    state::SelectionState,
    system::github::WorkflowTrigger,
};
use stage::{DispatchStatus, InputForm, Stage, StageKind};
use thiserror::Error;

/// Why a wizard action was refused. The wizard state is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("select at least one option to continue")]
    NothingSelected,
    #[error("required input(s) missing: {}", .0.join(", "))]
    MissingRequiredInput(Vec<String>),
    #[error("branch name is required")]
    MissingBranch,
    #[error("change log is required")]
    MissingChangeLog,
    #[error("change log is too long ({len} characters, at most {max})")]
    ChangeLogTooLong { len: usize, max: usize },
    #[error("already at the first step")]
    NoPreviousStage,
    #[error("nothing follows the confirmation step; trigger the workflows instead")]
    NoNextStage,
    #[error("checks can only be changed in a selection step (current: {0})")]
    NotASelectStage(StageKind),
    #[error("this action is only available in the {expected} step (current: {actual})")]
    WrongStage {
        expected: StageKind,
        actual: StageKind,
    },
    #[error("workflows are being triggered, please wait")]
    DispatchInProgress,
    #[error("workflows have already been triggered")]
    AlreadyTriggered,
    #[error("no matrices generated from your selections")]
    NoCombinations,
}

/// Messages delivered to the wizard from outside the interactive flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEvent {
    /// Periodic tick; animates the progress indicator while dispatching.
    Tick,
    /// The background dispatch finished with this outcome.
    DispatchFinished(Result<Vec<String>, DispatchError>),
}

/// The selection flow over one loaded configuration.
#[derive(Debug)]
pub struct Wizard<'a> {
    config: &'a Configuration,
    selection: SelectionState,
    stage: Stage,
}

impl<'a> Wizard<'a> {
    /// Starts at app selection with an empty selection.
    pub fn new(config: &'a Configuration) -> Self {
        let selection = SelectionState::new();
        let stage = Stage::init(StageKind::AppSelect, config, &selection);
        Self {
            config,
            selection,
            stage,
        }
    }

    pub fn config(&self) -> &'a Configuration {
        self.config
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn kind(&self) -> StageKind {
        self.stage.kind()
    }

    /// A matrix engine over the committed selection.
    pub fn engine(&self) -> MatrixEngine<'_> {
        MatrixEngine::new(self.config, &self.selection)
    }

    /// The dispatch status, when the wizard is at the confirmation step.
    pub fn dispatch_status(&self) -> Option<&DispatchStatus> {
        match &self.stage {
            Stage::Confirm(view) => Some(&view.status),
            _ => None,
        }
    }

    /// True while a dispatch started by `begin_dispatch` has not reported back.
    pub fn is_dispatching(&self) -> bool {
        matches!(self.dispatch_status(), Some(DispatchStatus::Running))
    }

    // --- Stage-local edits ---

    /// Replaces the checks of the current select stage.
    pub fn set_checked(&mut self, indices: &[usize]) -> Result<(), WizardError> {
        let actual = self.kind();
        let list = self
            .stage
            .checklist_mut()
            .ok_or(WizardError::NotASelectStage(actual))?;
        list.select_only(indices);
        Ok(())
    }

    fn form_mut(&mut self) -> Result<&mut InputForm, WizardError> {
        let actual = self.kind();
        match &mut self.stage {
            Stage::InputCollection(form) => Ok(form),
            _ => Err(WizardError::WrongStage {
                expected: StageKind::InputCollection,
                actual,
            }),
        }
    }

    /// Stages a value for an input field. Returns `false` when the key is not
    /// one of the fields shown for the current selection.
    pub fn set_input(&mut self, key: &str, value: impl Into<String>) -> Result<bool, WizardError> {
        Ok(self.form_mut()?.set_value(key, value))
    }

    pub fn set_branch_name(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.form_mut()?.branch_name = value.into();
        Ok(())
    }

    pub fn set_change_log(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        self.form_mut()?.change_log = value.into();
        Ok(())
    }

    // --- Navigation ---

    /// Validates the current stage, commits it, and opens the next one.
    /// On error nothing is mutated.
    pub fn advance(&mut self) -> Result<(), WizardError> {
        let kind = self.kind();
        match &self.stage {
            Stage::AppSelect(list) | Stage::PlatformSelect(list) | Stage::EnvironmentSelect(list) => {
                if !list.has_selection() {
                    return Err(WizardError::NothingSelected);
                }
                let labels = list.selected_labels();
                if let Some(slot) = kind.slot() {
                    self.selection.commit(slot, labels);
                }
            }
            Stage::InputCollection(form) => {
                let missing = form.missing_required();
                if !missing.is_empty() {
                    return Err(WizardError::MissingRequiredInput(missing));
                }
                if form.branch_name.trim().is_empty() {
                    return Err(WizardError::MissingBranch);
                }
                let change_log = form.change_log.trim();
                if change_log.is_empty() {
                    return Err(WizardError::MissingChangeLog);
                }
                let len = change_log.chars().count();
                if len > CHANGE_LOG_MAX_CHARS {
                    return Err(WizardError::ChangeLogTooLong {
                        len,
                        max: CHANGE_LOG_MAX_CHARS,
                    });
                }

                let form = form.clone();
                for field in form.fields {
                    self.selection.set_input(field.key, field.value.trim());
                }
                self.selection.branch_name = form.branch_name.trim().to_string();
                self.selection.change_log = form.change_log.trim().to_string();
            }
            Stage::Confirm(_) => return Err(WizardError::NoNextStage),
        }

        let next = kind.next().ok_or(WizardError::NoNextStage)?;
        log::debug!("Wizard: {} -> {}", kind, next);
        self.stage = Stage::init(next, self.config, &self.selection);
        Ok(())
    }

    /// Returns to the previous stage. Select stages keep their current checks.
    pub fn retreat(&mut self) -> Result<(), WizardError> {
        if self.is_dispatching() {
            return Err(WizardError::DispatchInProgress);
        }
        let kind = self.kind();
        let previous = kind.previous().ok_or(WizardError::NoPreviousStage)?;

        if let (Some(slot), Some(list)) = (kind.slot(), self.stage.checklist()) {
            let labels = list.selected_labels();
            self.selection.commit(slot, labels);
        }

        log::debug!("Wizard: {} <- {}", previous, kind);
        self.stage = Stage::init(previous, self.config, &self.selection);
        Ok(())
    }

    // --- Dispatch ---

    /// Prepares a dispatch run for the committed selection and marks the
    /// confirmation step as running.
    ///
    /// Zero combinations is reported as an error and leaves the step idle.
    /// A failed run can be retried; a successful one cannot.
    pub fn begin_dispatch(&mut self) -> Result<DispatchPlan, WizardError> {
        let actual = self.kind();
        let status = match &self.stage {
            Stage::Confirm(view) => &view.status,
            _ => {
                return Err(WizardError::WrongStage {
                    expected: StageKind::Confirm,
                    actual,
                });
            }
        };
        match status {
            DispatchStatus::Running => return Err(WizardError::DispatchInProgress),
            DispatchStatus::Succeeded { .. } => return Err(WizardError::AlreadyTriggered),
            DispatchStatus::Idle | DispatchStatus::Failed(_) => {}
        }

        let groups = self.engine().resolve_purified();
        let plan = DispatchPlan::from_groups(
            self.config,
            groups,
            &self.selection.branch_name,
            &self.selection.change_log,
        )
        .map_err(|_| WizardError::NoCombinations)?;

        if let Stage::Confirm(view) = &mut self.stage {
            view.status = DispatchStatus::Running;
            view.spinner_frame = 0;
        }
        log::info!(
            "Dispatching {} matrix record(s) across {} workflow(s)",
            plan.total_matrices(),
            plan.jobs.len()
        );
        Ok(plan)
    }

    /// Applies an external event. Events that do not apply to the current
    /// state are ignored.
    pub fn handle_event(&mut self, event: WizardEvent) {
        let Stage::Confirm(view) = &mut self.stage else {
            log::debug!("Ignoring {:?} outside the confirmation step", event);
            return;
        };
        if view.status != DispatchStatus::Running {
            log::debug!("Ignoring {:?}: no dispatch running", event);
            return;
        }

        match event {
            WizardEvent::Tick => {
                view.spinner_frame = view.spinner_frame.wrapping_add(1);
            }
            WizardEvent::DispatchFinished(Ok(workflows)) => {
                view.status = DispatchStatus::Succeeded { workflows };
            }
            WizardEvent::DispatchFinished(Err(e)) => {
                view.status = DispatchStatus::Failed(e.to_string());
            }
        }
    }
}

/// Runs a plan to completion and wraps the outcome as the event the wizard expects.
pub fn run_dispatch(trigger: &dyn WorkflowTrigger, plan: &DispatchPlan) -> WizardEvent {
    WizardEvent::DispatchFinished(dispatch::run_plan(trigger, plan).into_result())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dispatch::testing::RecordingTrigger;

    const CONFIG: &str = r#"
github:
  repository: acme/mobile
  workflows:
    deploy: { name: Deploy, file: deploy.yml }
    beta: { name: Beta, file: beta.yml }
inputs:
  ver: { description: Version, required: true }
  notes: { description: Notes }
matrix:
  App1:
    iOS:
      prod: { workflow: deploy, matrix: { version: "${{ input.ver }}" } }
      qa: { workflow: beta, matrix: { track: internal } }
    Android:
      prod: { workflow: deploy, matrix: { flavor: store } }
  App2:
    Web:
      prod: { workflow: deploy, matrix: { site: www } }
"#;

    fn config() -> Configuration {
        serde_yaml::from_str(CONFIG).unwrap()
    }

    fn labels(wizard: &Wizard<'_>) -> Vec<String> {
        wizard.stage().checklist().map(|l| l.labels()).unwrap_or_default()
    }

    /// Walks App1 / iOS / prod+qa into the confirmation step.
    fn to_confirm(wizard: &mut Wizard<'_>) {
        wizard.set_checked(&[0]).unwrap();
        wizard.advance().unwrap();
        wizard.set_checked(&[0]).unwrap();
        wizard.advance().unwrap();
        wizard.set_checked(&[0, 1]).unwrap();
        wizard.advance().unwrap();
        wizard.set_input("ver", " 2.1 ").unwrap();
        wizard.set_change_log("Ship it").unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.kind(), StageKind::Confirm);
    }

    #[test]
    fn test_starts_at_app_select_with_all_apps() {
        let config = config();
        let wizard = Wizard::new(&config);
        assert_eq!(wizard.kind(), StageKind::AppSelect);
        assert_eq!(labels(&wizard), vec!["App1", "App2"]);
        assert_eq!(wizard.selection(), &SelectionState::new());
    }

    #[test]
    fn test_advance_requires_a_selection() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        assert_eq!(wizard.advance(), Err(WizardError::NothingSelected));
        assert_eq!(wizard.kind(), StageKind::AppSelect);
        assert!(wizard.selection().selected_apps.is_empty());
    }

    #[test]
    fn test_candidates_narrow_with_each_step() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        wizard.set_checked(&[0, 1]).unwrap();
        wizard.advance().unwrap();
        assert_eq!(labels(&wizard), vec!["iOS", "Android", "Web"]);

        wizard.set_checked(&[0]).unwrap();
        wizard.advance().unwrap();
        assert_eq!(labels(&wizard), vec!["prod", "qa"]);
    }

    #[test]
    fn test_back_keeps_checks_and_prechecks_previous_stage() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        wizard.set_checked(&[1]).unwrap();
        wizard.advance().unwrap();
        wizard.set_checked(&[0]).unwrap();

        wizard.retreat().unwrap();
        assert_eq!(wizard.kind(), StageKind::AppSelect);
        assert_eq!(wizard.selection().selected_platforms, vec!["Web"]);
        let list = wizard.stage().checklist().unwrap();
        assert_eq!(list.selected_labels(), vec!["App2"]);

        assert_eq!(wizard.retreat(), Err(WizardError::NoPreviousStage));
    }

    #[test]
    fn test_input_stage_validation() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        wizard.set_checked(&[0]).unwrap();
        wizard.advance().unwrap();
        wizard.set_checked(&[0]).unwrap();
        wizard.advance().unwrap();
        wizard.set_checked(&[0]).unwrap();
        wizard.advance().unwrap();

        match wizard.stage() {
            Stage::InputCollection(form) => {
                assert_eq!(form.fields.len(), 1);
                assert_eq!(form.branch_name, "main");
            }
            other => panic!("unexpected stage {:?}", other.kind()),
        }

        assert_eq!(
            wizard.advance(),
            Err(WizardError::MissingRequiredInput(vec!["ver".into()]))
        );
        wizard.set_input("ver", "1.0").unwrap();
        assert_eq!(wizard.advance(), Err(WizardError::MissingChangeLog));
        wizard.set_change_log("notes").unwrap();
        wizard.set_branch_name("  ").unwrap();
        assert_eq!(wizard.advance(), Err(WizardError::MissingBranch));
        assert!(wizard.selection().input_values.is_empty());

        wizard.set_branch_name(" release ").unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.selection().branch_name, "release");
        assert_eq!(wizard.selection().input_values["ver"], "1.0");
    }

    #[test]
    fn test_change_log_length_is_limited() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        for _ in 0..3 {
            wizard.set_checked(&[0]).unwrap();
            wizard.advance().unwrap();
        }
        wizard.set_input("ver", "1.0").unwrap();

        let too_long = format!("Fix login\n{}", "x".repeat(CHANGE_LOG_MAX_CHARS - 9));
        assert_eq!(too_long.chars().count(), CHANGE_LOG_MAX_CHARS + 1);
        wizard.set_change_log(too_long).unwrap();
        assert_eq!(
            wizard.advance(),
            Err(WizardError::ChangeLogTooLong {
                len: CHANGE_LOG_MAX_CHARS + 1,
                max: CHANGE_LOG_MAX_CHARS
            })
        );
        assert_eq!(wizard.kind(), StageKind::InputCollection);
        assert!(wizard.selection().change_log.is_empty());

        let at_limit = format!("  Fix login\n{}  ", "é".repeat(CHANGE_LOG_MAX_CHARS - 10));
        wizard.set_change_log(at_limit).unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.kind(), StageKind::Confirm);
        assert_eq!(
            wizard.selection().change_log.lines().collect::<Vec<_>>()[0],
            "Fix login"
        );
    }

    #[test]
    fn test_set_checked_outside_select_stages() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        for _ in 0..3 {
            wizard.set_checked(&[0]).unwrap();
            wizard.advance().unwrap();
        }
        assert_eq!(
            wizard.set_checked(&[0]),
            Err(WizardError::NotASelectStage(StageKind::InputCollection))
        );

        wizard.set_input("ver", "1.0").unwrap();
        wizard.set_change_log("Ship it").unwrap();
        wizard.advance().unwrap();
        assert_eq!(
            wizard.set_checked(&[0]),
            Err(WizardError::NotASelectStage(StageKind::Confirm))
        );
    }

    #[test]
    fn test_stage_local_edits_are_rejected_elsewhere() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        assert!(matches!(
            wizard.set_input("ver", "1"),
            Err(WizardError::WrongStage { .. })
        ));
        assert!(matches!(
            wizard.begin_dispatch(),
            Err(WizardError::WrongStage { .. })
        ));
    }

    #[test]
    fn test_dispatch_success_flow() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        to_confirm(&mut wizard);

        let plan = wizard.begin_dispatch().unwrap();
        assert!(wizard.is_dispatching());
        assert_eq!(plan.branch_name, "main");
        assert_eq!(plan.change_log, "Ship it");
        assert_eq!(plan.jobs[0].matrices[0]["version"], "2.1");

        assert_eq!(wizard.retreat(), Err(WizardError::DispatchInProgress));
        assert_eq!(wizard.begin_dispatch(), Err(WizardError::DispatchInProgress));

        wizard.handle_event(WizardEvent::Tick);
        match wizard.stage() {
            Stage::Confirm(view) => assert_eq!(view.spinner_frame, 1),
            other => panic!("unexpected stage {:?}", other.kind()),
        }

        let trigger = RecordingTrigger::default();
        wizard.handle_event(run_dispatch(&trigger, &plan));
        assert_eq!(trigger.calls().len(), 2);
        assert_eq!(
            wizard.dispatch_status(),
            Some(&DispatchStatus::Succeeded {
                workflows: vec!["deploy".into(), "beta".into()]
            })
        );
        assert_eq!(wizard.begin_dispatch(), Err(WizardError::AlreadyTriggered));
    }

    #[test]
    fn test_dispatch_failure_allows_retry() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        to_confirm(&mut wizard);

        let plan = wizard.begin_dispatch().unwrap();
        let trigger = RecordingTrigger::failing_for(&["beta"]);
        wizard.handle_event(run_dispatch(&trigger, &plan));

        match wizard.dispatch_status() {
            Some(DispatchStatus::Failed(message)) => {
                assert!(message.starts_with("workflow trigger errors: 'beta'"));
            }
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(wizard.kind(), StageKind::Confirm);

        let retry = wizard.begin_dispatch().unwrap();
        assert_eq!(retry, plan);
    }

    #[test]
    fn test_selections_ahead_stay_stale_until_overwritten() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        to_confirm(&mut wizard);

        for _ in 0..4 {
            wizard.retreat().unwrap();
        }
        assert_eq!(wizard.kind(), StageKind::AppSelect);
        wizard.set_checked(&[1]).unwrap();
        wizard.advance().unwrap();

        assert_eq!(labels(&wizard), vec!["Web"]);
        assert_eq!(wizard.selection().selected_apps, vec!["App2"]);
        assert_eq!(wizard.selection().selected_platforms, vec!["iOS"]);
        assert_eq!(wizard.selection().selected_environments, vec!["prod", "qa"]);
        assert!(!wizard.stage().checklist().unwrap().has_selection());
    }

    #[test]
    fn test_begin_dispatch_without_combinations() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        to_confirm(&mut wizard);

        // Stale environments that no longer exist under the selected platform.
        wizard.selection.selected_environments = vec!["staging".into()];
        assert_eq!(wizard.begin_dispatch(), Err(WizardError::NoCombinations));
        assert_eq!(wizard.dispatch_status(), Some(&DispatchStatus::Idle));
    }

    #[test]
    fn test_events_outside_dispatch_are_ignored() {
        let config = config();
        let mut wizard = Wizard::new(&config);
        wizard.handle_event(WizardEvent::Tick);
        assert_eq!(wizard.kind(), StageKind::AppSelect);

        to_confirm(&mut wizard);
        wizard.handle_event(WizardEvent::DispatchFinished(Ok(vec![])));
        assert_eq!(wizard.dispatch_status(), Some(&DispatchStatus::Idle));
    }
}
