// src/core/matrix.rs

//! # Matrix Resolution Engine
//!
//! Expands the operator's selection into one record per reachable
//! `app × platform × environment` combination and groups the records by the
//! workflow each environment targets.
//!
//! Two projections of the same traversal are offered:
//!
//! - **metadata**: every record carries `app`, `platform` and `environment`
//!   next to its parameters, for previews and summaries;
//! - **purified**: parameters only, the payload shape sent to the workflow.
//!
//! Results are computed on every call. Nothing is cached, so a call always
//! reflects the selection and input values it is given.

use crate::{
    constants::{APP_KEY, ENVIRONMENT_KEY, PLATFORM_KEY},
    core::{interpolator, resolver},
    models::{Configuration, MatrixRecord, WorkflowGroups},
    state::SelectionState,
};
use serde_json::Value;
use std::fmt::Write as _;

/// Which shape the produced records take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    WithMetadata,
    Purified,
}

/// A read-only view over a configuration and a selection snapshot.
#[derive(Debug, Clone, Copy)]
pub struct MatrixEngine<'a> {
    config: &'a Configuration,
    selection: &'a SelectionState,
}

impl<'a> MatrixEngine<'a> {
    pub fn new(config: &'a Configuration, selection: &'a SelectionState) -> Self {
        Self { config, selection }
    }

    /// Resolves the selection into records that keep their provenance keys.
    pub fn resolve_with_metadata(&self) -> WorkflowGroups {
        self.resolve(Projection::WithMetadata)
    }

    /// Resolves the selection into parameter-only records.
    pub fn resolve_purified(&self) -> WorkflowGroups {
        self.resolve(Projection::Purified)
    }

    /// Number of records the current selection produces across all workflows.
    pub fn total_combinations(&self) -> usize {
        count_records(&self.resolve_with_metadata())
    }

    /// Renders the metadata records of one workflow for human review.
    pub fn preview(&self, workflow_key: &str) -> String {
        let groups = self.resolve_with_metadata();
        let Some(records) = groups.get(workflow_key) else {
            return format!("No matrix entries for workflow: {}", workflow_key);
        };
        if records.is_empty() {
            return "No matrix entries for this workflow.".to_string();
        }

        let mut preview = String::new();
        for (i, record) in records.iter().enumerate() {
            let _ = writeln!(preview, "Matrix #{}:", i + 1);
            for (key, label) in [
                (APP_KEY, "App"),
                (PLATFORM_KEY, "Platform"),
                (ENVIRONMENT_KEY, "Environment"),
            ] {
                if let Some(value) = record.get(key) {
                    let _ = writeln!(preview, "  • {}: {}", label, display_value(value));
                }
            }
            let _ = writeln!(preview, "  • Parameters:");
            for (key, value) in sorted_parameters(record) {
                let _ = writeln!(preview, "    - {}: {}", key, display_value(value));
            }
            preview.push('\n');
        }
        preview
    }

    fn resolve(&self, projection: Projection) -> WorkflowGroups {
        let mut groups = WorkflowGroups::new();
        let selection = self.selection;

        for selected_app in &selection.selected_apps {
            let Some((app, platforms)) = resolver::lookup(selected_app, &self.config.matrix)
            else {
                log::debug!("Skipping unknown app '{}'", selected_app);
                continue;
            };

            for selected_platform in &selection.selected_platforms {
                let Some((platform, environments)) = resolver::lookup(selected_platform, platforms)
                else {
                    continue;
                };

                for selected_environment in &selection.selected_environments {
                    let Some((environment, spec)) =
                        resolver::lookup(selected_environment, environments)
                    else {
                        continue;
                    };

                    let mut record = MatrixRecord::new();
                    if projection == Projection::WithMetadata {
                        record.insert(APP_KEY.to_string(), Value::from(app));
                        record.insert(PLATFORM_KEY.to_string(), Value::from(platform));
                        record.insert(ENVIRONMENT_KEY.to_string(), Value::from(environment));
                    }
                    for (name, value) in &spec.parameters {
                        record.insert(
                            name.clone(),
                            interpolator::substitute_value(
                                value,
                                &selection.input_values,
                                &self.config.inputs,
                            ),
                        );
                    }

                    groups.entry(spec.workflow.clone()).or_default().push(record);
                }
            }
        }

        log::debug!(
            "Resolved {} record(s) across {} workflow(s) ({:?})",
            count_records(&groups),
            groups.len(),
            projection
        );
        groups
    }
}

/// Sums the record counts of every workflow group.
pub fn count_records(groups: &WorkflowGroups) -> usize {
    groups.values().map(Vec::len).sum()
}

/// Returns a record's non-provenance entries sorted by key.
pub fn sorted_parameters(record: &MatrixRecord) -> Vec<(&String, &Value)> {
    let mut params: Vec<_> = record
        .iter()
        .filter(|(key, _)| ![APP_KEY, PLATFORM_KEY, ENVIRONMENT_KEY].contains(&key.as_str()))
        .collect();
    params.sort_by(|a, b| a.0.cmp(b.0));
    params
}

/// Formats a parameter value the way an operator expects to read it (no quotes around strings).
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SelectionSlot;

    const CONFIG: &str = r#"
github:
  repository: acme/mobile
  workflows:
    deploy: { name: Deploy, file: deploy.yml }
    beta: { name: Beta, file: beta.yml }
inputs:
  ver: { description: Version }
matrix:
  App1:
    iOS:
      prod:
        workflow: deploy
        matrix:
          version: "${{input.ver}}"
          retries: 2
      beta:
        workflow: beta
        matrix:
          track: testflight
  App2:
    iOS:
      prod:
        workflow: deploy
        matrix:
          version: "app2-${{input.ver}}"
"#;

    fn config() -> Configuration {
        serde_yaml::from_str(CONFIG).unwrap()
    }

    fn selection(apps: &[&str], platforms: &[&str], envs: &[&str]) -> SelectionState {
        let mut state = SelectionState::new();
        let to_vec = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        state.commit(SelectionSlot::Apps, to_vec(apps));
        state.commit(SelectionSlot::Platforms, to_vec(platforms));
        state.commit(SelectionSlot::Environments, to_vec(envs));
        state
    }

    fn with_default(mut config: Configuration, default: &str) -> Configuration {
        if let Some(def) = config.inputs.get_mut("ver") {
            def.default = default.to_string();
        }
        config
    }

    #[test]
    fn test_case_folded_selection_resolves_to_canonical_record() {
        let config = config();
        let mut state = selection(&["app1"], &["ios"], &["prod"]);
        state.set_input("ver", "1.2.3");

        let groups = MatrixEngine::new(&config, &state).resolve_with_metadata();

        assert_eq!(groups.len(), 1);
        let records = &groups["deploy"];
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["app"], Value::from("App1"));
        assert_eq!(records[0]["platform"], Value::from("iOS"));
        assert_eq!(records[0]["environment"], Value::from("prod"));
        assert_eq!(records[0]["version"], Value::from("1.2.3"));
        assert_eq!(records[0]["retries"], Value::from(2));
    }

    #[test]
    fn test_case_folded_labels_match_canonical_labels() {
        let config = config();
        let canonical = selection(&["App1"], &["iOS"], &["prod"]);
        let folded = selection(&["APP1"], &["IOS"], &["PROD"]);

        assert_eq!(
            MatrixEngine::new(&config, &canonical).resolve_with_metadata(),
            MatrixEngine::new(&config, &folded).resolve_with_metadata()
        );
    }

    #[test]
    fn test_default_fills_missing_input() {
        let config = with_default(config(), "latest");
        let state = selection(&["app1"], &["ios"], &["prod"]);

        let groups = MatrixEngine::new(&config, &state).resolve_purified();
        assert_eq!(groups["deploy"][0]["version"], Value::from("latest"));
    }

    #[test]
    fn test_placeholder_is_kept_without_value_or_default() {
        let config = config();
        let state = selection(&["app1"], &["ios"], &["prod"]);

        let groups = MatrixEngine::new(&config, &state).resolve_purified();
        assert_eq!(groups["deploy"][0]["version"], Value::from("${{input.ver}}"));
    }

    #[test]
    fn test_apps_sharing_a_workflow_group_in_selection_order() {
        let config = config();
        let mut state = selection(&["App2", "App1"], &["iOS"], &["prod"]);
        state.set_input("ver", "9");

        let groups = MatrixEngine::new(&config, &state).resolve_with_metadata();

        assert_eq!(groups.len(), 1);
        let apps: Vec<_> = groups["deploy"].iter().map(|r| r["app"].clone()).collect();
        assert_eq!(apps, vec![Value::from("App2"), Value::from("App1")]);
        assert_eq!(groups["deploy"][0]["version"], Value::from("app2-9"));
    }

    #[test]
    fn test_unknown_labels_are_skipped_silently() {
        let config = config();
        let state = selection(&["App1", "Ghost"], &["iOS", "Web"], &["qa"]);

        let engine = MatrixEngine::new(&config, &state);
        assert!(engine.resolve_with_metadata().is_empty());
        assert_eq!(engine.total_combinations(), 0);
    }

    #[test]
    fn test_purified_equals_metadata_without_provenance() {
        let config = config();
        let mut state = selection(&["App1", "App2"], &["iOS"], &["prod", "beta"]);
        state.set_input("ver", "3.0");
        let engine = MatrixEngine::new(&config, &state);

        let metadata = engine.resolve_with_metadata();
        let purified = engine.resolve_purified();

        assert_eq!(metadata.len(), purified.len());
        for (workflow, records) in &metadata {
            let stripped: Vec<MatrixRecord> = records
                .iter()
                .map(|r| {
                    let mut r = r.clone();
                    r.shift_remove(APP_KEY);
                    r.shift_remove(PLATFORM_KEY);
                    r.shift_remove(ENVIRONMENT_KEY);
                    r
                })
                .collect();
            assert_eq!(&stripped, &purified[workflow]);
        }
        assert_eq!(engine.total_combinations(), 3);
    }

    #[test]
    fn test_resolution_is_idempotent_and_tracks_input_changes() {
        let config = config();
        let mut state = selection(&["App1"], &["iOS"], &["prod"]);
        state.set_input("ver", "1");

        let first = MatrixEngine::new(&config, &state).resolve_purified();
        let second = MatrixEngine::new(&config, &state).resolve_purified();
        assert_eq!(first, second);

        state.set_input("ver", "2");
        let third = MatrixEngine::new(&config, &state).resolve_purified();
        assert_eq!(third["deploy"][0]["version"], Value::from("2"));
    }

    #[test]
    fn test_preview_lists_provenance_and_sorted_parameters() {
        let config = config();
        let mut state = selection(&["App1"], &["iOS"], &["prod"]);
        state.set_input("ver", "1.0");

        let preview = MatrixEngine::new(&config, &state).preview("deploy");
        assert!(preview.contains("Matrix #1:"));
        assert!(preview.contains("  • App: App1"));
        assert!(preview.contains("  • Environment: prod"));
        let retries = preview.find("- retries: 2").unwrap();
        let version = preview.find("- version: 1.0").unwrap();
        assert!(retries < version);
    }

    #[test]
    fn test_preview_of_unknown_workflow() {
        let config = config();
        let state = SelectionState::new();
        let preview = MatrixEngine::new(&config, &state).preview("nope");
        assert_eq!(preview, "No matrix entries for workflow: nope");
    }
}
