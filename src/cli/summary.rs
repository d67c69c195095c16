// src/cli/summary.rs

//! Text renderers for the confirmation step: the deployment summary shown
//! before triggering, and the full matrix preview across every workflow.

use colored::Colorize;
use std::fmt::Write as _;

use crate::{
    core::{
        inputs,
        matrix::{self, MatrixEngine},
    },
    models::Configuration,
    state::SelectionState,
};

const DIVIDER_WIDTH: usize = 55;

fn divider(width: usize) -> String {
    "━".repeat(width).dimmed().to_string()
}

fn bullet_list(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out, "{}", title.bold());
    for item in items {
        let _ = writeln!(out, "   • {}", item.green());
    }
}

/// Renders the summary of everything that is about to be dispatched.
pub fn deployment_summary(config: &Configuration, selection: &SelectionState) -> String {
    let engine = MatrixEngine::new(config, selection);
    let groups = engine.resolve_with_metadata();
    let total = matrix::count_records(&groups);

    let mut out = String::new();
    let _ = writeln!(out, "{}\n", divider(DIVIDER_WIDTH));
    let _ = writeln!(out, "{}\n", t!("summary.header").bold().yellow());
    let _ = writeln!(out, "{}\n", divider(DIVIDER_WIDTH));

    bullet_list(&mut out, t!("summary.apps"), &selection.selected_apps);
    out.push('\n');
    bullet_list(&mut out, t!("summary.platforms"), &selection.selected_platforms);
    out.push('\n');
    bullet_list(&mut out, t!("summary.environments"), &selection.selected_environments);
    out.push('\n');

    let _ = writeln!(out, "{}", t!("summary.inputs").bold());
    let relevant = inputs::relevant_inputs(
        &selection.selected_apps,
        &selection.selected_platforms,
        &selection.selected_environments,
        config,
    );
    for key in relevant {
        if let Some(value) = selection.input_values.get(&key) {
            let _ = writeln!(out, "   • {}: {}", key.bold(), value.green());
        }
    }
    out.push('\n');

    let _ = writeln!(out, "{}", t!("summary.workflows").bold());
    if total == 0 {
        let _ = writeln!(out, "   • {}", t!("summary.no_workflows"));
    } else {
        for (workflow, records) in &groups {
            if records.is_empty() {
                continue;
            }
            let line = format!(
                t!("summary.workflow_line"),
                name = config.workflow_display_name(workflow).bold(),
                count = records.len()
            );
            let _ = writeln!(out, "   • {}", line);
        }
    }
    out.push('\n');

    let change_log: Vec<String> = selection.change_log.lines().map(str::to_string).collect();
    bullet_list(&mut out, t!("summary.changelog"), &change_log);
    out.push('\n');
    bullet_list(
        &mut out,
        t!("summary.branch"),
        std::slice::from_ref(&selection.branch_name),
    );
    out.push('\n');

    let _ = writeln!(out, "{}\n", divider(DIVIDER_WIDTH));
    let _ = writeln!(out, "{}", format!(t!("summary.footer"), count = total).cyan());
    out
}

/// Renders every matrix of every workflow, workflows sorted by key.
pub fn all_workflows_preview(config: &Configuration, selection: &SelectionState) -> String {
    let engine = MatrixEngine::new(config, selection);
    let groups = engine.resolve_with_metadata();

    let mut workflows: Vec<&String> = groups
        .iter()
        .filter(|(_, records)| !records.is_empty())
        .map(|(key, _)| key)
        .collect();
    workflows.sort();

    let mut out = String::new();
    let _ = writeln!(out, "{}\n", divider(DIVIDER_WIDTH));
    let _ = writeln!(out, "{}\n", t!("preview.header").bold().yellow());
    let _ = writeln!(out, "{}\n", divider(DIVIDER_WIDTH));

    if workflows.is_empty() {
        let _ = writeln!(out, "{}", t!("preview.empty"));
        return out;
    }

    for workflow in workflows {
        let name = config.workflow_display_name(workflow);
        let _ = writeln!(
            out,
            "{}",
            format!(t!("preview.workflow"), name = name).bold().blue()
        );
        let _ = writeln!(out, "{}", divider(name.chars().count() + 10));
        let _ = writeln!(out, "{}", engine.preview(workflow));
    }
    out
}
