// src/state.rs

use std::collections::HashMap;

/// The operator's choices, threaded through every stage of the wizard.
///
/// The wizard owns the single instance; stages and the resolution engine
/// only ever see it through a shared borrow taken for the duration of a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_apps: Vec<String>,
    pub selected_platforms: Vec<String>,
    pub selected_environments: Vec<String>,
    pub input_values: HashMap<String, String>,
    pub branch_name: String,
    pub change_log: String,
}

/// Which of the three selection collections a stage writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSlot {
    Apps,
    Platforms,
    Environments,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the labels currently stored for a slot.
    pub fn selected(&self, slot: SelectionSlot) -> &[String] {
        match slot {
            SelectionSlot::Apps => &self.selected_apps,
            SelectionSlot::Platforms => &self.selected_platforms,
            SelectionSlot::Environments => &self.selected_environments,
        }
    }

    /// Replaces the labels of a slot, dropping duplicates while keeping first-seen order.
    pub fn commit(&mut self, slot: SelectionSlot, labels: Vec<String>) {
        let mut unique: Vec<String> = Vec::with_capacity(labels.len());
        for label in labels {
            if !unique.contains(&label) {
                unique.push(label);
            }
        }
        log::debug!("Committing {:?}: {:?}", slot, unique);
        match slot {
            SelectionSlot::Apps => self.selected_apps = unique,
            SelectionSlot::Platforms => self.selected_platforms = unique,
            SelectionSlot::Environments => self.selected_environments = unique,
        }
    }

    /// Sets the value of one input, replacing any previous value.
    pub fn set_input(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.input_values.insert(key.into(), value.into());
    }
}
