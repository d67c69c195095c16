// src/wizard/stage.rs

use crate::{
    constants::DEFAULT_BRANCH,
    core::{inputs, resolver},
    models::Configuration,
    state::{SelectionSlot, SelectionState},
};
use std::fmt;

/// Identifies a stage without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    AppSelect,
    PlatformSelect,
    EnvironmentSelect,
    InputCollection,
    Confirm,
}

impl StageKind {
    /// The stage that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::AppSelect => Some(Self::PlatformSelect),
            Self::PlatformSelect => Some(Self::EnvironmentSelect),
            Self::EnvironmentSelect => Some(Self::InputCollection),
            Self::InputCollection => Some(Self::Confirm),
            Self::Confirm => None,
        }
    }

    /// The stage that precedes this one, if any.
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::AppSelect => None,
            Self::PlatformSelect => Some(Self::AppSelect),
            Self::EnvironmentSelect => Some(Self::PlatformSelect),
            Self::InputCollection => Some(Self::EnvironmentSelect),
            Self::Confirm => Some(Self::InputCollection),
        }
    }

    /// The selection collection a select stage writes to.
    pub fn slot(self) -> Option<SelectionSlot> {
        match self {
            Self::AppSelect => Some(SelectionSlot::Apps),
            Self::PlatformSelect => Some(SelectionSlot::Platforms),
            Self::EnvironmentSelect => Some(SelectionSlot::Environments),
            Self::InputCollection | Self::Confirm => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AppSelect => "AppSelect",
            Self::PlatformSelect => "PlatformSelect",
            Self::EnvironmentSelect => "EnvironmentSelect",
            Self::InputCollection => "InputCollection",
            Self::Confirm => "Confirm",
        };
        f.write_str(name)
    }
}

// --- Select stages ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableItem {
    pub label: String,
    pub selected: bool,
}

/// The candidates of a select stage with their checked state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checklist {
    pub items: Vec<SelectableItem>,
}

impl Checklist {
    /// Builds a checklist; candidates already present in `selected` start checked.
    pub fn new(candidates: Vec<String>, selected: &[String]) -> Self {
        let items = candidates
            .into_iter()
            .map(|label| SelectableItem {
                selected: selected.contains(&label),
                label,
            })
            .collect();
        Self { items }
    }

    pub fn labels(&self) -> Vec<String> {
        self.items.iter().map(|item| item.label.clone()).collect()
    }

    pub fn selected_labels(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.selected)
            .map(|item| item.label.clone())
            .collect()
    }

    pub fn has_selection(&self) -> bool {
        self.items.iter().any(|item| item.selected)
    }

    /// Flips one item. Returns `false` when the index is out of range.
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.selected = !item.selected;
                true
            }
            None => false,
        }
    }

    /// Checks exactly the items at `indices`; other items are unchecked.
    pub fn select_only(&mut self, indices: &[usize]) {
        for (i, item) in self.items.iter_mut().enumerate() {
            item.selected = indices.contains(&i);
        }
    }
}

/// Platforms available under any of the selected apps, first-seen order.
pub fn platform_candidates(config: &Configuration, selected_apps: &[String]) -> Vec<String> {
    let mut platforms: Vec<String> = Vec::new();
    for app in selected_apps {
        if let Some((_, app_tree)) = resolver::lookup(app, &config.matrix) {
            for platform in app_tree.keys() {
                if !platforms.contains(platform) {
                    platforms.push(platform.clone());
                }
            }
        }
    }
    platforms
}

/// Environments available under any selected app × selected platform, first-seen order.
pub fn environment_candidates(
    config: &Configuration,
    selected_apps: &[String],
    selected_platforms: &[String],
) -> Vec<String> {
    let mut environments: Vec<String> = Vec::new();
    for app in selected_apps {
        let Some((_, app_tree)) = resolver::lookup(app, &config.matrix) else {
            continue;
        };
        for platform in selected_platforms {
            if let Some((_, platform_tree)) = resolver::lookup(platform, app_tree) {
                for environment in platform_tree.keys() {
                    if !environments.contains(environment) {
                        environments.push(environment.clone());
                    }
                }
            }
        }
    }
    environments
}

// --- Input stage ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub key: String,
    pub description: String,
    pub required: bool,
    pub value: String,
}

/// The staged edits of the input stage. Nothing here reaches the selection
/// state until the stage is left forward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputForm {
    pub fields: Vec<InputField>,
    pub branch_name: String,
    pub change_log: String,
}

impl InputForm {
    /// Opens the form for the inputs referenced by the current selection.
    pub fn new(config: &Configuration, selection: &SelectionState) -> Self {
        let relevant = inputs::relevant_inputs(
            &selection.selected_apps,
            &selection.selected_platforms,
            &selection.selected_environments,
            config,
        );

        let fields = relevant
            .into_iter()
            .filter_map(|key| {
                let def = config.inputs.get(&key)?;
                let value = match selection.input_values.get(&key) {
                    Some(v) if !v.is_empty() => v.clone(),
                    _ => def.default.clone(),
                };
                Some(InputField {
                    description: def.description.clone(),
                    required: def.required,
                    value,
                    key,
                })
            })
            .collect();

        let branch_name = if selection.branch_name.trim().is_empty() {
            DEFAULT_BRANCH.to_string()
        } else {
            selection.branch_name.clone()
        };

        Self {
            fields,
            branch_name,
            change_log: selection.change_log.clone(),
        }
    }

    /// Updates a field's staged value. Returns `false` for unknown keys.
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|field| field.key == key) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Keys of required fields whose value is blank.
    pub fn missing_required(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|field| field.required && field.value.trim().is_empty())
            .map(|field| field.key.clone())
            .collect()
    }
}

// --- Confirm stage ---

/// Progress of the terminal dispatch step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DispatchStatus {
    #[default]
    Idle,
    Running,
    Succeeded { workflows: Vec<String> },
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmView {
    pub status: DispatchStatus,
    pub spinner_frame: usize,
}

/// Frames of the progress indicator shown while workflows are being triggered.
pub const SPINNER_FRAMES: &[&str] = &["▱▱▱", "▰▱▱", "▰▰▱", "▰▰▰", "▰▰▱", "▰▱▱"];

impl ConfirmView {
    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES
            .get(self.spinner_frame % SPINNER_FRAMES.len())
            .copied()
            .unwrap_or("")
    }
}

// --- The stage sum type ---

/// One step of the wizard together with the data it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    AppSelect(Checklist),
    PlatformSelect(Checklist),
    EnvironmentSelect(Checklist),
    InputCollection(InputForm),
    Confirm(ConfirmView),
}

impl Stage {
    /// Builds a fresh stage of the given kind from the current selection.
    pub fn init(kind: StageKind, config: &Configuration, selection: &SelectionState) -> Self {
        match kind {
            StageKind::AppSelect => {
                Self::AppSelect(Checklist::new(config.apps(), &selection.selected_apps))
            }
            StageKind::PlatformSelect => Self::PlatformSelect(Checklist::new(
                platform_candidates(config, &selection.selected_apps),
                &selection.selected_platforms,
            )),
            StageKind::EnvironmentSelect => Self::EnvironmentSelect(Checklist::new(
                environment_candidates(
                    config,
                    &selection.selected_apps,
                    &selection.selected_platforms,
                ),
                &selection.selected_environments,
            )),
            StageKind::InputCollection => Self::InputCollection(InputForm::new(config, selection)),
            StageKind::Confirm => Self::Confirm(ConfirmView::default()),
        }
    }

    /// The kind of this stage, without its data.
    pub fn kind(&self) -> StageKind {
        match self {
            Self::AppSelect(_) => StageKind::AppSelect,
            Self::PlatformSelect(_) => StageKind::PlatformSelect,
            Self::EnvironmentSelect(_) => StageKind::EnvironmentSelect,
            Self::InputCollection(_) => StageKind::InputCollection,
            Self::Confirm(_) => StageKind::Confirm,
        }
    }

    /// The checklist of a select stage.
    pub fn checklist(&self) -> Option<&Checklist> {
        match self {
            Self::AppSelect(list) | Self::PlatformSelect(list) | Self::EnvironmentSelect(list) => {
                Some(list)
            }
            _ => None,
        }
    }

    /// Mutable access to the checklist of a select stage.
    pub fn checklist_mut(&mut self) -> Option<&mut Checklist> {
        match self {
            Self::AppSelect(list) | Self::PlatformSelect(list) | Self::EnvironmentSelect(list) => {
                Some(list)
            }
            _ => None,
        }
    }
}
