// src/core/inputs.rs

use crate::{
    core::{interpolator, resolver},
    models::Configuration,
};
use serde_json::Value;
use std::collections::HashSet;

/// Returns the declared inputs referenced by the parameters reachable from a selection.
///
/// Apps and platforms are resolved case-insensitively. Environments are
/// matched by exact key only, so a case-folded environment label contributes
/// nothing here even though the matrix engine would resolve it.
///
/// The result keeps the declaration order of `configuration.inputs`.
pub fn relevant_inputs(
    selected_apps: &[String],
    selected_platforms: &[String],
    selected_environments: &[String],
    configuration: &Configuration,
) -> Vec<String> {
    let mut referenced: HashSet<&str> = HashSet::new();

    for app in selected_apps {
        let Some((_, platforms)) = resolver::lookup(app, &configuration.matrix) else {
            continue;
        };
        for platform in selected_platforms {
            let Some((_, environments)) = resolver::lookup(platform, platforms) else {
                continue;
            };
            for environment in selected_environments {
                let Some(spec) = environments.get(environment) else {
                    continue;
                };
                for value in spec.parameters.values() {
                    if let Value::String(s) = value {
                        referenced.extend(interpolator::input_names(s));
                    }
                }
            }
        }
    }

    log::debug!("Inputs referenced by the current selection: {:?}", referenced);

    configuration
        .inputs
        .keys()
        .filter(|key| referenced.contains(key.as_str()))
        .cloned()
        .collect()
}
