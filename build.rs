// build.rs

// Generates the `t!` translation macro from `locales/<lang>.toml` at compile time.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

const FALLBACK_LANG: &str = "en";

/// A `lang_*` feature wins over `CATALYST_LANG`, which wins over English.
fn selected_language() -> String {
    let mut features: Vec<String> = env::vars()
        .filter_map(|(key, _)| key.strip_prefix("CARGO_FEATURE_LANG_").map(str::to_lowercase))
        .collect();
    features.sort();

    match features.first() {
        Some(first) => {
            if features.len() > 1 {
                println!(
                    "cargo:warning=Multiple language features enabled ({:?}), using '{}'.",
                    features, first
                );
            }
            first.clone()
        }
        None => env::var("CATALYST_LANG").unwrap_or_else(|_| FALLBACK_LANG.to_string()),
    }
}

fn read_table(path: &str) -> Option<HashMap<String, String>> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(table) => Some(table),
        Err(e) => panic!("Failed to parse {}: {}", path, e),
    }
}

fn main() {
    let lang = selected_language();
    println!("cargo:rustc-env=CATALYST_LANG_EFFECTIVE={}", lang);
    println!("cargo:rerun-if-env-changed=CATALYST_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=locales/");

    let fallback_path = format!("locales/{}.toml", FALLBACK_LANG);
    let mut translations = read_table(&fallback_path)
        .unwrap_or_else(|| panic!("Missing fallback language file {}", fallback_path));

    if lang != FALLBACK_LANG {
        let path = format!("locales/{}.toml", lang);
        match read_table(&path) {
            Some(specific) => translations.extend(specific),
            None => println!("cargo:warning=Language file '{}' not found, using '{}'.", path, FALLBACK_LANG),
        }
    }

    let mut macro_code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for (key, value) in &translations {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        macro_code.push_str(&format!("    (\"{}\") => {{ \"{}\" }};\n", key, escaped));
    }
    // Unknown keys fail the build.
    macro_code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n",
    );
    macro_code.push('}');

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("translations.rs"), macro_code)
        .expect("Failed to write translations.rs");
}
