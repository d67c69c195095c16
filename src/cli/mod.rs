use clap::Parser;
use std::path::PathBuf;

pub mod handlers;
pub mod summary;

/// Builds the dynamic, color-aware full help string at runtime.
fn build_help_string() -> &'static str {
    // Renders the semantic tags of the help template into ANSI styles.
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();

    let template = t!("cli.help.template");

    let title = if use_colors { "\x1b[1;33m" } else { "" }; // Bold Yellow
    let hl = if use_colors { "\x1b[1;36m" } else { "" }; // Bold Cyan
    let cmd = if use_colors { "\x1b[36m" } else { "" }; // Cyan
    let group = if use_colors { "\x1b[1;32m" } else { "" }; // Bold Green
    let dim = if use_colors { "\x1b[2m" } else { "" };
    let reset = if use_colors { "\x1b[0m" } else { "" };

    let formatted_string = template
        .replace("<title>", title)
        .replace("</title>", reset)
        .replace("<hl>", hl)
        .replace("</hl>", reset)
        .replace("<cmd>", cmd)
        .replace("</cmd>", reset)
        .replace("<group>", group)
        .replace("</group>", reset)
        .replace("<dim>", dim)
        .replace("</dim>", reset);

    Box::leak(formatted_string.into_boxed_str())
}

/// catalyst: pick apps, platforms and environments, then trigger their GitHub Actions matrices.
#[derive(Parser, Debug)]
#[command(
    name = "catalyst",
    author,
    version,
    about,
    help_template = { build_help_string() },
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Path to the configuration file (default: $CATALYST_CONFIG or ./catalyst.yaml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Print the static matrices of a workflow instead of starting the wizard.
    #[arg(long, value_name = "WORKFLOW")]
    pub extract: Option<String>,

    /// Output format for --extract (json|yaml).
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    pub format: String,

    /// Write the workflow payloads to disk instead of calling `gh`.
    #[arg(long)]
    pub dry_run: bool,

    /// Directory for --dry-run payloads.
    #[arg(long, value_name = "DIR", requires = "dry_run")]
    pub output_dir: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The workflow to extract. An empty `--extract` starts the wizard instead.
    pub fn extract_workflow(&self) -> Option<&str> {
        self.extract.as_deref().filter(|workflow| !workflow.is_empty())
    }
}
