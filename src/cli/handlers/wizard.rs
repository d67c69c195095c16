// src/cli/handlers/wizard.rs

//! The interactive flow. Each wizard stage is rendered with a `dialoguer`
//! prompt and the answers are fed back into the `Wizard`; all validation and
//! navigation rules live in the state machine, this handler only draws.
//!
//! The dispatch step runs on a blocking task of a `tokio` runtime while the
//! main thread animates a spinner until the outcome arrives over a channel.

use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use dialoguer::{Input, MultiSelect, Select, theme::ColorfulTheme};
use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::{runtime::Runtime, sync::mpsc};

use crate::{
    cli::{Cli, summary},
    constants::{CHANGE_LOG_MAX_CHARS, EXIT_CODE_INTERRUPTED, PAYLOAD_DIR_PREFIX},
    core::{config_loader, dispatch::DispatchPlan},
    system::github::{self, GhCli, PayloadWriter, WorkflowTrigger},
    wizard::{
        self, Wizard, WizardEvent,
        stage::{DispatchStatus, Stage, StageKind},
    },
};

const SPINNER_INTERVAL: Duration = Duration::from_millis(100);
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";
const CLEAR_LINE: &str = "\r\x1b[2K";

/// What the handler loop should do after a stage prompt returns.
enum Flow {
    Continue,
    Quit,
    Done,
}

/// The main handler for the interactive wizard.
pub fn handle(cli: &Cli) -> Result<()> {
    let (path, config) = config_loader::load_validated(cli.config.as_deref())
        .context(t!("cli.error.loading"))?;
    log::info!("Using configuration {}", path.display());

    let trigger: Arc<dyn WorkflowTrigger> = if cli.dry_run {
        let dir = cli.output_dir.clone().unwrap_or_else(default_payload_dir);
        println!(
            "{}",
            format!(t!("wizard.info.dry_run"), dir = dir.display()).yellow()
        );
        Arc::new(PayloadWriter::new(dir))
    } else {
        github::ensure_gh_installed()?;
        Arc::new(GhCli)
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context(t!("wizard.error.runtime"))?;
    spawn_interrupt_watcher(&runtime);

    let theme = ColorfulTheme::default();
    let mut wizard = Wizard::new(&config);

    loop {
        let flow = match wizard.kind() {
            StageKind::AppSelect | StageKind::PlatformSelect | StageKind::EnvironmentSelect => {
                prompt_checklist(&mut wizard, &theme)?
            }
            StageKind::InputCollection => prompt_inputs(&mut wizard, &theme)?,
            StageKind::Confirm => prompt_confirm(&mut wizard, &theme, &runtime, &trigger)?,
        };

        match flow {
            Flow::Continue => {}
            Flow::Quit => {
                println!("{}", t!("wizard.info.cancelled").dimmed());
                return Ok(());
            }
            Flow::Done => return Ok(()),
        }
    }
}

fn default_payload_dir() -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    PathBuf::from(format!("{}-{}", PAYLOAD_DIR_PREFIX, secs))
}

/// Exits with the interrupt status on Ctrl+C, whatever the main thread is doing.
fn spawn_interrupt_watcher(runtime: &Runtime) {
    runtime.spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            print!("{}{}", CLEAR_LINE, SHOW_CURSOR);
            let _ = io::stdout().flush();
            log::debug!("Interrupted by user");
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
    });
}

fn warn_inline(message: impl std::fmt::Display) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.to_string().yellow());
}

// --- Select stages ---

fn prompt_checklist(wizard: &mut Wizard<'_>, theme: &ColorfulTheme) -> Result<Flow> {
    let kind = wizard.kind();
    let prompt = match kind {
        StageKind::AppSelect => t!("wizard.prompt.apps"),
        StageKind::PlatformSelect => t!("wizard.prompt.platforms"),
        _ => t!("wizard.prompt.environments"),
    };
    let Some(list) = wizard.stage().checklist() else {
        return Ok(Flow::Continue);
    };
    let labels = list.labels();
    let defaults: Vec<bool> = list.items.iter().map(|item| item.selected).collect();

    println!("{}", t!("wizard.hint.select").dimmed());
    let chosen = MultiSelect::with_theme(theme)
        .with_prompt(prompt)
        .items(&labels)
        .defaults(&defaults)
        .interact_opt()?;

    let Some(indices) = chosen else {
        // Escape goes back, or leaves the program from the first step.
        if kind == StageKind::AppSelect {
            return Ok(Flow::Quit);
        }
        wizard.retreat()?;
        return Ok(Flow::Continue);
    };

    wizard.set_checked(&indices)?;
    if let Err(e) = wizard.advance() {
        warn_inline(e);
    }
    Ok(Flow::Continue)
}

// --- Input stage ---

fn prompt_inputs(wizard: &mut Wizard<'_>, theme: &ColorfulTheme) -> Result<Flow> {
    loop {
        let Stage::InputCollection(form) = wizard.stage() else {
            return Ok(Flow::Continue);
        };
        let form = form.clone();

        if form.fields.is_empty() {
            println!("{}", t!("wizard.info.no_inputs").dimmed());
        }
        for field in &form.fields {
            let prompt = if field.description.is_empty() {
                field.key.clone()
            } else {
                format!(
                    t!("wizard.prompt.input"),
                    key = field.key,
                    description = field.description
                )
            };
            let value: String = Input::with_theme(theme)
                .with_prompt(prompt)
                .with_initial_text(field.value.clone())
                .allow_empty(!field.required)
                .interact_text()?;
            wizard.set_input(&field.key, value)?;
        }

        let branch: String = Input::with_theme(theme)
            .with_prompt(t!("wizard.prompt.branch"))
            .with_initial_text(form.branch_name.clone())
            .interact_text()?;
        wizard.set_branch_name(branch)?;

        let change_log = prompt_change_log(theme, &form.change_log)?;
        wizard.set_change_log(change_log)?;

        let actions = [
            t!("wizard.action.continue"),
            t!("wizard.action.edit"),
            t!("wizard.action.back"),
            t!("wizard.action.quit"),
        ];
        let choice = Select::with_theme(theme)
            .with_prompt(t!("wizard.prompt.next"))
            .items(&actions)
            .default(0)
            .interact_opt()?;

        match choice {
            Some(0) => match wizard.advance() {
                Ok(()) => return Ok(Flow::Continue),
                Err(e) => warn_inline(e),
            },
            Some(1) => {}
            Some(2) | None => {
                wizard.retreat()?;
                return Ok(Flow::Continue);
            }
            Some(_) => return Ok(Flow::Quit),
        }
    }
}

/// Reads the change log one line at a time until an empty line.
/// An empty first line keeps `current`.
fn prompt_change_log(theme: &ColorfulTheme, current: &str) -> Result<String> {
    println!(
        "{}",
        format!(t!("wizard.hint.change_log"), max = CHANGE_LOG_MAX_CHARS).dimmed()
    );
    if !current.trim().is_empty() {
        println!("{}", t!("wizard.hint.change_log_keep").dimmed());
        for line in current.lines() {
            println!("   {}", line.green());
        }
    }

    let mut lines = Vec::new();
    loop {
        let line: String = Input::with_theme(theme)
            .with_prompt(t!("wizard.prompt.change_log"))
            .allow_empty(true)
            .interact_text()?;
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }

    if lines.is_empty() {
        return Ok(current.to_string());
    }
    Ok(lines.join("\n"))
}

// --- Confirm stage ---

fn prompt_confirm(
    wizard: &mut Wizard<'_>,
    theme: &ColorfulTheme,
    runtime: &Runtime,
    trigger: &Arc<dyn WorkflowTrigger>,
) -> Result<Flow> {
    println!(
        "\n{}",
        summary::deployment_summary(wizard.config(), wizard.selection())
    );

    loop {
        let first_action = match wizard.dispatch_status() {
            Some(DispatchStatus::Succeeded { workflows }) => {
                println!(
                    "\n{} {}",
                    t!("wizard.success.triggered").green().bold(),
                    format!("({})", workflows.join(", ")).dimmed()
                );
                return Ok(Flow::Done);
            }
            Some(DispatchStatus::Failed(message)) => {
                eprintln!(
                    "\n{}",
                    format!(t!("wizard.error.trigger"), error = message).red()
                );
                t!("wizard.action.retry")
            }
            _ => t!("wizard.action.trigger"),
        };

        let actions = [
            first_action,
            t!("wizard.action.preview"),
            t!("wizard.action.back"),
            t!("wizard.action.quit"),
        ];
        let choice = Select::with_theme(theme)
            .with_prompt(t!("wizard.prompt.next"))
            .items(&actions)
            .default(0)
            .interact_opt()?;

        match choice {
            Some(0) => match wizard.begin_dispatch() {
                Ok(plan) => run_with_spinner(wizard, runtime, Arc::clone(trigger), plan)?,
                Err(e) => warn_inline(e),
            },
            Some(1) => println!(
                "\n{}",
                summary::all_workflows_preview(wizard.config(), wizard.selection())
            ),
            Some(2) | None => {
                wizard.retreat()?;
                return Ok(Flow::Continue);
            }
            Some(_) => return Ok(Flow::Quit),
        }
    }
}

/// Runs the plan on a blocking task and animates the spinner until the
/// outcome has been delivered to the wizard.
fn run_with_spinner(
    wizard: &mut Wizard<'_>,
    runtime: &Runtime,
    trigger: Arc<dyn WorkflowTrigger>,
    plan: DispatchPlan,
) -> Result<()> {
    runtime.block_on(async {
        let (tx, mut rx) = mpsc::channel::<WizardEvent>(1);

        tokio::task::spawn_blocking(move || {
            let event = wizard::run_dispatch(trigger.as_ref(), &plan);
            if tx.blocking_send(event).is_err() {
                log::warn!("Dispatch finished after the wizard stopped listening");
            }
        });

        print!("{}", HIDE_CURSOR);
        let _cursor = scopeguard::guard((), |_| {
            print!("{}{}", CLEAR_LINE, SHOW_CURSOR);
            let _ = io::stdout().flush();
        });

        let mut ticker = tokio::time::interval(SPINNER_INTERVAL);
        while wizard.is_dispatching() {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => wizard.handle_event(event),
                    None => return Err(anyhow!(t!("wizard.error.dispatch_lost"))),
                },
                _ = ticker.tick() => {
                    wizard.handle_event(WizardEvent::Tick);
                    if let Stage::Confirm(view) = wizard.stage() {
                        print!(
                            "{}{} {}",
                            CLEAR_LINE,
                            t!("wizard.info.triggering").cyan(),
                            view.spinner().cyan()
                        );
                        let _ = io::stdout().flush();
                    }
                }
            }
        }
        Ok(())
    })
}
