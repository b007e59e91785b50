//! Command handlers
//!
//! Each subcommand drives the services the way a host page would: load a
//! scenario, hand its roster to the navigation filter, walk the enhancer
//! through its lifecycle, and print what changed.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::{Command, CommandFactory};
use clap_complete::{generate, Generator, Shell};
use tracing::{debug, instrument};

use crate::application::fingerprint::file_hash;
use crate::application::services::{FilterOutcome, SweepReport};
use crate::application::{document_fingerprint, nav_fingerprint};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{self, Settings};
use crate::domain::UserId;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::SelectionItem;
use crate::infrastructure::{InfraError, Scenario};
use crate::tree_traits::TreeDisplay;
use crate::util::path::{ensure_file_exists, get_relative_path, PathExt};

/// Dispatch the parsed CLI to its handler.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Filter { scenario, user }) => _filter(scenario, *user),
        Some(Commands::Enhance { scenario }) => _enhance(scenario),
        Some(Commands::Run {
            scenario,
            user,
            report,
        }) => _run(scenario, *user, report.as_deref()),
        Some(Commands::Scenarios { dir }) => _scenarios(dir.as_deref()),
        Some(Commands::Select { dir }) => _select(dir.as_deref()),
        Some(Commands::Fingerprint { scenario }) => _fingerprint(scenario),
        Some(Commands::Config { command }) => _config(command),
        Some(Commands::Completion { shell }) => _completion(*shell),
        None => Ok(()),
    }
}

/// Settings layered from the directory holding the target file, if any.
fn load_settings(local_dir: Option<&Path>) -> CliResult<Settings> {
    Ok(Settings::load(local_dir)?)
}

fn load_scenario(container: &ServiceContainer, path: &Path) -> CliResult<Scenario> {
    ensure_file_exists(path)?;
    let path = path.to_canonical()?;
    Ok(container.scenario_loader().load(&path)?)
}

fn acting_user(scenario: &Scenario, user_override: Option<u64>) -> UserId {
    user_override.map(UserId).unwrap_or(scenario.acting_user)
}

fn describe_user(scenario: &Scenario, user: UserId) -> String {
    match scenario.username(user) {
        Some(name) => format!("{name} ({user})"),
        None => user.to_string(),
    }
}

fn summarize(report: &SweepReport) -> String {
    format!(
        "rows {} (required {}, marked {}), placeholders {}/{}, events {} (badged {})",
        report.forms.rows(),
        report.forms.required(),
        report.forms.marked,
        report.placeholder.set,
        report.placeholder.candidates,
        report.calendar.events,
        report.calendar.badged(),
    )
}

fn print_filter_outcome(outcome: &FilterOutcome) {
    output::action("decision", &outcome.decision);
    for removed in &outcome.removed {
        output::diff_remove(removed);
    }
}

#[instrument]
fn _filter(scenario_path: &Path, user_override: Option<u64>) -> CliResult<()> {
    debug!("command: filter {:?}", scenario_path);
    let settings = load_settings(scenario_path.parent())?;
    let container = ServiceContainer::new(settings);
    let mut scenario = load_scenario(&container, scenario_path)?;

    let user = acting_user(&scenario, user_override);
    output::header(&format!("Scenario: {}", scenario.name));
    output::detail(&format!("acting user: {}", describe_user(&scenario, user)));

    output::header("Navigation before");
    output::info(&scenario.nav.to_tree_string());

    let roster = Arc::new(scenario.roster.clone());
    if roster.is_empty() {
        debug!("scenario roster is empty; every capability check will answer no");
    }
    let filter = container.navigation_filter(roster.clone(), roster);
    let outcome = filter.apply(user, &mut scenario.nav)?;
    print_filter_outcome(&outcome);

    output::header("Navigation after");
    output::info(&scenario.nav.to_tree_string());
    output::detail(&format!("tree hash: {}", nav_fingerprint(&scenario.nav)));
    Ok(())
}

#[instrument]
fn _enhance(scenario_path: &Path) -> CliResult<()> {
    debug!("command: enhance {:?}", scenario_path);
    let settings = load_settings(scenario_path.parent())?;
    let container = ServiceContainer::new(settings);
    let mut scenario = load_scenario(&container, scenario_path)?;

    output::header(&format!("Scenario: {}", scenario.name));

    let mut runtime = container.enhancer()?;
    let report = runtime.start(&mut scenario.document)?;
    runtime.stop(&mut scenario.document)?;

    output::header("Field rows");
    for (i, row) in report.forms.decisions.iter().enumerate() {
        let line = format!(
            "row {}: native={} marker={} help_icon={} required={}",
            i + 1,
            row.native,
            row.marker,
            row.help_icon,
            row.required
        );
        if row.required {
            output::success_detail(&line);
        } else {
            output::detail(&line);
        }
    }
    output::action(
        "required",
        &format!(
            "{} of {} rows, {} marked",
            report.forms.required(),
            report.forms.rows(),
            report.forms.marked
        ),
    );

    output::action(
        "placeholders",
        &format!(
            "{} of {} title fields",
            report.placeholder.set, report.placeholder.candidates
        ),
    );

    output::header("Event badges");
    for badge in &report.calendar.badges {
        output::diff_add(badge);
    }
    if report.calendar.unclassified > 0 {
        output::detail(&format!(
            "{} event(s) left unclassified",
            report.calendar.unclassified
        ));
    }

    output::header("Document");
    output::info(&scenario.document.to_tree_string());
    Ok(())
}

#[instrument]
fn _run(scenario_path: &Path, user_override: Option<u64>, report_path: Option<&Path>) -> CliResult<()> {
    debug!("command: run {:?}", scenario_path);
    let settings = load_settings(scenario_path.parent())?;
    let container = ServiceContainer::new(settings);
    let mut scenario = load_scenario(&container, scenario_path)?;

    let user = acting_user(&scenario, user_override);
    output::header(&format!("Scenario: {}", scenario.name));
    if !scenario.description.is_empty() {
        output::detail(&scenario.description);
    }
    output::detail(&format!("acting user: {}", describe_user(&scenario, user)));

    let roster = Arc::new(scenario.roster.clone());
    let filter = container.navigation_filter(roster.clone(), roster);
    let outcome = filter.apply(user, &mut scenario.nav)?;
    print_filter_outcome(&outcome);

    let mut runtime = container.enhancer()?;
    let mut total = runtime.start(&mut scenario.document)?;
    output::success(&format!("initial sweep: {}", summarize(&total)));

    while scenario.apply_next_insert()?.is_some() {
        if let Some(batch) = runtime.pump(&mut scenario.document)? {
            output::success_detail(&format!(
                "batch {}: {} root(s), {}",
                batch.seq,
                batch.roots,
                summarize(&batch.report)
            ));
            total.merge(batch.report);
        }
    }
    let batches = runtime.batches_processed();
    runtime.stop(&mut scenario.document)?;

    output::header("Navigation");
    output::info(&scenario.nav.to_tree_string());
    output::header("Document");
    output::info(&scenario.document.to_tree_string());

    let doc_hash = document_fingerprint(&scenario.document);
    let nav_hash = nav_fingerprint(&scenario.nav);
    output::action("document hash", &doc_hash);
    output::action("tree hash", &nav_hash);

    let written = write_report(
        report_path,
        &scenario,
        user,
        &outcome,
        &total,
        batches,
        &doc_hash,
        &nav_hash,
    )?;
    output::action("report", &written.display());
    Ok(())
}

/// Write the run report to `path`, or to a kept temp file when none is given.
#[allow(clippy::too_many_arguments)]
fn write_report(
    path: Option<&Path>,
    scenario: &Scenario,
    user: UserId,
    outcome: &FilterOutcome,
    total: &SweepReport,
    batches: u64,
    doc_hash: &str,
    nav_hash: &str,
) -> CliResult<PathBuf> {
    let mut report = String::new();
    let _ = writeln!(report, "# lmstune run report");
    let _ = writeln!(report, "generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(report, "scenario: {} ({})", scenario.name, scenario.source().display());
    let _ = writeln!(report, "acting user: {}", describe_user(scenario, user));
    let _ = writeln!(report);
    let _ = writeln!(report, "filter: {}", outcome.decision);
    for removed in &outcome.removed {
        let _ = writeln!(report, "  removed {removed}");
    }
    let _ = writeln!(report);
    let _ = writeln!(report, "sweeps: {}", summarize(total));
    for badge in &total.calendar.badges {
        let _ = writeln!(report, "  badge {badge}");
    }
    let _ = writeln!(report, "batches processed: {batches}");
    let _ = writeln!(report);
    let _ = writeln!(report, "document hash: {doc_hash}");
    let _ = writeln!(report, "tree hash: {nav_hash}");

    match path {
        Some(path) => {
            std::fs::write(path, &report)
                .map_err(|e| InfraError::io(format!("write report {}", path.display()), e))?;
            Ok(path.to_path_buf())
        }
        None => {
            let mut file = tempfile::Builder::new()
                .prefix("lmstune-report-")
                .suffix(".txt")
                .tempfile()
                .map_err(|e| InfraError::io("create report temp file", e))?;
            file.write_all(report.as_bytes())
                .map_err(|e| InfraError::io("write report temp file", e))?;
            let (_, kept) = file
                .keep()
                .map_err(|e| InfraError::io("persist report temp file", e.error))?;
            Ok(kept)
        }
    }
}

#[instrument]
fn _scenarios(dir_override: Option<&Path>) -> CliResult<()> {
    debug!("command: scenarios {:?}", dir_override);
    let settings = load_settings(dir_override)?;
    let container = ServiceContainer::new(settings);
    let dir = dir_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| container.settings.scenario_dir.clone());

    let summaries = container.scenario_loader().list(&dir)?;
    if summaries.is_empty() {
        output::warning(&format!("no scenarios found in {}", dir.display()));
        return Ok(());
    }

    output::header(&format!("{} scenario(s) in {}", summaries.len(), dir.display()));
    for summary in &summaries {
        let shown = get_relative_path(&dir, &summary.path)
            .unwrap_or_else(|_| summary.path.clone());
        if summary.description.is_empty() {
            output::success_detail(&format!("{} ({})", summary.name, shown.display()));
        } else {
            output::success_detail(&format!(
                "{} - {} ({})",
                summary.name,
                summary.description,
                shown.display()
            ));
        }
    }
    Ok(())
}

#[instrument]
fn _select(dir_override: Option<&Path>) -> CliResult<()> {
    debug!("command: select {:?}", dir_override);
    let settings = load_settings(dir_override)?;
    let container = ServiceContainer::new(settings);
    let dir = dir_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| container.settings.scenario_dir.clone());

    let summaries = container.scenario_loader().list(&dir)?;
    if summaries.is_empty() {
        return Err(CliError::Usage(format!(
            "no scenarios found in {}",
            dir.display()
        )));
    }

    let items: Vec<SelectionItem> = summaries
        .iter()
        .map(|s| SelectionItem {
            display: format!("{}\t{}", s.name, s.path.display()),
            value: s.path.to_string_lossy_cached(),
        })
        .collect();

    let selected = container
        .picker
        .select_one(&items, "Scenario> ")
        .map_err(|message| InfraError::Picker { message })?;

    match selected {
        Some(item) => _run(&PathBuf::from(item.value), None, None),
        None => {
            output::warning("selection aborted");
            Ok(())
        }
    }
}

#[instrument]
fn _fingerprint(scenario_path: &Path) -> CliResult<()> {
    debug!("command: fingerprint {:?}", scenario_path);
    let settings = load_settings(scenario_path.parent())?;
    let container = ServiceContainer::new(settings);
    let mut scenario = load_scenario(&container, scenario_path)?;

    let user = scenario.acting_user;
    let roster = Arc::new(scenario.roster.clone());
    let filter = container.navigation_filter(roster.clone(), roster);
    filter.apply(user, &mut scenario.nav)?;

    let mut runtime = container.enhancer()?;
    runtime.start(&mut scenario.document)?;
    while scenario.apply_next_insert()?.is_some() {
        runtime.pump(&mut scenario.document)?;
    }
    runtime.stop(&mut scenario.document)?;

    output::info(&format!("source   {}", file_hash(scenario.source())?));
    output::info(&format!("document {}", document_fingerprint(&scenario.document)));
    output::info(&format!("nav      {}", nav_fingerprint(&scenario.nav)));
    Ok(())
}

#[instrument]
fn _config(command: &ConfigCommands) -> CliResult<()> {
    debug!("command: config {:?}", command);
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(None)?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init { global } => _config_init(*global),
        ConfigCommands::Path => {
            match config::global_config_path() {
                Some(path) => {
                    if path.is_file() {
                        output::success_detail(&format!("global: {}", path.display()));
                    } else {
                        output::detail(&format!("global: {} (not created)", path.display()));
                    }
                }
                None => output::warning("global config directory unavailable"),
            }
            output::detail("local:  .lmstune.toml next to the scenario file");
            Ok(())
        }
    }
}

fn _config_init(global: bool) -> CliResult<()> {
    let settings = load_settings(None)?;
    let container = ServiceContainer::new(settings);

    let path = if global {
        config::global_config_path().ok_or_else(|| {
            CliError::Usage("cannot determine the global config directory".to_string())
        })?
    } else {
        PathBuf::from(".lmstune.toml")
    };

    if container.fs.exists(&path) {
        return Err(CliError::Usage(format!("{} already exists", path.display())));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        container
            .fs
            .create_dir_all(parent)
            .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
    }
    container
        .fs
        .write(&path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    output::success(&format!("wrote {}", path.display()));
    Ok(())
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut std::io::stdout());
}

fn _completion(shell: Shell) -> CliResult<()> {
    debug!("command: completion {:?}", shell);
    let mut cmd = Cli::command();
    print_completions(shell, &mut cmd);
    Ok(())
}
