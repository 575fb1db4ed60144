use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;

use auto_catalog_core::discovery::discover_markdown;
use auto_catalog_core::{
    CatalogConfig, CatalogError, FileReport, MatchKind, MoveOutcome, Organizer, Relocator,
    Result, RunMode, Vault,
};

mod args;
use args::{Cli, Commands, Shell};

/// Global output switches shared by all handlers
#[derive(Clone, Copy)]
struct Ui {
    verbose: bool,
    quiet: bool,
}

impl Ui {
    fn debug(&self, message: impl AsRef<str>) {
        if self.verbose {
            println!("{} {}", "[DEBUG]".dimmed(), message.as_ref());
        }
    }

    fn info(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", message.as_ref());
        }
    }

    fn warn(&self, message: impl AsRef<str>) {
        if !self.quiet {
            eprintln!("{} {}", "[WARN]".yellow().bold(), message.as_ref());
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let ui = Ui {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    let vault_start = resolve_vault_start(cli.vault);

    let result = match cli.command {
        Some(Commands::Sort {
            paths,
            dry_run,
            force,
        }) => handle_sort(
            ui,
            &vault_start,
            cli.config.as_deref(),
            &paths,
            dry_run,
            force,
        ),
        Some(Commands::Categories) => handle_categories(ui, &vault_start, cli.config.as_deref()),
        Some(Commands::Init { force }) => {
            handle_init(ui, &vault_start, cli.config.as_deref(), force)
        }
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            if let Some(hint) = error_hint(&e) {
                eprintln!("{}", hint);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Fatal errors stop a run before any file is touched
fn error_hint(e: &CatalogError) -> Option<&'static str> {
    e.is_fatal().then_some("Nothing was changed.")
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "auto-catalog", &mut io::stdout());
}

/// `--vault` > `AUTO_CATALOG_VAULT` > current directory
fn resolve_vault_start(cli_vault: Option<PathBuf>) -> PathBuf {
    if let Some(vault) = cli_vault {
        return vault;
    }

    if let Ok(vault) = std::env::var("AUTO_CATALOG_VAULT") {
        return PathBuf::from(vault);
    }

    PathBuf::from(".")
}

/// Locate the vault and load its config (explicit `--config` wins)
fn load_context(
    ui: Ui,
    vault_start: &Path,
    config_path: Option<&Path>,
) -> Result<(Vault, CatalogConfig)> {
    let vault = Vault::locate(vault_start)?;
    ui.debug(format!("Vault root: {}", vault.root().display()));

    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| vault.default_config_path());
    ui.debug(format!("Config: {}", config_path.display()));

    let config = CatalogConfig::load(&config_path)?;
    Ok((vault, config))
}

fn handle_sort(
    ui: Ui,
    vault_start: &Path,
    config_path: Option<&Path>,
    paths: &[PathBuf],
    dry_run: bool,
    force: bool,
) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let discovery = discover_markdown(paths, &cwd);

    for missing in &discovery.missing {
        ui.warn(format!("Path not found: {}", missing.display()));
    }

    if discovery.files.is_empty() {
        ui.info("No Markdown files to process.");
        return Ok(());
    }

    if ui.verbose {
        ui.debug(format!("Found {} Markdown files:", discovery.files.len()));
        for file in &discovery.files {
            ui.debug(format!("  - {}", file.display()));
        }
    }

    let (vault, config) = load_context(ui, vault_start, config_path)?;
    let table = config.category_table()?;
    for collision in table.collisions() {
        ui.warn(format!(
            "Subcategory '{}' is listed more than once: {} replaces {}",
            collision.key, collision.kept, collision.replaced
        ));
    }

    let classifier = config.llm.build_classifier(vault.root())?;
    let organizer = Organizer::new(
        &vault,
        &table,
        classifier.as_ref(),
        Relocator::new(force),
    );
    let mode = if dry_run {
        RunMode::Preview
    } else {
        RunMode::Apply
    };

    ui.info("");
    ui.info(format!("Vault: {}", vault.root().display().to_string().cyan()));
    if dry_run {
        ui.info(format!("{}", "(dry run)".yellow()));
    }
    ui.info("");

    let summary = organizer.process_batch(&discovery.files, mode, |report| {
        print_report(ui, report)
    });

    ui.info("");
    ui.info("Summary:");
    if dry_run {
        ui.info(format!("  Planned: {}", summary.previewed));
    } else {
        ui.info(format!("  Moved: {}", summary.moved));
        ui.info(format!("  Unchanged: {}", summary.unchanged));
    }
    ui.info(format!("  Failed: {}", summary.failed));

    if summary.failed > 0 {
        return Err(CatalogError::BatchFailed {
            failed: summary.failed,
            total: summary.total(),
        });
    }

    Ok(())
}

fn print_report(ui: Ui, report: &FileReport) {
    let outcome = match &report.result {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!(
                "  {} [{}] {}",
                "[FAILED]".red().bold(),
                report.path.display(),
                e
            );
            return;
        }
    };

    let matched = match outcome.resolution.matched {
        MatchKind::Exact => "exact",
        MatchKind::LastSegment => "last segment",
        MatchKind::Fallback => "fallback",
    };
    ui.debug(format!("Raw answer: {}", outcome.resolution.raw));
    ui.debug(format!(
        "Resolved: {} ({})",
        outcome.resolution.destination, matched
    ));
    ui.debug(format!(
        "Destination: {}",
        outcome.plan.destination_dir.display()
    ));

    let plan = &outcome.plan;
    let line = match outcome.moved {
        None => format!("{} {}", "[DRY RUN]".cyan(), plan.preview_line()),
        Some(MoveOutcome::Moved) => format!("{} {}", "[OK]".green(), plan.preview_line()),
        Some(MoveOutcome::Replaced) => {
            format!("{} {}", "[REPLACED]".yellow(), plan.preview_line())
        }
        Some(MoveOutcome::AlreadyInPlace) => format!(
            "{} {} (already in {})",
            "[SKIP]".yellow(),
            plan.file_name(),
            outcome.resolution.destination
        ),
    };
    ui.info(format!("  {}", line));
}

fn handle_categories(ui: Ui, vault_start: &Path, config_path: Option<&Path>) -> Result<()> {
    let (vault, config) = load_context(ui, vault_start, config_path)?;
    let table = config.category_table()?;

    println!();
    println!("Vault: {}", vault.root().display());
    println!();

    if table.is_empty() {
        println!("No categories configured.");
    } else {
        let width = table.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, destination) in table.iter() {
            let key = format!("{:width$}", key, width = width);
            println!("  {}  {}", key.cyan(), destination);
        }
    }

    println!();
    println!("Default: {}", table.fallback().yellow());

    if !table.collisions().is_empty() {
        println!();
        for collision in table.collisions() {
            println!(
                "{} '{}': {} replaces {}",
                "[WARN]".yellow().bold(),
                collision.key,
                collision.kept,
                collision.replaced
            );
        }
    }
    println!();

    Ok(())
}

fn handle_init(ui: Ui, vault_start: &Path, config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => Vault::locate(vault_start)?.default_config_path(),
    };

    let path = CatalogConfig::init(&path, force)?;
    ui.info(format!("{} {}", "Initialized:".green(), path.display()));
    ui.info("Edit the categories and set llm.api_key (or AUTO_CATALOG_API_KEY) before sorting.");
    Ok(())
}
