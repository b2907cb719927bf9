use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use image_renamer::analyzer::ImageAnalyzer;
use image_renamer::config::{AnalysisMode, Config, Language};
use image_renamer::renamer::{ProgressEvent, RenamePlan, RenameReport, Renamer};

#[derive(Parser, Debug)]
#[command(
    name = "image-renamer",
    version,
    about = "Rename image files based on their content using vision model analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// API key (overrides the config file)
    #[arg(short = 'k', long, global = true)]
    api_key: Option<String>,

    /// Chat-completions endpoint for GLM models (overrides the config file)
    #[arg(short = 'b', long, global = true)]
    base_url: Option<String>,

    /// Model name; `glm*` uses the GLM API, anything else Gemini
    #[arg(short = 'm', long, global = true)]
    model_name: Option<String>,

    /// Filename language: zh or en
    #[arg(short, long, global = true)]
    language: Option<Language>,

    /// Use offline mode (no AI analysis)
    #[arg(long, global = true)]
    offline: bool,

    /// Show what would be renamed without renaming anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Descend into subdirectories
    #[arg(short, long, global = true)]
    recursive: bool,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan images and show what the analyzer suggests for each
    Scan {
        /// Image files or directories
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Preview what files would be renamed
    Preview {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Save the preview as a plan file for `rename --plan`
        #[arg(long, value_name = "FILE")]
        save_plan: Option<PathBuf>,
    },
    /// Perform the renaming operation
    Rename {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Reuse a plan saved by `preview --save-plan` instead of analyzing again
        #[arg(long, value_name = "FILE")]
        plan: Option<PathBuf>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Write a default config.json and exit
    Init,
    /// Show the effective configuration and exit
    ShowConfig,
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    match &cli.command {
        Command::Init => init_config(cli.config.as_deref()),
        Command::ShowConfig => {
            print_config(&load_config(&cli)?);
            Ok(())
        }
        Command::Scan { paths } => {
            let config = load_config(&cli)?;
            let analyzer = build_analyzer(&config);
            let plans = build_renamer(&analyzer, &config).scan(paths).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&plans)?);
            } else {
                print_scan(&plans);
            }
            Ok(())
        }
        Command::Preview { paths, save_plan } => {
            let config = load_config(&cli)?;
            let analyzer = build_analyzer(&config);
            let plans = build_renamer(&analyzer, &config).scan(paths).await?;
            if let Some(file) = save_plan {
                let usable: Vec<_> = plans.iter().filter(|p| p.error.is_none()).cloned().collect();
                save_plans(file, &usable)?;
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&plans)?);
            } else {
                print_preview(&plans);
            }
            Ok(())
        }
        Command::Rename { paths, plan, yes } => {
            let config = load_config(&cli)?;
            let analyzer = build_analyzer(&config);
            let renamer = build_renamer(&analyzer, &config);
            let dry_run = config.output.dry_run;

            let plans = match plan {
                Some(file) => load_plans(file)?,
                None => renamer.preview_rename(paths).await?,
            };

            if !plans.iter().any(|p| p.would_rename) {
                notice(
                    cli.json,
                    &format!("{YELLOW}No image files found that would be renamed.{RESET}"),
                );
                return Ok(());
            }

            if !cli.json {
                print_preview(&plans);
            }

            if !dry_run && !*yes {
                let mut input = std::io::stdin().lock();
                let question = "Proceed with renaming? (y/N): ";
                if !confirm(question, &mut input, &mut std::io::stderr())? {
                    notice(cli.json, &format!("{YELLOW}Operation cancelled.{RESET}"));
                    return Ok(());
                }
            }

            let report = renamer.perform_rename(paths, dry_run, Some(&plans)).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, dry_run);
            }
            Ok(())
        }
    }
}

fn init_config(path: Option<&Path>) -> Result<()> {
    Config::default().save(path)?;
    let save_path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::config_path()?,
    };
    println!("Default config written to {}", save_path.display());
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    Ok(apply_overrides(Config::load(cli.config.as_deref())?, cli))
}

fn build_analyzer(config: &Config) -> ImageAnalyzer {
    match config.analysis_mode() {
        AnalysisMode::Offline => log::info!("Offline mode: names come from file metadata"),
        AnalysisMode::Online(kind) => {
            log::info!("Model: {} ({kind} API)", config.api.model_name)
        }
    }
    ImageAnalyzer::from_config(config)
}

fn build_renamer<'a>(analyzer: &'a ImageAnalyzer, config: &'a Config) -> Renamer<'a> {
    Renamer::new(analyzer, config).with_progress(|event| match event {
        ProgressEvent::Scan(p) => {
            log::debug!("scan {}% ({}/{}) {}", p.percent, p.current, p.total, p.file_name)
        }
        ProgressEvent::Rename(p) => log::debug!(
            "rename {}% ({}/{}) processed={} skipped={} ok={} failed={}",
            p.percent,
            p.current,
            p.total,
            p.processed,
            p.skipped,
            p.success,
            p.failed
        ),
    })
}

/// Status text that is not part of the result; kept off stdout in JSON mode.
fn notice(json: bool, message: &str) {
    if json {
        eprintln!("{message}");
    } else {
        println!("{message}");
    }
}

/// Layer command-line flags over the loaded configuration.
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(ref key) = cli.api_key {
        config.api.api_key = key.clone();
    }
    if let Some(ref url) = cli.base_url {
        config.api.base_url = url.clone();
    }
    if let Some(ref model) = cli.model_name {
        config.api.model_name = model.clone();
    }
    if let Some(language) = cli.language {
        config.naming.language = language;
    }
    if cli.offline {
        config.naming.offline_mode = true;
    }
    if cli.recursive {
        config.naming.recursive = true;
    }
    if cli.dry_run {
        config.output.dry_run = true;
    }
    config
}

/// Ask a yes/no question on `prompt`, reading the answer from `input`.
fn confirm(question: &str, input: &mut impl BufRead, prompt: &mut impl Write) -> Result<bool> {
    write!(prompt, "{question}")?;
    prompt.flush()?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn save_plans(path: &Path, plans: &[RenamePlan]) -> Result<()> {
    let contents = serde_json::to_string_pretty(plans).context("Failed to serialize plan")?;
    std::fs::write(path, contents).context("Failed to write plan file")?;
    log::info!("Plan saved to {}", path.display());
    Ok(())
}

fn load_plans(path: &Path) -> Result<Vec<RenamePlan>> {
    let contents = std::fs::read_to_string(path).context("Failed to read plan file")?;
    serde_json::from_str(&contents).context("Failed to parse plan file")
}

fn print_scan(plans: &[RenamePlan]) {
    if plans.is_empty() {
        println!("{YELLOW}No image files found.{RESET}");
        return;
    }

    println!();
    println!("{BOLD}=== Image Files Found ==={RESET}");
    println!("Found {} image files:", plans.len());
    println!();
    for (i, plan) in plans.iter().enumerate() {
        println!("{}. {CYAN}{}{RESET}", i + 1, plan.original_name);
        if let Some(ref meta) = plan.metadata {
            println!(
                "   {DIM}Size: {}  Type: {}  Dimensions: {} x {}{RESET}",
                format_file_size(meta.size_bytes),
                meta.mime_type,
                meta.width,
                meta.height
            );
        }
        match (&plan.suggested_name, &plan.error) {
            (_, Some(err)) => println!("   {RED}Error: {err}{RESET}"),
            (Some(name), None) => {
                let source = plan.source.map(|s| s.to_string()).unwrap_or_default();
                println!("   Suggested: {GREEN}{name}{RESET} {DIM}({source}){RESET}");
            }
            (None, None) => {}
        }
    }
    println!();
}

fn print_preview(plans: &[RenamePlan]) {
    for plan in plans.iter().filter(|p| p.error.is_some()) {
        println!(
            "{RED}Error: {}: {}{RESET}",
            plan.original_name,
            plan.error.as_deref().unwrap_or_default()
        );
    }

    let renames: Vec<_> = plans.iter().filter(|p| p.would_rename).collect();
    if renames.is_empty() {
        println!("{YELLOW}No image files found that would be renamed.{RESET}");
        return;
    }

    println!();
    println!("{BOLD}=== Files to Rename ==={RESET}");
    println!("Found {} files that would be renamed:", renames.len());
    println!();
    for (i, plan) in renames.iter().enumerate() {
        println!(
            "{}. {CYAN}{}{RESET} → {GREEN}{}{RESET}",
            i + 1,
            plan.original_name,
            plan.suggested_name.as_deref().unwrap_or_default()
        );
    }

    let unchanged = plans.iter().filter(|p| p.is_same_name).count();
    if unchanged > 0 {
        println!("{DIM}{unchanged} file(s) already have their suggested name{RESET}");
    }
    println!();
}

fn print_report(report: &RenameReport, dry_run: bool) {
    let summary = &report.summary;
    println!();
    if dry_run {
        println!("{BOLD}=== Dry Run ==={RESET}");
        println!("No files were actually renamed.");
        println!("Would rename: {} files", summary.success);
    } else {
        println!("{GREEN}Rename operation completed!{RESET}");
        println!("Successfully renamed: {} files", summary.success);
    }

    if !report.skipped.is_empty() {
        println!("{YELLOW}Skipped: {} files{RESET}", summary.skipped);
        for item in &report.skipped {
            println!(
                "  {DIM}- {}: {}{RESET}",
                item.original_name,
                item.reason.as_deref().unwrap_or_default()
            );
        }
    }

    if !report.failed.is_empty() {
        println!("{RED}Failed to rename: {} files{RESET}", summary.failed);
        for item in &report.failed {
            println!(
                "  {RED}- {}: {}{RESET}",
                item.original_name,
                item.error.as_deref().unwrap_or_default()
            );
        }
    }
}

fn print_config(config: &Config) {
    println!("{BOLD}=== Current Configuration ==={RESET}");
    let key = if config.api.api_key.is_empty() { "Not set" } else { "Set" };
    println!("API Key: {key}");
    println!("Base URL: {}", config.api.base_url);
    println!("Gemini Base URL: {}", config.api.gemini_base_url);
    println!("Model Name: {}", config.api.model_name);
    println!("Temperature: {}", config.api.temperature);
    println!("Max Tokens: {}", config.api.max_tokens);
    println!("Image Quality: {}", config.api.image_quality);
    println!("Language: {}", config.naming.language);
    println!("Offline Mode: {}", config.naming.offline_mode);
    println!("Recursive: {}", config.naming.recursive);
    println!(
        "Supported Formats: {}",
        config.naming.supported_extensions.join(", ")
    );
    println!(
        "Max Filename Length: {} (en) / {} (zh)",
        image_renamer::naming::MAX_LEN_EN,
        image_renamer::naming::MAX_LEN_ZH
    );
    println!("Dry Run: {}", config.output.dry_run);
}

/// Human-readable size, e.g. `1.5 MB`.
fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
