//! resxprune CLI - find and remove unused .resx resources.
//!
//! Features:
//! - Literal or regex reference formats (`%` stands for the key)
//! - Key prefix exclusion
//! - resxprune.toml project configuration, overridden by flags
//! - Plain, key-only and JSON output
//! - Deleting selected or all unused entries, with confirmation and dry run

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::collections::HashSet;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use resxprune_core::{
    init_structured_logging, keys_text, load_config, load_config_file, log_info, log_warn,
    print_json, print_plain, render_json, render_plain, ResxPruneConfig, ScanConfig, ScanResult,
    UnusedFinder,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Find and remove unused .resx resources")]
pub struct Cli {
    /// Root of the project to search
    #[arg(default_value = ".")]
    path: String,

    /// Resource file to check (overrides resource_file from the config file)
    #[arg(long, short = 'r', value_name = "FILE")]
    resource: Option<String>,

    /// Config file to use instead of <path>/resxprune.toml
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Comma-separated file extensions to search, e.g. ".cs,.xaml"
    #[arg(long, value_name = "LIST")]
    extensions: Option<String>,

    /// Reference format, `%` stands for the key (repeatable)
    #[arg(long = "format", value_name = "TEMPLATE")]
    formats: Vec<String>,

    /// Comma-separated key prefixes that are never reported
    #[arg(long, value_name = "LIST")]
    exclude_prefixes: Option<String>,

    /// Treat reference formats as regular expressions
    #[arg(long, conflicts_with = "no_regex")]
    regex: bool,

    /// Treat reference formats as plain text (overrides use_regex from the config file)
    #[arg(long)]
    no_regex: bool,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Output only the unused keys, one per line
    #[arg(long, conflicts_with = "json")]
    keys_only: bool,

    /// Write the output to a file instead of stdout (absolute or relative path)
    #[arg(long, value_name = "FILE")]
    output: Option<String>,

    /// Keys to drop from the result without touching the resource file
    #[arg(long, num_args = 1.., value_name = "KEY")]
    exclude: Vec<String>,

    /// Delete these unused keys from the resource file
    #[arg(long, num_args = 1.., value_name = "KEY", conflicts_with = "delete_all")]
    delete: Vec<String>,

    /// Delete every unused key from the resource file
    #[arg(long)]
    delete_all: bool,

    /// Do not ask for confirmation before --delete-all
    #[arg(long)]
    yes: bool,

    /// Show what would be deleted without changing the resource file
    #[arg(long)]
    dry_run: bool,
}

/// Loads the config file named on the command line, or resxprune.toml in
/// the project root. Returns it with the directory relative paths resolve
/// against.
fn load_file_config(cli: &Cli, root: &Path) -> Result<Option<(ResxPruneConfig, PathBuf)>> {
    match &cli.config {
        Some(file) => {
            let path = PathBuf::from(file);
            let cfg = load_config_file(&path)?;
            let base = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            Ok(Some((cfg, base)))
        }
        None => Ok(load_config(root)?.map(|cfg| (cfg, root.to_path_buf()))),
    }
}

/// Builds the scan configuration: defaults, then the config file, then flags.
fn build_config(cli: &Cli) -> Result<ScanConfig> {
    let root = PathBuf::from(&cli.path);
    let file_config = load_file_config(cli, &root)?;

    let resource = match (&cli.resource, &file_config) {
        (Some(resource), _) => PathBuf::from(resource),
        (None, Some((cfg, base))) => cfg.resource_path(base).ok_or_else(|| {
            anyhow!("No resource file given: pass --resource or set resource_file in the config file")
        })?,
        (None, None) => {
            return Err(anyhow!(
                "No resource file given: pass --resource or set resource_file in resxprune.toml"
            ))
        }
    };

    let mut config = ScanConfig::new(&root, resource);
    if let Some((cfg, _)) = &file_config {
        config = cfg.apply_to(config);
    }

    if let Some(extensions) = &cli.extensions {
        config = config.with_extensions_csv(extensions);
    }
    if !cli.formats.is_empty() {
        config = config.with_reference_formats(cli.formats.iter().cloned());
    }
    if let Some(prefixes) = &cli.exclude_prefixes {
        config = config.with_exclude_prefixes_csv(prefixes);
    }
    if cli.regex {
        config = config.use_regex(true);
    } else if cli.no_regex {
        config = config.use_regex(false);
    }

    Ok(config)
}

/// Validates an `--output` path. Absolute and relative paths are both
/// accepted; empty paths, paths with null bytes and directories are not.
fn validate_output_path(path: &str) -> Result<PathBuf> {
    if path.contains('\0') {
        return Err(anyhow!("Output path contains null bytes"));
    }
    if path.trim().is_empty() {
        return Err(anyhow!("Output path is empty"));
    }

    let p = PathBuf::from(path);
    if p.is_dir() {
        return Err(anyhow!("Output path is a directory: {}", path));
    }

    Ok(p)
}

/// The report text for the selected output mode.
fn render_output(cli: &Cli, results: &[ScanResult]) -> Result<String> {
    if cli.keys_only {
        Ok(keys_text(results))
    } else if cli.json {
        let mut json = render_json(results)?;
        json.push('\n');
        Ok(json)
    } else {
        Ok(render_plain(results))
    }
}

fn write_report(cli: &Cli, results: &[ScanResult]) -> Result<()> {
    match &cli.output {
        Some(file) => {
            let safe_path = validate_output_path(file)?;
            let text = render_output(cli, results)?;
            fs::write(&safe_path, text)
                .with_context(|| format!("Failed to write output to {}", safe_path.display()))?;
            eprintln!("Unused resources written to: {}", safe_path.display());
        }
        None if cli.keys_only => print!("{}", keys_text(results)),
        None if cli.json => print_json(results),
        None => print_plain(results),
    }
    Ok(())
}

/// Whether an answer to a [y/N] prompt means yes.
fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Asks a [y/N] question. Anything but an explicit yes, including end of
/// input, is a no.
fn confirm(question: &str, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "{} [y/N] ", question)?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(is_yes(&answer))
}

/// Marks each of `keys` as selected. Keys that are not in the current
/// result list are skipped with a warning.
fn select_keys(finder: &mut UnusedFinder, keys: &[String]) -> usize {
    let mut selected = 0;
    for key in keys {
        if finder.set_selected(key, true) {
            selected += 1;
        } else {
            log_warn(&format!("{} is not an unused resource, skipping", key));
            eprintln!("[WARN] Not an unused resource, skipping: {}", key);
        }
    }
    selected
}

/// Applies --delete / --delete-all. Returns the number of entries removed.
fn run_deletion(cli: &Cli, finder: &mut UnusedFinder) -> Result<usize> {
    let keys: HashSet<String> = if cli.delete_all {
        finder.remaining_keys().clone()
    } else {
        select_keys(finder, &cli.delete);
        finder.selected_keys()
    };

    if keys.is_empty() {
        eprintln!("No unused resources to delete.");
        return Ok(0);
    }

    if cli.dry_run {
        let mut sorted: Vec<&String> = keys.iter().collect();
        sorted.sort();
        eprintln!("[DRY-RUN] Would delete {} resource(s):", sorted.len());
        for key in sorted {
            eprintln!("  - {}", key);
        }
        return Ok(0);
    }

    if cli.delete_all && !cli.yes {
        let question = format!("Are you sure you want to delete {} resources?", keys.len());
        let stdin = io::stdin();
        let confirmed = confirm(&question, &mut stdin.lock(), &mut io::stderr())
            .context("Failed to read confirmation")?;
        if !confirmed {
            eprintln!("Aborted, nothing deleted.");
            return Ok(0);
        }
    }

    let removed = finder.delete(&keys)?;
    eprintln!("[DELETE] Deleted {} unused resource(s).", removed);
    Ok(removed)
}

/// Runs one scan plus any requested exclusion and deletion. Returns the
/// process exit code.
fn run(cli: &Cli) -> Result<i32> {
    let config = build_config(cli)?;

    let mut finder = UnusedFinder::new();
    finder
        .scan(&config)
        .with_context(|| format!("Scan of {} failed", config.project_root().display()))?;

    if !cli.exclude.is_empty() {
        let keys: HashSet<String> = cli.exclude.iter().cloned().collect();
        let excluded = finder.exclude(&keys);
        log_info(&format!("excluded {} of {} requested key(s)", excluded, keys.len()));
    }

    write_report(cli, finder.results())?;

    if cli.delete_all || !cli.delete.is_empty() {
        run_deletion(cli, &mut finder)?;
    }

    // Exit code (CI-friendly): unused resources left after any deletion
    Ok(if finder.results().is_empty() { 0 } else { 1 })
}

fn main() {
    // Global panic guard
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] resxprune internal error: {}", info);
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("[ERROR] {:#}", e);
            std::process::exit(2);
        }
    }
}
