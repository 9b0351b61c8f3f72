use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use surfacediff_core::{
    ApiSnapshot, ChangeKind, ComparisonConfiguration, ComparisonResult, OutputFormat, Severity,
};
use surfacediff_engine::ApiComparer;

/// Config files looked up in the working directory when `--config` is absent
const DEFAULT_CONFIG_FILES: [&str; 2] = ["surfacediff.json", "surfacediff.toml"];

/// Exit code for breaking changes (when failing is enabled)
const EXIT_BREAKING: i32 = 1;

/// Exit code for invalid or unreadable configuration
const EXIT_CONFIG: i32 = 2;

/// surfacediff - API surface comparison for compiled libraries
#[derive(Parser)]
#[command(name = "surfacediff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two API snapshots and report differences
    Compare {
        /// Snapshot of the previous version
        source: PathBuf,

        /// Snapshot of the new version
        target: PathBuf,

        /// Path to config file (default: surfacediff.json or surfacediff.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report format (overrides the config file)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Exit with success even if breaking changes are found
        #[arg(long)]
        no_fail: bool,
    },

    /// Validate a configuration file
    ValidateConfig {
        /// Config file to validate
        config: PathBuf,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination (JSON, or TOML by extension)
        #[arg(short, long, default_value = "surfacediff.json")]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Console,
    Json,
    Markdown,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Console => OutputFormat::Console,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compare { source, target, config, format, output, no_fail } => {
            compare_command(&source, &target, config.as_deref(), format, output, no_fail, cli.verbose)
        }
        Commands::ValidateConfig { config } => validate_config_command(&config),
        Commands::InitConfig { output } => init_config_command(&output, cli.verbose),
    }
}

/// Logs go to stderr; `RUST_LOG` wins over the verbosity flag
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load the explicit config, else a default file from the working directory,
/// else built-in defaults. Exits with code 2 on any config error.
fn load_config(path: Option<&Path>, verbose: bool) -> ComparisonConfiguration {
    let found = path.map(Path::to_path_buf).or_else(|| {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    });

    let Some(config_path) = found else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        return ComparisonConfiguration::default();
    };

    if verbose {
        eprintln!("{} {}", "Loading config from:".cyan(), config_path.display());
    }

    match ComparisonConfiguration::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Configuration error:".red().bold(), e);
            std::process::exit(EXIT_CONFIG);
        }
    }
}

/// Compare command - diff two snapshots and render the result
fn compare_command(
    source_path: &Path,
    target_path: &Path,
    config_path: Option<&Path>,
    format: Option<FormatArg>,
    output: Option<PathBuf>,
    no_fail: bool,
    verbose: bool,
) -> Result<()> {
    let config = load_config(config_path, verbose);

    let format = format.map(OutputFormat::from).unwrap_or(config.output_format);
    let output = output.or_else(|| config.output_path.clone());
    let fail_on_breaking = config.fail_on_breaking_changes && !no_fail;

    let comparer = match ApiComparer::new(config) {
        Ok(comparer) => comparer,
        Err(e) => {
            eprintln!("{} {}", "Configuration error:".red().bold(), e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if verbose {
        eprintln!("{} {}", "Loading source snapshot:".cyan(), source_path.display());
    }
    let source = ApiSnapshot::from_file(source_path)
        .map_err(|e| anyhow::anyhow!("Failed to load source snapshot: {}", e))?;

    if verbose {
        eprintln!("{} {}", "Loading target snapshot:".cyan(), target_path.display());
    }
    let target = ApiSnapshot::from_file(target_path)
        .map_err(|e| anyhow::anyhow!("Failed to load target snapshot: {}", e))?;

    let result = comparer.compare(&source, &target);
    tracing::debug!(?format, output = ?output, "rendering report");

    let rendered = match format {
        OutputFormat::Console => None,
        OutputFormat::Json => Some(result.to_json()?),
        OutputFormat::Markdown => Some(generate_markdown_report(&result)),
    };

    match (rendered, &output) {
        (Some(content), Some(path)) => {
            std::fs::write(path, content)?;
            if verbose {
                eprintln!("{} {}", "Report saved to:".green(), path.display());
            }
        }
        (Some(content), None) => println!("{}", content),
        (None, Some(path)) => {
            result.save_to_file(path)?;
            print_console_report(&result);
            if verbose {
                eprintln!("{} {}", "JSON report saved to:".green(), path.display());
            }
        }
        (None, None) => print_console_report(&result),
    }

    if fail_on_breaking && result.has_breaking_changes() {
        std::process::exit(EXIT_BREAKING);
    }

    Ok(())
}

/// Validate config command - load, validate, report
fn validate_config_command(path: &Path) -> Result<()> {
    match ComparisonConfiguration::from_file(path) {
        Ok(config) => {
            println!("{} {}", "✓ Configuration is valid:".green().bold(), path.display());
            println!(
                "  {} namespace mappings, {} type mappings",
                config.mappings.namespace_mappings.len(),
                config.mappings.type_mappings.len()
            );
            println!(
                "  {} excluded types, {} excluded members",
                config.exclusions.excluded_types.len() + config.exclusions.excluded_type_patterns.len(),
                config.exclusions.excluded_members.len() + config.exclusions.excluded_member_patterns.len()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗ Invalid configuration:".red().bold(), e);
            std::process::exit(EXIT_CONFIG);
        }
    }
}

/// Init config command - write the default configuration
fn init_config_command(output: &Path, verbose: bool) -> Result<()> {
    if output.exists() {
        return Err(anyhow::anyhow!(
            "{} already exists; remove it first or choose another path with --output",
            output.display()
        ));
    }

    ComparisonConfiguration::default().save_to_file(output)?;

    println!("{} {}", "Wrote default configuration to".green(), output.display());
    if verbose {
        eprintln!("Edit mappings and exclusions, then run 'surfacediff validate-config'");
    }

    Ok(())
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Critical => "CRITICAL".red().bold(),
        Severity::Error => "ERROR".red(),
        Severity::Warning => "WARN".yellow(),
        Severity::Info => "INFO".cyan(),
    }
}

/// Print result summary to stdout
fn print_console_report(result: &ComparisonResult) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "API Comparison Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Source: {} {}", result.source.name, result.source.version.as_deref().unwrap_or(""));
    println!("Target: {} {}", result.target.name, result.target.version.as_deref().unwrap_or(""));
    println!("Timestamp: {}", result.timestamp);
    println!();

    let summary = &result.summary;
    println!("{}", "Summary:".bold());
    println!("  Total differences: {}", summary.total);
    println!("  Added:     {}", summary.added);
    println!("  Removed:   {}", summary.removed);
    println!("  Modified:  {}", summary.modified);
    println!("  Moved:     {}", summary.moved);
    println!("  Excluded:  {}", summary.excluded);
    if summary.unexpectedly_included > 0 {
        println!("  Unexpectedly included: {}", summary.unexpectedly_included.to_string().yellow());
    }

    if summary.breaking > 0 {
        println!("  Breaking:  {}", summary.breaking.to_string().red().bold());
    } else {
        println!("  Breaking:  {}", summary.breaking.to_string().green());
    }
    println!();

    if result.differences.is_empty() {
        println!("{}", "✓ No API differences found!".green().bold());
    } else {
        println!("{}", "Differences:".bold());
        for diff in &result.differences {
            let marker = if diff.is_breaking { "✗".red() } else { " ".normal() };
            println!(
                "  {} [{}] {}",
                marker,
                severity_label(diff.severity),
                diff.description
            );

            for entry in &diff.change_details {
                let note = if entry.is_breaking { " (breaking)".red() } else { "".normal() };
                println!("      - {}{}", entry.detail, note);
            }
        }
    }

    if !result.diagnostics.is_empty() {
        println!();
        println!("{}", "Diagnostics:".bold());
        for diag in &result.diagnostics {
            println!("  [{}] {}: {}", severity_label(diag.severity), diag.code, diag.message);
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

/// Generate markdown report
fn generate_markdown_report(result: &ComparisonResult) -> String {
    let mut md = String::new();

    md.push_str("# API Comparison Report\n\n");
    md.push_str(&format!("**Source:** {}", result.source.name));
    if let Some(version) = &result.source.version {
        md.push_str(&format!(" {}", version));
    }
    md.push_str("\n\n");
    md.push_str(&format!("**Target:** {}", result.target.name));
    if let Some(version) = &result.target.version {
        md.push_str(&format!(" {}", version));
    }
    md.push_str("\n\n");
    md.push_str(&format!("**Timestamp:** {}\n\n", result.timestamp));

    let summary = &result.summary;
    md.push_str("## Summary\n\n");
    md.push_str("| Change | Count |\n|---|---|\n");
    md.push_str(&format!("| Added | {} |\n", summary.added));
    md.push_str(&format!("| Removed | {} |\n", summary.removed));
    md.push_str(&format!("| Modified | {} |\n", summary.modified));
    md.push_str(&format!("| Moved | {} |\n", summary.moved));
    md.push_str(&format!("| Excluded | {} |\n", summary.excluded));
    md.push_str(&format!("| Unexpectedly included | {} |\n", summary.unexpectedly_included));
    md.push_str(&format!("| **Breaking** | **{}** |\n", summary.breaking));
    md.push('\n');

    if result.differences.is_empty() {
        md.push_str("✅ **No API differences found!**\n");
        return md;
    }

    let breaking: Vec<_> = result.breaking_changes().collect();
    if !breaking.is_empty() {
        md.push_str("## Breaking Changes\n\n");
        for diff in breaking {
            md.push_str(&format!("- ❌ **{}** {}\n", diff.severity, diff.description));
        }
        md.push('\n');
    }

    for kind in [
        ChangeKind::Removed,
        ChangeKind::Modified,
        ChangeKind::Moved,
        ChangeKind::Added,
        ChangeKind::Excluded,
        ChangeKind::UnexpectedlyIncluded,
    ] {
        let diffs: Vec<_> = result
            .differences_of(kind)
            .filter(|d| !d.is_breaking)
            .collect();
        if diffs.is_empty() {
            continue;
        }

        md.push_str(&format!("## Non-breaking: {}\n\n", kind));
        for diff in diffs {
            md.push_str(&format!("- `{}` {}\n", diff.element_name(), diff.description));
            for detail in diff.details() {
                md.push_str(&format!("  - {}\n", detail));
            }
        }
        md.push('\n');
    }

    if !result.diagnostics.is_empty() {
        md.push_str("## Diagnostics\n\n");
        for diag in &result.diagnostics {
            md.push_str(&format!("- ⚠️ `{}` {}\n", diag.code, diag.message));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use surfacediff_core::{MemberDescriptor, MemberKind};

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn format_argument_maps_to_output_format() {
        assert_eq!(OutputFormat::from(FormatArg::Markdown), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from(FormatArg::Json), OutputFormat::Json);
    }

    #[test]
    fn markdown_report_lists_breaking_changes() {
        let ty = MemberDescriptor::new_type(MemberKind::Class, "Acme", "Widget");
        let run = MemberDescriptor::new_member(MemberKind::Method, &ty, "Run", "void()");
        let stop = MemberDescriptor::new_member(MemberKind::Method, &ty, "Stop", "void()");

        let comparer = ApiComparer::new(ComparisonConfiguration::default()).unwrap();
        let result = comparer.compare_descriptors(&[ty.clone(), run], &[ty, stop]);
        let md = generate_markdown_report(&result);

        assert!(md.contains("## Breaking Changes"));
        assert!(md.contains("method 'Acme.Widget.Run' was removed"));
        assert!(md.contains("## Non-breaking: added"));
        assert!(md.contains("| **Breaking** | **1** |"));
    }

    #[test]
    fn markdown_report_for_identical_snapshots() {
        let comparer = ApiComparer::new(ComparisonConfiguration::default()).unwrap();
        let result = comparer.compare_descriptors(&[], &[]);
        assert!(generate_markdown_report(&result).contains("No API differences found"));
    }
}
