//! treelink - Export git trees into fresh directories, hardlinking
//! unchanged files from earlier exports.
//!
//! Usage:
//!   treelink main /srv/www/3 -l v2,/srv/www/2 -l v1,/srv/www/1
//!   treelink main /srv/www/3 --link v2,/srv/www/2 v1,/srv/www/1
//!   treelink --format json HEAD out
//!   treelink --help

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use treelink_core::{ExportConfig, GenerationDescriptor};
use treelink_export::{ExportReport, Exporter};
use treelink_store::{GitStore, resolve_treeish};

#[derive(Parser)]
#[command(
    name = "treelink",
    version,
    about = "Export a git tree into a new directory, hardlinking files from earlier exports",
    long_about = "treelink exports the tree named by TREEISH into TARGET, which must be \
                  missing or empty.\n\n\
                  Every file whose content and mode already exist in one of the earlier \
                  exports given with --link is hardlinked from there instead of being \
                  written again. Earlier exports are consulted newest first.",
    after_help = "WARNING: hard links share storage. Editing a file in one export edits \
                  it in every export linked to it; there is no copy-on-write. Earlier \
                  exports are trusted as-is and never checked against their trees."
)]
struct Cli {
    /// Reference, tag, commit or tree to export
    treeish: String,

    /// Directory to export into (must be missing or empty)
    target: PathBuf,

    /// Earlier exports to link from, as TREEISH,PATH (newest first)
    #[arg(
        short,
        long = "link",
        value_name = "TREEISH,PATH",
        value_parser = parse_link,
        num_args = 1..
    )]
    links: Vec<LinkSpec>,

    /// Repository to read from (searched upwards like git)
    #[arg(short = 'C', long, default_value = ".")]
    repo: PathBuf,

    /// Output format for the summary
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Do not print the summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// An earlier export named on the command line.
#[derive(Debug, Clone)]
struct LinkSpec {
    treeish: String,
    path: PathBuf,
}

fn parse_link(value: &str) -> Result<LinkSpec, String> {
    let (treeish, path) = value
        .split_once(',')
        .ok_or_else(|| format!("expected TREEISH,PATH, got `{value}`"))?;
    if treeish.is_empty() || path.is_empty() {
        return Err(format!("expected TREEISH,PATH, got `{value}`"));
    }
    let path = std::path::absolute(path).map_err(|err| format!("invalid path `{path}`: {err}"))?;
    Ok(LinkSpec {
        treeish: treeish.to_string(),
        path,
    })
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = GitStore::discover(&cli.repo)
        .wrap_err_with(|| format!("Cannot open repository at {}", cli.repo.display()))?;

    let tree = resolve_treeish(&store, &cli.treeish)?;
    let mut config = ExportConfig::new(&cli.target);
    for link in &cli.links {
        let generation = resolve_treeish(&store, &link.treeish)?;
        config = config.with_generation(GenerationDescriptor::new(generation, &link.path));
    }

    if !cli.quiet {
        eprintln!("Exporting {} to {}...", cli.treeish, cli.target.display());
    }

    let report = Exporter::new(&store)
        .export(&tree, &config)
        .wrap_err("Export failed")?;

    if !cli.quiet {
        print_report(&report, cli.format)?;
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &ExportReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(60));
            println!(" {} -> {}", report.tree.short(), report.target.display());
            println!(
                " {} directories, {} files linked, {} files written ({})",
                report.directories,
                report.files_linked,
                report.files_written,
                format_size(report.bytes_written)
            );
            println!(
                " {:.1}% linked, finished in {:.2}s",
                report.link_ratio() * 100.0,
                report.duration.as_secs_f64()
            );
            println!("{}", "─".repeat(60));

            for pass in &report.passes {
                println!(
                    "   {:<40} {:>6} of {:>6}",
                    pass.label, pass.resolved, pass.attempted
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }

    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
