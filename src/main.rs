// FollowDiff - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation
// 3. Background import of both export files
// 4. Rendering the non-follower list (or statistics) to stdout or a file

use clap::{Parser, ValueEnum};
use followdiff::app::import::ImportManager;
use followdiff::app::session::Session;
use followdiff::core::export::{self, ExportFormat, ExportOptions, JsonStyle};
use followdiff::core::importer::{ExtractionStrategies, ImportConfig};
use followdiff::core::model::{ImportProgress, Side};
use followdiff::platform::config::{self, AppConfig, PlatformPaths};
use followdiff::platform::fs;
use followdiff::util::error::Result;
use followdiff::util::{constants, logging};
use std::path::PathBuf;

/// FollowDiff - find accounts you follow that do not follow you back.
///
/// Reads the followers and following files from a social platform data
/// export and lists every account in "following" that is missing from
/// "followers".
#[derive(Parser, Debug)]
#[command(name = "followdiff", version, about)]
struct Cli {
    /// Followers export file (e.g. followers_1.json).
    #[arg(long)]
    followers: PathBuf,

    /// Following export file (e.g. following.json).
    #[arg(long)]
    following: PathBuf,

    /// Sort Z to A instead of A to Z.
    #[arg(long)]
    descending: bool,

    /// Only output usernames containing this text (case-insensitive).
    #[arg(short = 's', long, default_value = "")]
    search: String,

    /// Output format (defaults to [export] format in config.toml, else text).
    #[arg(short = 'f', long, value_enum)]
    format: Option<FormatArg>,

    /// Wrap JSON output as {"nonFollowers": [...]}.
    #[arg(long)]
    json_object: bool,

    /// Omit the leading '@' from every username.
    #[arg(long)]
    strip_at: bool,

    /// Write output to this file (or into this directory) instead of stdout.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Print follower/following/non-follower counts as JSON instead of the list.
    #[arg(long)]
    stats: bool,

    /// Use this config.toml instead of the platform default.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ExportFormat::Text,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

fn import_config(config: &AppConfig) -> ImportConfig {
    ImportConfig {
        strategies: ExtractionStrategies::from_wrapper_keys(config.wrapper_keys.iter().cloned()),
        chunk_size: config.chunk_size,
        max_file_size: config.max_file_size,
    }
}

fn export_options(cli: &Cli, config: &AppConfig) -> ExportOptions {
    ExportOptions {
        strip_at: cli.strip_at || config.strip_at,
        json_style: if cli.json_object || config.json_object {
            JsonStyle::Object
        } else {
            JsonStyle::Array
        },
    }
}

/// Run both imports to completion, committing current results.
/// Returns false if either side failed.
fn run_imports(cli: &Cli, manager: &mut ImportManager, session: &mut Session) -> bool {
    manager.start_import(Side::Followers, cli.followers.clone());
    manager.start_import(Side::Following, cli.following.clone());

    let mut ok = true;
    while let Some(msg) = manager.wait_next() {
        if !manager.is_current(&msg) {
            tracing::debug!(side = %msg.side(), generation = msg.generation(), "Dropping stale import message");
            continue;
        }
        match msg {
            ImportProgress::Completed { side, outcome, .. } => {
                let report = session.commit(side, outcome);
                if let Some(notice) = report.notice {
                    eprintln!("Note: {notice}");
                }
                if report.skipped_records > 0 {
                    eprintln!(
                        "Note: skipped {} unreadable record(s) in '{}'",
                        report.skipped_records, report.file
                    );
                }
            }
            ImportProgress::Failed { side, error, .. } => {
                tracing::error!(side = %side, error = %error, "Import failed");
                eprintln!("Error: could not import the {side} file: {error}");
                ok = false;
            }
            ImportProgress::Progress {
                side,
                processed,
                total,
                ..
            } => {
                tracing::trace!(side = %side, processed, total, "Import progress");
            }
            ImportProgress::Started { .. } | ImportProgress::Cancelled { .. } => {}
        }
    }
    ok
}

fn main() {
    let cli = Cli::parse();

    // Config is loaded first so its [logging] level can apply.
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PlatformPaths::resolve().config_file());
    let (app_config, config_warnings) = config::load_config(&config_path);

    logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "FollowDiff starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Configuration warning");
    }

    let import_config = import_config(&app_config);
    let mut session = Session::new(import_config.clone());
    let mut manager = ImportManager::new(import_config);

    if !run_imports(&cli, &mut manager, &mut session) {
        std::process::exit(1);
    }

    if let Err(e) = render(&cli, &app_config, &mut session) {
        tracing::error!(error = %e, "FollowDiff failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Render the list (or statistics) and deliver it to stdout or `--output`.
fn render(cli: &Cli, app_config: &AppConfig, session: &mut Session) -> Result<()> {
    session.require_ready()?;

    // Apply the requested order to the canonical list before rendering.
    session.non_followers(!cli.descending, "");
    let stats = session.statistics();
    tracing::info!(
        followers = stats.follower_count,
        following = stats.following_count,
        non_followers = stats.non_follower_count,
        "Reconciliation complete"
    );

    let format: ExportFormat = match cli.format {
        Some(arg) => arg.into(),
        None => app_config.export_format.parse().unwrap_or_default(),
    };

    let rendered = if cli.stats {
        export::export_statistics(&stats)?
    } else {
        session.export_matching(&cli.search, format, export_options(cli, app_config))?
    };

    match &cli.output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(export::default_file_name(format))
            } else {
                path.clone()
            };
            fs::write_export(&path, &rendered)?;
            eprintln!("Wrote '{}'", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
