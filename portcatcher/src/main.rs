#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use portcatcher_core::{load_from_path, load_rules_from_file, run_split_pipeline, run_tcam_pipeline, report, Settings};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline 5-tuple ACL rule compiler")]
struct Cli {
    /// Path to the rule file to compile
    #[arg(default_value = "src/ACL_rules/test.rules")]
    rules_file: PathBuf,

    /// Directory to write reports into (overrides the settings file)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Optional TOML settings file
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Force the TCAM expansion on, regardless of settings
    #[arg(long, overrides_with = "no_tcam")]
    tcam: bool,

    /// Force the TCAM expansion off, regardless of settings
    #[arg(long, overrides_with = "tcam")]
    no_tcam: bool,

    /// Increase log verbosity; repeatable
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => match load_from_path(path) {
            Ok(settings) => settings,
            Err(err) => {
                init_tracing(&Settings::default(), 0);
                error!(%err, "failed to load settings");
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };

    init_tracing(&settings, cli.verbose);

    let output_dir = cli.output_dir.unwrap_or_else(|| PathBuf::from(&settings.output_dir));
    let emit_tcam = if cli.tcam {
        true
    } else if cli.no_tcam {
        false
    } else {
        settings.emit_tcam
    };

    if let Err(err) = run(&cli.rules_file, &output_dir, emit_tcam) {
        error!(%err, "compilation failed");
        std::process::exit(1);
    }
}

fn run(rules_file: &std::path::Path, output_dir: &std::path::Path, emit_tcam: bool) -> portcatcher_core::Result<()> {
    let (rules, warnings) = load_rules_from_file(rules_file)?;
    for warning in &warnings {
        warn!(line = warning.line, reason = %warning.reason, "skipped malformed rule line");
    }
    info!(accepted = rules.len(), skipped = warnings.len(), "rules loaded");

    std::fs::create_dir_all(output_dir).map_err(|source| portcatcher_core::CompilerError::ReportUnwritable {
        path: output_dir.display().to_string(),
        source,
    })?;

    let split_tables = run_split_pipeline(&rules);
    report_or_skip("metainfo.txt", report::write_metainfo(&output_dir.join("metainfo.txt"), &split_tables.metainfo));
    report_or_skip(
        "Port_table.txt",
        report::write_port_table(&output_dir.join("Port_table.txt"), &split_tables.lrme_entries),
    );
    report_or_skip("IP_table.txt", report::write_ip_table(&output_dir.join("IP_table.txt"), &split_tables.ip_table));

    if emit_tcam {
        let tcam_tables = run_tcam_pipeline(&rules);
        let ratio = if rules.is_empty() { 0.0 } else { tcam_tables.entries.len() as f64 / rules.len() as f64 };
        info!(entries = tcam_tables.entries.len(), expansion_ratio = ratio, "tcam expansion complete");
        report_or_skip(
            "TCAM_table.txt",
            report::write_tcam_table(&output_dir.join("TCAM_table.txt"), tcam_tables.entries.iter()),
        );
    }

    Ok(())
}

/// A report that fails to write is logged and skipped; it never aborts the
/// other reports or the run as a whole.
fn report_or_skip(name: &str, result: portcatcher_core::Result<()>) {
    if let Err(err) = result {
        error!(report = name, %err, "failed to write report, skipping");
    }
}

fn init_tracing(settings: &Settings, verbose: u8) {
    let base_level = bump_level(&settings.log_level, verbose);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
}

/// Bumps `level` up by `steps` toward `trace`, matching `-v`/`-vv` verbosity.
fn bump_level(level: &str, steps: u8) -> String {
    const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    let start = LEVELS.iter().position(|&l| l == level).unwrap_or(2);
    let bumped = (start + steps as usize).min(LEVELS.len() - 1);
    LEVELS[bumped].to_string()
}
