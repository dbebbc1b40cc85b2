//! Diaglot - draw.io label translation
//!
//! Detects the dominant language of each diagram page and writes
//! per-language label attributes that diagrams.net shows under "Edit Data…".

use anyhow::Result;
use clap::Parser;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use diaglot::cli::{Args, Commands, parse_languages};
use diaglot::config::Config;
use diaglot::report::FileReport;
use diaglot::workflow::{RunOptions, Workflow};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    // Load configuration: explicit path, then ./diaglot.toml, then defaults.
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("diaglot.toml").exists() {
                info!("Found diaglot.toml in current directory, loading...");
                Config::from_file("diaglot.toml")?
            } else {
                Config::default()
            }
        }
    };

    let workflow = Workflow::new(config)?;

    match args.command {
        Commands::Process {
            input,
            out_name,
            output_dir,
            languages,
            no_overwrite,
            uncompressed,
        } => {
            info!("Processing diagram file: {}", input.display());
            let options = RunOptions {
                output_dir,
                out_name,
                languages: languages.as_deref().map(parse_languages),
                no_overwrite,
                force_uncompressed: uncompressed,
            };
            let report = workflow.process_single_file(&input, &options).await?;
            print_report(&report);
        }
        Commands::Batch {
            input_dir,
            output_dir,
            languages,
            no_overwrite,
            uncompressed,
        } => {
            info!("Processing directory: {}", input_dir.display());
            let options = RunOptions {
                output_dir,
                out_name: None,
                languages: languages.as_deref().map(parse_languages),
                no_overwrite,
                force_uncompressed: uncompressed,
            };
            let reports = workflow.process_directory(&input_dir, &options).await?;

            for report in &reports {
                print_report(report);
            }
            let successes = reports.iter().filter(|r| r.succeeded()).count();
            let failures = reports.len() - successes;
            println!(
                "Done. {} file(s) processed successfully, {} failed.",
                successes, failures
            );
            if successes == 0 && !reports.is_empty() {
                anyhow::bail!("all {} file(s) failed", failures);
            }
        }
    }

    Ok(())
}

fn print_report(report: &FileReport) {
    match &report.error {
        Some(error) => {
            println!("[ERROR] {}: {}", report.input.display(), error);
            return;
        }
        None => {
            let output = report
                .output
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!("[OK] {} -> {}", report.input.display(), output);
        }
    }

    if report.pages.is_empty() {
        return;
    }
    println!(
        "  {:<20} {:<8} {:<8} {:<8} {:<8}",
        "Page", "Lang", "Written", "Skipped", "Failed"
    );
    for page in &report.pages {
        let lang = match (&page.detected_language, page.decode_failed) {
            (_, true) => "unreadable".to_string(),
            (Some(lang), _) if page.detection_fallback => format!("{}*", lang),
            (Some(lang), _) => lang.clone(),
            (None, _) => "-".to_string(),
        };
        println!(
            "  {:<20} {:<8} {:<8} {:<8} {:<8}",
            page.name,
            lang,
            page.attributes_written,
            page.attributes_skipped,
            page.failures.len()
        );
    }
}

/// Setup logging to both console and a daily-rolling file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".diaglot").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "diaglot.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program.
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer().with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
