use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use ppp_product_manager::app::{App, FetchOptions, FetchReport, RenameReport};
use ppp_product_manager::config::ConfigLoader;
use ppp_product_manager::decompress::GzDecompressor;
use ppp_product_manager::error::PppError;
use ppp_product_manager::output::{JsonOutput, OutputMode, StderrSink};
use ppp_product_manager::store::Store;
use ppp_product_manager::transport::{FtpFetcher, HttpFetcher};

#[derive(Parser)]
#[command(name = "ppp-pm")]
#[command(about = "Download and rename the auxiliary products needed for PPP GNSS processing")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download products for every observation file in a folder")]
    Fetch(FetchArgs),
    #[command(about = "Copy long-name files to short legacy names in a sibling short/ folder")]
    Rename(RenameArgs),
}

#[derive(Args)]
struct FetchArgs {
    #[arg(long)]
    folder: Option<String>,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    retries: Option<u32>,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct RenameArgs {
    #[arg(long)]
    folder: Option<String>,

    #[arg(long)]
    config: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(ppp) = report.downcast_ref::<PppError>() {
            return ExitCode::from(map_exit_code(ppp));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PppError) -> u8 {
    match error {
        PppError::MissingFolder
        | PppError::ConfigRead(_)
        | PppError::ConfigParse(_)
        | PppError::NoObservationFiles(_) => 2,
        PppError::Http(_) | PppError::TransferFailed { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Fetch(args) => run_fetch(args, output_mode),
        Commands::Rename(args) => run_rename(args, output_mode),
    }
}

fn run_fetch(args: FetchArgs, output_mode: OutputMode) -> miette::Result<()> {
    let config = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
    let folder = args
        .folder
        .map(Utf8PathBuf::from)
        .or(config.obs_folder)
        .ok_or(PppError::MissingFolder)
        .into_diagnostic()?;
    let options = FetchOptions {
        max_retries: args.retries.unwrap_or(config.max_retries),
        dry_run: args.dry_run,
    };

    let store = Store::new().into_diagnostic()?;
    let http = HttpFetcher::new().into_diagnostic()?;
    let app = App::new(store, http, FtpFetcher::new(), GzDecompressor::new());

    match output_mode {
        OutputMode::NonInteractive => {
            let report = app.fetch_folder(&folder, options, &JsonOutput).into_diagnostic()?;
            JsonOutput::print_fetch(&report).into_diagnostic()?;
            Ok(())
        }
        OutputMode::Interactive => {
            let report = app.fetch_folder(&folder, options, &StderrSink).into_diagnostic()?;
            print_fetch_summary(&report);
            Ok(())
        }
    }
}

fn run_rename(args: RenameArgs, output_mode: OutputMode) -> miette::Result<()> {
    let config = ConfigLoader::resolve(args.config.as_deref()).into_diagnostic()?;
    let folder = args
        .folder
        .map(Utf8PathBuf::from)
        .or(config.long_folder)
        .ok_or(PppError::MissingFolder)
        .into_diagnostic()?;

    let store = Store::new().into_diagnostic()?;
    let http = HttpFetcher::new().into_diagnostic()?;
    let app = App::new(store, http, FtpFetcher::new(), GzDecompressor::new());

    match output_mode {
        OutputMode::NonInteractive => {
            let report = app.rename_folder(&folder, &JsonOutput).into_diagnostic()?;
            JsonOutput::print_rename(&report).into_diagnostic()?;
            Ok(())
        }
        OutputMode::Interactive => {
            let report = app.rename_folder(&folder, &StderrSink).into_diagnostic()?;
            print_rename_summary(&report);
            Ok(())
        }
    }
}

fn print_fetch_summary(report: &FetchReport) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}ppp-pm fetch summary{reset}");
    println!(
        "{green}observation files processed: {}{reset}",
        report.observations.len()
    );
    println!("{yellow}failures: {}{reset}", report.total_failures());

    for obs in &report.observations {
        match (&obs.directory_tag, &obs.error) {
            (Some(tag), _) => {
                let failed = obs.failed_entries();
                let color = if failed == 0 { green } else { yellow };
                println!(
                    "{color}  {} -> products/{tag} ({}/{} products){reset}",
                    obs.observation,
                    obs.entries.len() - failed,
                    obs.entries.len()
                );
            }
            (None, Some(error)) => {
                println!("{yellow}  {} skipped: {error}{reset}", obs.observation);
            }
            (None, None) => {}
        }
        for entry in &obs.entries {
            if let Some(error) = &entry.error {
                println!("{yellow}    {}: {error}{reset}", entry.local_path);
            }
        }
    }
}

fn print_rename_summary(report: &RenameReport) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}ppp-pm rename summary{reset}");
    println!("{green}target folder: {}{reset}", report.target_dir);
    println!("{yellow}failures: {}{reset}", report.total_failures());

    for entry in &report.entries {
        match (&entry.short_name, &entry.error) {
            (Some(short), None) => println!("{green}  {} -> {short}{reset}", entry.long_name),
            (_, Some(error)) => println!("{yellow}  {}: {error}{reset}", entry.long_name),
            _ => {}
        }
    }
}
