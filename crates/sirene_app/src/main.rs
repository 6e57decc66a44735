mod cli;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::{debug, error, info, LevelFilter};

use sirene_core::{extract_sirens, summarize, Siren, Summary};
use sirene_engine::{
    build_workbook, fetch_batch, load_sirens, AtomicFileWriter, CancelFlag, FetchError,
    ProgressEvent, ProgressSink, SireneClient,
};
use sirene_logging::LogDestination;

use crate::cli::Cli;

/// Shell convention for a run ended by Ctrl-C.
const EXIT_STOPPED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if matches!(err.downcast_ref::<FetchError>(), Some(FetchError::Cancelled)) => {
            eprintln!("Stopped on request; no workbook was written.");
            ExitCode::from(EXIT_STOPPED)
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let destination = match &cli.log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    sirene_logging::initialize(destination, level);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let sirens = gather_sirens(&cli)?;
    anyhow::ensure!(
        !sirens.is_empty(),
        "no SIREN found; pass identifiers on the command line or through --input"
    );
    info!("Resolving {} SIREN", sirens.len());

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nStop requested; finishing the current page...");
        handler_flag.request_stop();
    })
    .context("could not install the Ctrl-C handler")?;

    let client = SireneClient::new(cli.api_key.clone(), cli.fetch_settings())?;
    let rows = fetch_batch(&client, &sirens, &cancel, &StderrProgress).await?;

    let summary = summarize(&rows);
    info!("{}", batch_headline(&summary));

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| Cli::default_output(sirens.len()));
    let bytes = build_workbook(&rows)?;
    let path = write_output(&output, &bytes)?;
    println!("Wrote {} row(s) to {}", rows.len(), path.display());
    Ok(())
}

/// Collects SIRENs from the input file and the command line, in that
/// order, keeping the first occurrence of each.
fn gather_sirens(cli: &Cli) -> anyhow::Result<Vec<Siren>> {
    let mut sirens = Vec::new();
    if let Some(input) = &cli.input {
        let from_file = load_sirens(input, cli.column.as_deref())
            .with_context(|| format!("could not read SIRENs from {}", input.display()))?;
        info!("{}: {} SIREN", input.display(), from_file.len());
        sirens.extend(from_file);
    }
    sirens.extend(extract_sirens(&cli.sirens.join("\n")));

    let mut seen = HashSet::new();
    sirens.retain(|siren| seen.insert(siren.clone()));
    Ok(sirens)
}

/// Single log line once the whole batch is fetched.
fn batch_headline(summary: &Summary) -> String {
    format!(
        "{} rows across {} SIREN ({} active, {} head offices)",
        summary.global.nb_siret,
        summary.global.nb_siren,
        summary.global.nb_actifs,
        summary.global.nb_sieges
    )
}

fn write_output(output: &Path, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    let dir = match output.parent() {
        Some(parent) if parent != Path::new("") => parent,
        _ => Path::new("."),
    };
    let filename = output
        .file_name()
        .and_then(|name| name.to_str())
        .context("output path has no file name")?;
    let writer = AtomicFileWriter::new(dir);
    writer
        .write_bytes(filename, bytes)
        .with_context(|| format!("could not write {}", output.display()))
}

/// Progress reporting on stderr, so stdout stays clean for the final line.
struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::SirenStarted { index, total, siren } => {
                eprintln!("SIREN {}/{} : {siren}", index + 1, total);
            }
            ProgressEvent::PageFetched { siren, page, rows } => {
                debug!("{siren}: page {page}, {rows} row(s)");
            }
            ProgressEvent::SirenCompleted { siren, rows, .. } => {
                eprintln!("  {siren}: {rows} establishment(s)");
            }
        }
    }
}
