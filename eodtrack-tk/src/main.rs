//! eodtrack-tk - EOD frequency tracker
//!
//! Turns the candidate fundamental frequencies extracted from a long
//! recording of wave-type weakly electric fish into per-fish frequency
//! trajectories with detected rises. Consumes the JSON handover file of the
//! spectral front-end, or resumes from previously saved first-level
//! artifacts.

use anyhow::{anyhow, Result};
use clap::Parser;
use eodtrack_common::TrackerConfig;
use eodtrack_tk::{CandidateSeries, Pipeline, RecordingStore};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Track wave-type electric fish EOD frequencies over time.
#[derive(Debug, Parser)]
#[command(name = "eodtrack-tk", version, about)]
struct Args {
    /// Candidate frequency file (JSON) produced by the spectral front-end
    input: Option<PathBuf>,

    /// Resume from saved first-level artifacts with this recording name
    #[arg(long, conflicts_with = "input")]
    resume: Option<String>,

    /// Recording name for saved artifacts (defaults to the input file stem)
    #[arg(long)]
    name: Option<String>,

    /// Folder for persisted artifacts
    #[arg(short, long, default_value = ".")]
    output_folder: PathBuf,

    /// TOML configuration file with the tracker tunables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the default configuration to this file and exit
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,

    /// Save the first-level assignment so a later run can resume from it
    #[arg(short = 's', long)]
    save_first_level: bool,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(path) = args.save_config {
        TrackerConfig::write_template(&path)?;
        info!("wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    let store = RecordingStore::new(&args.output_folder);
    let pipeline = Pipeline::new(config);

    let (name, result) = if let Some(name) = args.resume {
        info!("resuming {} from saved first-level assignment", name);
        let (axis, set) = store.load_first_level(&name)?;
        let result = pipeline.resume(axis, set)?;
        (name, result)
    } else {
        let input = args
            .input
            .ok_or_else(|| anyhow!("specify a candidate file or --resume <name>"))?;
        let name = args.name.unwrap_or_else(|| {
            input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "recording".to_string())
        });
        info!("processing {} as recording {}", input.display(), name);

        let series = CandidateSeries::from_json_file(&input)?;
        let result = if args.save_first_level {
            let (axis, set) = pipeline.first_level(&series)?;
            store.save_first_level(&name, &axis, &set)?;
            pipeline.resume(axis, set)?
        } else {
            pipeline.run(&series)?
        };
        (name, result)
    };

    store.save_result(&name, &result)?;
    info!(
        "{} trajectories with {} rises written to {}",
        result.trajectories.len(),
        result.total_rises(),
        args.output_folder.display()
    );

    Ok(())
}
