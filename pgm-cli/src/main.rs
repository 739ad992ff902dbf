//! Command-line front end for the monochromator model.
//!
//! - `show`: print the state a configuration starts in
//! - `energy`: energy diffracted at a pair of angles
//! - `scan`: step the energy through a range and print every point

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pgm::formulas::energy_from_angles;
use pgm::{
    BeamlineConfig, Detector, EnergyAxis, EnergyScan, FieldTracker, HarmonicTable,
    JsonModelStore, ModelPaths, PgmSnapshot, PgmState, ScanRecord, SimulatedPgm, Undulator,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Plane-grating monochromator energy/angle model
#[derive(Parser, Debug)]
#[command(name = "pgm-scan")]
#[command(version)]
struct Args {
    /// Beamline configuration (TOML); defaults to the ARI branch at 250 eV
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Grating to use instead of the configured one
    #[arg(short, long, global = true)]
    grating: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the initial state
    Show {
        /// Start at this energy (eV) instead of the configured one
        #[arg(short, long)]
        energy: Option<f64>,
    },

    /// Energy diffracted at the given angles (degrees)
    Energy {
        pre_mirror_angle: f64,
        grating_angle: f64,
    },

    /// Run an energy scan
    Scan {
        /// First energy (eV)
        start: f64,

        /// Last energy (eV)
        stop: f64,

        /// Number of points, both ends included
        #[arg(short = 'n', long, default_value = "11")]
        points: usize,

        /// Undulator harmonics table (JSON); adds a field column
        #[arg(long)]
        harmonics: Option<PathBuf>,

        /// Seed from this simulation model (JSON) and write every point through to it
        #[arg(long)]
        model: Option<PathBuf>,

        /// Where to save the model after the scan (defaults to --model)
        #[arg(long, requires = "model")]
        model_out: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>, grating: Option<String>) -> Result<BeamlineConfig> {
    let mut cfg = match path {
        Some(path) => BeamlineConfig::from_file(path)?,
        None => BeamlineConfig::default(),
    };
    if grating.is_some() {
        cfg.grating = grating;
    }
    Ok(cfg)
}

fn print_snapshot(snap: &PgmSnapshot) {
    println!("grating           {}", snap.grating_name);
    println!("energy            {:.6} eV", snap.energy);
    println!("pre_mirror_angle  {:.6} deg", snap.pre_mirror_angle);
    println!("grating_angle     {:.6} deg", snap.grating_angle);
    println!("cff               {:.6}", snap.cff);
    println!("harmonic_number   {}", snap.harmonic_number);
}

fn print_record(record: &ScanRecord) {
    let detectors: Vec<&String> = record
        .events
        .first()
        .map(|e| e.readings.keys().collect())
        .unwrap_or_default();

    let mut header = String::from("index\tgrating\tenergy\tpre_mirror_angle\tgrating_angle\tcff");
    for name in &detectors {
        header.push('\t');
        header.push_str(name);
    }
    println!("{header}");

    for event in &record.events {
        let s = &event.snapshot;
        let mut row = format!(
            "{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
            event.index, s.grating_name, s.energy, s.pre_mirror_angle, s.grating_angle, s.cff
        );
        for value in event.readings.values() {
            row.push_str(&format!("\t{value:.6}"));
        }
        println!("{row}");
    }
}

fn field_tracker(path: &Path, harmonic: u32, start: f64) -> Result<FieldTracker> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading harmonics table {}", path.display()))?;
    let table = HarmonicTable::from_json_str(&text)?;
    let field = table.field_for(start, harmonic)?;
    let undulator = Undulator::new(table, harmonic, field)?;
    Ok(FieldTracker::new("epu_field", undulator))
}

fn run_scan<A: EnergyAxis + ?Sized>(
    axis: &mut A,
    scan: &EnergyScan,
    tracker: Option<&mut FieldTracker>,
) -> Result<ScanRecord> {
    let mut detectors: Vec<&mut dyn Detector> = Vec::new();
    if let Some(tracker) = tracker {
        detectors.push(tracker);
    }
    Ok(scan.run(axis, &mut detectors)?)
}

fn cmd_scan(
    cfg: &BeamlineConfig,
    scan: EnergyScan,
    start: f64,
    harmonics: Option<&Path>,
    model: Option<&Path>,
    model_out: Option<&Path>,
) -> Result<()> {
    let mut tracker = harmonics
        .map(|path| field_tracker(path, cfg.harmonic_number, start))
        .transpose()?;

    let record = match model {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading model {}", path.display()))?;
            let store = JsonModelStore::from_json_str(&text)?;
            let mut pgm = SimulatedPgm::new(
                store,
                ModelPaths::default(),
                cfg.geometry(),
                cfg.catalog()?,
                &cfg.grating_name()?,
            )?;
            pgm.set_harmonic_number(cfg.harmonic_number);
            let record = run_scan(&mut pgm, &scan, tracker.as_mut())?;

            let out = model_out.unwrap_or(path);
            let json = serde_json::to_string_pretty(pgm.store().value())?;
            std::fs::write(out, json)
                .with_context(|| format!("writing model {}", out.display()))?;
            info!(path = %out.display(), "model saved");
            record
        }
        None => {
            let mut state = cfg.build_state()?;
            run_scan(&mut state, &scan, tracker.as_mut())?
        }
    };

    print_record(&record);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = load_config(args.config.as_deref(), args.grating)?;

    match args.command {
        Command::Show { energy } => {
            let mut state: PgmState = cfg.build_state()?;
            if let Some(energy) = energy {
                state.set_energy(energy)?;
            }
            state.check_consistency()?;
            print_snapshot(&state.get_state());
            Ok(())
        }
        Command::Energy {
            pre_mirror_angle,
            grating_angle,
        } => {
            let catalog = cfg.catalog()?;
            let grating = catalog.get(&cfg.grating_name()?)?;
            let energy =
                energy_from_angles(pre_mirror_angle, grating_angle, grating, &cfg.geometry())?;
            println!("{energy:.6}");
            Ok(())
        }
        Command::Scan {
            start,
            stop,
            points,
            harmonics,
            model,
            model_out,
        } => {
            let mut scan = EnergyScan::new(start, stop, points);
            if let Some(grating) = &cfg.grating {
                scan = scan.with_grating(grating);
            }
            cmd_scan(
                &cfg,
                scan,
                start,
                harmonics.as_deref(),
                model.as_deref(),
                model_out.as_deref(),
            )
        }
    }
}
