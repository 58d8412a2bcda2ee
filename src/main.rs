//! Tau trigger validation: emulation agreement and threshold scans
//!
//!
//! # Introduction (for the physicist)
//!
//! This program runs over recorded collision events and answers two
//! questions about the hadronic tau triggers.
//!
//! The first one is whether the trigger decision which was recorded online
//! can be reproduced offline. Each configured chain, Level-1 item or HLT
//! chain, is re-evaluated from the trigger candidates of the event, and the
//! result is compared with what the trigger actually decided. Chains for
//! which both disagree are reported event by event.
//!
//! The second one is how many signal-like events would survive various
//! ditau trigger thresholds. Events with two well-identified, truth-matched
//! offline taus are selected, and both their Level-1 and offline tau
//! energies are scanned against a grid of symmetric and asymmetric
//! thresholds.
//!
//!
//! # Introduction (for the computer guy)
//!
//! The program is organized as a pipeline:
//!
//! * read in the configuration and the events
//! * loop over batches of events, possibly in parallel,
//!     * compare recorded and emulated trigger decisions,
//!     * select objects and apply cuts one after the other,
//!     * fill threshold scans and distributions for surviving events
//! * merge the results of all batches in order
//! * then display / store the result.

#![warn(missing_docs)]

mod agreement;
mod book;
mod cli;
mod config;
mod cutflow;
mod error;
mod histogram;
mod numeric;
mod objects;
mod output;
mod overlap;
mod pipeline;
mod results;
mod scheduling;
mod selection;
mod store;
mod threshold;
mod trigger;
mod truth;

use crate::{
    cli::Opt,
    config::Configuration,
    pipeline::EventPipeline,
    store::EventReader,
    trigger::{RecordedDecisions, TrigEmulator},
};
use clap::Parser;
use env_logger::Env;
use eyre::WrapErr;
use std::{path::Path, time::Instant};

/// Configuration file which is used when none is specified
const DEFAULT_CONFIG: &str = "analysis.cfg";

/// We'll use eyre's type-erased result type throughout the application
type Result<T> = eyre::Result<T>;

/// This will act as our main function, with suitable error handling
fn main() -> Result<()> {
    let opt = Opt::parse();
    let env = Env::default().filter_or("TRIGVAL_LOG", &opt.loglevel);
    env_logger::init_from_env(env);

    // ### CONFIGURATION READOUT ###

    // An explicit configuration file must exist, the default one may not
    let default_path = Path::new(DEFAULT_CONFIG);
    let config_path = match &opt.config {
        Some(path) => Some(path.as_path()),
        None => default_path.exists().then_some(default_path),
    };
    let cfg = match config_path {
        Some(path) => Configuration::load(path).wrap_err("Failed to load the configuration")?,
        None => {
            log::info!("No {DEFAULT_CONFIG} file, using the default configuration");
            let cfg = Configuration::default();
            cfg.log_summary();
            cfg
        }
    };

    // ### ANALYSIS INITIALIZATION ###

    // Chains that cannot be emulated abort the job before any event is read
    let emulator = if cfg.stages.agreement {
        Some(
            TrigEmulator::new(&cfg.agreement.chains)
                .wrap_err("Failed to initialize the trigger emulation")?,
        )
    } else {
        None
    };

    let files = store::split_names(&opt.files);
    eyre::ensure!(!files.is_empty(), "No input file in \"{}\"", opt.files);
    let events = EventReader::new(files).read(opt.max_events)?;
    log::info!("Analyzing {} events", events.len());

    // We start the clock after I/O, to avoid I/O-induced timing fluctuations
    let saved_time = Instant::now();

    // ### ANALYSIS EXECUTION ###

    let pipeline = EventPipeline::new(&cfg, &RecordedDecisions, emulator.as_ref(), events.len());
    let results = scheduling::run_analysis(&events, |first_entry, batch| {
        pipeline.process_batch(first_entry, batch)
    })?;

    // ### RESULTS DISPLAY AND STORAGE ###

    let elapsed_time = saved_time.elapsed();
    output::dump_results(&results, elapsed_time, &opt.output)
        .wrap_err("Failed to output the results")?;

    // ...and we're done
    Ok(())
}
