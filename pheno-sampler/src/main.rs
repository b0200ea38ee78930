//! Pheno Sampler - Phenotype Diversity Campaign
//!
//! Perturbs the kinetic parameters of an oscillator many times, records the
//! shape of every trajectory, and writes the tracker snapshot to disk.

mod campaign;
mod config;
mod simulator;

use parking_lot::Mutex;
use tracing::{error, info, warn, Level};

use pheno_core::{
    complexity, encode, Genotype, PhenoResult, PhenotypeTracker, Simulator, TrackerConfig,
};

use campaign::Campaign;
use config::{print_banner, SamplerConfig, Schedule};
use simulator::DampedOscillator;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Pheno Sampler v{}", VERSION);

    if let Err(e) = run() {
        error!("Campaign failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> PhenoResult<()> {
    let tracker_config = TrackerConfig::from_env();
    let config = SamplerConfig::from_env();
    print_banner(&config, &tracker_config);

    let simulator = DampedOscillator::new(config.t_max, config.samples);
    info!(
        "Perturbing {}: {}",
        simulator.name(),
        simulator.parameter_names().join(", ")
    );
    let n_bins = tracker_config.n_bins;
    let campaign = Campaign::new(&simulator, &config, n_bins);

    let start = std::time::Instant::now();
    let (tracker, report) = match config.schedule {
        Schedule::Sequential => {
            let mut tracker = PhenotypeTracker::new(tracker_config)?;
            let report = campaign.run(&mut tracker);
            (tracker, report)
        }
        Schedule::Parallel => {
            let tracker = Mutex::new(PhenotypeTracker::new(tracker_config)?);
            let report = campaign.run_parallel(&tracker);
            (tracker.into_inner(), report)
        }
    };
    info!("🧪 Campaign finished in {:.2}s", start.elapsed().as_secs_f32());
    info!("Final results: {}", report);

    if report.successful == 0 {
        warn!("No successful trials; writing an empty snapshot");
    }

    tracker.persist(&config.output)?;

    info!("{}", tracker.memory_stats());
    info!("{} unique phenotypes", tracker.unique_phenotypes());
    for (rank, (encoding, freq)) in tracker.top_phenotypes().into_iter().enumerate() {
        let c = tracker.complexity(encoding).unwrap_or(0.0);
        info!("  #{} {} (frequency {}, complexity {:.3})", rank + 1, encoding, freq, c);
    }

    report_wildtype(&simulator, &tracker, n_bins);
    Ok(())
}

/// Log where the unperturbed model's phenotype ranks in the sampled set
fn report_wildtype(simulator: &DampedOscillator, tracker: &PhenotypeTracker, n_bins: usize) {
    let wildtype = Genotype::wildtype(simulator.parameter_count());
    let trajectory = match simulator.simulate(&wildtype.apply(&simulator.base_parameters())) {
        Ok(t) => t,
        Err(e) => {
            warn!("Wildtype simulation failed: {}", e);
            return;
        }
    };
    let encoding = match encode(&trajectory, n_bins) {
        Ok(enc) => enc,
        Err(e) => {
            warn!("Wildtype encoding failed: {}", e);
            return;
        }
    };

    match tracker.rank_of(&encoding) {
        Some(rank) => info!(
            "Wildtype phenotype rank: {} (frequency: {}, complexity {:.3})",
            rank,
            tracker.frequency(&encoding),
            complexity(&encoding)
        ),
        None => info!("Wildtype phenotype not found in sampled set"),
    }
}
