//! Snapshot inspector
//!
//! Restores a tracker snapshot and shows what the phenotypes around a
//! complexity value look like.
//!
//! Environment:
//! - PHENO_SNAPSHOT: snapshot to read (default: data/phenotypes.bin)
//! - PHENO_TARGET: complexity to troubleshoot (default: most frequent phenotype's)
//! - PHENO_MODE: highest_freq | lowest_freq | most_diverse (default: highest_freq)
//! - PHENO_RESULTS: representatives to show (default: 5)
//! - PHENO_RANGE: `lo..hi` to list one representative per phenotype in a range

use std::env;
use std::path::PathBuf;

use tracing::{error, info, Level};

use pheno_core::{
    analyze_complexity_range, troubleshoot, PhenoError, PhenoResult, PhenotypeTracker,
    Representative, TroubleshootMode, COMPLEXITY_BIN_SIZE,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    if let Err(e) = run() {
        error!("Inspection failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> PhenoResult<()> {
    let path = env::var("PHENO_SNAPSHOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/phenotypes.bin"));
    let tracker = PhenotypeTracker::restore(&path)?;
    info!("{}", tracker.memory_stats());

    println!("Complexity distribution (bin width {}):", COMPLEXITY_BIN_SIZE);
    for (bin, frequency) in tracker.complexity_distribution(COMPLEXITY_BIN_SIZE) {
        println!("  {:>6.2}  {}", bin, frequency);
    }

    let mode = match env::var("PHENO_MODE") {
        Ok(s) => s.parse::<TroubleshootMode>().map_err(PhenoError::config)?,
        Err(_) => TroubleshootMode::HighestFrequency,
    };
    let n = env_or("PHENO_RESULTS", 5usize)?;
    let target = match env::var("PHENO_TARGET") {
        Ok(s) => s
            .parse::<f64>()
            .map_err(|e| PhenoError::config(format!("PHENO_TARGET: {}", e)))?,
        Err(_) => {
            let Some((top, _)) = tracker.rank_frequency().into_iter().next() else {
                println!("Snapshot holds no phenotypes");
                return Ok(());
            };
            tracker.complexity(top).unwrap_or(0.0)
        }
    };

    println!();
    println!("{:?} around complexity {:.3}:", mode, target);
    for rep in troubleshoot(&tracker, target, mode, n) {
        print_representative(rep);
    }

    if let Ok(range) = env::var("PHENO_RANGE") {
        let (lo, hi) = parse_range(&range)?;
        println!();
        println!("Phenotypes with complexity in [{}, {}]:", lo, hi);
        for rep in analyze_complexity_range(&tracker, lo, hi) {
            print_representative(rep);
        }
    }

    Ok(())
}

fn print_representative(rep: &Representative) {
    let genotype: Vec<String> = rep.genotype().iter().map(|m| format!("{:.2}", m)).collect();
    println!(
        "  {}  c={:.3}  freq={}  period={:.2}  genotype=[{}]",
        rep.encoding(),
        rep.complexity(),
        rep.frequency(),
        rep.period(),
        genotype.join(", ")
    );
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> PhenoResult<T> {
    match env::var(key) {
        Ok(s) => s
            .parse()
            .map_err(|_| PhenoError::config(format!("{}: cannot parse {:?}", key, s))),
        Err(_) => Ok(default),
    }
}

fn parse_range(s: &str) -> PhenoResult<(f64, f64)> {
    let bad = || PhenoError::config(format!("PHENO_RANGE: expected lo..hi, got {:?}", s));
    let (lo, hi) = s.split_once("..").ok_or_else(bad)?;
    let lo = lo.trim().parse().map_err(|_| bad())?;
    let hi = hi.trim().parse().map_err(|_| bad())?;
    Ok((lo, hi))
}
