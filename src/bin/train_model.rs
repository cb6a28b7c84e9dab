//! Offline training for the loan default model.
//!
//! Reads a labeled CSV dataset, fits the catalog, scaler and classifier, and
//! writes the manifest-bound artifact set.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin train_model -- <dataset.csv> [artifact_dir] [--test-size <f>] [--seed <u64>] [--c <f>]
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

use loanrisk::adapters::{CsvDataset, FsArtifactStore};
use loanrisk::application::{train, TrainingConfig};
use loanrisk::config::AppConfig;
use loanrisk::ports::{ArtifactStore, DatasetSource};

struct Args {
    dataset: PathBuf,
    artifact_dir: Option<PathBuf>,
    config: TrainingConfig,
}

fn usage() -> anyhow::Error {
    anyhow!(
        "Usage: train_model <dataset.csv> [artifact_dir] [--test-size <f64>] [--seed <u64>] [--c <f64>]"
    )
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut config = TrainingConfig::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--test-size" => {
                let v = args.next().ok_or_else(usage)?;
                config.test_size = v
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("--test-size must be a number"))?;
            }
            "--seed" => {
                let v = args.next().ok_or_else(usage)?;
                config.seed = v
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("--seed must be a u64"))?;
            }
            "--c" => {
                let v = args.next().ok_or_else(usage)?;
                config.fit.c = v
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("--c must be a number"))?;
            }
            "-h" | "--help" => return Err(usage()),
            _ if positional.len() < 2 => positional.push(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    let mut positional = positional.into_iter();
    let dataset = positional.next().ok_or_else(usage)?;
    Ok(Args {
        dataset,
        artifact_dir: positional.next(),
        config,
    })
}

fn main() -> Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .init();

    let args = parse_args()?;
    let artifact_dir = args
        .artifact_dir
        .unwrap_or_else(|| AppConfig::from_env().artifact_dir);

    let dataset = CsvDataset::new(&args.dataset)
        .load()
        .with_context(|| format!("Failed to read {:?}", args.dataset))?;
    let outcome = train(&dataset, &args.config)?;

    FsArtifactStore::new(&artifact_dir)
        .save(&outcome.artifacts)
        .with_context(|| format!("Failed to save artifacts to {artifact_dir:?}"))?;

    let report = &outcome.report;
    let eval = &report.evaluation;
    println!("Trained on {} rows, evaluated on {}", report.train_rows, report.test_rows);
    println!(
        "Solver: {} iterations, converged={}",
        report.fit.iterations, report.fit.converged
    );
    println!("Features: {}", report.n_features);
    println!("Threshold: {:.4}", eval.threshold);
    println!("  accuracy  {:.4}", eval.accuracy);
    println!("  precision {:.4}", eval.precision);
    println!("  recall    {:.4}", eval.recall);
    println!("  f1        {:.4}", eval.f1);
    match eval.roc_auc {
        Some(auc) => println!("  roc_auc   {auc:.4}"),
        None => println!("  roc_auc   n/a (single class in test partition)"),
    }
    println!(
        "  confusion tp={} fp={} tn={} fn={}",
        eval.true_positives, eval.false_positives, eval.true_negatives, eval.false_negatives
    );
    println!("Artifacts written to {artifact_dir:?}");

    Ok(())
}
