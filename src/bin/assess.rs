//! Score one loan application from JSON.
//!
//! Reads a JSON object of raw fields from a file (or stdin when omitted or
//! `-`) and prints the prediction response with the recommendation.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin assess -- [request.json] [--artifacts <dir>]
//! ```
//!
//! Exit codes: 0 success, 1 usage or I/O failure, 2 invalid request,
//! 3 model artifacts unavailable.

use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use loanrisk::adapters::FsArtifactStore;
use loanrisk::application::{Assessment, PredictionService};
use loanrisk::config::AppConfig;
use loanrisk::ports::ArtifactStore;
use loanrisk::{LoanRiskError, RawRecord, Recommendation};

#[derive(Serialize)]
struct Output<'a> {
    id: &'a str,
    probability: f64,
    is_default: bool,
    threshold: f64,
    recommendation: Recommendation,
    summary: &'a str,
    actions: &'a [&'a str],
}

fn usage() -> String {
    "Usage: assess [request.json | -] [--artifacts <dir>]".to_string()
}

fn parse_args() -> Result<(Option<PathBuf>, Option<PathBuf>), String> {
    let mut args = env::args().skip(1);
    let mut request: Option<PathBuf> = None;
    let mut artifacts: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--artifacts" => {
                artifacts = Some(PathBuf::from(args.next().ok_or_else(usage)?));
            }
            "-h" | "--help" => return Err(usage()),
            "-" if request.is_none() => {}
            _ if request.is_none() => request = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }
    Ok((request, artifacts))
}

fn read_request(path: Option<&PathBuf>) -> Result<String, String> {
    match path {
        Some(p) => std::fs::read_to_string(p).map_err(|e| format!("Failed to read {p:?}: {e}")),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {e}"))?;
            Ok(buf)
        }
    }
}

/// Load the model, then read and score the request. Artifacts are checked
/// before the request is touched.
fn assess_request(
    store: &dyn ArtifactStore,
    read: impl FnOnce() -> Result<String, String>,
) -> Result<Assessment, (u8, String)> {
    let service = PredictionService::from_store(store).map_err(|e| (3, e.to_string()))?;

    let body = read().map_err(|e| (1, e))?;
    let record: RawRecord =
        serde_json::from_str(&body).map_err(|e| (2, format!("Invalid request JSON: {e}")))?;

    service.assess(&record).map_err(|e| match e {
        LoanRiskError::Input(_) => (2, e.to_string()),
        other => (3, other.to_string()),
    })
}

fn run() -> Result<(), (u8, String)> {
    let (request_path, artifact_dir) = parse_args().map_err(|e| (1, e))?;
    let config = AppConfig::from_env();
    let artifact_dir = artifact_dir.unwrap_or(config.artifact_dir);

    let store = FsArtifactStore::new(&artifact_dir).require_manifest(config.require_manifest);
    let assessment = assess_request(&store, || read_request(request_path.as_ref()))?;

    let rec = assessment.recommendation;
    let output = Output {
        id: &assessment.id,
        probability: assessment.probability,
        is_default: assessment.is_default,
        threshold: assessment.threshold,
        recommendation: rec,
        summary: rec.description(),
        actions: rec.actions(),
    };
    let json = serde_json::to_string_pretty(&output).map_err(|e| (1, e.to_string()))?;
    println!("{json}");
    Ok(())
}

fn main() -> ExitCode {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(writer)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err((code, message)) => {
            eprintln!("error: {message}");
            ExitCode::from(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_artifacts_win_over_bad_request() {
        let temp = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(temp.path().join("models"));

        let result = assess_request(&store, || Ok("{not json".to_string()));
        assert!(matches!(result, Err((3, _))));
    }

    #[test]
    fn test_request_is_not_read_without_artifacts() {
        let temp = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(temp.path().join("models"));

        let result = assess_request(&store, || panic!("request read before artifacts loaded"));
        assert!(matches!(result, Err((3, _))));
    }
}
