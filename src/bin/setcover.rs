use std::path::Path;

use finspace::config::SetCoverConfig;
use finspace::report::{export_report, ExportOptions};
use finspace::setcover::ExecutorRegistry;
use finspace::ComputeError;
use tracing_subscriber::{fmt, EnvFilter};

/// At most this many uncovered candidates are listed in the output.
const UNCOVERED_SAMPLE: usize = 16;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_writer(std::io::stderr).with_env_filter(filter).init();

    let registry = ExecutorRegistry::with_defaults();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!(
            "Usage: setcover <config.json>\n\nAvailable executors:\n  - {}",
            registry.names().join("\n  - ")
        );
        std::process::exit(2);
    }

    let path = Path::new(&args[1]);
    let cfg = match SetCoverConfig::load(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            std::process::exit(2);
        }
    };
    if let Err(e) = cfg.validate() {
        eprintln!("Invalid config {}: {e}", path.display());
        std::process::exit(2);
    }
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let run = cfg
        .compute()
        .install(|| -> Result<_, ComputeError> {
            let params = cfg.params(base_dir)?;
            let coverage = params.evaluate_with(&registry, &cfg.executor)?;
            Ok((params, coverage))
        })
        .and_then(|r| r);
    let (params, coverage) = match run {
        Ok(x) => x,
        Err(e) => {
            eprintln!("Evaluation failed: {e}");
            std::process::exit(1);
        }
    };

    let mut exported = None;
    if let Some(export) = &cfg.export {
        let opts = ExportOptions {
            force: export.force,
            compression: export.compression,
        };
        if let Err(e) = export_report(&params, &coverage, &export.dir, opts) {
            eprintln!("Export failed: {e}");
            std::process::exit(1);
        }
        exported = Some(export.dir.display().to_string());
    }

    let uncovered: Vec<String> = coverage
        .uncovered()
        .take(UNCOVERED_SAMPLE)
        .filter_map(|gid| params.candidates().get(gid).ok())
        .map(|p| format!("{p:#x}"))
        .collect();

    let out = serde_json::json!({
        "v": params.v(),
        "m": params.m(),
        "t": params.t(),
        "executor": coverage.executor,
        "candidates": params.candidate_count(),
        "codewords": params.codewords().len(),
        "covered": coverage.covered_count,
        "complete": coverage.is_complete(),
        "elapsed_ms": coverage.elapsed_ms,
        "uncovered_sample": uncovered,
        "report_dir": exported,
    });
    println!("{}", serde_json::to_string_pretty(&out).unwrap());
}
