use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use finspace::space::{FiniteSpace, Visiting};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_writer(std::io::stderr).with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: space_count <n0> [n1 ...] [--visit] [--sequential]");
        std::process::exit(2);
    }

    let mut dims: Vec<isize> = Vec::new();
    let mut visit = false;
    let mut visiting = Visiting::Parallel;
    for arg in &args[1..] {
        match arg.as_str() {
            "--visit" => visit = true,
            "--sequential" => visiting = Visiting::Sequential,
            x => match x.parse::<isize>() {
                Ok(n) => dims.push(n),
                Err(e) => {
                    eprintln!("invalid dimension length {x}: {e}");
                    std::process::exit(2);
                }
            },
        }
    }

    let space = FiniteSpace::new(&dims);

    let visited = if visit {
        let count = AtomicU64::new(0);
        let start = Instant::now();
        space.for_each(visiting, |_| {
            count.fetch_add(1, Ordering::Relaxed);
        });
        info!(
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            mode = ?visiting,
            "traversal finished"
        );
        Some(count.into_inner())
    } else {
        None
    };

    let out = serde_json::json!({
        "dims": space.dims(),
        "variant": space.variant(),
        "cardinality": space.cardinality().to_string(),
        "visited": visited,
    });
    println!("{}", serde_json::to_string_pretty(&out).unwrap());
}
