//! Consultation-hour simulation binary.
//!
//! Spawns N student producers against a bounded waiting queue and a single
//! consumer, then shuts down gracefully once every student has either been
//! attended or turned away.
//!
//! # Usage
//!
//! ```sh
//! lectern-sim --students 10 --capacity 5 --timeout-ms 500
//! lectern-sim --fast
//! ```

use std::time::Duration;

use lectern::sim::{self, SimConfig};

fn main() {
    if let Err(e) = run() {
        eprintln!("lectern-sim: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let config = parse_args(&args)?;

    lectern::init_tracing();

    eprintln!(
        "lectern-sim: {} students, {} seats, {}ms patience",
        config.students,
        config.capacity,
        config.enqueue_timeout.as_millis()
    );

    let report = sim::run(&config)?;

    eprintln!(
        "lectern-sim: done - accepted {}, rejected {}, attended {}",
        report.accepted, report.rejected, report.attended
    );

    Ok(())
}

/// Parses command line arguments into a `SimConfig`.
fn parse_args(args: &[String]) -> Result<SimConfig, String> {
    let mut config = SimConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--students" | "-n" => {
                config.students = parse_value(args, &mut i)?;
            }
            "--capacity" | "-c" => {
                config.capacity = parse_value(args, &mut i)?;
            }
            "--timeout-ms" | "-t" => {
                let ms: u64 = parse_value(args, &mut i)?;
                config.enqueue_timeout = Duration::from_millis(ms);
            }
            "--fast" => {
                config = SimConfig::fast(config.students, config.capacity);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg => return Err(format!("unknown argument: {arg}")),
        }
        i += 1;
    }

    if config.capacity == 0 {
        return Err("capacity must be at least 1".into());
    }

    Ok(config)
}

/// Parses the value following the flag at `args[*i]`, advancing `*i`.
fn parse_value<T: std::str::FromStr>(args: &[String], i: &mut usize) -> Result<T, String> {
    let flag = &args[*i];
    *i += 1;
    let value = args
        .get(*i)
        .ok_or_else(|| format!("missing value for {flag}"))?;
    value
        .parse()
        .map_err(|_| format!("invalid value for {flag}: {value}"))
}

fn print_usage() {
    eprintln!(
        r#"lectern-sim - bounded rendezvous queue demo

USAGE:
    lectern-sim [OPTIONS]

OPTIONS:
    -n, --students <N>      Number of student producers (default: 10)
    -c, --capacity <N>      Waiting-queue capacity (default: 5)
    -t, --timeout-ms <MS>   Admission timeout in milliseconds (default: 500)
        --fast              Zero all delays (deterministic demo run)
    -h, --help              Print this help message

ENVIRONMENT:
    RUST_LOG                Log filter (default: lectern=info)

EXAMPLE:
    lectern-sim --students 20 --capacity 3 --timeout-ms 200
"#
    );
}
