//! txprop - transaction propagation simulator
//!
//! This is the main entry point for the txprop command-line interface.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use txprop::pattern::{HalflingThief, HitAndRunMethod, SubtleMethod};
use txprop::service::{user_services, OuterBoundary, ServiceResult, TransactionNames};
use txprop::storage::InMemoryUserStore;
use txprop::transaction::{PropagationMode, TransactionManagerConfig};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    // Parse simple command line args.
    let mut modes: Vec<PropagationMode> = PropagationMode::ALL.to_vec();
    let mut outer: Option<OuterBoundary> = None;
    let mut nested = false;
    let mut config_path: Option<PathBuf> = None;
    let mut json = false;
    let mut steal = false;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-m" | "--mode" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    eprintln!("Missing value for --mode");
                    return ExitCode::FAILURE;
                };
                if value != "all" {
                    match value.parse::<PropagationMode>() {
                        Ok(mode) => modes = vec![mode],
                        Err(e) => {
                            eprintln!("{}", e);
                            return ExitCode::FAILURE;
                        }
                    }
                }
            }
            "--outer" => outer = Some(OuterBoundary::Transactional),
            "--no-outer" => outer = Some(OuterBoundary::Absent),
            "--nested" => nested = true,
            "-c" | "--config" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    eprintln!("Missing value for --config");
                    return ExitCode::FAILURE;
                };
                config_path = Some(PathBuf::from(value));
            }
            "--json" => json = true,
            "--steal" => steal = true,
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "--version" => {
                println!("txprop v{}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            arg => {
                eprintln!("Unknown option: {}", arg);
                return ExitCode::FAILURE;
            }
        }
        i += 1;
    }

    init_logging(verbose);

    if steal {
        run_thief();
        return ExitCode::SUCCESS;
    }

    let config = match config_path {
        Some(path) => match TransactionManagerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => TransactionManagerConfig::default(),
    };
    let config = if nested {
        config.nested_transaction_allowed(true)
    } else {
        config
    };

    let store = InMemoryUserStore::with_savepoints(config.nested_transaction_allowed);
    let first = user_services(store, config);

    for mode in modes {
        let boundary = outer.unwrap_or_else(|| OuterBoundary::default_for(mode));
        let result = first.save_with(mode, boundary);
        let rows = match first.find_all() {
            Ok(users) => users.len(),
            Err(e) => {
                eprintln!("Error reading users after {}: {}", mode, e);
                return ExitCode::FAILURE;
            }
        };
        print_result(mode, boundary, &result, rows, json);
        first.delete_all();
    }

    ExitCode::SUCCESS
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_help() {
    println!("txprop - transaction propagation simulator");
    println!();
    println!("Usage: txprop [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -m, --mode MODE      Propagation mode to run, or 'all' (default: all)");
    println!("      --outer          Force an outer REQUIRED transaction");
    println!("      --no-outer       Run without an outer transaction");
    println!("      --nested         Allow NESTED through savepoints");
    println!("  -c, --config FILE    Load transaction manager config (JSON)");
    println!("      --json           Print results as JSON lines");
    println!("      --steal          Run the template method example instead");
    println!("  -v, --verbose        Enable debug logging");
    println!("  -h, --help           Show this help message");
    println!("  --version            Show version");
    println!();
    println!("Examples:");
    println!("  txprop                               Run every mode with its default outer boundary");
    println!("  txprop -m requires_new               Run REQUIRES_NEW only");
    println!("  txprop -m nested --nested -v         Run NESTED on savepoints with debug logs");
}

fn print_result(
    mode: PropagationMode,
    outer: OuterBoundary,
    result: &ServiceResult<TransactionNames>,
    rows: usize,
    json: bool,
) {
    if json {
        let line = match result {
            Ok(names) => serde_json::json!({
                "mode": mode,
                "outer": outer == OuterBoundary::Transactional,
                "transactions": names,
                "rows": rows,
            }),
            Err(e) => serde_json::json!({
                "mode": mode,
                "outer": outer == OuterBoundary::Transactional,
                "error": e.to_string(),
                "rows": rows,
            }),
        };
        println!("{}", line);
        return;
    }

    let outer = match outer {
        OuterBoundary::Transactional => "with outer",
        OuterBoundary::Absent => "no outer",
    };
    match result {
        Ok(names) => println!("{:<13} ({}): {} transaction(s) {} | {} row(s)", mode.name(), outer, names.len(), names, rows),
        Err(e) => println!("{:<13} ({}): error: {} | {} row(s)", mode.name(), outer, e, rows),
    }
}

fn run_thief() {
    let mut thief = HalflingThief::new(Box::new(HitAndRunMethod));
    let heist = thief.steal();
    println!("{} -> {}", heist.target, heist.loot);

    thief.change_method(Box::new(SubtleMethod));
    let heist = thief.steal();
    println!("{} -> {}", heist.target, heist.loot);
}
