//! CLI tool for running scripts with ecma-eval
//!
//! Usage: ecma-eval [options] <script.js>
//!
//! Options:
//!   --max-depth <n>    Maximum call stack depth (default: 512)
//!
//! Diagnostics are controlled by the `ECMA_EVAL_LOG` environment variable,
//! using `tracing-subscriber` filter syntax (e.g. `ECMA_EVAL_LOG=debug`).

use std::env;
use std::fs;
use std::path::PathBuf;

use ecma_eval::{Runtime, RuntimeConfig};
use tracing_subscriber::EnvFilter;

/// CLI configuration
struct Config {
    script_path: PathBuf,
    max_depth: Option<usize>,
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map_or("ecma-eval", |s| s.as_str());

    let mut max_depth: Option<usize> = None;
    let mut script_arg: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        let Some(arg) = args.get(i) else {
            break;
        };
        if arg == "--max-depth" {
            i += 1;
            max_depth = Some(
                args.get(i)
                    .ok_or_else(|| "--max-depth requires a value".to_string())?
                    .parse::<usize>()
                    .map_err(|_| "--max-depth must be a positive integer".to_string())?,
            );
        } else if arg.starts_with('-') {
            return Err(format!("Unknown option: {}", arg));
        } else {
            script_arg = Some(arg);
        }
        i += 1;
    }

    let script_arg =
        script_arg.ok_or_else(|| format!("Usage: {} [--max-depth <n>] <script.js>", program_name))?;

    Ok(Config {
        script_path: PathBuf::from(script_arg),
        max_depth,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ECMA_EVAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), String> {
    let config = parse_args()?;
    init_tracing();

    let source = fs::read_to_string(&config.script_path)
        .map_err(|e| format!("Cannot read {}: {}", config.script_path.display(), e))?;

    let mut runtime_config = RuntimeConfig::default();
    if let Some(depth) = config.max_depth {
        runtime_config = runtime_config.with_max_call_depth(depth);
    }
    let mut runtime = Runtime::with_config(runtime_config);

    match runtime.eval(&source) {
        Ok(value) => {
            if !value.is_undefined() {
                println!("{}", value.describe());
            }
            Ok(())
        }
        Err(error) => Err(format!("Uncaught {}\n\n  File: {}", error, config.script_path.display())),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
