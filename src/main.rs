use clap::Parser;
use context_resolution::functions::Registry;
use context_resolution::options::{EvalOptions, Mode};
use context_resolution::{demo, Evaluator};
use tracing::Level;

/// Runs a context-resolution script and prints what it logged.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Script source. Without it (and without --file) the built-in demonstration runs.
    script: Option<String>,
    /// Read the script from a file instead
    #[arg(long, conflicts_with = "script")]
    file: Option<std::path::PathBuf>,
    /// Resolution mode; a leading "use strict" in the script overrides it
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    /// Evaluation options as JSON, e.g. '{"mode":"strict","run_deferred":false}'
    #[arg(long)]
    options: Option<String>,
    /// Global objects as a JSON object, one property per global
    #[arg(long)]
    globals: Option<String>,
    /// Print the transcript as JSON
    #[arg(long)]
    json: bool,
    /// Log every invocation to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    // Build options: JSON first, then the explicit flag on top.
    let mut opts = EvalOptions::default();
    if let Some(raw) = args.options.as_deref() {
        match serde_json::from_str::<EvalOptions>(raw) {
            Ok(o) => opts = o,
            Err(e) => {
                eprintln!("Invalid options: {e}");
                std::process::exit(1);
            }
        }
    }
    if let Some(mode) = args.mode {
        opts.mode = mode;
    }

    let mut evaluator = Evaluator::new(Registry::with_builtins()).with_options(opts);
    if let Some(raw) = args.globals.as_deref() {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(map)) => {
                for (name, value) in map {
                    evaluator = evaluator.with_global(name, value);
                }
            }
            Ok(_) => {
                eprintln!("Invalid globals: expected a JSON object");
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Invalid globals: {e}");
                std::process::exit(1);
            }
        }
    }

    // Load the script.
    let source = match (&args.script, &args.file) {
        (Some(s), _) => s.clone(),
        (None, Some(path)) => match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Cannot read {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        (None, None) => demo::SCRIPT.to_string(),
    };

    let transcript = match evaluator.run(&source) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Output result.
    if args.json {
        match serde_json::to_string_pretty(&transcript) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Cannot serialize transcript: {e}");
                std::process::exit(1);
            }
        }
    } else {
        for line in &transcript.lines {
            println!("{line}");
        }
        for err in &transcript.deferred_errors {
            eprintln!("deferred callback failed: {err}");
        }
    }
}
