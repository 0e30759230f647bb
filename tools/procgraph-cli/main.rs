use clap::{Parser, ValueEnum};
use procgraph::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// CLI-side mirror of the fan-out policy for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FanOutCli {
    Strict,
    Deferred,
}

/// Reads a process model, reports structural problems and optionally normalizes it
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the process model XML file
    model_path: String,

    /// Optional JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Overrides the fan-out policy of the configuration
    #[arg(long, value_enum)]
    fan_out: Option<FanOutCli>,

    /// Insert splits wherever a non-split node has several successors
    #[arg(short, long)]
    normalize: bool,

    /// Write the resulting model to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli);
}

fn run(cli: Cli) {
    let total_start = Instant::now();

    // --- 1. Configuration ---
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load configuration '{}': {}", path, e))
        }),
        None => Config::default(),
    };
    if let Some(fan_out) = cli.fan_out {
        config.model.fan_out = match fan_out {
            FanOutCli::Strict => FanOutPolicy::Strict,
            FanOutCli::Deferred => FanOutPolicy::Deferred,
        };
    }

    // --- 2. Reading ---
    let read_start = Instant::now();
    let xml = fs::read_to_string(&cli.model_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read model file '{}': {}",
            &cli.model_path, e
        ))
    });
    let mut model = read_model_with(&xml, config.model)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read process model: {}", e)));
    let read_duration = read_start.elapsed();

    eprintln!(
        "Read model '{}' with {} nodes ({} start, {} end) in {:?}",
        model.name().unwrap_or("<unnamed>"),
        model.len(),
        model.start_nodes().count(),
        model.end_node_count(),
        read_duration
    );

    // --- 3. Validation ---
    let problems = model.validate();
    if problems.is_empty() {
        eprintln!("No structural problems found.");
    } else {
        eprintln!("\n{} structural problem(s):", problems.len());
        for problem in &problems {
            eprintln!("  -> {}", problem);
        }
    }

    // --- 4. Normalization ---
    if cli.normalize {
        let splits = model
            .normalize(&mut DefaultSplitFactory)
            .unwrap_or_else(|e| exit_with_error(&format!("Normalization failed: {}", e)));
        eprintln!("\nNormalization inserted {} split(s).", splits.len());
    }

    // --- 5. Writing ---
    let written = write_model(&model)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write process model: {}", e)));
    match &cli.output {
        Some(path) => fs::write(path, written).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to write output file '{}': {}", path, e))
        }),
        None => println!("{}", written),
    }

    eprintln!("Total Execution:      {:?}", total_start.elapsed());
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
