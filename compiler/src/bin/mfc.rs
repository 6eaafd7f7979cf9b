// Microfluidics backend CLI
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use microfluidc::{MicrofluidicsBackend, PrimitiveTypeTable, ProcessParameterArgs, Schematic};

#[derive(Parser)]
#[command(name = "mfc")]
#[command(version = "0.1.0")]
#[command(about = "Microfluidic schematic to SMT-LIB2 (QF_NRA) translator", long_about = None)]
struct Cli {
    /// Raise log verbosity to debug
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a schematic into <name>.smt2
    Compile {
        /// Schematic JSON file
        #[arg(value_name = "SCHEMATIC")]
        input: PathBuf,

        /// Directory receiving the .smt2 file
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        process: ProcessParameterArgs,
    },

    /// Validate a schematic and its type hierarchy without translating
    Check {
        /// Schematic JSON file
        #[arg(value_name = "SCHEMATIC")]
        input: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            input,
            output_dir,
            process,
        } => compile_command(input, output_dir, process),
        Commands::Check { input } => check_command(input),
    }
}

fn compile_command(input: PathBuf, output_dir: PathBuf, process: ProcessParameterArgs) -> Result<()> {
    let params = process.load().context(
        "process parameters could not be loaded; specify them with either \
         '--process-file <FILE>' or '--process-<param> <VALUE>'",
    )?;
    let schematic = Schematic::load(&input)
        .with_context(|| format!("Failed to load schematic: {}", input.display()))?;

    let backend = MicrofluidicsBackend::new(params);
    let path = backend
        .run(&schematic, &output_dir)
        .with_context(|| format!("Code generation failed for '{}'", schematic.name))?;
    println!("{}", path.display());
    Ok(())
}

fn check_command(input: PathBuf) -> Result<()> {
    let schematic = Schematic::load(&input)
        .with_context(|| format!("Failed to load schematic: {}", input.display()))?;
    let types = PrimitiveTypeTable::build(&schematic).with_context(|| "Type hierarchy check failed")?;
    tracing::info!(
        nodes = schematic.nodes.len(),
        connections = schematic.connections.len(),
        derived_pressure_control_points = types.derived_pressure_control_point_node_types().len(),
        derived_voltage_control_points = types.derived_voltage_control_point_node_types().len(),
        "schematic ok"
    );
    Ok(())
}
