use absolute_zero::config::{Config, CoolingKind};
use absolute_zero::logging::init_tracing;
use absolute_zero::simulation::Simulation;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "absolute-zero", version, about = "Simulate systems approaching absolute zero")]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Skip writing images
    #[arg(long, global = true)]
    no_render: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Standing-wave energy field and its rest point
    Field,
    /// Cooling curve toward 0 K
    Cooling {
        #[arg(short, long, value_enum)]
        model: Option<CoolingKind>,
    },
    /// Frames of two counter-propagating waves and their superposition
    Interference,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.log_summary();

    let sim = Simulation::new(config).context("Failed to set up simulation")?;

    match cli.command {
        Command::Field => {
            let report = if cli.no_render {
                sim.run_field()?.1
            } else {
                sim.run_field_with_visualisation()?
            };
            println!("Minimum energy point:");
            println!("   {}", report.minimum);
            println!("   minimum energy: {:.6e}", report.minimum.energy);
            println!("   peak energy:    {:.6e}", report.max_energy);
            println!(
                "   rest region:    {} of {} points below {} of peak",
                report.skeleton_points,
                report.shape.0 * report.shape.1,
                sim.config.search.skeleton_threshold
            );
            if let Some(kelvin) = report.minimum_kelvin {
                println!("   equivalent temperature at minimum: {:.3e} K", kelvin);
            }
            match report.rest_point {
                Some(rest) => {
                    println!("Rest point (field, slope and velocity all ≈ 0):");
                    println!("   {}", rest);
                }
                None => println!(
                    "No exact rest point found. Increase the resolution or relax epsilon."
                ),
            }
        }
        Command::Cooling { model } => {
            let curve = sim.run_cooling(model, !cli.no_render)?;
            if let Some(kelvin) = curve.final_temperature() {
                println!("Final simulated temperature: {:.5e} K", kelvin);
            }
            if let Some(kelvin) = curve.min_temperature() {
                println!("Lowest temperature reached:  {:.5e} K", kelvin);
            }
            println!("→ Approaches 0 K without reaching it (zero-point energy remains).");
        }
        Command::Interference => {
            if cli.no_render {
                println!("Nothing to do: interference only produces frames.");
            } else {
                let written = sim.run_interference()?;
                println!("Saved {} interference frame(s)", written);
            }
        }
    }

    Ok(())
}
