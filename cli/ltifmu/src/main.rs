//! ltifmu CLI: compile LTI models into FMI 2.0 units.
//!
//! Building needs a runtime skeleton (the FMI 2.0 headers plus
//! `fmi2Template.{h,c}`), which is not bundled. `ltifmu doctor` reports
//! where it is looked for and what is missing.

mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::build::BuildArgs;
use commands::model::{self, StateSpaceArgs};
use config::LtifmuConfig;

#[derive(Parser)]
#[command(name = "ltifmu", version, about = "Compile LTI models into FMI 2.0 units")]
struct Cli {
    /// More logging (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Continuous-time state space model
    ///
    /// Example: ltifmu ss -A "[[1,2],[3,4]]" -o ./q.fmu
    Ss {
        /// A matrix as JSON, zero if omitted
        #[arg(short = 'A', long = "A")]
        a: Option<String>,
        /// B matrix as JSON, inferred if omitted
        #[arg(short = 'B', long = "B")]
        b: Option<String>,
        /// C matrix as JSON, identity if omitted unless D is given
        #[arg(short = 'C', long = "C")]
        c: Option<String>,
        /// D matrix as JSON, inferred if omitted
        #[arg(short = 'D', long = "D")]
        d: Option<String>,
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Transfer function, coefficients from highest degree down
    Tf {
        /// Numerator coefficients as a JSON list
        #[arg(short, long)]
        num: String,
        /// Denominator coefficients as a JSON list
        #[arg(short, long)]
        den: String,
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Zero-pole-gain model with real zeros and poles
    Zpk {
        /// Zeros as a JSON list
        #[arg(short, long, allow_hyphen_values = true)]
        zeros: String,
        /// Poles as a JSON list
        #[arg(short, long, allow_hyphen_values = true)]
        poles: String,
        /// Gain
        #[arg(short = 'k', long = "k", default_value_t = 1.0, allow_hyphen_values = true)]
        gain: f64,
        #[command(flatten)]
        args: BuildArgs,
    },
    /// PID controller kp + ki/s + kd*s/(T*s + 1)
    Pid {
        /// Proportional gain
        #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
        kp: f64,
        /// Integral gain
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        ki: f64,
        /// Derivative gain
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        kd: f64,
        /// Derivative filter time constant
        #[arg(short = 'T', long = "T", default_value_t = 0.0, allow_hyphen_values = true)]
        t: f64,
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Build a model described in a TOML or JSON file
    Build {
        /// Model file with a `kind` of ss, tf, zpk or pid
        model: PathBuf,
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Check host platform, compiler and runtime skeleton
    Doctor,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let (spec, args) = match cli.command {
        Commands::Doctor => return commands::doctor::run(&cwd),
        Commands::Ss { a, b, c, d, args } => {
            let spec = model::state_space(StateSpaceArgs {
                a: a.as_deref(),
                b: b.as_deref(),
                c: c.as_deref(),
                d: d.as_deref(),
            })?;
            (spec, args)
        }
        Commands::Tf { num, den, args } => (model::transfer_function(&num, &den)?, args),
        Commands::Zpk {
            zeros,
            poles,
            gain,
            args,
        } => (model::zero_pole_gain(&zeros, &poles, gain)?, args),
        Commands::Pid {
            kp,
            ki,
            kd,
            t,
            args,
        } => (model::pid(kp, ki, kd, t), args),
        Commands::Build { model: path, args } => (model::load_model_file(&path)?, args),
    };

    let loaded = LtifmuConfig::find_and_load(&cwd)?;
    if let Some(loaded) = &loaded {
        tracing::debug!(dir = %loaded.dir.display(), "loaded configuration");
    }

    let spec = model::with_start_values(spec, args.x0.as_deref(), args.u0.as_deref())?;
    commands::build::run(spec, &args, loaded.as_ref(), &cwd)
}
