//! Model subcommands (`ss`, `tf`, `zpk`, `pid`, `build`): realize, then
//! render or compile and package.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use ltifmu_model::ModelSpec;
use ltifmu_package::pipeline::DEFAULT_STEP_SIZE;
use ltifmu_package::{build, check_destination, render, BuildConfig, SystemToolchain};

use crate::config::LoadedConfig;

/// Environment variable naming the runtime skeleton directory.
pub const RUNTIME_DIR_ENV: &str = "LTIFMU_RUNTIME_DIR";

/// What a model subcommand produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// Compile and write the `.fmu` archive.
    Artifact,
    /// Print the generated C source.
    Source,
    /// Print the generated modelDescription.xml.
    Descriptor,
}

/// Flags shared by every model subcommand.
#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    /// Output archive; its file stem becomes the model identifier
    #[arg(short, long, default_value = "./q.fmu")]
    pub output: PathBuf,
    /// Euler integrator step size
    #[arg(long)]
    pub dt: Option<f64>,
    /// Initial state vector as a JSON list
    #[arg(long, allow_hyphen_values = true)]
    pub x0: Option<String>,
    /// Initial input, a JSON list (state space) or a number
    #[arg(long, allow_hyphen_values = true)]
    pub u0: Option<String>,
    /// Directory holding the runtime skeleton
    #[arg(long)]
    pub runtime_dir: Option<PathBuf>,
    /// Leave sources/ out of the archive
    #[arg(long)]
    pub no_sources: bool,
    /// What to produce
    #[arg(long, value_enum, default_value_t = Emit::Artifact)]
    pub emit: Emit,
    /// Print the build report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            output: PathBuf::from("./q.fmu"),
            dt: None,
            x0: None,
            u0: None,
            runtime_dir: None,
            no_sources: false,
            emit: Emit::Artifact,
            json: false,
        }
    }
}

/// Effective build settings after layering flags, config file and environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub step_size: f64,
    pub keep_sources: bool,
    pub runtime_dir: PathBuf,
    pub compiler: Option<String>,
    pub flags: Vec<String>,
}

impl Settings {
    /// Resolve settings: flag > `ltifmu.toml` > environment > default.
    pub fn resolve(
        args: &BuildArgs,
        config: Option<&LoadedConfig>,
        cwd: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = config.map(|c| &c.config);

        let step_size = args
            .dt
            .or_else(|| file.and_then(|f| f.build.step_size))
            .unwrap_or(DEFAULT_STEP_SIZE);
        anyhow::ensure!(
            step_size.is_finite() && step_size > 0.0,
            "step size must be finite and positive, found {step_size}"
        );

        let keep_sources = if args.no_sources {
            false
        } else {
            file.and_then(|f| f.build.keep_sources).unwrap_or(true)
        };

        let runtime_dir = args
            .runtime_dir
            .clone()
            .or_else(|| config.and_then(LoadedConfig::runtime_dir))
            .or_else(|| env(RUNTIME_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| cwd.join("runtime"));

        let compiler = file
            .and_then(|f| f.toolchain.compiler.clone())
            .or_else(|| env("CC").filter(|cc| !cc.trim().is_empty()));
        let flags = file.map(|f| f.toolchain.flags.clone()).unwrap_or_default();

        Ok(Self {
            step_size,
            keep_sources,
            runtime_dir,
            compiler,
            flags,
        })
    }

    pub fn toolchain(&self) -> SystemToolchain {
        let toolchain = SystemToolchain::new().with_flags(self.flags.iter().cloned());
        match &self.compiler {
            Some(compiler) => toolchain.with_compiler(compiler.clone()),
            None => toolchain,
        }
    }
}

/// Realize `spec` and produce what `--emit` asks for.
pub fn run(
    spec: ModelSpec,
    args: &BuildArgs,
    config: Option<&LoadedConfig>,
    cwd: &Path,
) -> Result<()> {
    let settings = Settings::resolve(args, config, cwd, |key| std::env::var(key).ok())?;
    tracing::debug!(?settings, "resolved build settings");

    let model = spec
        .realize()
        .with_context(|| format!("invalid {} model", spec.form_name()))?;

    match args.emit {
        Emit::Source | Emit::Descriptor => {
            let dest = check_destination(&args.output)?;
            let rendered = render(&model, &dest.identifier, settings.step_size)?;
            if args.emit == Emit::Source {
                print!("{}", rendered.source);
            } else {
                print!("{}", rendered.descriptor);
            }
        }
        Emit::Artifact => {
            let mut build_config = BuildConfig::new(&args.output, &settings.runtime_dir)?;
            build_config.step_size = settings.step_size;
            build_config.keep_sources = settings.keep_sources;

            let report = build(&model, &build_config, &settings.toolchain())
                .with_context(|| format!("building {}", args.output.display()))?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
    }
    Ok(())
}
