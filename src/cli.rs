//! The command line interface for the program.
use crate::expenditure::CostSummary;
use crate::grid::get_lifetime_grid_status;
use crate::log;
use crate::model::Model;
use crate::ninja::fetch_profiles;
use crate::output::{create_output_directory, get_output_dir, write_costs};
use crate::profile::total_profile_output;
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::{Path, PathBuf};

pub mod demo;
use demo::DemoSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// Options for the commands which generate profiles
#[derive(Args)]
pub struct ProfileOpts {
    /// Directory in which to save profiles
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Regenerate profiles even if they have already been saved
    #[arg(long)]
    pub regenerate: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Calculate the costs of a system.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a model.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
    /// Generate grid-availability profiles for the system lifetime.
    Grid {
        /// The path to the model directory.
        model_dir: PathBuf,
        /// Other profile options
        #[command(flatten)]
        opts: ProfileOpts,
        /// Seed for the random number generator
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Fetch solar and wind profiles from renewables.ninja.
    Fetch {
        /// The path to the model directory.
        model_dir: PathBuf,
        /// Other profile options
        #[command(flatten)]
        opts: ProfileOpts,
    },
    /// Manage demo models.
    Demo {
        /// The available subcommands for managing demo models.
        #[command(subcommand)]
        subcommand: DemoSubcommands,
    },
    /// Manage the program settings file.
    Settings {
        /// The available subcommands for the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Grid {
                model_dir,
                opts,
                seed,
            } => handle_grid_command(&model_dir, &opts, seed, None),
            Self::Fetch { model_dir, opts } => handle_fetch_command(&model_dir, &opts, None),
            Self::Demo { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ minigrid --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Use the given settings, or load them from the settings file
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Get the output folder requested by the user, or the default for the model
fn resolve_output_dir(model_path: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
    match output_dir {
        Some(output_dir) => Ok(output_dir.to_path_buf()),
        None => get_output_dir(model_path),
    }
}

/// Handle the `run` command.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    let output_path = resolve_output_dir(model_path, opts.output_dir.as_deref())?;

    // The overwrite setting can be enabled by command-line argument
    let allow_overwrite = opts.overwrite || settings.overwrite;
    let overwrite = create_output_directory(&output_path, allow_overwrite).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    log::init(Some(&settings.log_level), Some(&output_path))
        .context("Failed to initialise logging.")?;

    let model = Model::from_path(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let summary = CostSummary::calculate(&model).context("Failed to calculate costs.")?;
    for (cost_type, value) in summary.iter() {
        info!("{cost_type}: {:.2}", value.value());
    }
    write_costs(&output_path, &summary)?;
    info!("Costs written to {}", output_path.display());

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // We don't save log files when running the validate command
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    Model::from_path(model_path).context("Failed to validate model.")?;
    info!("Model validation successful!");

    Ok(())
}

/// Create the folder in which profiles are saved and start logging there
fn prepare_profile_dir(
    model_path: &Path,
    opts: &ProfileOpts,
    settings: Option<Settings>,
) -> Result<PathBuf> {
    let settings = load_settings(settings)?;
    let output_path = resolve_output_dir(model_path, opts.output_dir.as_deref())?;

    // Existing profiles are kept, so they can be reused
    fs::create_dir_all(&output_path).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    log::init(Some(&settings.log_level), Some(&output_path))
        .context("Failed to initialise logging.")?;

    Ok(output_path)
}

/// Handle the `grid` command.
pub fn handle_grid_command(
    model_path: &Path,
    opts: &ProfileOpts,
    seed: Option<u64>,
    settings: Option<Settings>,
) -> Result<()> {
    let output_path = prepare_profile_dir(model_path, opts, settings)?;
    let model = Model::from_path(model_path).context("Failed to load model.")?;
    let Some(grid_times) = &model.grid_times else {
        bail!("No grid times provided for model {}", model_path.display());
    };

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let statuses = get_lifetime_grid_status(
        &output_path,
        grid_times,
        model.parameters.max_years,
        opts.regenerate,
        &mut rng,
    )?;

    for (name, status) in &statuses {
        let available = status.iter().filter(|&&status| status == 1).count();
        info!(
            "Grid {name} is available for {available} of {} hours",
            status.len()
        );
    }

    Ok(())
}

/// Handle the `fetch` command.
pub fn handle_fetch_command(
    model_path: &Path,
    opts: &ProfileOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let output_path = prepare_profile_dir(model_path, opts, settings)?;
    let model = Model::from_path(model_path).context("Failed to load model.")?;
    let Some(generation) = &model.generation else {
        bail!(
            "No generation inputs provided for model {}",
            model_path.display()
        );
    };

    fetch_profiles(generation, &output_path, opts.regenerate)?;

    let max_years = model.parameters.max_years;
    for kind in generation.profile_kinds() {
        let profile = total_profile_output(
            &output_path,
            &kind.to_string(),
            &generation.prefix,
            generation.start_year,
            max_years,
            opts.regenerate,
        )?;
        info!(
            "{kind} profile covers {} hours of the {max_years}-year system lifetime",
            profile.len()
        );
    }

    Ok(())
}
