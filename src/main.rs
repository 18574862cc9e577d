use clap::{Parser, Subcommand};
use color_eyre::Result;
use env_logger::Env;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

use rtf::config::{resolve_settings, Settings};
use rtf::manifest::VagrantfileNotifier;
use rtf::platform::PlatformLoader;
use rtf::state::{StateFile, StateStore};
use rtf::utils::validate_state;

/// Subnet, IP and port allocation for Vagrant test platforms
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (defaults to ./rtf.yaml when present)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// State file, overrides the settings
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Directory of platform definitions, overrides the settings
    #[arg(long, global = true)]
    platforms_dir: Option<PathBuf>,

    /// Vagrantfile template, overrides the settings
    #[arg(long, global = true)]
    template: Option<PathBuf>,

    /// Generated Vagrantfile, overrides the settings
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Add or update platforms, then assign every missing subnet, IP and port
    Update {
        /// Platform names, one `<platforms_dir>/<name>.json` each
        #[arg(required = true)]
        platforms: Vec<String>,
    },
    /// Remove a platform from the state
    Remove {
        platform: String,
    },
    /// Assign missing resources without loading any definition
    Reconcile,
    /// Check the state for colliding or misplaced assignments
    Check,
    /// List known platforms
    List,
}

impl Args {
    /// Settings from file, with command-line overrides applied
    fn settings(&self) -> Result<Settings> {
        let mut settings = resolve_settings(self.settings.as_deref())?;

        if let Some(path) = &self.state {
            settings.state_path = path.clone();
        }
        if let Some(path) = &self.platforms_dir {
            settings.platforms_dir = path.clone();
        }
        if let Some(path) = &self.template {
            settings.template_path = path.clone();
        }
        if let Some(path) = &self.manifest {
            settings.manifest_path = path.clone();
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<ExitCode> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = args.settings()?;
    info!("State file: {:?}", settings.state_path);

    let mut store = StateStore::new(
        StateFile::new(&settings.state_path),
        PlatformLoader::new(&settings.platforms_dir),
        VagrantfileNotifier::new(&settings.template_path, &settings.manifest_path),
    );

    match args.command {
        Command::Update { platforms } => {
            let report = store.update(&platforms)?;
            info!("Made {} new assignment(s)", report.assignments.len());
            if !report.is_complete() {
                for skipped in &report.skipped {
                    error!("Platform '{}' was not updated: {}", skipped.name, skipped.error);
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Remove { platform } => {
            if !store.remove_platform(&platform)? {
                warn!("Unknown platform '{}'", platform);
            }
        }
        Command::Reconcile => {
            let assignments = store.reconcile()?;
            info!("Made {} new assignment(s)", assignments.len());
        }
        Command::Check => {
            let state = store.load()?;
            if let Err(violations) = validate_state(&state) {
                for violation in &violations {
                    warn!("{}", violation);
                }
                error!("State check found {} problem(s)", violations.len());
                return Ok(ExitCode::FAILURE);
            }
            info!("State is consistent ({} platform(s))", state.platforms.len());
        }
        Command::List => {
            let state = store.load()?;
            for (name, platform) in &state.platforms {
                let subnet = platform
                    .subnet
                    .map(|subnet| subnet.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{} host(s)", name, subnet, platform.hosts.len());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
