use std::error::Error;
use std::fs;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};

use minebot::config::{BotConfig, ConfigLoadError, EXAMPLE_CONFIG};
use minebot::logging::{init_logging, level_for_verbosity};
use minebot::movement::{Facing, PathReplay, PeriodicAction};
use minebot::{sim, ReactiveBehavior, WorldSession};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enables debug mode
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// Name to log in as (overrides config file)
    #[arg(short, long)]
    username: Option<String>,

    /// Seed for the simulated world (overrides config file)
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk the configured waypoints back and forth
    Patrol {
        /// Ticks between waypoints
        #[arg(long)]
        step_ticks: Option<u64>,
    },
    /// Turn in place by a fixed angle every few ticks
    Spin {
        /// Ticks between turns
        #[arg(long)]
        step_ticks: Option<u64>,
        /// Degrees per turn
        #[arg(long, allow_hyphen_values = true)]
        step_degrees: Option<f32>,
    },
    /// Greet players, complain about damage and relay chat
    Greeter,
    /// Write an example config file and exit
    InitConfig,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Patrol { .. } => "patrol",
            Command::Spin { .. } => "spin",
            Command::Greeter => "greeter",
            Command::InitConfig => "init-config",
        }
    }
}

fn create_example_config() -> Result<(), Box<dyn Error>> {
    let config_path = BotConfig::config_path();

    // Never overwrite an existing config file
    if config_path.exists() {
        return Err(format!(
            "Config file already exists at {}. Please edit it manually or delete it to create a new one.",
            config_path.display()
        )
        .into());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&config_path, EXAMPLE_CONFIG)?;
    eprintln!("Config file created at: {}", config_path.display());
    eprintln!("Please edit it with your waypoints and messages, then run minebot again.");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Command::InitConfig = cli.command {
        return create_example_config();
    }

    let mut config = match BotConfig::load() {
        Ok(cfg) => cfg,
        Err(ConfigLoadError::NotFound) => {
            eprintln!("No config found, creating example config");
            return create_example_config();
        }
        Err(err) => {
            return Err(format!("Failed to load config: {}", err).into());
        }
    };

    if let Some(username) = cli.username {
        config.session.username = username;
    }
    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
    }

    let _log_guard = init_logging(
        cli.command.name(),
        level_for_verbosity(cli.debug),
        config.logging.file,
    )?;

    info!("Starting minebot {} as {}", cli.command.name(), config.session.username);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down...");
            let _ = shutdown_tx.send(true);
        }
    });

    let (mut session, world_handle) = sim::connect_local(
        &config.session.username,
        &config.simulation,
        shutdown_rx.clone(),
    );
    if let Some(max_wait) = config.session.max_wait() {
        session = session.with_max_wait(max_wait);
    }

    let result = match cli.command {
        Command::Patrol { step_ticks } => {
            let step_ticks = step_ticks.unwrap_or(config.patrol.step_ticks);
            let mut patrol = PathReplay::new(config.patrol.positions(), step_ticks)?;
            patrol.run(&mut session, Some(shutdown_rx)).await
        }
        Command::Spin {
            step_ticks,
            step_degrees,
        } => {
            let step_ticks = step_ticks.unwrap_or(config.spin.step_ticks);
            let step_degrees = step_degrees.unwrap_or(config.spin.step_degrees);
            let mut spin = PeriodicAction::new(step_ticks, Facing::new(0.0, step_degrees));
            session.enable_move(true)?;
            spin.run(&mut session, Some(shutdown_rx)).await
        }
        Command::Greeter => {
            let mut greeter = ReactiveBehavior::new(config.greeter.clone());
            greeter.run(&mut session, Some(shutdown_rx)).await
        }
        Command::InitConfig => Ok(()),
    };

    drop(session);
    if let Err(err) = world_handle.await {
        error!("Simulated world task failed: {}", err);
    }

    match result {
        Ok(()) | Err(minebot::Error::Cancelled) => {
            info!("Shut down cleanly");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
