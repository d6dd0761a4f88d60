use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::behavior::GreeterMessages;
use crate::geom::Position;

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Config file not found")]
    NotFound,
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_username() -> String {
    "bilbo".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_username")]
    pub username: String,

    /// Longest a single wait may take in real time before giving up
    #[serde(default)]
    pub max_wait_ms: Option<u64>,
}

impl SessionConfig {
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            max_wait_ms: None,
        }
    }
}

fn default_patrol_step() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatrolConfig {
    #[serde(default = "default_patrol_step")]
    pub step_ticks: u64,

    /// Waypoints as `[x, y, z]`
    #[serde(default)]
    pub waypoints: Vec<[f64; 3]>,
}

impl PatrolConfig {
    pub fn positions(&self) -> Vec<Position> {
        self.waypoints.iter().copied().map(Position::from).collect()
    }
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            step_ticks: default_patrol_step(),
            waypoints: Vec::new(),
        }
    }
}

fn default_spin_step_ticks() -> u64 {
    10
}

fn default_spin_step_degrees() -> f32 {
    10.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinConfig {
    #[serde(default = "default_spin_step_ticks")]
    pub step_ticks: u64,
    #[serde(default = "default_spin_step_degrees")]
    pub step_degrees: f32,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            step_ticks: default_spin_step_ticks(),
            step_degrees: default_spin_step_degrees(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file in the data directory
    #[serde(default)]
    pub file: bool,
}

fn default_players() -> Vec<String> {
    ["frodo", "sam", "merry", "pippin"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_join_chance() -> f64 {
    0.02
}

fn default_damage_chance() -> f64 {
    0.03
}

fn default_chat_chance() -> f64 {
    0.02
}

/// Tuning for the in-process world the CLI runs against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_players")]
    pub players: Vec<String>,
    /// Per-tick chance that a player joins or leaves
    #[serde(default = "default_join_chance")]
    pub join_chance: f64,
    /// Per-tick chance of taking damage
    #[serde(default = "default_damage_chance")]
    pub damage_chance: f64,
    /// Per-tick chance that an online player says something
    #[serde(default = "default_chat_chance")]
    pub chat_chance: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            players: default_players(),
            join_chance: default_join_chance(),
            damage_chance: default_damage_chance(),
            chat_chance: default_chat_chance(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub patrol: PatrolConfig,
    #[serde(default)]
    pub spin: SpinConfig,
    #[serde(default)]
    pub greeter: GreeterMessages,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl BotConfig {
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "minebot")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("minebot.toml"))
    }

    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigLoadError> {
        if !path.exists() {
            return Err(ConfigLoadError::NotFound);
        }

        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&self)?;
        fs::write(path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }
}

pub const EXAMPLE_CONFIG: &str = r#"# minebot configuration

[session]
username = "bilbo"
# Give up on a single wait after this many milliseconds
# max_wait_ms = 30000

[patrol]
step_ticks = 1
waypoints = [[259.0, 63.0, 27.0], [260.0, 63.0, 27.0], [261.0, 63.0, 27.0], [262.0, 63.0, 28.0]]

[spin]
step_ticks = 10
step_degrees = 10.0

[greeter]
health_drop = "Ouch! Health dropped from {old} to {new}"
greeting = "Hello, {name}!"
farewell = "Goodbye, {name}!"

[logging]
file = false

[simulation]
# seed = 42
players = ["frodo", "sam", "merry", "pippin"]
"#;
