//! An in-process world for running bots without a server.
//!
//! Runs on the same 50ms tick as a real server, reports world age every
//! second, and rolls dice each tick for damage, players coming and going, and
//! chatter. Bot actions are logged; `Say` comes back as chat from the bot.
use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::blocks::BlockState;
use crate::clock::TICK_DURATION;
use crate::config::SimulationConfig;
use crate::geom::{BlockPosition, Position};
use crate::session::Session;
use crate::world::{BotAction, ChatMessage, WorldUpdate};

const TICKS_PER_TIME_UPDATE: u64 = 20;
const TICKS_PER_REGEN: u64 = 40;
const MAX_HEALTH: f32 = 20.0;
const FLOOR_RADIUS: i32 = 8;
const FLOOR_Y: i32 = 63;
const STONE: u16 = 1;

const CHATTER: &[&str] = &[
    "anyone seen my pickaxe?",
    "creepers near spawn again",
    "brb",
    "nice build",
    "who took the last of the bread",
];

type Sent = Result<(), mpsc::error::SendError<WorldUpdate>>;

/// Start a simulated world and return a session connected to it.
///
/// The world task stops when `shutdown_rx` flips to `true` or the session is
/// dropped.
pub fn connect_local(
    username: &str,
    config: &SimulationConfig,
    shutdown_rx: watch::Receiver<bool>,
) -> (Session, JoinHandle<()>) {
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let (actions_tx, actions_rx) = mpsc::unbounded_channel();

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let world = SimulatedWorld {
        username: username.to_string(),
        config: config.clone(),
        rng,
        online: BTreeSet::new(),
        health: MAX_HEALTH,
        world_age: 0,
        updates: updates_tx,
    };

    let handle = tokio::spawn(world.run(actions_rx, shutdown_rx.clone()));
    let session = Session::new(username, updates_rx, actions_tx).with_shutdown(shutdown_rx);
    (session, handle)
}

struct SimulatedWorld {
    username: String,
    config: SimulationConfig,
    rng: StdRng,
    online: BTreeSet<String>,
    health: f32,
    world_age: u64,
    updates: mpsc::UnboundedSender<WorldUpdate>,
}

impl SimulatedWorld {
    async fn run(
        mut self,
        mut actions: mpsc::UnboundedReceiver<BotAction>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!(target: "sim", "Simulated world starting for {}", self.username);
        if self.spawn().is_err() {
            return;
        }

        let mut ticker = tokio::time::interval(TICK_DURATION);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let alive = tokio::select! {
                changed = shutdown_rx.changed() => changed.is_ok(),
                action = actions.recv() => match action {
                    Some(action) => self.handle_action(action).is_ok(),
                    None => false,
                },
                _ = ticker.tick() => self.tick().is_ok(),
            };

            if !alive {
                break;
            }
        }

        info!(target: "sim", "Simulated world stopped at world age {}", self.world_age);
    }

    fn send(&self, update: WorldUpdate) -> Sent {
        self.updates.send(update)
    }

    fn spawn(&mut self) -> Sent {
        self.world_age = self.rng.gen_range(0..24_000);
        self.send(WorldUpdate::TimeUpdate {
            world_age: self.world_age,
        })?;

        for x in -FLOOR_RADIUS..=FLOOR_RADIUS {
            for z in -FLOOR_RADIUS..=FLOOR_RADIUS {
                self.send(WorldUpdate::BlockChanged {
                    position: BlockPosition::new(x, FLOOR_Y, z),
                    state: BlockState::from_parts(STONE, 0),
                })?;
            }
        }

        self.send(WorldUpdate::PositionCorrected {
            position: spawn_point(),
        })
    }

    fn chance(&mut self, p: f64) -> bool {
        // gen_bool panics outside 0..=1
        p > 0.0 && self.rng.gen_bool(p.min(1.0))
    }

    fn tick(&mut self) -> Sent {
        self.world_age += 1;
        if self.world_age % TICKS_PER_TIME_UPDATE == 0 {
            self.send(WorldUpdate::TimeUpdate {
                world_age: self.world_age,
            })?;
        }

        if self.chance(self.config.damage_chance) {
            let damage = self.rng.gen_range(1..=4) as f32;
            self.health = (self.health - damage).max(0.0);
            debug!(target: "sim", "{} took {} damage", self.username, damage);
            self.report_health()?;
        } else if self.health > 0.0
            && self.health < MAX_HEALTH
            && self.world_age % TICKS_PER_REGEN == 0
        {
            self.health = (self.health + 1.0).min(MAX_HEALTH);
            self.report_health()?;
        }

        if !self.config.players.is_empty() && self.chance(self.config.join_chance) {
            let index = self.rng.gen_range(0..self.config.players.len());
            let name = self.config.players[index].clone();
            if self.online.remove(&name) {
                debug!(target: "sim", "{} left", name);
                self.send(WorldUpdate::PlayerLeft { name })?;
            } else {
                debug!(target: "sim", "{} joined", name);
                self.online.insert(name.clone());
                self.send(WorldUpdate::PlayerJoined { name })?;
            }
        }

        if !self.online.is_empty() && self.chance(self.config.chat_chance) {
            let index = self.rng.gen_range(0..self.online.len());
            if let Some(sender) = self.online.iter().nth(index).cloned() {
                let line = CHATTER[self.rng.gen_range(0..CHATTER.len())];
                self.send(WorldUpdate::ChatReceived(ChatMessage::new(sender, line)))?;
            }
        }

        Ok(())
    }

    fn report_health(&self) -> Sent {
        self.send(WorldUpdate::HealthUpdated {
            health: self.health,
            food: MAX_HEALTH,
        })
    }

    fn handle_action(&mut self, action: BotAction) -> Sent {
        match action {
            BotAction::Teleport { position } => {
                debug!(target: "sim", "{} moved to {}", self.username, position);
            }
            BotAction::SetYaw { degrees } => {
                debug!(target: "sim", "{} now facing {}", self.username, degrees);
            }
            BotAction::EnableMove { enabled } => {
                debug!(target: "sim", "{} movement enabled: {}", self.username, enabled);
            }
            BotAction::Say { message } => {
                info!(target: "sim", "<{}> {}", self.username, message);
                self.send(WorldUpdate::ChatReceived(ChatMessage::new(
                    self.username.clone(),
                    message,
                )))?;
            }
            BotAction::Respawn => {
                info!(target: "sim", "{} respawned", self.username);
                self.health = MAX_HEALTH;
                self.report_health()?;
                self.send(WorldUpdate::PositionCorrected {
                    position: spawn_point(),
                })?;
            }
        }
        Ok(())
    }
}

fn spawn_point() -> Position {
    Position::new(0.5, (FLOOR_Y + 1) as f64, 0.5)
}
