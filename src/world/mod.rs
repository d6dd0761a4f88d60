//! The boundary between the bot core and the game connection.
//!
//! The connection layer feeds [`WorldUpdate`]s in and carries [`BotAction`]s
//! out. Bot logic only ever talks to a [`WorldSession`], which lets tests swap
//! in a scripted session.
pub mod state;

use std::collections::BTreeSet;
use std::future::Future;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::blocks::BlockState;
use crate::error::Result;
use crate::events::{Event, EventMatcherSet};
use crate::geom::{BlockPosition, Position};

pub use state::WorldState;

/// A chat line as received from the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub message: String,
}

impl ChatMessage {
    pub fn new(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
        }
    }
}

/// State changes reported by the connection layer
#[derive(Debug, Clone, PartialEq, Display, Serialize, Deserialize)]
pub enum WorldUpdate {
    /// Server world age, used to keep the local tick clock in step
    TimeUpdate { world_age: u64 },
    HealthUpdated { health: f32, food: f32 },
    PlayerJoined { name: String },
    PlayerLeft { name: String },
    ChatReceived(ChatMessage),
    BlockChanged { position: BlockPosition, state: BlockState },
    /// Server moved us, e.g. after a rejected move or a respawn
    PositionCorrected { position: Position },
}

/// Requests sent back to the connection layer
#[derive(Debug, Clone, PartialEq, Display, Serialize, Deserialize)]
pub enum BotAction {
    Teleport { position: Position },
    SetYaw { degrees: f32 },
    EnableMove { enabled: bool },
    Say { message: String },
    Respawn,
}

/// Everything bot logic needs from a live game session
pub trait WorldSession {
    /// Name the bot is logged in as
    fn username(&self) -> &str;

    fn current_tick(&self) -> u64;

    fn position(&self) -> Position;

    fn health(&self) -> f32;

    fn food(&self) -> f32;

    fn player_names(&self) -> BTreeSet<String>;

    fn block_state_at(&self, position: BlockPosition) -> Option<BlockState>;

    /// Known blocks with the given id within `radius` of `origin`, nearest first
    fn find_block_ids_within(
        &self,
        block_id: u16,
        origin: BlockPosition,
        radius: i32,
    ) -> Vec<BlockPosition>;

    fn find_path_to(&self, origin: BlockPosition, destination: BlockPosition)
        -> Option<Vec<BlockPosition>>;

    fn teleport_to(&mut self, position: Position) -> Result<()>;

    fn set_yaw(&mut self, degrees: f32) -> Result<()>;

    fn enable_move(&mut self, enabled: bool) -> Result<()>;

    fn say(&mut self, message: &str) -> Result<()>;

    /// Suspend until one of `matchers` is satisfied and return that event.
    ///
    /// Fails with [`Error::EmptyMatcherSet`](crate::Error::EmptyMatcherSet)
    /// when nothing is registered.
    fn listen_for(&mut self, matchers: &EventMatcherSet)
        -> impl Future<Output = Result<Event>> + Send;
}
