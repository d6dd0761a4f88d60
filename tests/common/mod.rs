//! Shared helpers for driving executors without a live world.
#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};

use minebot::blocks::BlockState;
use minebot::{BlockPosition, Error, Event, EventMatcherSet, Position, Result, WorldSession};

/// A [`WorldSession`] that plays back a script.
///
/// Queued events are delivered in order when their kind is registered and
/// dropped otherwise. A tick target jumps the clock straight to it. Once the
/// clock would pass `tick_limit`, or there is nothing left to deliver, the
/// wait fails with [`Error::Cancelled`] so `run` loops end.
pub struct ScriptedSession {
    pub username: String,
    pub tick: u64,
    pub tick_limit: u64,
    pub position: Position,
    pub health: f32,
    pub players: BTreeSet<String>,
    pub script: VecDeque<Event>,
    pub waits: usize,
    pub teleports: Vec<Position>,
    pub yaws: Vec<f32>,
    pub said: Vec<String>,
}

impl ScriptedSession {
    pub fn new(tick_limit: u64) -> Self {
        Self {
            username: "bilbo".to_string(),
            tick: 0,
            tick_limit,
            position: Position::new(0.5, 64.0, 0.5),
            health: 20.0,
            players: BTreeSet::from(["bilbo".to_string()]),
            script: VecDeque::new(),
            waits: 0,
            teleports: Vec::new(),
            yaws: Vec::new(),
            said: Vec::new(),
        }
    }

    pub fn with_script(mut self, events: impl IntoIterator<Item = Event>) -> Self {
        self.script.extend(events);
        self
    }
}

impl WorldSession for ScriptedSession {
    fn username(&self) -> &str {
        &self.username
    }

    fn current_tick(&self) -> u64 {
        self.tick
    }

    fn position(&self) -> Position {
        self.position
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn food(&self) -> f32 {
        20.0
    }

    fn player_names(&self) -> BTreeSet<String> {
        self.players.clone()
    }

    fn block_state_at(&self, _position: BlockPosition) -> Option<BlockState> {
        None
    }

    fn find_block_ids_within(
        &self,
        _block_id: u16,
        _origin: BlockPosition,
        _radius: i32,
    ) -> Vec<BlockPosition> {
        Vec::new()
    }

    fn find_path_to(
        &self,
        _origin: BlockPosition,
        _destination: BlockPosition,
    ) -> Option<Vec<BlockPosition>> {
        None
    }

    fn teleport_to(&mut self, position: Position) -> Result<()> {
        self.position = position;
        self.teleports.push(position);
        Ok(())
    }

    fn set_yaw(&mut self, degrees: f32) -> Result<()> {
        self.yaws.push(degrees);
        Ok(())
    }

    fn enable_move(&mut self, _enabled: bool) -> Result<()> {
        Ok(())
    }

    fn say(&mut self, message: &str) -> Result<()> {
        self.said.push(message.to_string());
        Ok(())
    }

    async fn listen_for(&mut self, matchers: &EventMatcherSet) -> Result<Event> {
        if matchers.is_empty() {
            return Err(Error::EmptyMatcherSet);
        }
        self.waits += 1;

        while let Some(event) = self.script.pop_front() {
            if matchers.contains(event.kind()) {
                return Ok(event);
            }
        }

        match matchers.tick_target() {
            Some(target) if target <= self.tick_limit => {
                self.tick = self.tick.max(target);
                Ok(Event::TickReached { tick: self.tick })
            }
            _ => Err(Error::Cancelled),
        }
    }
}
