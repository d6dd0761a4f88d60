use std::collections::BTreeSet;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::blocks::BlockState;
use crate::clock::Clock;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::events::{Event, EventMatcherSet};
use crate::geom::{BlockPosition, Position};
use crate::world::{BotAction, WorldSession, WorldState, WorldUpdate};

/// What woke a waiting `listen_for`
enum Wake {
    Update(WorldUpdate),
    TickBoundary,
    Disconnected,
    Shutdown,
    Deadline,
}

/// Reference [`WorldSession`] over a pair of channels.
///
/// The connection layer pushes [`WorldUpdate`]s into `updates` and drains
/// [`BotAction`]s from `actions`. Ticks come from a local [`Clock`] that the
/// server's time updates keep in step.
pub struct Session {
    world: WorldState,
    clock: Clock,
    dispatcher: Dispatcher,
    updates: mpsc::UnboundedReceiver<WorldUpdate>,
    actions: mpsc::UnboundedSender<BotAction>,
    shutdown_rx: Option<watch::Receiver<bool>>,
    max_wait: Option<Duration>,
    disconnected: bool,
}

impl Session {
    pub fn new(
        username: impl Into<String>,
        updates: mpsc::UnboundedReceiver<WorldUpdate>,
        actions: mpsc::UnboundedSender<BotAction>,
    ) -> Self {
        let world = WorldState::new(username);
        let dispatcher = Dispatcher::new(&world);
        Self {
            world,
            clock: Clock::new(),
            dispatcher,
            updates,
            actions,
            shutdown_rx: None,
            max_wait: None,
            disconnected: false,
        }
    }

    /// Fail pending and future waits with [`Error::Cancelled`] once `true` is sent
    pub fn with_shutdown(mut self, shutdown_rx: watch::Receiver<bool>) -> Self {
        self.shutdown_rx = Some(shutdown_rx);
        self
    }

    /// Give up on a single `listen_for` after this much real time
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    fn send(&mut self, action: BotAction) -> Result<()> {
        if self.disconnected {
            return Err(Error::SessionDisconnected);
        }
        debug!(target: "actions", "Sending {:?}", action);
        self.actions.send(action).map_err(|_| {
            self.disconnected = true;
            Error::SessionDisconnected
        })
    }

    fn apply(&mut self, update: WorldUpdate) -> Result<()> {
        match update {
            WorldUpdate::TimeUpdate { world_age } => self.clock.sync(world_age),
            WorldUpdate::ChatReceived(message) => {
                if message.sender != self.world.username() {
                    self.dispatcher.queue_chat(message);
                }
            }
            WorldUpdate::HealthUpdated { health, .. } => {
                self.world.apply(&update);
                if health <= 0.0 {
                    info!("Died, requesting respawn");
                    self.send(BotAction::Respawn)?;
                }
            }
            other => self.world.apply(&other),
        }
        Ok(())
    }

    /// Apply everything already queued, forming one observation step
    fn drain_updates(&mut self) -> Result<()> {
        loop {
            match self.updates.try_recv() {
                Ok(update) => self.apply(update)?,
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    return Err(Error::SessionDisconnected);
                }
            }
        }
    }

    async fn next_wake(&mut self, deadline: Option<Instant>) -> Wake {
        let tick_end = self.clock.current_tick_end();
        let shutdown = wait_for_shutdown(&mut self.shutdown_rx);

        tokio::select! {
            biased;

            _ = shutdown => Wake::Shutdown,
            update = self.updates.recv() => match update {
                Some(update) => Wake::Update(update),
                None => Wake::Disconnected,
            },
            _ = sleep_until(tick_end) => Wake::TickBoundary,
            _ = sleep_until(deadline.unwrap_or(tick_end)), if deadline.is_some() => Wake::Deadline,
        }
    }
}

/// Resolves once a shutdown has been signalled; never resolves without a receiver
async fn wait_for_shutdown(shutdown_rx: &mut Option<watch::Receiver<bool>>) {
    match shutdown_rx {
        Some(rx) => {
            let sender_gone = rx.wait_for(|stop| *stop).await.is_err();
            if sender_gone {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

impl WorldSession for Session {
    fn username(&self) -> &str {
        self.world.username()
    }

    fn current_tick(&self) -> u64 {
        self.clock.current_tick()
    }

    fn position(&self) -> Position {
        self.world.position()
    }

    fn health(&self) -> f32 {
        self.world.health()
    }

    fn food(&self) -> f32 {
        self.world.food()
    }

    fn player_names(&self) -> BTreeSet<String> {
        self.world.players().clone()
    }

    fn block_state_at(&self, position: BlockPosition) -> Option<BlockState> {
        self.world.block_state_at(position)
    }

    fn find_block_ids_within(
        &self,
        block_id: u16,
        origin: BlockPosition,
        radius: i32,
    ) -> Vec<BlockPosition> {
        self.world.find_block_ids_within(block_id, origin, radius)
    }

    fn find_path_to(
        &self,
        origin: BlockPosition,
        destination: BlockPosition,
    ) -> Option<Vec<BlockPosition>> {
        self.world.find_path_to(origin, destination)
    }

    fn teleport_to(&mut self, position: Position) -> Result<()> {
        self.world.teleport_to(position);
        self.send(BotAction::Teleport { position })
    }

    fn set_yaw(&mut self, degrees: f32) -> Result<()> {
        self.world.set_yaw(degrees);
        self.send(BotAction::SetYaw { degrees })
    }

    fn enable_move(&mut self, enabled: bool) -> Result<()> {
        self.world.set_moving(enabled);
        self.send(BotAction::EnableMove { enabled })
    }

    fn say(&mut self, message: &str) -> Result<()> {
        self.send(BotAction::Say {
            message: message.to_string(),
        })
    }

    async fn listen_for(&mut self, matchers: &EventMatcherSet) -> Result<Event> {
        if matchers.is_empty() {
            return Err(Error::EmptyMatcherSet);
        }
        if self.disconnected {
            return Err(Error::SessionDisconnected);
        }

        let deadline = self.max_wait.map(|max_wait| Instant::now() + max_wait);

        loop {
            if self.shutdown_requested() {
                return Err(Error::Cancelled);
            }

            self.clock.advance();
            self.drain_updates()?;

            let tick = self.clock.current_tick();
            if let Some(event) = self.dispatcher.evaluate(matchers, &self.world, tick) {
                return Ok(event);
            }

            match self.next_wake(deadline).await {
                Wake::Update(update) => self.apply(update)?,
                Wake::TickBoundary => {}
                Wake::Disconnected => {
                    warn!("World session disconnected while waiting");
                    self.disconnected = true;
                    return Err(Error::SessionDisconnected);
                }
                Wake::Shutdown => return Err(Error::Cancelled),
                Wake::Deadline => {
                    // max_wait is always set when a deadline exists
                    return Err(Error::TimedOut(self.max_wait.unwrap_or_default()));
                }
            }
        }
    }
}
