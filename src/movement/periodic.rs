use tokio::sync::watch;
use tracing::{debug, info};

use super::{shutdown_requested, TickWait};
use crate::error::Result;
use crate::events::Event;
use crate::world::WorldSession;

/// State advanced once per period, with the action it drives
pub trait Accumulator {
    /// Act on the session using the current value
    fn apply<S: WorldSession>(&self, session: &mut S) -> Result<()>;

    /// Move to the next value
    fn advance(&mut self);
}

/// Turns the bot by a fixed number of degrees each period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facing {
    angle: f32,
    step: f32,
}

impl Facing {
    pub fn new(start: f32, step: f32) -> Self {
        Self {
            angle: start.rem_euclid(360.0),
            step,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

impl Accumulator for Facing {
    fn apply<S: WorldSession>(&self, session: &mut S) -> Result<()> {
        session.set_yaw(self.angle)
    }

    fn advance(&mut self) {
        self.angle = (self.angle + self.step).rem_euclid(360.0);
    }
}

/// Runs an action every `N` ticks, unconditionally
#[derive(Debug, Clone)]
pub struct PeriodicAction<A> {
    wait: TickWait,
    accumulator: A,
    fired: u64,
}

impl<A: Accumulator> PeriodicAction<A> {
    pub fn new(period_ticks: u64, accumulator: A) -> Self {
        Self {
            wait: TickWait::new(period_ticks),
            accumulator,
            fired: 0,
        }
    }

    pub fn accumulator(&self) -> &A {
        &self.accumulator
    }

    /// How many times the action has run
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Wait one period, act, then advance the accumulator
    pub async fn step<S: WorldSession>(&mut self, session: &mut S) -> Result<()> {
        if let Event::TickReached { tick } = self.wait.next(session).await? {
            debug!(target: "movement", "Tick {}: periodic action #{}", tick, self.fired + 1);
            self.accumulator.apply(session)?;
            self.accumulator.advance();
            self.fired += 1;
        }
        Ok(())
    }

    /// Repeat until a shutdown is requested or the session fails
    pub async fn run<S: WorldSession>(
        &mut self,
        session: &mut S,
        shutdown_rx: Option<watch::Receiver<bool>>,
    ) -> Result<()> {
        info!(
            target: "movement",
            "Starting periodic action every {} ticks",
            self.wait.interval()
        );

        loop {
            if shutdown_requested(shutdown_rx.as_ref()) {
                info!(target: "movement", "Periodic action stopped after {} runs", self.fired);
                return Ok(());
            }
            self.step(session).await?;
        }
    }
}
