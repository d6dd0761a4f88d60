//! Tick-driven executors.
//!
//! Both executors share the same loop shape: wait `N` ticks through
//! [`TickWait`], act once, repeat until shut down.
pub mod patrol;
pub mod periodic;

use tokio::sync::watch;
use tracing::trace;

use crate::error::Result;
use crate::events::{Event, EventMatcherSet};
use crate::world::WorldSession;

pub use patrol::{PathReplay, PatrolState};
pub use periodic::{Accumulator, Facing, PeriodicAction};

/// Waits a fixed number of ticks at a time.
///
/// Keeps a base matcher set for any additional interest and layers a fresh tick
/// target on a copy of it for each wait. The target survives other events, so
/// a chat message does not restart the countdown.
#[derive(Debug, Clone)]
pub struct TickWait {
    interval: u64,
    base: EventMatcherSet,
    target: Option<u64>,
}

impl TickWait {
    /// An interval of zero is treated as one tick
    pub fn new(interval: u64) -> Self {
        Self::with_interest(interval, EventMatcherSet::new())
    }

    pub fn with_interest(interval: u64, base: EventMatcherSet) -> Self {
        Self {
            interval: interval.max(1),
            base,
            target: None,
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// The tick currently being waited for, if a wait is in progress
    pub fn target(&self) -> Option<u64> {
        self.target
    }

    /// Wait for the next event: the interval elapsing or anything in the base set
    pub async fn next<S: WorldSession>(&mut self, session: &mut S) -> Result<Event> {
        let target = match self.target {
            Some(target) => target,
            None => {
                let target = session.current_tick() + self.interval;
                self.target = Some(target);
                target
            }
        };

        let mut matchers = EventMatcherSet::from(&self.base);
        matchers.listen_tick(target);
        trace!(target: "movement", "Waiting for tick {}", target);

        let event = session.listen_for(&matchers).await?;
        if let Event::TickReached { .. } = event {
            self.target = None;
        }
        Ok(event)
    }
}

/// True once a shutdown has been requested on the channel
pub(crate) fn shutdown_requested(shutdown_rx: Option<&watch::Receiver<bool>>) -> bool {
    shutdown_rx.is_some_and(|rx| *rx.borrow())
}
