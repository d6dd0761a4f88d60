use tokio::sync::watch;
use tracing::{debug, info};

use super::{shutdown_requested, TickWait};
use crate::error::{Error, Result};
use crate::events::{Event, EventMatcherSet};
use crate::geom::{BlockPosition, Position};
use crate::world::WorldSession;

/// Where a patrol is in its back-and-forth cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolState {
    Idle,
    /// Walking toward the end of the path; `next` is the next index to visit
    SteppingForward { next: usize },
    /// Walking back toward the start; `None` once index 0 has been visited
    SteppingBackward { next: Option<usize> },
}

impl PatrolState {
    /// Pick the waypoint to visit on this step and the state after it.
    ///
    /// Forward visits every index, backward visits from the second to last
    /// down to zero, then forward starts again at zero. An empty path visits
    /// nothing.
    pub fn step(self, len: usize) -> (Option<usize>, PatrolState) {
        if len == 0 {
            return (None, PatrolState::Idle);
        }

        match self {
            PatrolState::Idle => PatrolState::SteppingForward { next: 0 }.step(len),
            PatrolState::SteppingForward { next } if next < len => {
                (Some(next), PatrolState::SteppingForward { next: next + 1 })
            }
            PatrolState::SteppingForward { .. } => match len.checked_sub(2) {
                Some(index) => (
                    Some(index),
                    PatrolState::SteppingBackward {
                        next: index.checked_sub(1),
                    },
                ),
                None => PatrolState::SteppingForward { next: 0 }.step(len),
            },
            PatrolState::SteppingBackward { next: Some(index) } => (
                Some(index),
                PatrolState::SteppingBackward {
                    next: index.checked_sub(1),
                },
            ),
            PatrolState::SteppingBackward { next: None } => {
                PatrolState::SteppingForward { next: 0 }.step(len)
            }
        }
    }
}

/// Replays a path one waypoint every `N` ticks, forever, forward then back.
#[derive(Debug, Clone)]
pub struct PathReplay {
    waypoints: Vec<Position>,
    state: PatrolState,
    wait: TickWait,
}

impl PathReplay {
    /// Waypoints are normalized to the center of their block cell.
    ///
    /// Fails with [`Error::InvalidPath`] if any coordinate is NaN or infinite.
    pub fn new(waypoints: Vec<Position>, step_ticks: u64) -> Result<Self> {
        Self::with_interest(waypoints, step_ticks, EventMatcherSet::new())
    }

    /// Like [`PathReplay::new`], also waking for anything in `interest`
    pub fn with_interest(
        waypoints: Vec<Position>,
        step_ticks: u64,
        interest: EventMatcherSet,
    ) -> Result<Self> {
        if let Some((index, bad)) = waypoints
            .iter()
            .enumerate()
            .find(|(_, pos)| !pos.is_finite())
        {
            return Err(Error::InvalidPath(format!(
                "waypoint {} has a non-finite coordinate: {}",
                index, bad
            )));
        }

        Ok(Self {
            waypoints: waypoints.iter().map(Position::cell_center).collect(),
            state: PatrolState::Idle,
            wait: TickWait::with_interest(step_ticks, interest),
        })
    }

    /// Build from a path as returned by `find_path_to`
    pub fn from_blocks(path: &[BlockPosition], step_ticks: u64) -> Result<Self> {
        Self::new(path.iter().copied().map(Position::from).collect(), step_ticks)
    }

    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }

    pub fn state(&self) -> PatrolState {
        self.state
    }

    /// Wait for one event and act on it.
    ///
    /// Returns the waypoint index moved to, or `None` when the event was not
    /// the step timer (or the path is empty).
    pub async fn step<S: WorldSession>(&mut self, session: &mut S) -> Result<Option<usize>> {
        let event = self.wait.next(session).await?;
        let Event::TickReached { tick } = event else {
            debug!(target: "movement", "Patrol woke for {:?}", event);
            return Ok(None);
        };

        let (index, state) = self.state.step(self.waypoints.len());
        self.state = state;

        if let Some(index) = index {
            let waypoint = self.waypoints[index];
            debug!(target: "movement", "Tick {}: moving to waypoint {} at {}", tick, index, waypoint);
            session.teleport_to(waypoint)?;
        }
        Ok(index)
    }

    /// Patrol until a shutdown is requested or the session fails
    pub async fn run<S: WorldSession>(
        &mut self,
        session: &mut S,
        shutdown_rx: Option<watch::Receiver<bool>>,
    ) -> Result<()> {
        info!(
            target: "movement",
            "Starting patrol over {} waypoints, one every {} ticks",
            self.waypoints.len(),
            self.wait.interval()
        );

        loop {
            if shutdown_requested(shutdown_rx.as_ref()) {
                info!(target: "movement", "Patrol stopped");
                return Ok(());
            }
            self.step(session).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visits(len: usize, steps: usize) -> Vec<Option<usize>> {
        let mut state = PatrolState::Idle;
        (0..steps)
            .map(|_| {
                let (index, next) = state.step(len);
                state = next;
                index
            })
            .collect()
    }

    #[test]
    fn test_three_waypoints_ping_pong() {
        let seen: Vec<usize> = visits(3, 10).into_iter().flatten().collect();
        assert_eq!(seen, vec![0, 1, 2, 1, 0, 0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_two_waypoints() {
        let seen: Vec<usize> = visits(2, 6).into_iter().flatten().collect();
        assert_eq!(seen, vec![0, 1, 0, 0, 1, 0]);
    }

    #[test]
    fn test_single_waypoint_stays_put() {
        assert_eq!(visits(1, 4), vec![Some(0); 4]);
    }

    #[test]
    fn test_empty_path_never_moves() {
        assert_eq!(visits(0, 3), vec![None; 3]);
    }

    #[test]
    fn test_states_after_forward_pass() {
        let mut state = PatrolState::Idle;
        for _ in 0..3 {
            state = state.step(3).1;
        }
        assert_eq!(state, PatrolState::SteppingForward { next: 3 });
        state = state.step(3).1;
        assert_eq!(state, PatrolState::SteppingBackward { next: Some(0) });
    }

    #[test]
    fn test_waypoints_are_centered() {
        let replay = PathReplay::from_blocks(
            &[BlockPosition::new(0, 64, 0), BlockPosition::new(-1, 64, 3)],
            1,
        )
        .unwrap();
        assert_eq!(
            replay.waypoints(),
            &[Position::new(0.5, 64.0, 0.5), Position::new(-0.5, 64.0, 3.5)]
        );
    }

    #[test]
    fn test_non_finite_waypoint_rejected() {
        let result = PathReplay::new(
            vec![Position::new(0.0, 64.0, 0.0), Position::new(f64::NAN, 64.0, 0.0)],
            1,
        );
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }
}
