use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::events::{Event, EventKind, EventMatcher, EventMatcherSet};
use crate::world::{ChatMessage, WorldState};

/// Matches observed world state against a caller's matcher set.
///
/// Tracks what has already been reported so that every change is delivered at
/// most once. A change that lost a tie-break stays pending for the next call;
/// a change nobody was listening for is dropped.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    reported_health: f32,
    reported_roster: BTreeSet<String>,
    pending_chat: VecDeque<ChatMessage>,
    spent_tick_registration: Option<u64>,
}

impl Dispatcher {
    /// Start with the given state as already reported
    pub fn new(world: &WorldState) -> Self {
        Self {
            reported_health: world.health(),
            reported_roster: world.players().clone(),
            pending_chat: VecDeque::new(),
            spent_tick_registration: None,
        }
    }

    pub fn queue_chat(&mut self, message: ChatMessage) {
        self.pending_chat.push_back(message);
    }

    pub fn pending_chat(&self) -> usize {
        self.pending_chat.len()
    }

    /// Evaluate one observation step, returning at most one event.
    ///
    /// Matchers are tried in priority order and the first satisfied one wins.
    pub fn evaluate(
        &mut self,
        matchers: &EventMatcherSet,
        world: &WorldState,
        current_tick: u64,
    ) -> Option<Event> {
        let event = matchers.iter().find_map(|matcher| match matcher {
            EventMatcher::OnHealthChange => self.take_health_change(world),
            EventMatcher::OnRosterChange => self.take_roster_change(world),
            EventMatcher::OnChat => self.take_chat(),
            EventMatcher::OnTick(target) => {
                self.take_tick(*target, matchers.tick_registration(), current_tick)
            }
        });

        self.forget_unwatched(matchers, world);

        if let Some(ref event) = event {
            debug!(target: "events", "Dispatching {:?}", event);
        }
        event
    }

    fn take_health_change(&mut self, world: &WorldState) -> Option<Event> {
        let new = world.health();
        // NaN is not a health reading
        if new.is_nan() || new == self.reported_health {
            return None;
        }
        let old = std::mem::replace(&mut self.reported_health, new);
        Some(Event::HealthChanged { old, new })
    }

    fn take_roster_change(&mut self, world: &WorldState) -> Option<Event> {
        let current = world.players();
        if *current == self.reported_roster {
            return None;
        }
        let (joined, left) = roster_diff(&self.reported_roster, current);
        self.reported_roster = current.clone();
        Some(Event::RosterChanged { joined, left })
    }

    fn take_chat(&mut self) -> Option<Event> {
        self.pending_chat
            .pop_front()
            .map(|ChatMessage { sender, message }| Event::ChatReceived { sender, message })
    }

    fn take_tick(
        &mut self,
        target: u64,
        registration: Option<u64>,
        current_tick: u64,
    ) -> Option<Event> {
        if current_tick < target || self.spent_tick_registration == registration {
            return None;
        }
        self.spent_tick_registration = registration;
        Some(Event::TickReached { tick: current_tick })
    }

    fn forget_unwatched(&mut self, matchers: &EventMatcherSet, world: &WorldState) {
        if !matchers.contains(EventKind::Health) && !world.health().is_nan() {
            self.reported_health = world.health();
        }
        if !matchers.contains(EventKind::Roster) && self.reported_roster != *world.players() {
            self.reported_roster = world.players().clone();
        }
        if !matchers.contains(EventKind::Chat) {
            self.pending_chat.clear();
        }
    }
}

/// Names present only in `current`, and names present only in `previous`
pub fn roster_diff(
    previous: &BTreeSet<String>,
    current: &BTreeSet<String>,
) -> (Vec<String>, Vec<String>) {
    let joined = current.difference(previous).cloned().collect();
    let left = previous.difference(current).cloned().collect();
    (joined, left)
}
