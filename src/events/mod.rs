//! Events produced by the dispatcher and the matchers that select them.
//!
//! A caller describes what it wants to wake up for with an [`EventMatcherSet`],
//! hands it to [`WorldSession::listen_for`](crate::world::WorldSession::listen_for)
//! and receives exactly one [`Event`] back.
pub mod matcher;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

pub use matcher::{EventMatcher, EventMatcherSet};

/// Discriminant shared by events and matchers.
///
/// The declaration order is the dispatch priority: when several matchers are
/// satisfied by the same observation step the earliest kind wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub enum EventKind {
    Health,
    Roster,
    Chat,
    Tick,
}

/// A single occurrence in the world, delivered once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// The world tick counter reached or passed a registered target
    TickReached { tick: u64 },
    /// Health differs from the value last reported to the caller
    HealthChanged { old: f32, new: f32 },
    /// Net roster difference since the last reported roster, both lists sorted
    RosterChanged {
        joined: Vec<String>,
        left: Vec<String>,
    },
    /// A chat message from another player
    ChatReceived { sender: String, message: String },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::TickReached { .. } => EventKind::Tick,
            Event::HealthChanged { .. } => EventKind::Health,
            Event::RosterChanged { .. } => EventKind::Roster,
            Event::ChatReceived { .. } => EventKind::Chat,
        }
    }
}
