use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::EventKind;

/// One condition a caller can wait on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventMatcher {
    /// Satisfied once the tick counter is at or past the target
    OnTick(u64),
    OnHealthChange,
    OnRosterChange,
    OnChat,
}

impl EventMatcher {
    pub fn kind(&self) -> EventKind {
        match self {
            EventMatcher::OnTick(_) => EventKind::Tick,
            EventMatcher::OnHealthChange => EventKind::Health,
            EventMatcher::OnRosterChange => EventKind::Roster,
            EventMatcher::OnChat => EventKind::Chat,
        }
    }
}

static NEXT_TICK_REGISTRATION: AtomicU64 = AtomicU64::new(1);

/// The combined wait condition for one `listen_for` call.
///
/// Holds at most one matcher per [`EventKind`]; adding a kind that is already
/// present replaces it. Clones are independent values.
///
/// Every tick matcher added gets a fresh registration id, which copies keep.
/// A tick registration fires once, so passing the same set again does not
/// refire while a newly registered target does.
#[derive(Debug, Clone, Default)]
pub struct EventMatcherSet {
    matchers: BTreeMap<EventKind, EventMatcher>,
    tick_registration: Option<u64>,
}

impl PartialEq for EventMatcherSet {
    fn eq(&self, other: &Self) -> bool {
        self.matchers == other.matchers
    }
}

impl Eq for EventMatcherSet {}

impl EventMatcherSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a matcher, replacing any matcher of the same kind
    pub fn insert(&mut self, matcher: EventMatcher) {
        if let EventMatcher::OnTick(_) = matcher {
            self.tick_registration = Some(NEXT_TICK_REGISTRATION.fetch_add(1, Ordering::Relaxed));
        }
        self.matchers.insert(matcher.kind(), matcher);
    }

    pub fn listen_tick(&mut self, target_tick: u64) {
        self.insert(EventMatcher::OnTick(target_tick));
    }

    pub fn listen_health(&mut self) {
        self.insert(EventMatcher::OnHealthChange);
    }

    pub fn listen_roster(&mut self) {
        self.insert(EventMatcher::OnRosterChange);
    }

    pub fn listen_chat(&mut self) {
        self.insert(EventMatcher::OnChat);
    }

    /// Remove the matcher of the given kind, returning it if present
    pub fn clear(&mut self, kind: EventKind) -> Option<EventMatcher> {
        if kind == EventKind::Tick {
            self.tick_registration = None;
        }
        self.matchers.remove(&kind)
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.matchers.contains_key(&kind)
    }

    pub fn tick_target(&self) -> Option<u64> {
        match self.matchers.get(&EventKind::Tick) {
            Some(EventMatcher::OnTick(target)) => Some(*target),
            _ => None,
        }
    }

    /// Identifies the current tick matcher, if any
    pub fn tick_registration(&self) -> Option<u64> {
        self.tick_registration
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Matchers in dispatch priority order
    pub fn iter(&self) -> impl Iterator<Item = &EventMatcher> {
        self.matchers.values()
    }
}

impl From<&EventMatcherSet> for EventMatcherSet {
    fn from(existing: &EventMatcherSet) -> Self {
        existing.clone()
    }
}

impl FromIterator<EventMatcher> for EventMatcherSet {
    fn from_iter<I: IntoIterator<Item = EventMatcher>>(iter: I) -> Self {
        let mut set = Self::new();
        for matcher in iter {
            set.insert(matcher);
        }
        set
    }
}
