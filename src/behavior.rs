//! "On event X, do Y" policies driven by one fixed matcher set.
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::Result;
use crate::events::{Event, EventMatcherSet};
use crate::movement::shutdown_requested;
use crate::world::WorldSession;

/// Where incoming chat is forwarded instead of being echoed in game
pub trait ChatSink: Send {
    fn chat(&mut self, sender: &str, message: &str);
}

/// Writes chat to the `chat` tracing target
#[derive(Debug, Default)]
pub struct LogSink;

impl ChatSink for LogSink {
    fn chat(&mut self, sender: &str, message: &str) {
        info!(target: "chat", "<{}> {}", sender, message);
    }
}

fn default_health_drop() -> String {
    "Ouch! Health dropped from {old} to {new}".to_string()
}

fn default_greeting() -> String {
    "Hello, {name}!".to_string()
}

fn default_farewell() -> String {
    "Goodbye, {name}!".to_string()
}

/// Message templates.
///
/// `health_drop` takes `{old}` and `{new}`, rendered with one decimal place;
/// `greeting` and `farewell` take `{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreeterMessages {
    #[serde(default = "default_health_drop")]
    pub health_drop: String,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_farewell")]
    pub farewell: String,
}

impl Default for GreeterMessages {
    fn default() -> Self {
        Self {
            health_drop: default_health_drop(),
            greeting: default_greeting(),
            farewell: default_farewell(),
        }
    }
}

impl GreeterMessages {
    pub fn health_drop(&self, old: f32, new: f32) -> String {
        self.health_drop
            .replace("{old}", &format!("{:.1}", old))
            .replace("{new}", &format!("{:.1}", new))
    }

    pub fn greeting(&self, name: &str) -> String {
        self.greeting.replace("{name}", name)
    }

    pub fn farewell(&self, name: &str) -> String {
        self.farewell.replace("{name}", name)
    }
}

/// Reacts to health, roster and chat events.
///
/// The matcher set is built once and reused for every wait.
pub struct ReactiveBehavior<C: ChatSink = LogSink> {
    matchers: EventMatcherSet,
    messages: GreeterMessages,
    sink: C,
}

impl ReactiveBehavior<LogSink> {
    pub fn new(messages: GreeterMessages) -> Self {
        Self::with_sink(messages, LogSink)
    }
}

impl<C: ChatSink> ReactiveBehavior<C> {
    pub fn with_sink(messages: GreeterMessages, sink: C) -> Self {
        let mut matchers = EventMatcherSet::new();
        matchers.listen_health();
        matchers.listen_roster();
        matchers.listen_chat();

        Self {
            matchers,
            messages,
            sink,
        }
    }

    pub fn matchers(&self) -> &EventMatcherSet {
        &self.matchers
    }

    pub fn sink(&self) -> &C {
        &self.sink
    }

    /// Apply the policy for one event
    pub fn handle<S: WorldSession>(&mut self, session: &mut S, event: &Event) -> Result<()> {
        match event {
            Event::HealthChanged { old, new } => {
                if new < old {
                    session.say(&self.messages.health_drop(*old, *new))?;
                } else {
                    debug!(target: "events", "Health rose from {} to {}", old, new);
                }
            }
            Event::RosterChanged { joined, left } => {
                for name in joined {
                    session.say(&self.messages.greeting(name))?;
                }
                for name in left {
                    session.say(&self.messages.farewell(name))?;
                }
            }
            Event::ChatReceived { sender, message } => {
                self.sink.chat(sender, message);
            }
            Event::TickReached { .. } => {}
        }
        Ok(())
    }

    /// Wait for one event and handle it
    pub async fn step<S: WorldSession>(&mut self, session: &mut S) -> Result<Event> {
        let event = session.listen_for(&self.matchers).await?;
        self.handle(session, &event)?;
        Ok(event)
    }

    pub async fn run<S: WorldSession>(
        &mut self,
        session: &mut S,
        shutdown_rx: Option<watch::Receiver<bool>>,
    ) -> Result<()> {
        info!("Greeter listening as {}", session.username());
        loop {
            if shutdown_requested(shutdown_rx.as_ref()) {
                info!("Greeter stopped");
                return Ok(());
            }
            self.step(session).await?;
        }
    }
}
