pub mod behavior;
pub mod blocks;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod geom;
pub mod logging;
pub mod movement;
pub mod session;
pub mod sim;
pub mod world;

pub use behavior::{ChatSink, GreeterMessages, LogSink, ReactiveBehavior};
pub use error::{Error, Result};
pub use events::{Event, EventKind, EventMatcher, EventMatcherSet};
pub use geom::{BlockPosition, Position};
pub use movement::{Accumulator, Facing, PathReplay, PatrolState, PeriodicAction, TickWait};
pub use session::Session;
pub use world::{BotAction, ChatMessage, WorldSession, WorldUpdate};
