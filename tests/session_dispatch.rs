use std::time::Duration;

use minebot::clock::TICK_DURATION;
use minebot::{
    BotAction, ChatMessage, Error, Event, EventMatcherSet, Position, Session, WorldSession,
    WorldUpdate,
};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

fn connect() -> (
    Session,
    mpsc::UnboundedSender<WorldUpdate>,
    mpsc::UnboundedReceiver<BotAction>,
) {
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let (actions_tx, actions_rx) = mpsc::unbounded_channel();
    (Session::new("bilbo", updates_rx, actions_tx), updates_tx, actions_rx)
}

fn chat(sender: &str, message: &str) -> WorldUpdate {
    WorldUpdate::ChatReceived(ChatMessage::new(sender, message))
}

fn health(health: f32) -> WorldUpdate {
    WorldUpdate::HealthUpdated { health, food: 20.0 }
}

#[tokio::test(start_paused = true)]
async fn test_tick_never_fires_early() {
    let (mut session, _updates, _actions) = connect();
    let start = Instant::now();

    let mut matchers = EventMatcherSet::new();
    matchers.listen_tick(3);
    let event = session.listen_for(&matchers).await.unwrap();

    assert_eq!(event, Event::TickReached { tick: 3 });
    assert!(start.elapsed() >= TICK_DURATION * 3);
}

#[tokio::test(start_paused = true)]
async fn test_past_tick_target_fires_immediately() {
    let (mut session, updates, _actions) = connect();
    updates.send(WorldUpdate::TimeUpdate { world_age: 1000 }).unwrap();
    let start = Instant::now();

    let mut matchers = EventMatcherSet::new();
    matchers.listen_tick(500);
    let event = session.listen_for(&matchers).await.unwrap();

    assert_eq!(event, Event::TickReached { tick: 1000 });
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(session.clock().is_synced());
}

#[tokio::test(start_paused = true)]
async fn test_reached_tick_fires_once_per_registration() {
    let (session, _updates, _actions) = connect();
    let mut session = session.with_max_wait(Duration::from_secs(5));

    let mut first = EventMatcherSet::new();
    first.listen_tick(3);
    assert_eq!(
        session.listen_for(&first).await.unwrap(),
        Event::TickReached { tick: 3 }
    );

    // The same registration passed again does not refire
    let result = session.listen_for(&first).await;
    assert!(matches!(result, Err(Error::TimedOut(_))));
    assert!(session.current_tick() > 3);

    // A new registration of an already reached target fires at once
    let start = Instant::now();
    let mut again = EventMatcherSet::new();
    again.listen_tick(3);
    let event = session.listen_for(&again).await.unwrap();
    assert_eq!(
        event,
        Event::TickReached {
            tick: session.current_tick()
        }
    );
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_nan_health_ignored() {
    let (mut session, updates, _actions) = connect();
    updates.send(health(f32::NAN)).unwrap();

    let mut matchers = EventMatcherSet::new();
    matchers.listen_health();
    matchers.listen_tick(2);
    assert_eq!(
        session.listen_for(&matchers).await.unwrap(),
        Event::TickReached { tick: 2 }
    );

    updates.send(health(17.0)).unwrap();
    let mut matchers = EventMatcherSet::new();
    matchers.listen_health();
    assert_eq!(
        session.listen_for(&matchers).await.unwrap(),
        Event::HealthChanged { old: 20.0, new: 17.0 }
    );
}

#[tokio::test(start_paused = true)]
async fn test_health_change_reported_once() {
    let (mut session, updates, _actions) = connect();
    updates.send(health(15.0)).unwrap();

    let mut matchers = EventMatcherSet::new();
    matchers.listen_health();
    let event = session.listen_for(&matchers).await.unwrap();
    assert_eq!(event, Event::HealthChanged { old: 20.0, new: 15.0 });

    // Same value again is not a change
    updates.send(health(15.0)).unwrap();
    let mut later = EventMatcherSet::new();
    later.listen_health();
    later.listen_tick(session.current_tick() + 2);
    let event = session.listen_for(&later).await.unwrap();
    assert!(matches!(event, Event::TickReached { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_roster_reports_net_change() {
    let (mut session, updates, _actions) = connect();
    for update in [
        WorldUpdate::PlayerJoined { name: "sam".into() },
        WorldUpdate::PlayerJoined { name: "frodo".into() },
        WorldUpdate::PlayerJoined { name: "merry".into() },
        WorldUpdate::PlayerLeft { name: "merry".into() },
    ] {
        updates.send(update).unwrap();
    }

    let mut matchers = EventMatcherSet::new();
    matchers.listen_roster();
    let event = session.listen_for(&matchers).await.unwrap();

    assert_eq!(
        event,
        Event::RosterChanged {
            joined: vec!["frodo".into(), "sam".into()],
            left: vec![],
        }
    );
    assert!(session.player_names().contains("frodo"));
}

#[tokio::test(start_paused = true)]
async fn test_chat_delivered_in_order_without_own_lines() {
    let (mut session, updates, _actions) = connect();
    updates.send(chat("frodo", "one")).unwrap();
    updates.send(chat("bilbo", "talking to myself")).unwrap();
    updates.send(chat("sam", "two")).unwrap();

    let mut matchers = EventMatcherSet::new();
    matchers.listen_chat();

    let first = session.listen_for(&matchers).await.unwrap();
    let second = session.listen_for(&matchers).await.unwrap();
    assert_eq!(
        first,
        Event::ChatReceived {
            sender: "frodo".into(),
            message: "one".into()
        }
    );
    assert_eq!(
        second,
        Event::ChatReceived {
            sender: "sam".into(),
            message: "two".into()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_tie_break_keeps_loser_pending() {
    let (mut session, updates, _actions) = connect();
    updates.send(chat("frodo", "ouch?")).unwrap();
    updates.send(health(12.0)).unwrap();

    let mut matchers = EventMatcherSet::new();
    matchers.listen_chat();
    matchers.listen_health();

    let first = session.listen_for(&matchers).await.unwrap();
    let second = session.listen_for(&matchers).await.unwrap();
    assert_eq!(first, Event::HealthChanged { old: 20.0, new: 12.0 });
    assert!(matches!(second, Event::ChatReceived { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_unwatched_changes_are_dropped() {
    let (mut session, updates, _actions) = connect();
    updates.send(health(10.0)).unwrap();
    updates.send(chat("frodo", "anyone?")).unwrap();

    let mut ticks = EventMatcherSet::new();
    ticks.listen_tick(1);
    session.listen_for(&ticks).await.unwrap();

    let mut matchers = EventMatcherSet::new();
    matchers.listen_health();
    matchers.listen_chat();
    matchers.listen_tick(3);
    let event = session.listen_for(&matchers).await.unwrap();
    assert_eq!(event, Event::TickReached { tick: 3 });
}

#[tokio::test(start_paused = true)]
async fn test_empty_matcher_set_rejected() {
    let (mut session, _updates, _actions) = connect();
    let result = session.listen_for(&EventMatcherSet::new()).await;
    assert!(matches!(result, Err(Error::EmptyMatcherSet)));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_fails_wait_and_actions() {
    let (mut session, updates, _actions) = connect();
    drop(updates);

    let mut matchers = EventMatcherSet::new();
    matchers.listen_health();
    let result = session.listen_for(&matchers).await;

    assert!(matches!(result, Err(Error::SessionDisconnected)));
    assert!(session.is_disconnected());
    assert!(matches!(session.say("hello?"), Err(Error::SessionDisconnected)));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_wait() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (session, _updates, _actions) = connect();
    let mut session = session.with_shutdown(shutdown_rx);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        shutdown_tx.send(true).unwrap();
    });

    let mut matchers = EventMatcherSet::new();
    matchers.listen_chat();
    let result = session.listen_for(&matchers).await;
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn test_max_wait_times_out() {
    let (session, _updates, _actions) = connect();
    let mut session = session.with_max_wait(Duration::from_secs(1));

    let mut matchers = EventMatcherSet::new();
    matchers.listen_roster();
    let result = session.listen_for(&matchers).await;
    assert!(matches!(result, Err(Error::TimedOut(d)) if d == Duration::from_secs(1)));
}

#[tokio::test(start_paused = true)]
async fn test_death_requests_respawn() {
    let (mut session, updates, mut actions) = connect();
    updates.send(health(0.0)).unwrap();

    let mut matchers = EventMatcherSet::new();
    matchers.listen_health();
    let event = session.listen_for(&matchers).await.unwrap();

    assert_eq!(event, Event::HealthChanged { old: 20.0, new: 0.0 });
    assert_eq!(actions.try_recv().unwrap(), BotAction::Respawn);
}

#[tokio::test(start_paused = true)]
async fn test_actions_reach_connection() {
    let (mut session, _updates, mut actions) = connect();
    let target = Position::new(1.5, 64.0, -2.5);

    session.teleport_to(target).unwrap();
    session.set_yaw(90.0).unwrap();
    session.say("hi").unwrap();
    session.enable_move(true).unwrap();

    assert_eq!(session.position(), target);
    assert!(session.world().is_moving());
    assert_eq!(actions.try_recv().unwrap(), BotAction::Teleport { position: target });
    assert_eq!(actions.try_recv().unwrap(), BotAction::SetYaw { degrees: 90.0 });
    assert_eq!(
        actions.try_recv().unwrap(),
        BotAction::Say {
            message: "hi".into()
        }
    );
    assert_eq!(
        actions.try_recv().unwrap(),
        BotAction::EnableMove { enabled: true }
    );
}
