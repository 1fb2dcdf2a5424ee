use crate::shutdown::{ShutdownController, ShutdownMode};

use std::time::Duration;

use tokio::time::timeout;

/// **VALUE**: Shutdown modes only move forward.
///
/// **WHY THIS MATTERS**: A late SIGTERM arriving after SIGUSR1 must not turn a kill back
/// into a drain, or the server would wait on connections it already closed.
///
/// **BUG THIS CATCHES**: Would catch `request` overwriting the mode unconditionally.
#[test]
fn given_kill_requested_when_drain_requested_then_mode_stays_kill() {
    // GIVEN: A controller already in kill mode
    let controller = ShutdownController::new();
    assert!(controller.request(ShutdownMode::Kill));

    // WHEN: A drain is requested afterwards
    let escalated = controller.request(ShutdownMode::Drain);

    // THEN: The request is ignored
    assert!(!escalated);
    assert_eq!(controller.mode(), ShutdownMode::Kill);
}

#[test]
fn given_running_when_drain_then_kill_requested_then_both_escalate() {
    // GIVEN: A fresh controller
    let controller = ShutdownController::new();
    assert_eq!(controller.mode(), ShutdownMode::Running);

    // WHEN/THEN: Each step escalates once, repeats are ignored
    assert!(controller.request(ShutdownMode::Drain));
    assert!(!controller.request(ShutdownMode::Drain));
    assert!(controller.request(ShutdownMode::Kill));
    assert!(!controller.request(ShutdownMode::Running));
    assert_eq!(controller.mode(), ShutdownMode::Kill);
}

#[tokio::test]
async fn given_listener_when_drain_requested_then_stopping_resolves_with_drain() {
    // GIVEN: A listener waiting for shutdown
    let controller = ShutdownController::new();
    let mut listener = controller.subscribe();
    let waiter = tokio::spawn(async move { listener.stopping().await });

    // WHEN: Drain is requested
    controller.request(ShutdownMode::Drain);

    // THEN: The listener observes drain
    let mode = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    assert_eq!(mode, ShutdownMode::Drain);
}

#[tokio::test]
async fn given_subscribed_after_kill_when_waiting_then_resolves_immediately() {
    // GIVEN: A controller already in kill mode
    let controller = ShutdownController::new();
    controller.request(ShutdownMode::Kill);

    // WHEN: A new listener waits
    let mut listener = controller.subscribe();

    // THEN: Both waits complete at once
    assert_eq!(
        timeout(Duration::from_secs(1), listener.stopping()).await.unwrap(),
        ShutdownMode::Kill
    );
    timeout(Duration::from_secs(1), listener.killed()).await.unwrap();
}

#[tokio::test]
async fn given_drain_when_waiting_for_kill_then_does_not_resolve_until_kill() {
    // GIVEN: A controller in drain mode
    let controller = ShutdownController::new();
    controller.request(ShutdownMode::Drain);
    let mut listener = controller.subscribe();

    // WHEN: Waiting briefly for kill
    let early = timeout(Duration::from_millis(100), listener.killed()).await;

    // THEN: It has not resolved
    assert!(early.is_err());

    // WHEN: Kill is requested
    controller.request(ShutdownMode::Kill);

    // THEN: killed() resolves
    timeout(Duration::from_secs(1), listener.killed()).await.unwrap();
}

#[test]
fn given_modes_when_displayed_then_lowercase_names() {
    assert_eq!(ShutdownMode::Running.to_string(), "running");
    assert_eq!(ShutdownMode::Drain.to_string(), "drain");
    assert_eq!(ShutdownMode::Kill.to_string(), "kill");
}
