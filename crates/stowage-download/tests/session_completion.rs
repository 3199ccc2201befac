//! Integration tests for session drain handling and the run loop.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{Harness, counting_handler, snapshot};
use stowage_download::{
    DownloadError, DownloadEvent, DownloadRequest, SessionId, TaskId, TaskState, TransferOutcome,
    TransportEvent,
};

async fn start(h: &Harness, url: &str) -> TaskId {
    h.coordinator
        .start(DownloadRequest::new(url))
        .await
        .unwrap()
        .id
}

// ── completion handlers ────────────────────────────────────────────

#[tokio::test]
async fn handler_fires_after_last_task_of_signalled_session() {
    let h = Harness::new();
    let session = SessionId::default();
    let fired = Arc::new(AtomicUsize::new(0));

    let a = start(&h, "https://host/a.jpg").await;
    let b = start(&h, "https://host/b.jpg").await;
    h.coordinator
        .register_completion_handler(session.clone(), counting_handler(&fired))
        .await;

    h.coordinator.on_session_finished_events(&session).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    h.coordinator
        .on_task_finished(&a, TransferOutcome::Failed(DownloadError::Cancelled))
        .await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    h.coordinator
        .on_task_finished(&b, TransferOutcome::Failed(DownloadError::Cancelled))
        .await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // Consumed: later activity does not fire it again.
    h.coordinator.on_session_finished_events(&session).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(h.coordinator.pending_sessions().await.is_empty());
}

#[tokio::test]
async fn handler_fires_on_signal_when_already_drained() {
    let h = Harness::new();
    let session = SessionId::default();
    let fired = Arc::new(AtomicUsize::new(0));

    h.coordinator
        .register_completion_handler(session.clone(), counting_handler(&fired))
        .await;
    assert_eq!(h.coordinator.pending_sessions().await, vec![session.clone()]);

    h.coordinator.on_session_finished_events(&session).await;

    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn late_registration_fires_immediately_once() {
    let h = Harness::new();
    let session = SessionId::default();
    let fired = Arc::new(AtomicUsize::new(0));

    h.coordinator.on_session_finished_events(&session).await;
    h.coordinator
        .register_completion_handler(session.clone(), counting_handler(&fired))
        .await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    let again = Arc::new(AtomicUsize::new(0));
    h.coordinator
        .register_completion_handler(session, counting_handler(&again))
        .await;
    assert_eq!(again.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn replaced_handler_never_fires() {
    let h = Harness::new();
    let session = SessionId::default();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let id = start(&h, "https://host/a.jpg").await;
    h.coordinator
        .register_completion_handler(session.clone(), counting_handler(&first))
        .await;
    h.coordinator
        .register_completion_handler(session.clone(), counting_handler(&second))
        .await;

    h.coordinator.on_session_finished_events(&session).await;
    h.coordinator
        .on_task_finished(&id, TransferOutcome::Failed(DownloadError::Cancelled))
        .await;

    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn other_sessions_do_not_trigger_handler() {
    let h = Harness::new();
    let fired = Arc::new(AtomicUsize::new(0));

    h.coordinator
        .register_completion_handler(SessionId::default(), counting_handler(&fired))
        .await;
    h.coordinator
        .on_session_finished_events(&SessionId::new("elsewhere"))
        .await;

    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn signal_before_a_new_batch_does_not_fire_its_handler() {
    let h = Harness::new();
    let session = SessionId::default();
    let fired = Arc::new(AtomicUsize::new(0));

    // The previous batch signalled with nobody listening.
    h.coordinator.on_session_finished_events(&session).await;

    let id = start(&h, "https://host/a.jpg").await;
    h.coordinator
        .register_completion_handler(session.clone(), counting_handler(&fired))
        .await;
    h.coordinator
        .on_task_finished(&id, TransferOutcome::Failed(DownloadError::Cancelled))
        .await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    h.coordinator.on_session_finished_events(&session).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

// ── reconciliation ─────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_restores_transport_tasks() {
    let h = Harness::new();
    h.transport.set_snapshots(vec![
        snapshot("t1", "https://host/a.jpg", 10, false),
        snapshot("t2", "https://host/b.jpg", 0, false),
    ]);

    let restored = h.coordinator.reconcile_after_restart().await.unwrap();

    assert_eq!(restored.len(), 2);
    let t1 = h.coordinator.lookup_id(&TaskId::new("t1")).await.unwrap();
    let t2 = h.coordinator.lookup_id(&TaskId::new("t2")).await.unwrap();
    assert_eq!(t1.state, TaskState::Transferring);
    assert_eq!(t2.state, TaskState::Pending);
    assert!(h.coordinator.lookup("https://host/b.jpg").await.is_some());

    // Restored tasks behave like fresh ones.
    h.coordinator.on_progress(&t2.id, 5, Some(100)).await;
    assert_eq!(h.emitter.progress().len(), 1);
}

#[tokio::test]
async fn reconcile_keeps_registered_ids_and_is_idempotent() {
    let h = Harness::new();
    let id = start(&h, "https://host/a.jpg").await;
    h.coordinator.on_progress(&id, 40, Some(100)).await;
    h.transport.set_snapshots(vec![snapshot(
        id.as_str(),
        "https://host/a.jpg",
        0,
        false,
    )]);

    let first = h.coordinator.reconcile_after_restart().await.unwrap();
    let second = h.coordinator.reconcile_after_restart().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].bytes_received, 40);
    assert_eq!(h.coordinator.tasks().await.len(), 1);
}

#[tokio::test]
async fn restored_task_still_counts_towards_session_drain() {
    let h = Harness::new();
    let session = SessionId::default();
    let fired = Arc::new(AtomicUsize::new(0));
    h.transport
        .set_snapshots(vec![snapshot("t1", "https://host/a.jpg", 10, true)]);
    h.coordinator.reconcile_after_restart().await.unwrap();

    h.coordinator
        .register_completion_handler(session.clone(), counting_handler(&fired))
        .await;
    h.coordinator.on_session_finished_events(&session).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    h.coordinator
        .on_task_finished(&TaskId::new("t1"), TransferOutcome::Failed(DownloadError::Cancelled))
        .await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unplaced_payload_from_previous_process_is_placed_and_acknowledged() {
    let h = Harness::new();
    h.transport
        .set_snapshots(vec![snapshot("t1", "https://host/media/a.jpg", 3, false)]);
    h.coordinator.reconcile_after_restart().await.unwrap();

    // The transport redelivers the terminal event for the finished payload.
    let payload = h.payload("t1.part", b"abc");
    h.coordinator
        .on_task_finished(&TaskId::new("t1"), TransferOutcome::Finished { location: payload })
        .await;

    assert_eq!(std::fs::read(h.store_path("a.jpg")).unwrap(), b"abc");
    assert_eq!(h.transport.acknowledged(), vec![TaskId::new("t1")]);
    assert!(h.coordinator.tasks().await.is_empty());
}

// ── run loop ───────────────────────────────────────────────────────

#[tokio::test]
async fn run_loop_applies_events_in_order() {
    let h = Harness::new();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = h.coordinator.spawn(rx).expect("first spawn starts the loop");
    let (_tx2, rx2) = tokio::sync::mpsc::unbounded_channel();
    assert!(h.coordinator.spawn(rx2).is_none());

    let fired = Arc::new(AtomicUsize::new(0));
    h.coordinator
        .register_completion_handler(SessionId::default(), counting_handler(&fired))
        .await;
    let id = start(&h, "https://host/media/a.jpg").await;
    let payload = h.payload("p.part", b"abc");

    tx.send(TransportEvent::progress(id.clone(), 1, Some(3))).unwrap();
    tx.send(TransportEvent::progress(id.clone(), 3, Some(3))).unwrap();
    tx.send(TransportEvent::finished(id.clone(), payload)).unwrap();
    tx.send(TransportEvent::SessionFinished {
        session: SessionId::default(),
    })
    .unwrap();
    drop(tx);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop ends when the channel closes")
        .unwrap();

    let events = h.emitter.events();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], DownloadEvent::Progress { bytes_received: 1, .. }));
    assert!(matches!(events[1], DownloadEvent::Progress { bytes_received: 3, .. }));
    assert!(matches!(events[2], DownloadEvent::Completed { success: true, .. }));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(h.store_path("a.jpg").exists());
}

#[tokio::test]
async fn shutdown_stops_the_loop() {
    let h = Harness::new();
    let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = h.coordinator.spawn(rx).unwrap();

    h.coordinator.shutdown();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop stops on shutdown")
        .unwrap();
}
