//! Two participants in one process
//!
//! Both clients run the real `CollabSession` loop against the relay and
//! stores of one `AppState` through the in-process transport.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::common::*;
use pairsync::client::{
    ClientError, CollabSession, Command, DocumentState, ExitOutcome, LocalDirectory,
    LocalTransport, PublishOutcome, Transport,
};
use pairsync::shared::{ClientConfig, Envelope, Language};

type LocalSession = CollabSession<LocalDirectory, LocalTransport>;

async fn join(
    state: &pairsync::backend::AppState,
    user_id: &str,
) -> (LocalSession, mpsc::Receiver<Envelope>) {
    let directory = Arc::new(LocalDirectory::new(state));
    let (transport, inbound) = LocalTransport::connect(state, SESSION_ID, user_id)
        .await
        .unwrap();
    let session = CollabSession::join(&ClientConfig::default(), directory, transport, SESSION_ID, user_id)
        .await
        .unwrap();
    (session, inbound)
}

/// Next envelope matching `predicate`, skipping others
async fn next_matching<F>(inbound: &mut mpsc::Receiver<Envelope>, predicate: F) -> Envelope
where
    F: Fn(&Envelope) -> bool,
{
    loop {
        let envelope = tokio::time::timeout(Duration::from_secs(5), inbound.recv())
            .await
            .expect("Timed out waiting for envelope")
            .expect("Inbound closed");
        if predicate(&envelope) {
            return envelope;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_typed_text_converges_and_is_checkpointed() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;

    let (mut alice, alice_inbound) = join(&state, ALICE).await;
    let (mut bob, bob_inbound) = join(&state, BOB).await;
    let mut bob_view = bob.watch_view();

    let (alice_commands, alice_rx) = mpsc::channel(16);
    let (bob_commands, bob_rx) = mpsc::channel(16);

    let driver = async {
        alice_commands
            .send(Command::Insert {
                index: 0,
                text: "hello".to_string(),
            })
            .await
            .unwrap();
        wait_for(&mut bob_view, |view| view.text == "hello").await;

        tokio::time::sleep(Duration::from_secs(61)).await;
        let stored = state.stores.sessions.get(SESSION_ID).await.unwrap().unwrap();
        assert_eq!(DocumentState::decode(stored.document.as_bytes()).text(), "hello");

        alice_commands.send(Command::Leave).await.unwrap();
        bob_commands.send(Command::Leave).await.unwrap();
    };

    let (alice_exit, bob_exit, ()) = tokio::join!(
        alice.run(alice_inbound, alice_rx),
        bob.run(bob_inbound, bob_rx),
        driver
    );

    assert_eq!(bob.text(), "hello");
    assert_eq!(alice_exit, ExitOutcome::Persisted);
    assert_eq!(bob_exit, ExitOutcome::Persisted);
}

/// Feed both participants their inbound envelopes until the traffic stops
async fn settle(
    alice: &mut LocalSession,
    alice_inbound: &mut mpsc::Receiver<Envelope>,
    bob: &mut LocalSession,
    bob_inbound: &mut mpsc::Receiver<Envelope>,
) {
    let mut quiet_rounds = 0;
    while quiet_rounds < 3 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let mut handled = 0;
        while let Ok(envelope) = alice_inbound.try_recv() {
            alice.handle(envelope).await;
            handled += 1;
        }
        while let Ok(envelope) = bob_inbound.try_recv() {
            bob.handle(envelope).await;
            handled += 1;
        }
        quiet_rounds = if handled == 0 { quiet_rounds + 1 } else { 0 };
    }
}

#[tokio::test]
async fn test_late_joiner_catches_up_before_checkpointing() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;

    let (mut alice, mut alice_inbound) = join(&state, ALICE).await;
    alice.insert(0, "hello").await;

    // the stored snapshot predates alice's edit
    let (mut bob, mut bob_inbound) = join(&state, BOB).await;
    assert_eq!(bob.text(), "");
    alice.insert(5, " world").await;

    settle(&mut alice, &mut alice_inbound, &mut bob, &mut bob_inbound).await;
    assert_eq!(bob.text(), "hello world");

    assert_eq!(alice.leave().await, ExitOutcome::Persisted);
    bob.insert(0, "x").await;
    assert_eq!(bob.leave().await, ExitOutcome::Persisted);

    let stored = state.stores.sessions.get(SESSION_ID).await.unwrap().unwrap();
    assert_eq!(DocumentState::decode(stored.document.as_bytes()).text(), "xhello world");
}

#[tokio::test]
async fn test_edits_made_alone_reach_a_returning_peer() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;
    let (mut alice, mut alice_inbound) = join(&state, ALICE).await;
    let (mut bob, mut bob_inbound) = join(&state, BOB).await;
    alice.insert(0, "shared").await;
    settle(&mut alice, &mut alice_inbound, &mut bob, &mut bob_inbound).await;
    assert_eq!(bob.text(), "shared");

    // alice drops out without a checkpoint of bob's later work
    drop(alice);
    drop(alice_inbound);
    bob.insert(6, " draft").await;

    let (mut alice, mut alice_inbound) = join(&state, ALICE).await;
    settle(&mut alice, &mut alice_inbound, &mut bob, &mut bob_inbound).await;
    assert_eq!(alice.text(), "shared draft");
    assert!(bob.peer_online());
}

#[tokio::test]
async fn test_leave_persists_edits_made_before_first_tick() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;
    let (mut alice, alice_inbound) = join(&state, ALICE).await;

    let (commands, rx) = mpsc::channel(16);
    commands
        .send(Command::Insert {
            index: 0,
            text: "fn main() {}".to_string(),
        })
        .await
        .unwrap();
    commands.send(Command::Leave).await.unwrap();

    assert_eq!(alice.run(alice_inbound, rx).await, ExitOutcome::Persisted);
    let stored = state.stores.sessions.get(SESSION_ID).await.unwrap().unwrap();
    assert_eq!(DocumentState::decode(stored.document.as_bytes()).text(), "fn main() {}");
}

#[tokio::test]
async fn test_rejoin_restores_document() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;

    let (mut alice, _inbound) = join(&state, ALICE).await;
    alice.insert(0, "saved").await;
    alice.leave().await;
    drop(alice);

    let (bob, _inbound) = join(&state, BOB).await;
    assert_eq!(bob.text(), "saved");
}

#[tokio::test]
async fn test_remote_language_change_is_not_echoed() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;
    let (mut alice, mut alice_inbound) = join(&state, ALICE).await;
    let (mut bob, mut bob_inbound) = join(&state, BOB).await;

    assert_eq!(alice.select_language(Language::Python).await, Some(Language::Python));

    let notice = next_matching(&mut bob_inbound, |e| {
        matches!(e, Envelope::LanguageChange { .. })
    })
    .await;
    bob.handle(notice).await;
    assert_eq!(bob.language(), Language::Python);

    // the editor reports the applied change back as a selection
    assert_eq!(bob.select_language(Language::Python).await, None);

    tokio::task::yield_now().await;
    while let Ok(envelope) = alice_inbound.try_recv() {
        assert!(!matches!(envelope, Envelope::LanguageChange { .. }));
    }

    let stored = state.stores.sessions.get(SESSION_ID).await.unwrap().unwrap();
    assert_eq!(stored.language, Language::Python);
}

#[tokio::test]
async fn test_chat_roundtrip_and_history() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;
    let (mut alice, mut alice_inbound) = join(&state, ALICE).await;
    let (mut bob, mut bob_inbound) = join(&state, BOB).await;

    alice.send_chat("ready when you are").await.unwrap();
    assert!(alice.chat().is_empty());

    let echo = next_matching(&mut alice_inbound, |e| matches!(e, Envelope::Chat(_))).await;
    alice.handle(echo).await;
    let delivered = next_matching(&mut bob_inbound, |e| matches!(e, Envelope::Chat(_))).await;
    bob.handle(delivered).await;

    assert_eq!(alice.chat(), bob.chat());
    assert_eq!(bob.chat()[0].text, "ready when you are");

    // a late joiner gets the same history from the archive
    let (mut late, _inbound) = join(&state, BOB).await;
    let directory = LocalDirectory::new(&state);
    assert_eq!(late.load_chat_history(&directory, 10).await.unwrap(), 1);
    assert_eq!(late.chat(), alice.chat());

    assert!(matches!(
        alice.send_chat("   ").await,
        Err(ClientError::Shared(_))
    ));
}

#[tokio::test]
async fn test_disconnected_publish_is_dropped() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;
    let (_bob, mut bob_inbound) = join(&state, BOB).await;
    let (mut alice, _alice_inbound) = join(&state, ALICE).await;

    assert_eq!(alice.insert(0, "x").await, PublishOutcome::Sent);
    let update = next_matching(&mut bob_inbound, |e| {
        matches!(e, Envelope::DocumentUpdate { .. })
    })
    .await;
    assert_eq!(update.sender_id(), Some(ALICE));

    let (transport, _inbound) = LocalTransport::connect(&state, SESSION_ID, ALICE)
        .await
        .unwrap();
    transport.disconnect();
    assert!(!transport.is_connected());

    // the edit stays local
    let directory = Arc::new(LocalDirectory::new(&state));
    let mut offline =
        CollabSession::join(&ClientConfig::default(), directory, transport, SESSION_ID, ALICE)
            .await
            .unwrap();
    assert_eq!(offline.insert(0, "local only").await, PublishOutcome::Dropped);
    assert_eq!(offline.text(), "local only");
}

#[tokio::test]
async fn test_outsider_cannot_connect() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;
    let result = LocalTransport::connect(&state, SESSION_ID, "mallory").await;
    assert!(matches!(
        result,
        Err(ClientError::Status { status: 403, .. })
    ));
}
