//! Participants over HTTP
//!
//! The router is served on an ephemeral port and both clients talk to it
//! through `HttpApi` and `HttpTransport`, the same path a deployed client
//! takes.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::common::*;
use pairsync::backend::routes::create_router;
use pairsync::backend::AppState;
use pairsync::client::{
    ChatLogSource, CollabSession, Command, ConnectionStatus, DocumentState, ExitOutcome, HttpApi,
    HttpTransport, PublishOutcome, SessionDirectory, Transport,
};
use pairsync::shared::{ClientConfig, Envelope, Language, SessionPatch};

type HttpSession = CollabSession<HttpApi, HttpTransport>;

/// Serve `state` on 127.0.0.1 and return a client config pointing at it
async fn serve(state: AppState) -> ClientConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    ClientConfig::builder()
        .server_url(format!("http://{}", addr))
        .build()
        .unwrap()
}

async fn connect_transport(
    config: &ClientConfig,
    session_id: &str,
    user_id: &str,
) -> (HttpTransport, mpsc::Receiver<Envelope>) {
    let (transport, inbound) = HttpTransport::connect(config, session_id, user_id).unwrap();
    let mut status = transport.status();
    wait_for(&mut status, |s| *s == ConnectionStatus::Connected).await;
    (transport, inbound)
}

async fn join(config: &ClientConfig, user_id: &str) -> (HttpSession, mpsc::Receiver<Envelope>) {
    let api = Arc::new(HttpApi::new(config).unwrap());
    let (transport, inbound) = connect_transport(config, SESSION_ID, user_id).await;
    let session = CollabSession::join(config, api, transport, SESSION_ID, user_id)
        .await
        .unwrap();
    (session, inbound)
}

fn insert(index: u32, text: &str) -> Command {
    Command::Insert {
        index,
        text: text.to_string(),
    }
}

#[tokio::test]
async fn test_edits_and_chat_over_http() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;
    let config = serve(state).await;

    let (mut alice, alice_inbound) = join(&config, ALICE).await;
    let (mut bob, bob_inbound) = join(&config, BOB).await;
    let mut alice_view = alice.watch_view();
    let mut bob_view = bob.watch_view();
    let (alice_commands, alice_rx) = mpsc::channel(16);
    let (bob_commands, bob_rx) = mpsc::channel(16);

    let driver = async {
        alice_commands.send(insert(0, "hello")).await.unwrap();
        wait_for(&mut bob_view, |view| view.text == "hello").await;

        bob_commands
            .send(Command::SendChat("looks good".to_string()))
            .await
            .unwrap();
        wait_for(&mut alice_view, |view| view.chat.len() == 1).await;

        alice_commands.send(Command::Leave).await.unwrap();
        bob_commands.send(Command::Leave).await.unwrap();
    };

    let (alice_exit, bob_exit, ()) = tokio::join!(
        alice.run(alice_inbound, alice_rx),
        bob.run(bob_inbound, bob_rx),
        driver
    );
    assert_eq!(alice_exit, ExitOutcome::Persisted);
    assert_eq!(bob_exit, ExitOutcome::Persisted);

    let api = HttpApi::new(&config).unwrap();
    let stored = api.fetch(SESSION_ID).await.unwrap();
    assert_eq!(DocumentState::decode(stored.document.as_bytes()).text(), "hello");

    let page = api.page(SESSION_ID, 1, 10).await.unwrap();
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].text, "looks good");
    assert_eq!(page.messages[0].sender_id, BOB);
}

#[tokio::test]
async fn test_late_joiner_over_http_catches_up() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;
    let config = serve(state).await;

    let (mut alice, alice_inbound) = join(&config, ALICE).await;
    let mut alice_view = alice.watch_view();
    let (alice_commands, alice_rx) = mpsc::channel(16);

    let late = async {
        alice_commands.send(insert(0, "hello")).await.unwrap();
        wait_for(&mut alice_view, |view| view.text == "hello").await;

        let (mut bob, bob_inbound) = join(&config, BOB).await;
        let mut bob_view = bob.watch_view();
        let (bob_commands, bob_rx) = mpsc::channel(16);

        let driver = async {
            wait_for(&mut bob_view, |view| view.text == "hello").await;
            alice_commands.send(insert(5, " world")).await.unwrap();
            bob_commands.send(insert(0, "// ")).await.unwrap();
            wait_for(&mut bob_view, |view| view.text == "// hello world").await;
            wait_for(&mut alice_view, |view| view.text == "// hello world").await;

            alice_commands.send(Command::Leave).await.unwrap();
            bob_commands.send(Command::Leave).await.unwrap();
        };
        let (bob_exit, ()) = tokio::join!(bob.run(bob_inbound, bob_rx), driver);
        bob_exit
    };

    let (alice_exit, bob_exit) = tokio::join!(alice.run(alice_inbound, alice_rx), late);
    assert_eq!(alice_exit, ExitOutcome::Persisted);
    assert_eq!(bob_exit, ExitOutcome::Persisted);

    let stored = HttpApi::new(&config).unwrap().fetch(SESSION_ID).await.unwrap();
    assert_eq!(
        DocumentState::decode(stored.document.as_bytes()).text(),
        "// hello world"
    );
}

#[tokio::test]
async fn test_reserved_characters_in_ids_stay_in_their_segment() {
    let odd = "pair/7?x#y";
    let state = memory_state();
    seed_session(&state, odd).await;
    seed_session(&state, "pair").await;
    let config = serve(state).await;
    let api = HttpApi::new(&config).unwrap();

    assert_eq!(api.fetch(odd).await.unwrap().id, odd);
    let patched = api
        .patch(odd, &SessionPatch::language(Language::Python))
        .await
        .unwrap();
    assert_eq!(patched.language, Language::Python);
    assert_eq!(api.fetch("pair").await.unwrap().language, Language::JavaScript);

    let (transport, mut inbound) = connect_transport(&config, odd, ALICE).await;
    let greeting = tokio::time::timeout(Duration::from_secs(5), inbound.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(greeting, Envelope::presence(odd, BOB, false));

    let mut doc = DocumentState::new();
    let update = doc.insert(0, "x").unwrap();
    assert_eq!(
        transport.publish(Envelope::document_update(odd, ALICE, update)).await,
        PublishOutcome::Sent
    );
}
