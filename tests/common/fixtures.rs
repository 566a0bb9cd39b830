//! App state and record fixtures

use axum_test::TestServer;
use std::time::Duration;
use tokio::sync::watch;

use pairsync::backend::routes::create_router;
use pairsync::backend::store::{connect_sqlite, Stores};
use pairsync::backend::AppState;
use pairsync::shared::{Language, NewQuestion, NewSession, Participants, Session};

pub const SESSION_ID: &str = "abc123";
pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

/// App state on fresh in-memory stores
pub fn memory_state() -> AppState {
    AppState::new(Stores::memory(), 64)
}

/// App state on a migrated in-memory SQLite database
pub async fn sqlite_state() -> AppState {
    let pool = connect_sqlite("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");
    AppState::new(Stores::sqlite(pool), 64)
}

/// HTTP test server over `state`
pub fn test_server(state: AppState) -> TestServer {
    TestServer::new(create_router(state)).expect("Failed to start test server")
}

pub fn new_session(id: &str) -> NewSession {
    NewSession {
        id: id.to_string(),
        participants: Participants::new(ALICE, BOB).unwrap(),
        question_id: 1090,
        language: Language::JavaScript,
    }
}

/// Insert the alice/bob session `id`
pub async fn seed_session(state: &AppState, id: &str) -> Session {
    state
        .stores
        .sessions
        .create(new_session(id).into_session(chrono::Utc::now()))
        .await
        .expect("Failed to seed session")
}

pub fn new_question(title: &str, complexity: &str, categories: &[&str]) -> NewQuestion {
    NewQuestion {
        title: title.to_string(),
        description: format!("{} description", title),
        category: categories.iter().map(|c| c.to_string()).collect(),
        complexity: complexity.to_string(),
    }
}

/// Wait until `predicate` holds for the watched value
pub async fn wait_for<T, F>(rx: &mut watch::Receiver<T>, predicate: F)
where
    F: Fn(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|value| predicate(value)))
        .await
        .expect("Timed out waiting for condition")
        .expect("Watch sender dropped");
}
