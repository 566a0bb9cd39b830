//! Store behavior shared by the in-memory and SQLite backends
//!
//! Each check runs against both so the server behaves the same with or
//! without a database.

use pretty_assertions::assert_eq;

use crate::common::*;
use pairsync::backend::questions::PickError;
use pairsync::backend::AppState;
use pairsync::shared::{ChatMessage, Language, SelectionCriterion, SessionPatch, Snapshot};

async fn sessions_contract(state: AppState) {
    seed_session(&state, SESSION_ID).await;
    seed_session(&state, "def456").await;
    let sessions = &state.stores.sessions;

    assert!(sessions
        .create(new_session(SESSION_ID).into_session(chrono::Utc::now()))
        .await
        .is_err());

    let blob = Snapshot::from_bytes(vec![0u8, 159, 146, 150]);
    sessions
        .patch(SESSION_ID, &SessionPatch::document(blob.clone()))
        .await
        .unwrap();
    let patched = sessions
        .patch(SESSION_ID, &SessionPatch::language(Language::Python))
        .await
        .unwrap();
    assert_eq!(patched.document, blob);
    assert_eq!(patched.language, Language::Python);

    assert!(sessions.has_participant(SESSION_ID, BOB).await.unwrap());
    assert!(!sessions.has_participant(SESSION_ID, "mallory").await.unwrap());
    assert_eq!(sessions.list_for_user(ALICE).await.unwrap().len(), 2);

    assert!(sessions.delete("def456").await.unwrap());
    assert!(!sessions.exists("def456").await.unwrap());
    assert!(sessions
        .patch("def456", &SessionPatch::language(Language::Python))
        .await
        .is_err());
}

async fn picker_contract(state: AppState) {
    let questions = &state.stores.questions;
    let active = questions
        .insert(new_question("Graph BFS", "medium", &["graphs"]))
        .await
        .unwrap();
    let retired = questions
        .insert(new_question("Old DFS", "medium", &["graphs", "recursion"]))
        .await
        .unwrap();
    assert_eq!(retired.question_id, active.question_id + 1);
    questions.soft_delete(retired.question_id).await.unwrap();

    // active tier wins whenever it has a match
    for _ in 0..20 {
        let picked = state
            .picker
            .pick(&SelectionCriterion::new("medium", "graphs"))
            .await
            .unwrap();
        assert_eq!(picked, active.question_id);
    }

    // only a deleted question matches: fall back to it
    let picked = state
        .picker
        .pick(&SelectionCriterion::new("medium", "recursion"))
        .await
        .unwrap();
    assert_eq!(picked, retired.question_id);

    assert!(matches!(
        state.picker.pick(&SelectionCriterion::new("hard", "graphs")).await,
        Err(PickError::NotFound)
    ));
}

async fn archive_contract(state: AppState) {
    for n in 1..=25i64 {
        state
            .archive
            .append(ChatMessage::new(SESSION_ID, ALICE, BOB, n.to_string(), n))
            .await
            .unwrap();
    }
    // other sessions never leak in
    state
        .archive
        .append(ChatMessage::new("def456", ALICE, BOB, "elsewhere", 100))
        .await
        .unwrap();

    let page = state.archive.page(SESSION_ID, 2, 10).await.unwrap();
    let texts: Vec<String> = page.messages.iter().map(|m| m.text.clone()).collect();
    assert_eq!(texts, (6..=15).map(|n| n.to_string()).collect::<Vec<_>>());
    assert_eq!(page.pagination.total_logs, 25);
    assert_eq!(page.pagination.total_pages, 3);
}

#[tokio::test]
async fn test_memory_sessions() {
    sessions_contract(memory_state()).await;
}

#[tokio::test]
async fn test_sqlite_sessions() {
    sessions_contract(sqlite_state().await).await;
}

#[tokio::test]
async fn test_memory_picker_tiers() {
    picker_contract(memory_state()).await;
}

#[tokio::test]
async fn test_sqlite_picker_tiers() {
    picker_contract(sqlite_state().await).await;
}

#[tokio::test]
async fn test_memory_archive_pages() {
    archive_contract(memory_state()).await;
}

#[tokio::test]
async fn test_sqlite_archive_pages() {
    archive_contract(sqlite_state().await).await;
}
