//! HTTP API integration tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::*;
use pairsync::shared::{ChatMessage, ChatPage, Envelope, Language, Question, Session, Snapshot};

#[tokio::test]
async fn test_session_lifecycle() {
    let server = test_server(memory_state());

    let response = server.post("/sessions").json(&new_session(SESSION_ID)).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    // duplicate id
    let response = server.post("/sessions").json(&new_session(SESSION_ID)).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let session: Session = server.get("/sessions/abc123").await.json();
    assert_eq!(session.participants.first(), ALICE);
    assert!(session.document.is_empty());

    let blob = Snapshot::from_bytes(vec![1u8, 0, 7]);
    let response = server
        .patch("/sessions/abc123")
        .json(&json!({ "document": blob.to_base64() }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .patch("/sessions/abc123")
        .json(&json!({ "language": "python" }))
        .await;
    let session: Session = response.json();
    assert_eq!(session.language, Language::Python);
    assert_eq!(session.document, blob);

    let exists: serde_json::Value = server.get("/sessions/abc123/check/bob").await.json();
    assert_eq!(exists["exists"], true);
    let exists: serde_json::Value = server.get("/sessions/abc123/check/mallory").await.json();
    assert_eq!(exists["exists"], false);

    let sessions: Vec<Session> = server.get("/users/bob/sessions").await.json();
    assert_eq!(sessions.len(), 1);

    let response = server.delete("/sessions/abc123").await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = server.get("/sessions/abc123").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_session_with_duplicate_participants_is_rejected() {
    let server = test_server(memory_state());
    let response = server
        .post("/sessions")
        .json(&json!({
            "id": "solo",
            "participants": ["alice", "alice"],
            "question_id": 1090
        }))
        .await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_chat_pagination_over_http() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;
    let server = test_server(state);

    for n in 1..=25i64 {
        let message = ChatMessage::new(SESSION_ID, ALICE, BOB, format!("message {}", n), n);
        let response = server.post("/sessions/abc123/chat").json(&message).await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let page: ChatPage = server
        .get("/sessions/abc123/chat")
        .add_query_param("page", 1)
        .add_query_param("limit", 10)
        .await
        .json();
    let epochs: Vec<i64> = page.messages.iter().map(|m| m.sent_at_epoch).collect();
    assert_eq!(epochs, (16..=25).collect::<Vec<_>>());
    assert_eq!(page.pagination.total_pages, 3);
    assert_eq!(page.pagination.total_logs, 25);

    let page: ChatPage = server
        .get("/sessions/abc123/chat")
        .add_query_param("page", 3)
        .await
        .json();
    let epochs: Vec<i64> = page.messages.iter().map(|m| m.sent_at_epoch).collect();
    assert_eq!(epochs, (1..=5).collect::<Vec<_>>());

    let page: ChatPage = server
        .get("/sessions/abc123/chat")
        .add_query_param("page", 4)
        .await
        .json();
    assert!(page.messages.is_empty());

    let response = server
        .get("/sessions/abc123/chat")
        .add_query_param("page", 0)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_question_picker_over_http() {
    let server = test_server(memory_state());

    let created: Question = server
        .post("/questions")
        .json(&new_question("Two Sum", "easy", &["arrays", "hashing"]))
        .await
        .json();
    assert!(created.question_id >= 1090);

    let picked: serde_json::Value = server
        .get("/questions/random")
        .add_query_param("complexity", "easy")
        .add_query_param("category", "hashing")
        .await
        .json();
    assert_eq!(picked["question_id"], created.question_id);

    let response = server
        .get("/questions/random")
        .add_query_param("complexity", "hard")
        .add_query_param("category", "graphs")
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .get("/questions/random")
        .add_query_param("complexity", "")
        .add_query_param("category", "graphs")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // soft-deleted questions still resolve and are still picked as a last resort
    let path = format!("/questions/{}", created.question_id);
    assert_eq!(server.delete(&path).await.status_code(), StatusCode::NO_CONTENT);
    let question: Question = server.get(&path).await.json();
    assert!(question.deleted);
    let picked: serde_json::Value = server
        .get("/questions/random")
        .add_query_param("complexity", "easy")
        .add_query_param("category", "arrays")
        .await
        .json();
    assert_eq!(picked["question_id"], created.question_id);
}

#[tokio::test]
async fn test_realtime_publish_rules() {
    let state = memory_state();
    seed_session(&state, SESSION_ID).await;
    let server = test_server(state.clone());

    let response = server
        .post("/realtime/abc123/language")
        .json(&Envelope::language_change(SESSION_ID, ALICE, BOB, Language::Python))
        .await;
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let session = state.stores.sessions.get(SESSION_ID).await.unwrap().unwrap();
    assert_eq!(session.language, Language::Python);

    // envelope kind must match the endpoint
    let response = server
        .post("/realtime/abc123/chat")
        .json(&Envelope::language_change(SESSION_ID, ALICE, BOB, Language::Python))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // path and envelope must name the same session
    let response = server
        .post("/realtime/other/document")
        .json(&Envelope::document_update(SESSION_ID, ALICE, vec![1u8]))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/realtime/abc123/document")
        .json(&Envelope::document_update(SESSION_ID, "mallory", vec![1u8]))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = server
        .post("/realtime/abc123/sync")
        .json(&Envelope::sync_request(SESSION_ID, BOB, vec![0u8]))
        .await;
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let response = server
        .post("/realtime/abc123/sync")
        .json(&Envelope::document_update(SESSION_ID, BOB, vec![1u8]))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server.get("/realtime/abc123/alice").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
