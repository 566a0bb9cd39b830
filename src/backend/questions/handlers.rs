/**
 * Question HTTP Handlers
 *
 * - `POST /questions` - add a question
 * - `GET /questions/random?complexity=..&category=..` - pick one id
 * - `GET /questions/{id}` - fetch a question
 * - `DELETE /questions/{id}` - soft delete
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;
use crate::backend::questions::QuestionPicker;
use crate::backend::server::state::AppState;
use crate::shared::{NewQuestion, Question, SelectionCriterion};

#[derive(Debug, Deserialize)]
pub struct RandomQuery {
    #[serde(default)]
    pub complexity: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PickedQuestion {
    pub question_id: i64,
}

pub async fn create_question(
    State(state): State<AppState>,
    Json(new_question): Json<NewQuestion>,
) -> Result<(StatusCode, Json<Question>), BackendError> {
    new_question.validate()?;
    let question = state.stores.questions.insert(new_question).await?;
    tracing::info!("[Questions] Added question {}", question.question_id);
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn get_question(
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
) -> Result<Json<Question>, BackendError> {
    state
        .stores
        .questions
        .get(question_id)
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found(format!("question {} not found", question_id)))
}

pub async fn delete_question(
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
) -> Result<StatusCode, BackendError> {
    if state.stores.questions.soft_delete(question_id).await? {
        tracing::info!("[Questions] Soft-deleted question {}", question_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(BackendError::not_found(format!(
            "question {} not found",
            question_id
        )))
    }
}

pub async fn pick_random_question(
    State(picker): State<QuestionPicker>,
    Query(query): Query<RandomQuery>,
) -> Result<Json<PickedQuestion>, BackendError> {
    let criterion = SelectionCriterion::new(query.complexity, query.category);
    let question_id = picker.pick(&criterion).await?;
    Ok(Json(PickedQuestion { question_id }))
}
