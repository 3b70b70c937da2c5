use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::Validate;

use application::{MessageDto, ParticipantDto, SendMessageRequest};
use domain::MessageKind;

use crate::{error::ApiError, extract::UserHeader, state::AppState};

#[derive(Debug, Deserialize, Validate)]
struct RegisterPayload {
    #[validate(length(min = 1))]
    name: String,
}

#[derive(Debug, Deserialize, Validate)]
struct SendMessagePayload {
    #[validate(length(min = 1))]
    to: String,
    #[validate(length(min = 1))]
    text: String,
    #[serde(rename = "type")]
    kind: MessageKind,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<i64>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/participants", post(register).get(list_participants))
        .route("/messages", post(send_message).get(list_messages))
        .route("/status", post(heartbeat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

fn parse_body<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::unprocessable(rejection.body_text()))?;
    payload
        .validate()
        .map_err(|errors| ApiError::unprocessable(errors.to_string()))?;
    Ok(payload)
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterPayload>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let payload = parse_body(payload)?;
    state.chat_service.join(&payload.name).await?;
    Ok(StatusCode::CREATED)
}

async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParticipantDto>>, ApiError> {
    let participants = state.chat_service.participants().await?;
    Ok(Json(
        participants.into_iter().map(ParticipantDto::from).collect(),
    ))
}

async fn send_message(
    State(state): State<AppState>,
    user: UserHeader,
    payload: Result<Json<SendMessagePayload>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let payload = parse_body(payload)?;
    state
        .chat_service
        .send_message(SendMessageRequest {
            from: user.into_name(),
            to: payload.to,
            text: payload.text,
            kind: payload.kind,
        })
        .await?;
    Ok(StatusCode::CREATED)
}

async fn list_messages(
    State(state): State<AppState>,
    user: UserHeader,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::unprocessable(rejection.body_text()))?;
    let limit = query
        .limit
        .ok_or_else(|| ApiError::unprocessable("limit: query parameter is required"))?;

    let messages = state
        .chat_service
        .messages(&user.into_name(), limit)
        .await?;
    Ok(Json(messages.into_iter().map(MessageDto::from).collect()))
}

async fn heartbeat(
    State(state): State<AppState>,
    UserHeader(user): UserHeader,
) -> Result<StatusCode, ApiError> {
    let user = user.ok_or_else(|| ApiError::not_found("missing `User` header"))?;
    state.chat_service.heartbeat(&user).await?;
    Ok(StatusCode::OK)
}
