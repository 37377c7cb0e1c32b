use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::user;
use crate::http_server::{error::ApiError, state::AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            score: model.score,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    name: Option<String>,
    score: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScoreRequest {
    name: Option<String>,
    score: Option<i64>,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let name = request.name.unwrap_or_default();
    let user = state.users.create(&name, request.score).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state
        .users
        .leaderboard(Some(state.leaderboard_size))
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn update_score(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateScoreRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let name = request.name.filter(|name| !name.trim().is_empty());
    let (Some(name), Some(score)) = (name, request.score) else {
        return Err(ApiError::BadRequest(
            "Name and score are required".to_string(),
        ));
    };
    let user = state.users.update_score(&name, score).await?;
    Ok(Json(UserResponse::from(user)))
}
