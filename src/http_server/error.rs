use axum::{
    Json,
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

use crate::http_server::http_routes::users::UserResponse;
use crate::services::quiz::QuizError;
use crate::services::user::UserError;

/// Errors a handler can return.
///
/// `Internal` wraps any report; its details are logged and the client only sees a
/// generic message.
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    UserExists(UserResponse),
    Internal(color_eyre::Report),
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(message) => write!(f, "BadRequest({message})"),
            ApiError::NotFound(message) => write!(f, "NotFound({message})"),
            ApiError::UserExists(user) => write!(f, "UserExists({})", user.name),
            ApiError::Internal(err) => err.fmt(f),
        }
    }
}

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::EmptyCatalog => ApiError::NotFound("No songs available".to_string()),
            err => ApiError::Internal(err.into()),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NameRequired => ApiError::BadRequest(err.to_string()),
            UserError::AlreadyExists(user) => ApiError::UserExists(UserResponse::from(*user)),
            UserError::NotFound(_) => ApiError::NotFound(err.to_string()),
            UserError::Database(_) => ApiError::Internal(err.into()),
        }
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response<Body> {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
            }
            ApiError::UserExists(user) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "User already exists", "user": user })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                tracing::error!("{err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Something went wrong, please try again" })),
                )
                    .into_response()
            }
        }
    }
}
