use std::sync::Arc;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect,
};

use crate::database::Database;
use crate::entities::user;

pub const DEFAULT_LEADERBOARD_SIZE: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Name is required")]
    NameRequired,

    #[error("User '{}' already exists", .0.name)]
    AlreadyExists(Box<user::Model>),

    #[error("User '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Players and their scores.
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Name.eq(name))
            .one(&self.db.conn)
            .await
    }

    /// Registers a player. Names are trimmed and must be unique.
    pub async fn create(&self, name: &str, score: Option<i64>) -> Result<user::Model, UserError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UserError::NameRequired);
        }

        if let Some(existing) = self.find_by_name(name).await? {
            return Err(UserError::AlreadyExists(Box::new(existing)));
        }

        let model = user::ActiveModel {
            name: Set(name.to_string()),
            score: Set(score.unwrap_or(0)),
            ..user::ActiveModel::new()
        }
        .insert(&self.db.conn)
        .await?;

        tracing::info!("User created: '{}' (ID: {})", model.name, model.id);
        Ok(model)
    }

    /// Highest scores first; ties go to whoever registered first.
    pub async fn leaderboard(&self, limit: Option<u64>) -> Result<Vec<user::Model>, UserError> {
        let users = user::Entity::find()
            .order_by_desc(user::Column::Score)
            .order_by_asc(user::Column::Id)
            .limit(limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE))
            .all(&self.db.conn)
            .await?;
        Ok(users)
    }

    pub async fn update_score(&self, name: &str, score: i64) -> Result<user::Model, UserError> {
        let name = name.trim();
        let existing = self
            .find_by_name(name)
            .await?
            .ok_or_else(|| UserError::NotFound(name.to_string()))?;

        let mut active = existing.into_active_model();
        active.score = Set(score);
        let model = active.update(&self.db.conn).await?;

        tracing::debug!("Score for '{}' set to {}", model.name, model.score);
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_db;

    #[tokio::test]
    async fn test_create_trims_name_and_defaults_score() {
        let service = UserService::new(test_db().await);

        let user = service.create("  alice ", None).await.unwrap();

        assert_eq!(user.name, "alice");
        assert_eq!(user.score, 0);
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let service = UserService::new(test_db().await);

        let result = service.create("   ", Some(3)).await;

        assert!(matches!(result, Err(UserError::NameRequired)));
    }

    #[tokio::test]
    async fn test_create_duplicate_returns_existing_user() {
        let service = UserService::new(test_db().await);
        let first = service.create("bob", Some(12)).await.unwrap();

        let result = service.create(" bob", None).await;

        match result {
            Err(UserError::AlreadyExists(existing)) => assert_eq!(*existing, first),
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_leaderboard_orders_by_score() {
        let service = UserService::new(test_db().await);
        for (name, score) in [("a", 5), ("b", 40), ("c", 12), ("d", 40)] {
            service.create(name, Some(score)).await.unwrap();
        }

        let top = service.leaderboard(Some(3)).await.unwrap();

        let names: Vec<&str> = top.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "c"]);
    }

    #[tokio::test]
    async fn test_leaderboard_default_limit() {
        let service = UserService::new(test_db().await);
        for i in 0..15 {
            service.create(&format!("player{i}"), Some(i)).await.unwrap();
        }

        let top = service.leaderboard(None).await.unwrap();

        assert_eq!(top.len(), DEFAULT_LEADERBOARD_SIZE as usize);
        assert_eq!(top[0].score, 14);
    }

    #[tokio::test]
    async fn test_update_score() {
        let service = UserService::new(test_db().await);
        service.create("carol", None).await.unwrap();

        let updated = service.update_score("carol", 77).await.unwrap();

        assert_eq!(updated.score, 77);
        assert_eq!(service.leaderboard(None).await.unwrap()[0].score, 77);
    }

    #[tokio::test]
    async fn test_update_score_unknown_user() {
        let service = UserService::new(test_db().await);

        let result = service.update_score("nobody", 1).await;

        assert!(matches!(result, Err(UserError::NotFound(name)) if name == "nobody"));
    }
}
