use std::sync::Arc;

use sea_orm::{DbErr, EntityTrait, QueryOrder};

use crate::database::Database;
use crate::entities;
use crate::ports::catalog::Song;

/// Read access to the song library.
pub struct SongService {
    db: Arc<Database>,
}

impl SongService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Song>, DbErr> {
        let models = entities::song::Entity::find()
            .order_by_asc(entities::song::Column::Id)
            .all(&self.db.conn)
            .await?;
        Ok(models.into_iter().map(Song::from).collect())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Song>, DbErr> {
        let model = entities::song::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await?;
        Ok(model.map(Song::from))
    }
}
