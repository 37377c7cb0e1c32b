use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::SliceRandom;
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};

use crate::database::Database;
use crate::entities;
use crate::ports::catalog::{CatalogError, Song, SongCatalog, SongFilter};

/// `SongCatalog` over the `songs` table.
///
/// Sampling loads the matching ids only, picks among them in memory and then
/// fetches the chosen rows.
pub struct DbSongCatalog {
    db: Arc<Database>,
}

impl DbSongCatalog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn matching_ids(&self, condition: Condition) -> Result<Vec<i64>, CatalogError> {
        let ids = entities::song::Entity::find()
            .filter(condition)
            .select_only()
            .column(entities::song::Column::Id)
            .into_tuple::<i64>()
            .all(&self.db.conn)
            .await?;
        Ok(ids)
    }

    async fn fetch(&self, ids: Vec<i64>) -> Result<Vec<Song>, CatalogError> {
        let models = entities::song::Entity::find()
            .filter(entities::song::Column::Id.is_in(ids))
            .all(&self.db.conn)
            .await?;
        Ok(models.into_iter().map(Song::from).collect())
    }
}

fn filter_condition(filter: Option<&SongFilter>) -> Condition {
    let mut condition = Condition::all();
    if let Some(filter) = filter {
        if let Some(source) = filter.source {
            condition = condition.add(entities::song::Column::Source.eq(source));
        }
        if let Some(hosted) = filter.externally_hosted {
            condition = condition.add(entities::song::Column::ExternallyHosted.eq(hosted));
        }
    }
    condition
}

#[async_trait::async_trait]
impl SongCatalog for DbSongCatalog {
    async fn count(&self) -> Result<u64, CatalogError> {
        Ok(entities::song::Entity::find().count(&self.db.conn).await?)
    }

    async fn count_where(&self, filter: &SongFilter) -> Result<u64, CatalogError> {
        Ok(entities::song::Entity::find()
            .filter(filter_condition(Some(filter)))
            .count(&self.db.conn)
            .await?)
    }

    async fn sample_one(&self, filter: Option<&SongFilter>) -> Result<Option<Song>, CatalogError> {
        let ids = self.matching_ids(filter_condition(filter)).await?;
        let Some(id) = ids.choose(&mut rand::thread_rng()).copied() else {
            return Ok(None);
        };

        let model = entities::song::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await?;
        Ok(model.map(Song::from))
    }

    async fn sample_excluding(
        &self,
        exclude_ids: &HashSet<i64>,
        filter: Option<&SongFilter>,
        limit: usize,
    ) -> Result<Vec<Song>, CatalogError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let condition = filter_condition(filter).add(
            entities::song::Column::Id.is_not_in(exclude_ids.iter().copied()),
        );
        let ids = self.matching_ids(condition).await?;
        let chosen: Vec<i64> = ids
            .choose_multiple(&mut rand::thread_rng(), limit)
            .copied()
            .collect();
        if chosen.is_empty() {
            return Ok(Vec::new());
        }

        let mut songs = self.fetch(chosen).await?;
        songs.shuffle(&mut rand::thread_rng());
        Ok(songs)
    }
}
