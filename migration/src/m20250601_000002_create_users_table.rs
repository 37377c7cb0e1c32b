use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table("users")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(string("name").not_null().unique_key())
                    .col(big_integer("score").not_null().default(0))
                    .col(timestamp("created_at").not_null())
                    .col(timestamp("updated_at").not_null())
                    .to_owned(),
            )
            .await?;

        // Leaderboard reads sort by score
        manager
            .create_index(
                Index::create()
                    .name("idx_users_score")
                    .table("users")
                    .col("score")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table("users").to_owned())
            .await
    }
}
