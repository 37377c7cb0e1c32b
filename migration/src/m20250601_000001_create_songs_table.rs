use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Song::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Song::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Song::Title).string().not_null())
                    .col(ColumnDef::new(Song::Artist).string().not_null())
                    .col(
                        ColumnDef::new(Song::Source)
                            .string()
                            .not_null()
                            .default("s3"),
                    )
                    .col(ColumnDef::new(Song::LocationKind).string().not_null())
                    .col(ColumnDef::new(Song::Location).string().not_null())
                    .col(ColumnDef::new(Song::ClipUrl).string())
                    .col(
                        ColumnDef::new(Song::ExternallyHosted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Song::DurationSeconds).integer())
                    .col(ColumnDef::new(Song::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Song::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Distractor lookups filter on source
        manager
            .create_index(
                Index::create()
                    .name("idx_songs_source")
                    .table(Song::Table)
                    .col(Song::Source)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_songs_title_artist")
                    .table(Song::Table)
                    .col(Song::Title)
                    .col(Song::Artist)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Song::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Song {
    #[sea_orm(iden = "songs")]
    Table,
    Id,
    Title,
    Artist,
    Source,
    LocationKind,
    Location,
    ClipUrl,
    ExternallyHosted,
    DurationSeconds,
    CreatedAt,
    UpdatedAt,
}
