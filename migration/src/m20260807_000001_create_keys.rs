use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Keys::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Keys::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Keys::Title).string().not_null())
          .col(ColumnDef::new(Keys::ImageUrl).string().not_null())
          .col(ColumnDef::new(Keys::Secret).string().not_null().unique_key())
          .col(ColumnDef::new(Keys::Claimed).boolean().not_null().default(false))
          .col(ColumnDef::new(Keys::ClaimedAt).date_time().null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_keys_claimed")
          .table(Keys::Table)
          .col(Keys::Claimed)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Keys::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Keys {
  Table,
  Id,
  Title,
  ImageUrl,
  Secret,
  Claimed,
  ClaimedAt,
}
