use sea_orm::SqlErr;
use sea_orm::sea_query::Expr;

use crate::entity::key;
use crate::prelude::*;

pub struct Key<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Key<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn insert(
    &self,
    title: &str,
    image_url: &str,
    secret: &str,
  ) -> Result<key::Model> {
    let (title, image_url, secret) =
      (title.trim(), image_url.trim(), secret.trim());

    if title.is_empty() || image_url.is_empty() || secret.is_empty() {
      return Err(Error::MissingFields);
    }

    let key = key::ActiveModel {
      title: Set(title.to_string()),
      image_url: Set(image_url.to_string()),
      secret: Set(secret.to_string()),
      claimed: Set(false),
      claimed_at: Set(None),
      ..Default::default()
    };

    match key.insert(self.db).await {
      Ok(model) => Ok(model),
      Err(err)
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
      {
        Err(Error::DuplicateSecret)
      }
      Err(err) => Err(err.into()),
    }
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<key::Model>> {
    Ok(key::Entity::find_by_id(id).one(self.db).await?)
  }

  /// Unclaimed keys in insertion order.
  pub async fn list_unclaimed(&self) -> Result<Vec<key::Model>> {
    let keys = key::Entity::find()
      .filter(key::Column::Claimed.eq(false))
      .order_by_asc(key::Column::Id)
      .all(self.db)
      .await?;
    Ok(keys)
  }

  /// Every key, unclaimed first so the operator sees actionable rows on top.
  pub async fn list_all(&self) -> Result<Vec<key::Model>> {
    let keys = key::Entity::find()
      .order_by_asc(key::Column::Claimed)
      .order_by_asc(key::Column::Id)
      .all(self.db)
      .await?;
    Ok(keys)
  }

  /// The claim linearization point: one conditional UPDATE that flips
  /// `claimed` only while it is still unset. Returns whether this call won;
  /// two racers on the same id can never both see `true`.
  pub async fn try_claim(&self, id: i32, now: DateTime) -> Result<bool> {
    let update = key::Entity::update_many()
      .col_expr(key::Column::Claimed, Expr::value(true))
      .col_expr(key::Column::ClaimedAt, Expr::value(now))
      .filter(key::Column::Id.eq(id))
      .filter(key::Column::Claimed.eq(false))
      .exec(self.db)
      .await?;

    Ok(update.rows_affected == 1)
  }

  /// Read path used only after a winning `try_claim`.
  pub async fn secret(&self, id: i32) -> Result<String> {
    let key =
      key::Entity::find_by_id(id).one(self.db).await?.ok_or(Error::NotFound)?;
    Ok(key.secret)
  }

  /// Unconditional removal; claimed state does not matter. Returns whether
  /// a row existed.
  pub async fn delete(&self, id: i32) -> Result<bool> {
    let deleted = key::Entity::delete_by_id(id).exec(self.db).await?;
    Ok(deleted.rows_affected == 1)
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(key::Entity::find().count(self.db).await?)
  }
}

#[cfg(test)]
mod tests {
  use sea_orm::{ConnectionTrait, Database, DbBackend, Schema};

  use super::*;

  async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();

    let schema = Schema::new(DbBackend::Sqlite);
    let stmt = schema.create_table_from_entity(key::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }

  #[tokio::test]
  async fn test_insert_and_list() {
    let db = setup_test_db().await;
    let sv = Key::new(&db);

    let key = sv.insert("Game A", "https://img/a", "XXXX-1111").await.unwrap();
    assert_eq!(key.title, "Game A");
    assert!(!key.claimed);
    assert!(key.claimed_at.is_none());

    let listed = sv.list_unclaimed().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, key.id);
  }

  #[tokio::test]
  async fn test_insert_trims_fields() {
    let db = setup_test_db().await;
    let sv = Key::new(&db);

    let key =
      sv.insert("  Game A  ", " https://img/a ", " XXXX-1111 ").await.unwrap();
    assert_eq!(key.title, "Game A");
    assert_eq!(key.secret, "XXXX-1111");
  }

  #[tokio::test]
  async fn test_insert_rejects_empty_fields() {
    let db = setup_test_db().await;
    let sv = Key::new(&db);

    assert!(matches!(
      sv.insert("", "https://img/a", "XXXX-1111").await,
      Err(Error::MissingFields)
    ));
    assert!(matches!(
      sv.insert("Game A", "   ", "XXXX-1111").await,
      Err(Error::MissingFields)
    ));
    assert_eq!(sv.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_duplicate_secret_rejected() {
    let db = setup_test_db().await;
    let sv = Key::new(&db);

    sv.insert("Game A", "https://img/a", "XXXX-1111").await.unwrap();

    assert!(matches!(
      sv.insert("Game B", "https://img/b", "XXXX-1111").await,
      Err(Error::DuplicateSecret)
    ));
    assert_eq!(sv.count().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_try_claim_wins_exactly_once() {
    let db = setup_test_db().await;
    let sv = Key::new(&db);

    let key = sv.insert("Game A", "https://img/a", "XXXX-1111").await.unwrap();
    let now = Utc::now().naive_utc();

    assert!(sv.try_claim(key.id, now).await.unwrap());
    assert!(!sv.try_claim(key.id, now + TimeDelta::seconds(1)).await.unwrap());

    // The losing call must not touch the row
    let claimed = sv.by_id(key.id).await.unwrap().unwrap();
    assert!(claimed.claimed);
    assert_eq!(claimed.claimed_at, Some(now));
  }

  #[tokio::test]
  async fn test_claimed_at_set_iff_claimed() {
    let db = setup_test_db().await;
    let sv = Key::new(&db);

    let key = sv.insert("Game A", "https://img/a", "XXXX-1111").await.unwrap();

    let fresh = sv.by_id(key.id).await.unwrap().unwrap();
    assert!(!fresh.claimed);
    assert!(fresh.claimed_at.is_none());

    let now = Utc::now().naive_utc();
    sv.try_claim(key.id, now).await.unwrap();

    let claimed = sv.by_id(key.id).await.unwrap().unwrap();
    assert!(claimed.claimed);
    assert!(claimed.claimed_at.is_some());
  }

  #[tokio::test]
  async fn test_try_claim_unknown_id() {
    let db = setup_test_db().await;
    let sv = Key::new(&db);

    let now = Utc::now().naive_utc();
    assert!(!sv.try_claim(404, now).await.unwrap());
  }

  #[tokio::test]
  async fn test_list_unclaimed_excludes_claimed() {
    let db = setup_test_db().await;
    let sv = Key::new(&db);

    let a = sv.insert("Game A", "https://img/a", "XXXX-1111").await.unwrap();
    let b = sv.insert("Game B", "https://img/b", "XXXX-2222").await.unwrap();

    sv.try_claim(a.id, Utc::now().naive_utc()).await.unwrap();

    let listed = sv.list_unclaimed().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, b.id);
  }

  #[tokio::test]
  async fn test_list_all_orders_unclaimed_first() {
    let db = setup_test_db().await;
    let sv = Key::new(&db);

    let a = sv.insert("Game A", "https://img/a", "XXXX-1111").await.unwrap();
    let b = sv.insert("Game B", "https://img/b", "XXXX-2222").await.unwrap();
    let c = sv.insert("Game C", "https://img/c", "XXXX-3333").await.unwrap();

    sv.try_claim(a.id, Utc::now().naive_utc()).await.unwrap();

    let ids: Vec<_> =
      sv.list_all().await.unwrap().into_iter().map(|key| key.id).collect();
    assert_eq!(ids, vec![b.id, c.id, a.id]);
  }

  #[tokio::test]
  async fn test_delete() {
    let db = setup_test_db().await;
    let sv = Key::new(&db);

    let key = sv.insert("Game A", "https://img/a", "XXXX-1111").await.unwrap();

    assert!(sv.delete(key.id).await.unwrap());
    assert!(!sv.delete(key.id).await.unwrap());
    assert_eq!(sv.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_delete_claimed_key_allowed() {
    let db = setup_test_db().await;
    let sv = Key::new(&db);

    let key = sv.insert("Game A", "https://img/a", "XXXX-1111").await.unwrap();
    sv.try_claim(key.id, Utc::now().naive_utc()).await.unwrap();

    assert!(sv.delete(key.id).await.unwrap());
  }
}
