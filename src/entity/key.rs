//! Key entity - one giveaway item and its redemption code

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "keys")]
#[serde(rename_all = "camelCase")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub title: String,
  pub image_url: String,
  /// The redemption code. Never serialized into public listings; only the
  /// admin view and the winning claim response carry it.
  #[sea_orm(unique)]
  pub secret: String,
  pub claimed: bool,
  pub claimed_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
