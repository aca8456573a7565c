use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Game character confirmed to belong to both the registering credential and
/// the target corporation. Written at registration confirmation, one row per
/// corp-member character; owned exclusively by its user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "characters")]
pub struct Model {
    /// External character identifier from the game API.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    pub user_id: String,

    /// Unix timestamp (seconds).
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
