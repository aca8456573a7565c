use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registered corp member.
///
/// The server never stores a plaintext password: `password_hash` is a PBKDF2
/// derivation with a random per-user `salt` and `password_iterations`. The
/// original API credential pair is retained so membership can be re-verified
/// later.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
    pub password_iterations: i32,

    /// External API credential pair used for the original ownership proof.
    pub api_key_id: String,
    pub api_code: String,

    pub active: bool,

    /// Live activation token (hex) while `active` is false; replaced by the
    /// consumed sentinel on activation and never reissued.
    pub activation_code: String,

    /// Unix timestamp (seconds). Set exactly once, when the activation code
    /// is consumed.
    pub activated_at: Option<i64>,

    /// Outstanding recovery token (hex), if any. Only the latest issuance is
    /// valid; cleared after a successful recovery.
    pub recovery_code: Option<String>,

    /// Unix timestamp (seconds) of the current outstanding recovery code.
    pub recovery_sent_at: Option<i64>,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::character::Entity")]
    Character,
}

impl Related<super::character::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Character.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
