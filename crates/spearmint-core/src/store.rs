use async_trait::async_trait;
use entity::{character, user};
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, SqlErr,
};

use crate::error::StoreError;
use crate::util;

/// Fields of an account as created at registration confirmation. The store
/// assigns the row id and timestamps.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
    pub password_iterations: i32,
    pub api_key_id: String,
    pub api_code: String,
    pub activation_code: String,
}

/// Durable account state. The only actor that changes it; every mutation in
/// the lifecycle controller goes through this seam.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, StoreError>;

    /// Insert a fresh inactive account. A uniqueness violation on email
    /// surfaces as `StoreError::Conflict`.
    async fn insert(&self, account: NewAccount) -> Result<user::Model, StoreError>;

    /// Persist the given snapshot over the stored row with the same id.
    async fn update(&self, account: user::Model) -> Result<user::Model, StoreError>;

    /// Delete an account and, through cascade, its character rows. Used to
    /// back out a registration that failed after the account insert.
    async fn remove(&self, user_id: &str) -> Result<(), StoreError>;

    async fn add_character(&self, user_id: &str, character_id: i64) -> Result<(), StoreError>;

    async fn characters_of(&self, user_id: &str) -> Result<Vec<character::Model>, StoreError>;
}

#[async_trait]
impl<T: AccountStore + ?Sized> AccountStore for std::sync::Arc<T> {
    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, StoreError> {
        (**self).find_by_email(email).await
    }

    async fn insert(&self, account: NewAccount) -> Result<user::Model, StoreError> {
        (**self).insert(account).await
    }

    async fn update(&self, account: user::Model) -> Result<user::Model, StoreError> {
        (**self).update(account).await
    }

    async fn remove(&self, user_id: &str) -> Result<(), StoreError> {
        (**self).remove(user_id).await
    }

    async fn add_character(&self, user_id: &str, character_id: i64) -> Result<(), StoreError> {
        (**self).add_character(user_id, character_id).await
    }

    async fn characters_of(&self, user_id: &str) -> Result<Vec<character::Model>, StoreError> {
        (**self).characters_of(user_id).await
    }
}

/// SeaORM-backed store.
pub struct OrmStore {
    db: DatabaseConnection,
}

impl OrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn classify(err: DbErr) -> StoreError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        StoreError::Conflict
    } else {
        StoreError::Db(err)
    }
}

#[async_trait]
impl AccountStore for OrmStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, StoreError> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(StoreError::from)
    }

    async fn insert(&self, account: NewAccount) -> Result<user::Model, StoreError> {
        let now = util::now_ts();

        let active = user::ActiveModel {
            id: Set(util::random_id()),
            email: Set(account.email),
            password_hash: Set(account.password_hash),
            salt: Set(account.salt),
            password_iterations: Set(account.password_iterations),
            api_key_id: Set(account.api_key_id),
            api_code: Set(account.api_code),
            active: Set(false),
            activation_code: Set(account.activation_code),
            activated_at: Set(None),
            recovery_code: Set(None),
            recovery_sent_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        active.insert(&self.db).await.map_err(classify)
    }

    async fn update(&self, account: user::Model) -> Result<user::Model, StoreError> {
        let active = user::ActiveModel {
            id: Unchanged(account.id),
            email: Set(account.email),
            password_hash: Set(account.password_hash),
            salt: Set(account.salt),
            password_iterations: Set(account.password_iterations),
            api_key_id: Set(account.api_key_id),
            api_code: Set(account.api_code),
            active: Set(account.active),
            activation_code: Set(account.activation_code),
            activated_at: Set(account.activated_at),
            recovery_code: Set(account.recovery_code),
            recovery_sent_at: Set(account.recovery_sent_at),
            created_at: Unchanged(account.created_at),
            updated_at: Set(util::now_ts()),
        };

        active.update(&self.db).await.map_err(StoreError::from)
    }

    async fn remove(&self, user_id: &str) -> Result<(), StoreError> {
        user::Entity::delete_by_id(user_id)
            .exec(&self.db)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn add_character(&self, user_id: &str, character_id: i64) -> Result<(), StoreError> {
        let active = character::ActiveModel {
            id: Set(character_id),
            user_id: Set(user_id.to_string()),
            created_at: Set(util::now_ts()),
        };

        active.insert(&self.db).await.map_err(classify)?;
        Ok(())
    }

    async fn characters_of(&self, user_id: &str) -> Result<Vec<character::Model>, StoreError> {
        character::Entity::find()
            .filter(character::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(StoreError::from)
    }
}
