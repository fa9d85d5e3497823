use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{entities::users::UserEntity, value_objects::iam::AccountEnrollment};

#[async_trait]
#[automock]
pub trait UserRepository {
    /// Exact, case-sensitive match on the stored email.
    async fn find_by_email(&self, email: String) -> Result<Option<UserEntity>>;

    async fn find_active_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;

    /// Inserts the user, its subscription and its starter grant in one transaction.
    async fn register(&self, account_enrollment: AccountEnrollment) -> Result<UserEntity>;

    async fn update_last_login(&self, user_id: Uuid) -> Result<()>;
}
