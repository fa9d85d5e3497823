use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::SubscriptionEntity;

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    /// The most recently created `active` subscription. More than one active row is a
    /// data-integrity error, not a tie to break.
    async fn find_current_active_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionEntity>>;
}
