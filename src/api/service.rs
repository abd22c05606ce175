use async_trait::async_trait;

use crate::api::types::{FollowsResponse, HelixUser};
use crate::api::{ApiClientError, HelixApiClient};

/// Remote user and follow data consumed by the popup controller.
///
/// Every call takes the viewer's OAuth token explicitly.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user_id_by_name(&self, auth: &str, name: &str) -> Result<String, ApiClientError>;

    /// `Ok(None)` when the id does not belong to any user.
    async fn get_user(&self, auth: &str, id: &str) -> Result<Option<HelixUser>, ApiClientError>;

    async fn get_user_follows(
        &self,
        auth: &str,
        from_id: &str,
        to_id: &str,
    ) -> Result<FollowsResponse, ApiClientError>;

    async fn follow_user(&self, auth: &str, from_id: &str, to_id: &str)
    -> Result<(), ApiClientError>;

    async fn unfollow_user(
        &self,
        auth: &str,
        from_id: &str,
        to_id: &str,
    ) -> Result<(), ApiClientError>;

    async fn block_user(&self, auth: &str, target_id: &str) -> Result<(), ApiClientError>;

    async fn unblock_user(&self, auth: &str, target_id: &str) -> Result<(), ApiClientError>;
}

#[async_trait]
impl UserService for HelixApiClient {
    async fn get_user_id_by_name(&self, auth: &str, name: &str) -> Result<String, ApiClientError> {
        HelixApiClient::get_user_id_by_name(self, auth, name).await
    }

    async fn get_user(&self, auth: &str, id: &str) -> Result<Option<HelixUser>, ApiClientError> {
        self.get_user_by_id(auth, id).await
    }

    async fn get_user_follows(
        &self,
        auth: &str,
        from_id: &str,
        to_id: &str,
    ) -> Result<FollowsResponse, ApiClientError> {
        self.get_follows_between(auth, from_id, to_id).await
    }

    async fn follow_user(
        &self,
        auth: &str,
        from_id: &str,
        to_id: &str,
    ) -> Result<(), ApiClientError> {
        self.create_follow(auth, from_id, to_id).await
    }

    async fn unfollow_user(
        &self,
        auth: &str,
        from_id: &str,
        to_id: &str,
    ) -> Result<(), ApiClientError> {
        self.delete_follow(auth, from_id, to_id).await
    }

    async fn block_user(&self, auth: &str, target_id: &str) -> Result<(), ApiClientError> {
        self.create_block(auth, target_id).await
    }

    async fn unblock_user(&self, auth: &str, target_id: &str) -> Result<(), ApiClientError> {
        self.delete_block(auth, target_id).await
    }
}
