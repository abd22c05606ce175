use reqwest::Method;

use crate::api::{ApiClientError, HelixApiClient};

impl HelixApiClient {
    /// Make `from_id` follow `to_id`.
    pub async fn create_follow(
        &self,
        oauth: &str,
        from_id: &str,
        to_id: &str,
    ) -> Result<(), ApiClientError> {
        let body = serde_json::json!({ "from_id": from_id, "to_id": to_id });
        self.helix_send(Method::POST, "/users/follows", oauth, Some(&body))
            .await
    }

    /// Remove the follow from `from_id` to `to_id`.
    pub async fn delete_follow(
        &self,
        oauth: &str,
        from_id: &str,
        to_id: &str,
    ) -> Result<(), ApiClientError> {
        let url = format!(
            "/users/follows?from_id={}&to_id={}",
            urlencoding::encode(from_id),
            urlencoding::encode(to_id),
        );
        self.helix_send(Method::DELETE, &url, oauth, None).await
    }

    /// Add a user to the authenticated user's block list.
    pub async fn create_block(&self, oauth: &str, target_id: &str) -> Result<(), ApiClientError> {
        let url = format!("/users/blocks?target_user_id={}", urlencoding::encode(target_id));
        self.helix_send(Method::PUT, &url, oauth, None).await
    }

    /// Remove a user from the authenticated user's block list.
    pub async fn delete_block(&self, oauth: &str, target_id: &str) -> Result<(), ApiClientError> {
        let url = format!("/users/blocks?target_user_id={}", urlencoding::encode(target_id));
        self.helix_send(Method::DELETE, &url, oauth, None).await
    }
}
