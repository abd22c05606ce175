use crate::api::types::{FollowsResponse, HelixFollow, HelixResponse, HelixUser};
use crate::api::{ApiClientError, HelixApiClient};

impl HelixApiClient {
    /// Look up a user by login name.
    pub async fn get_user_by_login(
        &self,
        oauth: &str,
        login: &str,
    ) -> Result<Option<HelixUser>, ApiClientError> {
        let url = format!("/users?login={}", urlencoding::encode(login));
        let resp: HelixResponse<HelixUser> = self.helix_get(&url, oauth).await?;
        Ok(resp.data.into_iter().next())
    }

    /// Resolve a login name to its numeric user ID.
    pub async fn get_user_id_by_name(
        &self,
        oauth: &str,
        login: &str,
    ) -> Result<String, ApiClientError> {
        self.get_user_by_login(oauth, login)
            .await?
            .map(|user| user.id)
            .ok_or_else(|| ApiClientError::NotFound(login.to_string()))
    }

    /// Look up a user by numeric ID.
    pub async fn get_user_by_id(
        &self,
        oauth: &str,
        user_id: &str,
    ) -> Result<Option<HelixUser>, ApiClientError> {
        let url = format!("/users?id={}", urlencoding::encode(user_id));
        let resp: HelixResponse<HelixUser> = self.helix_get(&url, oauth).await?;
        Ok(resp.data.into_iter().next())
    }

    /// Check whether `from_id` follows `to_id`.
    pub async fn get_follows_between(
        &self,
        oauth: &str,
        from_id: &str,
        to_id: &str,
    ) -> Result<FollowsResponse, ApiClientError> {
        let url = format!(
            "/users/follows?from_id={}&to_id={}",
            urlencoding::encode(from_id),
            urlencoding::encode(to_id),
        );
        let resp: HelixResponse<HelixFollow> = self.helix_get(&url, oauth).await?;
        Ok(resp.into())
    }
}
