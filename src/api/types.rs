use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Generic Helix response wrapper
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
#[serde(bound(serialize = "T: serde::Serialize"))]
pub struct HelixResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelixUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub broadcaster_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Follows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelixFollow {
    #[serde(default)]
    pub from_id: String,
    #[serde(default)]
    pub from_login: String,
    #[serde(default)]
    pub to_id: String,
    #[serde(default)]
    pub to_login: String,
    pub followed_at: DateTime<Utc>,
}

/// A follow-relationship lookup: total count plus the matching records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowsResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub data: Vec<HelixFollow>,
}

impl From<HelixResponse<HelixFollow>> for FollowsResponse {
    fn from(resp: HelixResponse<HelixFollow>) -> Self {
        Self {
            total: resp.total.unwrap_or(resp.data.len() as u64),
            data: resp.data,
        }
    }
}

// ---------------------------------------------------------------------------
// Token validation
// ---------------------------------------------------------------------------

/// Body of `GET https://id.twitch.tv/oauth2/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenValidation {
    pub client_id: String,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_helix_user_payload() {
        let body = r#"{"data":[{"id":"141981764","login":"twitchdev","display_name":"TwitchDev",
            "type":"","broadcaster_type":"partner","description":"Supporting third-party developers",
            "profile_image_url":"https://static-cdn.jtvnw.net/x.png","offline_image_url":"",
            "view_count":5980557,"created_at":"2016-12-14T20:32:28Z"}]}"#;
        let resp: HelixResponse<HelixUser> = serde_json::from_str(body).unwrap();
        let user = &resp.data[0];
        assert_eq!(user.login, "twitchdev");
        assert_eq!(user.display_name, "TwitchDev");
        assert_eq!(user.broadcaster_type.as_deref(), Some("partner"));
        assert_eq!(user.created_at.to_rfc3339(), "2016-12-14T20:32:28+00:00");
    }

    #[test]
    fn follows_total_falls_back_to_record_count() {
        let body = r#"{"data":[{"from_id":"1","from_login":"a","to_id":"2","to_login":"b",
            "followed_at":"2020-01-01T00:00:00Z"}],"pagination":{}}"#;
        let resp: HelixResponse<HelixFollow> = serde_json::from_str(body).unwrap();
        let follows = FollowsResponse::from(resp);
        assert_eq!(follows.total, 1);
        assert_eq!(follows.data[0].to_login, "b");
    }

    #[test]
    fn follows_total_prefers_reported_total() {
        let body = r#"{"total":0,"data":[]}"#;
        let resp: HelixResponse<HelixFollow> = serde_json::from_str(body).unwrap();
        assert_eq!(FollowsResponse::from(resp).total, 0);
    }
}
