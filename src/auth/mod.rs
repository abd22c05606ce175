//! Authentication for the Twitch Helix API.
//!
//! Tokens are supplied by the user; this module only loads and validates them.

pub mod credentials;

use thiserror::Error;

use crate::api::bare_token;
use crate::api::types::TokenValidation;
use credentials::CredentialSet;

const VALIDATE_URL: &str = "https://id.twitch.tv/oauth2/validate";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("credential error: {0}")]
    Credential(#[from] credentials::CredentialError),
    #[error("token rejected (status {0})")]
    InvalidToken(u16),
    #[error("token is not bound to a user; a user access token is required")]
    AppToken,
    #[error("token was issued to client {actual}, expected {expected}")]
    ClientMismatch { expected: String, actual: String },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// The viewer behind a validated token.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub client_id: String,
    pub user_id: String,
    pub login: String,
    pub oauth_token: String,
}

/// Call the validate endpoint and resolve the viewer the token belongs to.
pub async fn validate_token(
    client: &reqwest::Client,
    creds: &CredentialSet,
) -> Result<Viewer, AuthError> {
    let resp = client
        .get(VALIDATE_URL)
        .header("Authorization", format!("OAuth {}", bare_token(&creds.oauth_token)))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(AuthError::InvalidToken(status.as_u16()));
    }

    let validation: TokenValidation = resp.json().await?;
    viewer_from_validation(creds, validation)
}

fn viewer_from_validation(
    creds: &CredentialSet,
    validation: TokenValidation,
) -> Result<Viewer, AuthError> {
    if let Some(ref expected) = creds.client_id
        && *expected != validation.client_id
    {
        return Err(AuthError::ClientMismatch {
            expected: expected.clone(),
            actual: validation.client_id,
        });
    }

    let (Some(user_id), Some(login)) = (validation.user_id, validation.login) else {
        return Err(AuthError::AppToken);
    };

    tracing::debug!(%login, scopes = ?validation.scopes, expires_in = validation.expires_in, "token validated");

    Ok(Viewer {
        client_id: validation.client_id,
        user_id,
        login,
        oauth_token: creds.oauth_token.clone(),
    })
}
