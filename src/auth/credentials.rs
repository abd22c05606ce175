use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to load .env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("no credentials found; set TWITCH_CLIENT_ID and TWITCH_OAUTH_TOKEN in env or .env")]
    NoCredentials,
    #[error("TWITCH_OAUTH_TOKEN is not set")]
    MissingToken,
}

/// Application client id plus the viewer's OAuth token.
#[derive(Clone, Default)]
pub struct CredentialSet {
    /// May be empty; token validation reports the id the token was issued to.
    pub client_id: Option<String>,
    pub oauth_token: String,
}

impl std::fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSet")
            .field("client_id", &self.client_id)
            .field("oauth_token", &"<redacted>")
            .finish()
    }
}

/// Return candidate .env paths in priority order.
fn env_file_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/chattertui/.env"));
    }
    paths.push(PathBuf::from(".env"));
    paths
}

/// Load .env files without requiring any particular variable to be present.
pub fn load_env_files() {
    // Earlier files win because dotenvy never overwrites existing env vars.
    for path in env_file_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

/// Load credentials from environment variables, trying .env files first.
///
/// Priority: ~/.config/chattertui/.env > cwd .env.
/// Variables already set in the environment take precedence.
pub fn load_credentials() -> Result<CredentialSet, CredentialError> {
    load_env_files();

    let get = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    credentials_from(get("TWITCH_CLIENT_ID"), get("TWITCH_OAUTH_TOKEN"))
}

fn credentials_from(
    client_id: Option<String>,
    oauth_token: Option<String>,
) -> Result<CredentialSet, CredentialError> {
    match (client_id, oauth_token) {
        (None, None) => Err(CredentialError::NoCredentials),
        (_, None) => Err(CredentialError::MissingToken),
        (client_id, Some(oauth_token)) => Ok(CredentialSet {
            client_id,
            oauth_token,
        }),
    }
}
