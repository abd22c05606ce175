use image::DynamicImage;
use thiserror::Error;
use url::Url;

use crate::avatar::{Avatar, DisplayContext, ImageTarget};

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("invalid avatar url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("avatar download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("avatar decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("avatar decode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Downloads and decodes avatars, reporting progress to an [`ImageTarget`].
#[derive(Clone)]
pub struct AvatarLoader {
    http_client: reqwest::Client,
    context: DisplayContext,
}

impl AvatarLoader {
    pub fn new(http_client: reqwest::Client, context: DisplayContext) -> Self {
        Self {
            http_client,
            context,
        }
    }

    pub fn context(&self) -> DisplayContext {
        self.context
    }

    /// Load `url` into `target`: placeholder first, then the image or the
    /// error drawable.
    pub async fn load<T: ImageTarget>(&self, url: &str, target: &mut T) -> Result<(), AvatarError> {
        target.on_load_started(Some(Avatar::placeholder(self.context)));

        match self.fetch(url).await {
            Ok(image) => {
                tracing::debug!(url, "avatar loaded");
                target.on_resource_ready(image);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "avatar load failed");
                target.on_load_failed(Some(Avatar::broken(self.context)));
                Err(e)
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<DynamicImage, AvatarError> {
        let parsed = Url::parse(url).map_err(|source| AvatarError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let bytes = self
            .http_client
            .get(parsed)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await??;
        Ok(image)
    }
}
