//! Explicit application context.
//!
//! Built once from [`Config`] and handed to whoever needs it; the auth and
//! generation clients only meet here.

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::{AuthClient, GoogleOAuthProvider, IdentityProvider};
use crate::config::Config;
use crate::generation::{ImageBackend, ImageClient, ImagenBackend};
use crate::storage::{FileStore, KeyValueStore};
use crate::Result;

pub struct AppContext {
    pub config: Config,
    pub auth: AuthClient,
    pub images: ImageClient,
}

impl AppContext {
    /// Wire the production stack: file session store, Google sign-in, Imagen.
    pub fn from_config(config: Config) -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::in_dir(&config.data_dir));
        let provider: Arc<dyn IdentityProvider> =
            Arc::new(GoogleOAuthProvider::new(config.oauth.clone()));
        let backend: Arc<dyn ImageBackend> = Arc::new(
            ImagenBackend::new(&config.api_base, &config.model)
                .with_project(config.project_id.clone()),
        );
        Self::with_parts(config, provider, store, backend)
    }

    /// Wire arbitrary parts (tests, alternative providers)
    pub fn with_parts(
        config: Config,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn ImageBackend>,
    ) -> Self {
        Self {
            auth: AuthClient::new(provider, store),
            images: ImageClient::new(backend),
            config,
        }
    }

    /// Initialize the auth client (configure + restore session).
    pub async fn initialize(&self) -> Result<()> {
        self.auth.initialize().await
    }

    /// Generate a page for `prompt` with the current session's token.
    ///
    /// Without `output` the page lands in the configured output directory
    /// under a fresh name whose extension follows the returned MIME type.
    pub async fn generate(&self, prompt: &str, output: Option<PathBuf>) -> Result<PathBuf> {
        let token = self.auth.access_token().await?;
        if let Some(path) = output {
            return self.images.generate_image_to_file(prompt, &token, path).await;
        }

        let image = self.images.generate_image(prompt, &token).await?;
        let path = self.config.output_dir.join(format!(
            "page-{}.{}",
            uuid::Uuid::new_v4(),
            image.extension()
        ));
        self.images.write_image(&path, &image).await
    }

    /// Generate a page and return it as a `data:` URI.
    pub async fn generate_data_uri(&self, prompt: &str) -> Result<String> {
        let token = self.auth.access_token().await?;
        self.images.generate_image_data_uri(prompt, &token).await
    }

    /// Signed in and the model handle can be built.
    pub async fn health(&self) -> bool {
        if !self.auth.is_signed_in().await {
            return false;
        }
        match self.auth.access_token().await {
            Ok(token) => self.images.check_health(&token).await,
            Err(_) => false,
        }
    }
}
