//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::Result;
use crate::error::Error;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the session store lives
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Default directory for generated pages
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Imagen model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Generative Language API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Google Cloud project billed for Imagen calls
    #[serde(default)]
    pub project_id: Option<String>,

    /// OAuth client registration
    #[serde(default)]
    pub oauth: OAuthConfig,
}

/// Installed-app OAuth client credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    /// Loopback port for the sign-in redirect
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_port: default_callback_port(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    config_dir()
}

fn default_output_dir() -> PathBuf {
    config_dir().join("pages")
}

fn default_model() -> String {
    "imagen-3.0-generate-002".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_callback_port() -> u16 {
    8085
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            model: default_model(),
            api_base: default_api_base(),
            project_id: None,
            oauth: OAuthConfig::default(),
        }
    }
}

impl Config {
    /// Apply COLORBOOK_CLIENT_ID, COLORBOOK_CLIENT_SECRET and GOOGLE_CLOUD_PROJECT
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(id) = non_empty("COLORBOOK_CLIENT_ID") {
            self.oauth.client_id = id;
        }
        if let Some(secret) = non_empty("COLORBOOK_CLIENT_SECRET") {
            self.oauth.client_secret = secret;
        }
        if let Some(project) = non_empty("GOOGLE_CLOUD_PROJECT") {
            tracing::debug!("Using GOOGLE_CLOUD_PROJECT: {}", project);
            self.project_id = Some(project);
        }
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".colorbook")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from file, then apply environment overrides
pub fn load() -> Result<Config> {
    let path = config_path();

    if !path.exists() {
        return Err(Error::Config(format!(
            "Config not found at {:?}. Run 'colorbook onboard' first.",
            path
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config.with_env_overrides())
}

/// Save configuration to file
pub fn save(config: &Config) -> Result<()> {
    let path = config_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, content)?;

    // The file holds the OAuth client secret
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Interactive first-run setup
pub fn onboard() -> Result<()> {
    use crate::ui;
    use inquire::{Confirm, Text};

    ui::print_header("Setup", "Google sign-in");
    println!("  Colorbook needs a Google OAuth client (Desktop app type) from the Cloud Console.\n");

    let mut config = Config::default();

    let client_id = Text::new("OAuth client ID:").prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    if client_id.trim().is_empty() {
        return Err(Error::Config("Client ID cannot be empty".to_string()));
    }
    config.oauth.client_id = client_id.trim().to_string();

    config.oauth.client_secret = Text::new("OAuth client secret:").prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?
        .trim()
        .to_string();

    let project = Text::new("Google Cloud project ID (optional):").prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    if !project.trim().is_empty() {
        config.project_id = Some(project.trim().to_string());
    }

    ui::print_step(&format!("Pages will be saved to {:?}", config.output_dir));
    let keep_output = Confirm::new("Use this output directory?").with_default(true).prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    if !keep_output {
        let dir = Text::new("Output directory:").prompt()
            .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
        config.output_dir = PathBuf::from(dir);
    }

    ui::print_thinking("Creating directories");
    std::fs::create_dir_all(&config.data_dir)?;
    std::fs::create_dir_all(&config.output_dir)?;

    ui::print_thinking("Saving configuration");
    save(&config)?;

    println!();
    ui::print_success("Setup complete! Run 'colorbook login' to sign in.");
    Ok(())
}

/// Delete all configuration and the stored session
pub fn reset() -> Result<()> {
    use inquire::Confirm;
    use crate::ui;

    ui::print_warning("This deletes your Colorbook configuration and signed-in session.");

    let confirmed = Confirm::new("Reset Colorbook?")
        .with_default(false)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;

    if !confirmed {
        ui::print_step("Reset cancelled.");
        return Ok(());
    }

    let dir = config_dir();
    if dir.exists() {
        ui::print_thinking(&format!("Deleting {:?}", dir));
        std::fs::remove_dir_all(dir)?;
        ui::print_success("Colorbook has been reset.");
    } else {
        ui::print_step("No configuration directory found.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "imagen-3.0-generate-002");
        assert_eq!(config.oauth.callback_port, 8085);
        assert!(config.project_id.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"oauth": {"client_id": "abc"}}"#).unwrap();
        assert_eq!(config.oauth.client_id, "abc");
        assert_eq!(config.oauth.callback_port, 8085);
        assert_eq!(config.api_base, "https://generativelanguage.googleapis.com/v1beta");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("COLORBOOK_CLIENT_ID", "env-id"),
            ("COLORBOOK_CLIENT_SECRET", ""),
            ("GOOGLE_CLOUD_PROJECT", "my-project"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.oauth.client_secret = "file-secret".to_string();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.oauth.client_id, "env-id");
        // Empty values do not clobber the file
        assert_eq!(config.oauth.client_secret, "file-secret");
        assert_eq!(config.project_id.as_deref(), Some("my-project"));
    }
}
