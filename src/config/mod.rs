//! Configuration and session storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::StoredCookie;

const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
const DEFAULT_LABS_URL: &str = "http://localhost:3000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// EmailJS REST base
pub const EMAIL_API_BASE: &str = "https://api.emailjs.com/api/v1.0";

/// Credentials for the third-party email relay used to deliver OTP codes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    pub service_id: Option<String>,
    pub template_id: Option<String>,
    pub public_key: Option<String>,
}

impl EmailConfig {
    /// Fill unset fields from runtime env, then from build-time env.
    fn resolved(&self) -> Self {
        Self {
            service_id: resolve_opt(
                "CEDRIK_EMAILJS_SERVICE_ID",
                self.service_id.as_deref(),
                option_env!("CEDRIK_EMAILJS_SERVICE_ID"),
            ),
            template_id: resolve_opt(
                "CEDRIK_EMAILJS_TEMPLATE_ID",
                self.template_id.as_deref(),
                option_env!("CEDRIK_EMAILJS_TEMPLATE_ID"),
            ),
            public_key: resolve_opt(
                "CEDRIK_EMAILJS_PUBLIC_KEY",
                self.public_key.as_deref(),
                option_env!("CEDRIK_EMAILJS_PUBLIC_KEY"),
            ),
        }
    }
}

/// Application configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Main backend base URL
    pub backend_url: Option<String>,
    /// Labs service base URL
    pub labs_url: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// Location the session last navigated to
    pub last_path: Option<String>,
    /// Email relay credentials
    #[serde(default)]
    pub email: EmailConfig,
    /// Cookies received from the backend (session JWT, CSRF token)
    #[serde(default)]
    pub cookies: BTreeMap<String, StoredCookie>,
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "cedrik", "cedrik-cli")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        // Session cookies live in here
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    pub fn backend_url(&self) -> String {
        resolve(
            "CEDRIK_BACKEND_URL",
            self.backend_url.as_deref(),
            option_env!("CEDRIK_BACKEND_URL"),
            DEFAULT_BACKEND_URL,
        )
    }

    pub fn labs_url(&self) -> String {
        resolve(
            "CEDRIK_LABS_URL",
            self.labs_url.as_deref(),
            option_env!("CEDRIK_LABS_URL"),
            DEFAULT_LABS_URL,
        )
    }

    pub fn email(&self) -> EmailConfig {
        self.email.resolved()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// Precedence: runtime env, config file, build-time env, default.
fn resolve(var: &str, file: Option<&str>, compiled: Option<&str>, default: &str) -> String {
    resolve_opt(var, file, compiled).unwrap_or_else(|| default.to_string())
}

fn resolve_opt(var: &str, file: Option<&str>, compiled: Option<&str>) -> Option<String> {
    pick(std::env::var(var).ok().as_deref(), file, compiled)
}

fn pick(runtime: Option<&str>, file: Option<&str>, compiled: Option<&str>) -> Option<String> {
    [runtime, file, compiled]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}
