//! ReleaseWatch configuration types and loading

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use checkpointstore::FileCheckpointStore;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};

use crate::domain::TrackedProject;
use crate::watcher::WatcherConfig;

/// Config file name searched in the working directory and the user config dir
pub const CONFIG_FILE_NAME: &str = "releasewatch.yml";

/// Main ReleaseWatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Projects to watch, processed in this order
    pub projects: Vec<TrackedProject>,

    /// Upstream release source
    pub github: GithubConfig,

    /// Mail relay used for notifications
    pub smtp: SmtpConfig,

    /// Where the checkpoint lives
    pub checkpoint: CheckpointConfig,

    /// Watcher loop settings
    pub watch: WatcherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            projects: vec![
                TrackedProject::new("CesiumGS", "cesium-unreal", "Cesium Unreal"),
                TrackedProject::new("CesiumGS", "cesium", "CesiumJS"),
            ],
            github: GithubConfig::default(),
            smtp: SmtpConfig::default(),
            checkpoint: CheckpointConfig::default(),
            watch: WatcherConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.projects.is_empty() {
            return Err(eyre!("No projects configured. Add at least one entry under `projects`."));
        }

        let mut slugs = HashSet::new();
        let mut keys = HashSet::new();
        for project in &self.projects {
            if project.owner.trim().is_empty() || project.name.trim().is_empty() {
                return Err(eyre!("Project entries need a non-empty owner and name: {:?}", project));
            }
            if project.display_name.trim().is_empty() {
                return Err(eyre!("Project {} has an empty display-name", project.slug()));
            }
            if !slugs.insert(project.slug()) {
                return Err(eyre!("Project {} is listed more than once", project.slug()));
            }
            if !keys.insert(project.key().to_string()) {
                return Err(eyre!(
                    "Project name '{}' is used by more than one owner; names key the checkpoint and must be unique",
                    project.key()
                ));
            }
        }

        if self.checkpoint.format == CheckpointFormat::Bare && self.projects.len() != 1 {
            return Err(eyre!(
                "checkpoint format `bare` holds a single tag and needs exactly one project ({} configured)",
                self.projects.len()
            ));
        }

        if self.watch.poll_interval_secs == 0 {
            return Err(eyre!("watch.poll-interval-secs must be greater than zero"));
        }

        if self.watch.call_timeout_ms == 0 {
            return Err(eyre!("watch.call-timeout-ms must be greater than zero"));
        }

        Ok(())
    }

    /// Load configuration with fallback chain
    ///
    /// An explicit path must load. Otherwise the first existing file of
    /// `./releasewatch.yml` and `~/.config/releasewatch/releasewatch.yml`
    /// must load; only when neither exists are built-in defaults used.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        if let Some(candidate) = Self::candidate_paths().into_iter().find(|p| p.exists()) {
            return Self::load_from_file(&candidate)
                .context(format!("Failed to load config from {}", candidate.display()));
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        #[derive(Deserialize)]
        struct LogLevelOnly {
            #[serde(rename = "log-level")]
            log_level: Option<String>,
        }

        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::candidate_paths().into_iter().find(|p| p.exists())?,
        };
        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str::<LogLevelOnly>(&content).ok()?.log_level
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("releasewatch").join(CONFIG_FILE_NAME));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Open the checkpoint store described by this configuration
    pub fn checkpoint_store(&self) -> Result<FileCheckpointStore> {
        let path = self.checkpoint.resolve_path();
        match self.checkpoint.format {
            CheckpointFormat::Json => Ok(FileCheckpointStore::json(path)),
            CheckpointFormat::Bare => {
                let project = self
                    .projects
                    .first()
                    .ok_or_else(|| eyre!("checkpoint format `bare` needs a project"))?;
                Ok(FileCheckpointStore::bare(path, project.key()))
            }
        }
    }

    /// Find a configured project by checkpoint key or `owner/name`
    pub fn find_project(&self, id: &str) -> Option<&TrackedProject> {
        self.projects.iter().find(|p| p.key() == id || p.slug() == id)
    }
}

/// Upstream release source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the bearer token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            token_env: "GH_TOKEN".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl GithubConfig {
    /// Bearer token from the environment, if set
    pub fn token(&self) -> Option<String> {
        self.token_with(|name| std::env::var(name).ok())
    }

    /// Bearer token via an explicit variable lookup
    pub fn token_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        lookup(&self.token_env).filter(|t| !t.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Transport security for the mail relay connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TlsMode {
    /// Plain connection upgraded with STARTTLS (usually port 587)
    #[default]
    #[serde(rename = "starttls")]
    StartTls,
    /// TLS from the first byte (usually port 465)
    #[serde(rename = "tls")]
    Implicit,
    /// No encryption (local relays and tests only)
    #[serde(rename = "none")]
    Disabled,
}

impl fmt::Display for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsMode::StartTls => write!(f, "starttls"),
            TlsMode::Implicit => write!(f, "tls"),
            TlsMode::Disabled => write!(f, "none"),
        }
    }
}

/// Mail relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,

    pub port: u16,

    pub tls: TlsMode,

    /// Skip certificate verification
    #[serde(rename = "accept-invalid-certs")]
    pub accept_invalid_certs: bool,

    /// Environment variable holding the account name (also sender and recipient)
    #[serde(rename = "username-env")]
    pub username_env: String,

    /// Environment variable holding the account password
    #[serde(rename = "password-env")]
    pub password_env: String,

    /// Send to this address instead of the account itself
    pub recipient: Option<String>,

    /// Connection and command timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            tls: TlsMode::StartTls,
            accept_invalid_certs: false,
            username_env: "EMAIL_USERNAME".to_string(),
            password_env: "EMAIL_PASSWORD".to_string(),
            recipient: None,
            timeout_ms: 30_000,
        }
    }
}

impl SmtpConfig {
    /// Account credentials from the environment
    pub fn credentials(&self) -> Result<SmtpCredentials> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    /// Account credentials via an explicit variable lookup
    pub fn credentials_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<SmtpCredentials> {
        let username = lookup(&self.username_env)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| eyre!("Mail account not found. Set the {} environment variable.", self.username_env))?;
        let password = lookup(&self.password_env)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| eyre!("Mail password not found. Set the {} environment variable.", self.password_env))?;
        Ok(SmtpCredentials { username, password })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Resolved mail account credentials
#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Checkpoint file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointFormat {
    /// JSON object of project name to tag
    #[default]
    Json,
    /// A bare tag string (single project)
    Bare,
}

/// Checkpoint location configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Explicit checkpoint path (wins over everything else)
    pub path: Option<PathBuf>,

    /// Environment variable naming the directory the checkpoint lives in
    #[serde(rename = "workspace-env")]
    pub workspace_env: String,

    /// File name inside that directory
    #[serde(rename = "file-name")]
    pub file_name: String,

    pub format: CheckpointFormat,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            path: None,
            workspace_env: "GITHUB_WORKSPACE".to_string(),
            file_name: checkpointstore::DEFAULT_FILE_NAME.to_string(),
            format: CheckpointFormat::Json,
        }
    }
}

impl CheckpointConfig {
    /// Checkpoint path from config and environment
    pub fn resolve_path(&self) -> PathBuf {
        self.resolve_path_with(|name| std::env::var(name).ok())
    }

    /// Checkpoint path via an explicit variable lookup
    ///
    /// Order: explicit `path`, then `$workspace_env/file_name`, then
    /// `file_name` in the working directory.
    pub fn resolve_path_with(&self, lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        match lookup(&self.workspace_env).filter(|dir| !dir.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir).join(&self.file_name),
            None => PathBuf::from(&self.file_name),
        }
    }
}
