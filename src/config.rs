use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::{
    env, fs, io,
    path::PathBuf,
    sync::{OnceLock, RwLock},
};

/// Globally accessible application configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_catalog_url_value")]
    pub catalog_url: String,
    #[serde(default = "default_initial_topic_url_value")]
    pub initial_topic_url: Option<String>,
    #[serde(default = "default_document_extension_value")]
    pub document_extension: String,
    #[serde(default = "default_user_agent_value")]
    pub user_agent: String,
    #[serde(default = "default_max_reshuffle_attempts_value")]
    pub max_reshuffle_attempts: usize,
}

impl AppConfig {
    fn normalize(&mut self) {
        if self.catalog_url.trim().is_empty() {
            self.catalog_url = default_catalog_url_value();
        }
        if self
            .initial_topic_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            self.initial_topic_url = None;
        }
        let extension = self.document_extension.trim();
        if extension.is_empty() {
            self.document_extension = default_document_extension_value();
        } else if !extension.starts_with('.') {
            self.document_extension = format!(".{extension}");
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = default_user_agent_value();
        }
        if self.max_reshuffle_attempts == 0 {
            self.max_reshuffle_attempts = DEFAULT_MAX_RESHUFFLE_ATTEMPTS;
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var(CATALOG_URL_ENV) {
            self.catalog_url = url;
        }
        if let Ok(url) = env::var(INITIAL_TOPIC_URL_ENV) {
            self.initial_topic_url = Some(url);
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url_value(),
            initial_topic_url: default_initial_topic_url_value(),
            document_extension: default_document_extension_value(),
            user_agent: default_user_agent_value(),
            max_reshuffle_attempts: DEFAULT_MAX_RESHUFFLE_ATTEMPTS,
        }
    }
}

const DEFAULT_CATALOG_URL: &str =
    "https://api.github.com/repos/SouravShrestha/q-and-a-guru/contents/data";
const DEFAULT_INITIAL_TOPIC_URL: &str =
    "https://cdn.jsdelivr.net/gh/SouravShrestha/q-and-a-guru@main/data/oops.json";
const DEFAULT_DOCUMENT_EXTENSION: &str = ".json";
const DEFAULT_MAX_RESHUFFLE_ATTEMPTS: usize = 16;

const CATALOG_URL_ENV: &str = "QAGURU_CATALOG_URL";
const INITIAL_TOPIC_URL_ENV: &str = "QAGURU_INITIAL_TOPIC_URL";

const CONFIG_FILE_PATH: &str = "config/app_config.toml";

static APP_CONFIG: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn config_lock() -> &'static RwLock<AppConfig> {
    APP_CONFIG.get_or_init(|| RwLock::new(AppConfig::default()))
}

/// Attempt to load configuration from disk and the environment. If loading fails, the in-memory config
/// will be reset to defaults and the error will be returned for the caller to surface if desired.
pub fn initialize() -> Result<()> {
    match load_config_from_disk() {
        Ok(mut config) => {
            config.apply_env_overrides();
            config.normalize();
            let lock = config_lock();
            *lock.write().expect("config lock poisoned") = config;
            Ok(())
        }
        Err(err) => {
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config.normalize();
            let lock = config_lock();
            *lock.write().expect("config lock poisoned") = config;
            Err(err)
        }
    }
}

/// Retrieve a clone of the current configuration.
pub fn current() -> AppConfig {
    config_lock().read().expect("config lock poisoned").clone()
}

/// Absolute path to the configuration file.
pub fn config_file_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_PATH)
}

fn load_config_from_disk() -> Result<AppConfig> {
    let path = config_file_path();
    match fs::read_to_string(&path) {
        Ok(contents) => parse_config(&contents)
            .wrap_err_with(|| format!("failed to parse configuration at {}", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(err) => Err(eyre!(format!(
            "failed to read configuration at {}: {}",
            path.display(),
            err
        ))),
    }
}

fn parse_config(contents: &str) -> Result<AppConfig> {
    let mut config: AppConfig = toml::from_str(contents)?;
    config.normalize();
    Ok(config)
}

fn default_catalog_url_value() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_initial_topic_url_value() -> Option<String> {
    Some(DEFAULT_INITIAL_TOPIC_URL.to_string())
}

fn default_document_extension_value() -> String {
    DEFAULT_DOCUMENT_EXTENSION.to_string()
}

fn default_user_agent_value() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

const fn default_max_reshuffle_attempts_value() -> usize {
    DEFAULT_MAX_RESHUFFLE_ATTEMPTS
}
