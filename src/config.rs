// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::wait::Settle;

const DEFAULT_SEARCH_URL: &str =
    "https://www.linkedin.com/jobs/search/?geoId=104738515&keywords=Senior%20Analyst";

const DEFAULT_PROMPT_SUFFIX: &str = "Please score how well this position fits the user on a scale from 1 to 10, \
and provide the score only in the format 'X'.";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Raw job search URL copied from the browser. Only `geoId` and
    /// `keywords` survive normalisation.
    pub search_url: String,
    /// Closing instruction appended to every fit-analysis prompt.
    pub prompt_suffix: String,
    pub paths: PathsConfig,
    pub browser: BrowserConfig,
    pub timing: TimingConfig,
    pub collector: CollectorConfig,
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    #[serde(skip)]
    pub credentials: Option<Credentials>,
    #[serde(skip)]
    pub openai_api_key: Option<String>,
    /// File the configuration was read from, `None` for built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub database: PathBuf,
    pub cv_folder: PathBuf,
    pub cover_letters: PathBuf,
    pub positions_input: PathBuf,
    pub positions_output: PathBuf,
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub idle_timeout_secs: u64,
}

/// Randomized pauses around page loads.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub login_page: Settle,
    pub after_login: Settle,
    pub listing_page: Settle,
    pub scroll_step: Settle,
    pub detail_page: Settle,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub page_size: usize,
    pub scroll_step_px: i64,
    /// Upper bound on scroll steps per results page.
    pub max_scroll_steps: u32,
    pub results_container: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Browser sessions tried per stage before a driver failure is fatal.
    pub session_attempts: u32,
}

/// Site login read from `LINKEDIN_EMAIL` / `LINKEDIN_PASSWORD`.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Option<Self> {
        let email = non_empty_env("LINKEDIN_EMAIL")?;
        let password = non_empty_env("LINKEDIN_PASSWORD")?;
        Some(Self { email, password })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            prompt_suffix: DEFAULT_PROMPT_SUFFIX.to_string(),
            paths: PathsConfig::default(),
            browser: BrowserConfig::default(),
            timing: TimingConfig::default(),
            collector: CollectorConfig::default(),
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            credentials: None,
            openai_api_key: None,
            source: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("linkedin_jobs.db"),
            cv_folder: PathBuf::from("user_data"),
            cover_letters: PathBuf::from("cover_letters"),
            positions_input: PathBuf::from("positions/input"),
            positions_output: PathBuf::from("positions/output"),
            log_file: PathBuf::from("jobwatch.log"),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            idle_timeout_secs: 120,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            login_page: Settle::new(5_000, 1_000, 2_000),
            after_login: Settle::new(10_000, 1_000, 3_000),
            listing_page: Settle::new(4_000, 1_000, 2_000),
            scroll_step: Settle::new(0, 500, 1_500),
            detail_page: Settle::new(2_000, 500, 1_000),
        }
    }
}

impl TimingConfig {
    /// No pauses at all. Used against scripted sessions.
    pub fn immediate() -> Self {
        Self {
            login_page: Settle::none(),
            after_login: Settle::none(),
            listing_page: Settle::none(),
            scroll_step: Settle::none(),
            detail_page: Settle::none(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            page_size: 25,
            scroll_step_px: 500,
            max_scroll_steps: 60,
            results_container: "#main > div > div:nth-child(2) > div:nth-child(1) > div".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { session_attempts: 2 }
    }
}

impl AppConfig {
    /// Load `path` if it exists, otherwise fall back to defaults, then pull
    /// secrets from the environment (and `.env`). Runs before logging is
    /// set up, so callers report [`source`](Self::source) themselves.
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut config = Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            config.source = Some(path.to_path_buf());
            config
        } else {
            Self::default()
        };

        config.paths = config.paths.resolved()?;
        config.credentials = Credentials::from_env();
        config.openai_api_key = non_empty_env("OPENAI_API_KEY");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Directories the pipeline writes into.
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs = vec![
            self.paths.cv_folder.clone(),
            self.paths.cover_letters.clone(),
            self.paths.positions_input.clone(),
            self.paths.positions_output.clone(),
        ];
        if let Some(parent) = self.paths.database.parent() {
            if !parent.as_os_str().is_empty() {
                dirs.push(parent.to_path_buf());
            }
        }
        dirs
    }
}

impl PathsConfig {
    fn resolved(self) -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        let resolve = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else {
                current_dir.join(path)
            }
        };

        Ok(Self {
            database: resolve(self.database),
            cv_folder: resolve(self.cv_folder),
            cover_letters: resolve(self.cover_letters),
            positions_input: resolve(self.positions_input),
            positions_output: resolve(self.positions_output),
            log_file: resolve(self.log_file),
        })
    }
}
