//! Configuration for link enrichment

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoints, credentials and limits used by the [`crate::Enricher`]
///
/// Endpoints are configurable so tests and mirrors can point elsewhere.
/// Credentials are never read from or written to configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnricherConfig {
    /// GitHub REST API base
    pub github_api_base: String,

    /// Repository metadata service (owner/repo keyed)
    pub github_metadata_url: String,

    /// File content service used to fetch README text
    pub github_content_url: String,

    /// GitLab REST API base
    pub gitlab_api_base: String,

    /// PyPI JSON API base
    pub pypi_api_base: String,

    /// Bitbucket REST API base
    pub bitbucket_api_base: String,

    /// Bitbucket web base for raw files
    pub bitbucket_raw_base: String,

    /// Organizational git hosts whose URLs are recorded without fetching
    pub organizational_git_hosts: Vec<String>,

    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Maximum URLs enriched concurrently within one conflict
    pub enrich_concurrency: usize,

    /// Enrich the original URL when redirect resolution fails
    ///
    /// When false the URL contributes no evidence on redirect failure.
    pub fallback_to_original_url: bool,

    /// User-Agent sent with every request
    pub user_agent: String,

    /// Render SourceForge and generic pages in headless Chromium
    ///
    /// Only honored when built with the `browser` feature.
    pub render_javascript: bool,

    /// GitHub token (from `GITHUB_TOKEN`)
    #[serde(skip)]
    pub github_token: Option<String>,

    /// GitLab token (from `GITLAB_TOKEN`)
    #[serde(skip)]
    pub gitlab_token: Option<String>,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            github_api_base: "https://api.github.com".to_string(),
            github_metadata_url:
                "https://observatory.openebench.bsc.es/github-metadata-api/metadata/user".to_string(),
            github_content_url:
                "https://observatory.openebench.bsc.es/github-metadata-api/metadata/content/user"
                    .to_string(),
            gitlab_api_base: "https://gitlab.com/api/v4".to_string(),
            pypi_api_base: "https://pypi.org/pypi".to_string(),
            bitbucket_api_base: "https://api.bitbucket.org/2.0".to_string(),
            bitbucket_raw_base: "https://bitbucket.org".to_string(),
            organizational_git_hosts: vec!["git.bioconductor.org".to_string()],
            request_timeout_secs: 10,
            enrich_concurrency: 4,
            fallback_to_original_url: false,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.5993.90 Safari/537.36".to_string(),
            render_javascript: true,
            github_token: None,
            gitlab_token: None,
        }
    }
}

impl EnricherConfig {
    /// Read `GITHUB_TOKEN` / `GITLAB_TOKEN` from the environment
    pub fn with_env_credentials(mut self) -> Self {
        self.github_token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        self.gitlab_token = std::env::var("GITLAB_TOKEN").ok().filter(|t| !t.is_empty());
        self
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.enrich_concurrency == 0 {
            return Err("enrich_concurrency must be greater than 0".to_string());
        }
        for (name, base) in [
            ("github_api_base", &self.github_api_base),
            ("gitlab_api_base", &self.gitlab_api_base),
            ("pypi_api_base", &self.pypi_api_base),
            ("bitbucket_api_base", &self.bitbucket_api_base),
        ] {
            if url::Url::parse(base).is_err() {
                return Err(format!("{} is not a valid URL: {}", name, base));
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}
