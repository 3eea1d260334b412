//! The link enricher

use crate::classify::{classify, LinkSource};
use crate::config::EnricherConfig;
use crate::error::EnrichError;
use crate::render::{HttpRenderer, PageRenderer};
use crate::sources::{bitbucket, generic, github, gitlab, pypi, sourceforge, SourceContext};
use async_trait::async_trait;
use concord_domain::{EvidenceRecord, Fetch, LinkEnricher};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolves URLs into evidence records
///
/// Never fails per URL: every source error ends up as a `Fetch::Failed`
/// field on the returned record and one warning in the log.
pub struct Enricher {
    client: reqwest::Client,
    config: EnricherConfig,
    renderer: Arc<dyn PageRenderer>,
}

impl Enricher {
    /// Create an enricher that fetches pages over plain HTTP
    pub fn new(config: EnricherConfig) -> Result<Self, EnrichError> {
        config.validate().map_err(EnrichError::Config)?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()?;
        let renderer = Arc::new(HttpRenderer::with_client(client.clone()));
        info!("Enricher using HTTP page fetches (JavaScript not executed)");
        Ok(Self {
            client,
            config,
            renderer,
        })
    }

    /// Create an enricher that renders pages in headless Chromium
    #[cfg(feature = "browser")]
    pub async fn with_browser(config: EnricherConfig) -> Result<Self, EnrichError> {
        let renderer = crate::render::ChromiumRenderer::launch().await?;
        info!("Enricher using headless Chromium");
        Ok(Self::new(config)?.with_renderer(Arc::new(renderer)))
    }

    /// Replace the page renderer
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &EnricherConfig {
        &self.config
    }

    /// Follow redirects with a HEAD request and return the final URL
    ///
    /// The status of the final response is not checked.
    pub async fn resolve_redirect(&self, url: &str) -> Result<String, EnrichError> {
        let response = self.client.head(url).send().await?;
        Ok(response.url().to_string())
    }

    async fn canonical_url(&self, url: &str) -> Option<String> {
        match self.resolve_redirect(url).await {
            Ok(resolved) => {
                if resolved != url {
                    debug!("{} redirects to {}", url, resolved);
                }
                Some(resolved)
            }
            Err(e) if self.config.fallback_to_original_url => {
                warn!("Redirect resolution failed for {}: {}; using it as is", url, e);
                Some(url.to_string())
            }
            Err(e) => {
                warn!("Redirect resolution failed for {}: {}; skipping", url, e);
                None
            }
        }
    }
}

#[async_trait]
impl LinkEnricher for Enricher {
    async fn enrich(&self, url: &str) -> EvidenceRecord {
        let mut record = EvidenceRecord::empty(url);
        let Some(target) = self.canonical_url(url).await else {
            return record;
        };

        let source = classify(&target, &self.config.organizational_git_hosts);
        debug!("Enriching {} as {}", target, source.name());

        let ctx = SourceContext {
            client: &self.client,
            config: &self.config,
            renderer: self.renderer.as_ref(),
        };

        match source {
            LinkSource::GitHub { owner, repo } => {
                let (metadata, readme) = github::fetch(&ctx, &owner, &repo).await;
                record.repo_metadata = metadata;
                record.readme_content = readme;
            }
            LinkSource::GitLab { project_path } => {
                let (metadata, readme) = gitlab::fetch(&ctx, &project_path).await;
                record.repo_metadata = metadata;
                record.readme_content = readme;
            }
            LinkSource::PyPI { package } => {
                record.project_metadata = pypi::fetch(&ctx, &package).await;
            }
            LinkSource::SourceForge => {
                record.project_metadata = sourceforge::fetch(&ctx, &target).await;
            }
            LinkSource::Bitbucket { user, repo } => {
                let (metadata, readme) = bitbucket::fetch(&ctx, &user, &repo).await;
                record.repo_metadata = metadata;
                record.readme_content = readme;
            }
            LinkSource::OrganizationalGit => {
                record.repo_metadata = Fetch::Found(json!({ "url": target }));
            }
            LinkSource::Generic => {
                record.content = generic::fetch(&ctx, &target).await;
            }
        }

        for (label, reason) in record.failures() {
            warn!("Failed to fetch {} for {}: {}", label, url, reason);
        }
        record
    }
}
