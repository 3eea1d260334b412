//! Command implementations.

pub mod infer;
pub mod prepare;
pub mod resolve;

pub use self::infer::execute_infer;
pub use self::prepare::execute_prepare;
pub use self::resolve::execute_resolve;

use crate::config::ConcordConfig;
use crate::error::{CliError, Result};
use concord_assembler::{ConflictAssembler, MessageBuilder, TemplateRegistry, TiktokenCounter};
use concord_domain::TokenCounter;
use concord_enricher::Enricher;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Build the assembler and message builder shared by `prepare` and `resolve`.
pub(crate) async fn assembly_parts(
    config: &ConcordConfig,
) -> Result<(ConflictAssembler<Enricher>, MessageBuilder)> {
    let counter: Arc<dyn TokenCounter> =
        Arc::new(TiktokenCounter::for_model(&config.budget.tokenizer_model)?);
    let templates = match &config.templates_dir {
        Some(dir) => TemplateRegistry::load_dir(dir)?,
        None => TemplateRegistry::builtin()?,
    };
    let enricher = build_enricher(config).await?;

    let assembler = ConflictAssembler::new(enricher, Arc::clone(&counter), &config.budget)
        .with_concurrency(config.enricher.enrich_concurrency);
    let builder = MessageBuilder::new(Arc::new(templates), counter, config.budget.clone());
    Ok((assembler, builder))
}

/// Build the link enricher, launching Chromium when the build and config allow it.
pub(crate) async fn build_enricher(config: &ConcordConfig) -> Result<Enricher> {
    #[cfg(feature = "browser")]
    if config.enricher.render_javascript {
        return Ok(Enricher::with_browser(config.enricher.clone()).await?);
    }
    Ok(Enricher::new(config.enricher.clone())?)
}

/// Read a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|e| {
        CliError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write a pretty-printed JSON document, creating parent folders.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_enricher_when_rendering_disabled() {
        let mut config = ConcordConfig::default();
        config.enricher.render_javascript = false;
        config.enricher.user_agent = "concord-test".to_string();
        let enricher = build_enricher(&config).await.unwrap();
        assert_eq!(enricher.config().user_agent, "concord-test");
    }

    #[tokio::test]
    async fn test_invalid_enricher_config_rejected() {
        let mut config = ConcordConfig::default();
        config.enricher.render_javascript = false;
        config.enricher.request_timeout_secs = 0;
        assert!(matches!(
            build_enricher(&config).await,
            Err(CliError::Enricher(_))
        ));
    }
}
