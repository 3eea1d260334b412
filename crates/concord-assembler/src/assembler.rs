//! Conflict assembly: strip references, enrich each URL once, chunk evidence

use crate::budget::chunk_text;
use crate::config::BudgetConfig;
use concord_domain::{
    labels, ConflictGroup, EvidenceRecord, Fetch, FullConflict, LinkEnricher, SoftwareEntry,
    TokenCounter,
};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Default number of URLs enriched at the same time
pub const DEFAULT_ENRICH_CONCURRENCY: usize = 4;

/// Links referenced by a conflict's entries, split the way they are collected
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictLinks {
    /// Repositories on a known forge whose URL really points there
    pub repositories: BTreeSet<String>,
    /// Web pages, plus repositories of any other kind
    pub webpages: BTreeSet<String>,
}

impl ConflictLinks {
    /// Collect the links of every entry in both partitions
    ///
    /// Empty URLs are ignored.
    pub fn collect<'a>(entries: impl IntoIterator<Item = &'a SoftwareEntry>) -> Self {
        let mut links = Self::default();
        for entry in entries {
            links
                .webpages
                .extend(entry.webpage.iter().filter(|u| !u.trim().is_empty()).cloned());
            for repo in &entry.repository {
                if repo.url.trim().is_empty() {
                    continue;
                }
                if repo.is_hosted_repository() {
                    links.repositories.insert(repo.url.clone());
                } else {
                    links.webpages.insert(repo.url.clone());
                }
            }
        }
        links
    }

    /// Deduplicated union of both sets
    pub fn unique_urls(&self) -> BTreeSet<String> {
        self.repositories.union(&self.webpages).cloned().collect()
    }
}

/// Builds [`FullConflict`]s from conflict groups
pub struct ConflictAssembler<E> {
    enricher: E,
    counter: Arc<dyn TokenCounter>,
    max_tokens_per_chunk: usize,
    concurrency: usize,
}

impl<E: LinkEnricher> ConflictAssembler<E> {
    /// Create an assembler
    pub fn new(enricher: E, counter: Arc<dyn TokenCounter>, budget: &BudgetConfig) -> Self {
        Self {
            enricher,
            counter,
            max_tokens_per_chunk: budget.max_tokens_per_chunk,
            concurrency: DEFAULT_ENRICH_CONCURRENCY,
        }
    }

    /// Limit how many URLs are enriched concurrently (at least one)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The wrapped enricher
    pub fn enricher(&self) -> &E {
        &self.enricher
    }

    /// Strip references from every entry and gather evidence for their links
    ///
    /// Every unique URL is enriched exactly once. Failures of individual
    /// URLs only leave their evidence partial; assembly always completes.
    pub async fn build_full_conflict(&self, group: &ConflictGroup) -> FullConflict {
        let links = ConflictLinks::collect(group.entries());
        let urls = links.unique_urls();
        info!(
            "Enriching {} unique URLs ({} repositories, {} web pages)",
            urls.len(),
            links.repositories.len(),
            links.webpages.len()
        );

        let records: Vec<EvidenceRecord> = stream::iter(urls)
            .map(|url| async move { self.enricher.enrich(&url).await })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let webpage_contents = records
            .into_iter()
            .map(|record| {
                let url = record.url.clone();
                (url, self.chunk_evidence(record))
            })
            .collect();

        FullConflict {
            disconnected: group.disconnected.iter().map(SoftwareEntry::without_references).collect(),
            remaining: group.remaining.iter().map(SoftwareEntry::without_references).collect(),
            webpage_contents,
        }
    }

    /// Label → chunks for one evidence record
    ///
    /// Free text is chunked under the token limit; metadata is kept whole as
    /// a single compact JSON chunk.
    pub fn chunk_evidence(&self, record: EvidenceRecord) -> BTreeMap<String, Vec<String>> {
        let mut contents = BTreeMap::new();
        let max = self.max_tokens_per_chunk;

        if let Fetch::Found(text) = record.content {
            let chunks = chunk_text(&text, max, self.counter.as_ref());
            if !chunks.is_empty() {
                contents.insert(labels::CONTENT.to_string(), chunks);
            }
        }
        if let Fetch::Found(text) = record.readme_content {
            let chunks = chunk_text(&text, max, self.counter.as_ref());
            if !chunks.is_empty() {
                contents.insert(labels::README.to_string(), chunks);
            }
        }
        if let Fetch::Found(metadata) = record.repo_metadata {
            contents.insert(labels::REPOSITORY_METADATA.to_string(), vec![metadata.to_string()]);
        }
        if let Fetch::Found(metadata) = record.project_metadata {
            contents.insert(labels::PROJECT_METADATA.to_string(), vec![metadata.to_string()]);
        }

        debug!("{}: {} content labels", record.url, contents.len());
        contents
    }
}
