//! Production resolution of disputed clusters

use crate::config::ResolverConfig;
use crate::error::ResolverError;
use crate::inference::ask_oracle;
use crate::metrics::ResolverMetrics;
use crate::remap::InstanceIndex;
use crate::state::ConflictState;
use concord_assembler::{ConflictAssembler, MessageBuilder};
use concord_domain::{
    Cluster, ConflictGroup, ConflictSet, GroupedEntries, LinkEnricher, Oracle, ResolutionResult,
};
use concord_ledger::{ArtifactStore, ErrorLog, Ledger, ReviewQueue};
use concord_llm::RateLimiter;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Everything a resolution run produced
#[derive(Debug, Clone, Default)]
pub struct ResolutionRun {
    /// Grouped entries with resolved clusters regrouped
    pub grouped: GroupedEntries,
    /// Results by conflict key, stored ones included
    pub results: BTreeMap<String, ResolutionResult>,
    /// Counters for this run
    pub metrics: ResolverMetrics,
}

/// Drives each disputed cluster through assembly, the oracle and the ledger
pub struct Workflow<E, O> {
    assembler: ConflictAssembler<E>,
    builder: MessageBuilder,
    oracle: O,
    limiter: RateLimiter,
    ledger: Ledger,
    review: ReviewQueue,
    errors: ErrorLog,
    artifacts: ArtifactStore,
    config: ResolverConfig,
}

impl<E: LinkEnricher, O: Oracle> Workflow<E, O> {
    /// Create a workflow writing to the files named in `config`
    pub fn new(
        assembler: ConflictAssembler<E>,
        builder: MessageBuilder,
        oracle: O,
        config: ResolverConfig,
    ) -> Result<Self, ResolverError> {
        config.validate().map_err(ResolverError::Config)?;
        let limiter = RateLimiter::per_minute(oracle.requests_per_minute());
        Ok(Self {
            assembler,
            builder,
            oracle,
            limiter,
            ledger: Ledger::open(&config.paths.ledger),
            review: ReviewQueue::open(&config.paths.review_queue),
            errors: ErrorLog::open(&config.paths.error_log),
            artifacts: ArtifactStore::new(&config.paths.raw_results_dir),
            config,
        })
    }

    /// The wrapped oracle
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// The ledger results are written to
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Resolve every conflict in `conflicts` against `grouped`
    ///
    /// Conflicts are handled one after another; one failing never stops
    /// the others. Only an unreadable ledger aborts the run.
    pub async fn run(
        &self,
        grouped: &GroupedEntries,
        conflicts: &ConflictSet,
    ) -> Result<ResolutionRun, ResolverError> {
        let stored = self.ledger.load_results()?;
        let solved = self.ledger.load_solved_keys()?;
        let index = InstanceIndex::build(grouped);
        let mut run = ResolutionRun::default();

        for key in conflicts.keys().filter(|key| !grouped.contains_key(*key)) {
            warn!("Conflict {} has no cluster in the grouped entries, skipping", key);
        }
        info!(
            "Resolving {} conflicts ({} already solved)",
            conflicts.len(),
            solved.len()
        );

        for (key, cluster) in grouped {
            let Some(group) = conflicts.get(key) else {
                run.grouped.insert(key.clone(), cluster.clone());
                continue;
            };

            let mut state = ConflictState::Unseen;
            if solved.contains(key) {
                info!("Skipping conflict {}, already solved", key);
                state.advance(key, ConflictState::Solved);
                run.metrics.skipped += 1;
                let output = match stored.get(key) {
                    Some(result) => {
                        run.results.insert(key.clone(), result.clone());
                        self.regroup(key, result, cluster, &index)
                    }
                    None => cluster.clone(),
                };
                run.grouped.insert(key.clone(), output);
                continue;
            }

            let output = match self.resolve_one(key, group, &mut state, &mut run.metrics).await {
                Ok(result) => {
                    self.record(key, &result, &mut run.metrics);
                    let output = if result.verdict.is_unclear() {
                        state.advance(key, ConflictState::Unclear);
                        run.metrics.unclear += 1;
                        self.raise_review(key, &result);
                        cluster.clone()
                    } else {
                        state.advance(key, ConflictState::Resolved);
                        run.metrics.resolved += 1;
                        self.regroup(key, &result, cluster, &index)
                    };
                    run.results.insert(key.clone(), result);
                    output
                }
                Err(e) => {
                    state.advance(key, ConflictState::Failed);
                    self.fail(key, e, &mut run.metrics);
                    cluster.clone()
                }
            };
            run.grouped.insert(key.clone(), output);
        }

        info!("Resolution finished\n{}", run.metrics.summary());
        Ok(run)
    }

    async fn resolve_one(
        &self,
        key: &str,
        group: &ConflictGroup,
        state: &mut ConflictState,
        metrics: &mut ResolverMetrics,
    ) -> Result<ResolutionResult, ResolverError> {
        state.advance(key, ConflictState::Assembling);
        let conflict = self.assembler.build_full_conflict(group).await;
        let prompt =
            self.builder
                .build_prompt(conflict, self.config.prompt_style, self.config.prompt_mode)?;

        state.advance(key, ConflictState::AwaitingOracle);
        info!("Making inference for conflict {}", key);
        ask_oracle(
            &self.oracle,
            &self.limiter,
            &self.artifacts,
            key,
            &prompt,
            &self.config.model,
            metrics,
        )
        .await
    }

    fn record(&self, key: &str, result: &ResolutionResult, metrics: &mut ResolverMetrics) {
        if let Err(e) = self.ledger.append(key, result) {
            error!("Could not record result for {}: {}", key, e);
            metrics.ledger_errors += 1;
        }
    }

    fn fail(&self, key: &str, err: ResolverError, metrics: &mut ResolverMetrics) {
        if let ResolverError::Parse(_) = err {
            // parse_result already warned
            metrics.unparsed += 1;
            if self.config.persist_unparsed {
                if let Err(e) = self.ledger.append_unparsed(key) {
                    error!("Could not record result for {}: {}", key, e);
                    metrics.ledger_errors += 1;
                }
                return;
            }
            info!("Conflict {} left unsolved: {}", key, err);
        } else {
            metrics.failed += 1;
            error!("Error processing conflict {}: {}", key, err);
        }

        if let Err(e) = self.errors.record(key, &err.to_string()) {
            error!("Could not log failure of {}: {}", key, e);
        }
    }

    fn raise_review(&self, key: &str, result: &ResolutionResult) {
        let item = result.github_issue.clone().unwrap_or_else(|| {
            json!({
                "key": key,
                "explanation": result.explanation.clone().map_or(Value::Null, Value::String),
            })
        });
        if let Err(e) = self.review.push(&item) {
            error!("Could not queue review for {}: {}", key, e);
        }
    }

    fn regroup(
        &self,
        key: &str,
        result: &ResolutionResult,
        cluster: &Cluster,
        index: &InstanceIndex,
    ) -> Cluster {
        match &result.groups {
            Some(groups) if !result.verdict.is_unclear() => index.remap(key, groups),
            Some(_) => cluster.clone(),
            None => {
                if !result.verdict.is_unclear() {
                    warn!("Conflict {}: verdict {} has no groups", key, result.verdict.as_str());
                }
                cluster.clone()
            }
        }
    }
}
