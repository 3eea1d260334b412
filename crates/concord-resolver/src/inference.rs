//! Batch inference over a prepared messages file

use crate::config::ResolverConfig;
use crate::error::ResolverError;
use crate::metrics::ResolverMetrics;
use concord_assembler::parse_result;
use concord_domain::{Oracle, Prompt, ResolutionResult};
use concord_ledger::{ArtifactStore, Ledger, MessagesFile};
use concord_llm::RateLimiter;
use std::time::Instant;
use tracing::{error, info, warn};

/// Throttle, query, save the raw answer and usage, parse
///
/// Shared by batch inference and the production workflow.
pub(crate) async fn ask_oracle<O: Oracle>(
    oracle: &O,
    limiter: &RateLimiter,
    artifacts: &ArtifactStore,
    key: &str,
    prompt: &Prompt,
    model: &str,
    metrics: &mut ResolverMetrics,
) -> Result<ResolutionResult, ResolverError> {
    limiter.wait().await;
    metrics.oracle_calls += 1;

    let start = Instant::now();
    let reply = oracle
        .query(prompt, model)
        .await
        .map_err(|e| ResolverError::Oracle(e.to_string()))?;
    let elapsed = start.elapsed();

    // A lost artifact never costs the verdict
    if let Err(e) = artifacts.write_raw(key, &reply.answer) {
        warn!("Could not save raw answer for {}: {}", key, e);
        metrics.artifact_errors += 1;
    }
    if let Err(e) = artifacts.append_meta(key, &reply.usage, elapsed) {
        warn!("Could not save usage for {}: {}", key, e);
        metrics.artifact_errors += 1;
    }

    Ok(parse_result(&reply.answer)?)
}

/// Sends every unsolved prepared prompt to the oracle
pub struct InferenceRunner<O> {
    oracle: O,
    limiter: RateLimiter,
    ledger: Ledger,
    artifacts: ArtifactStore,
    model: String,
    persist_unparsed: bool,
}

impl<O: Oracle> InferenceRunner<O> {
    /// Create a runner; throttling follows the oracle's quota
    pub fn new(oracle: O, config: &ResolverConfig) -> Result<Self, ResolverError> {
        config.validate().map_err(ResolverError::Config)?;
        let limiter = RateLimiter::per_minute(oracle.requests_per_minute());
        Ok(Self {
            oracle,
            limiter,
            ledger: Ledger::open(&config.paths.ledger),
            artifacts: ArtifactStore::new(&config.paths.raw_results_dir),
            model: config.model.clone(),
            persist_unparsed: config.persist_unparsed,
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

    /// Query the oracle for every prompt whose key is not in the ledger
    ///
    /// A failure for one key is logged and the run moves on; the key stays
    /// unsolved.
    pub async fn run(&self, messages: &MessagesFile) -> Result<ResolverMetrics, ResolverError> {
        let prompts = messages.load()?;
        let solved = self.ledger.load_solved_keys()?;
        let mut metrics = ResolverMetrics::new();
        info!("Number of cases to process: {}", prompts.len());

        for (key, prompt) in &prompts {
            if solved.contains(key) {
                info!("Skipping conflict {}, already solved", key);
                metrics.skipped += 1;
                continue;
            }

            info!("Making inference for conflict {}", key);
            let outcome = ask_oracle(
                &self.oracle,
                &self.limiter,
                &self.artifacts,
                key,
                prompt,
                &self.model,
                &mut metrics,
            )
            .await;

            match outcome {
                Ok(result) => {
                    if result.verdict.is_unclear() {
                        metrics.unclear += 1;
                    } else {
                        metrics.resolved += 1;
                    }
                    if let Err(e) = self.ledger.append(key, &result) {
                        error!("Could not record result for {}: {}", key, e);
                        metrics.ledger_errors += 1;
                    }
                }
                Err(ResolverError::Parse(e)) => {
                    metrics.unparsed += 1;
                    if self.persist_unparsed {
                        if let Err(e) = self.ledger.append_unparsed(key) {
                            error!("Could not record result for {}: {}", key, e);
                            metrics.ledger_errors += 1;
                        }
                    } else {
                        info!("Conflict {} left unsolved: {}", key, e);
                    }
                }
                Err(e) => {
                    error!("Error processing conflict {}: {}", key, e);
                    metrics.failed += 1;
                }
            }
        }

        info!("All inferences completed");
        Ok(metrics)
    }
}
