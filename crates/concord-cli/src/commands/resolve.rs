//! Resolve command implementation.

use crate::cli::ResolveArgs;
use crate::commands::{assembly_parts, read_json, write_json};
use crate::config::ConcordConfig;
use crate::error::Result;
use concord_domain::{ConflictSet, GroupedEntries, Oracle};
use concord_llm::{MockOracle, OracleClient};
use concord_resolver::{ResolverConfig, ResolverMetrics, Workflow};
use tracing::info;

/// Execute the resolve command.
///
/// Writes the regrouped entries to `args.output` and returns the run counts.
pub async fn execute_resolve(
    args: ResolveArgs,
    config: &ConcordConfig,
    dry_run: bool,
) -> Result<ResolverMetrics> {
    let grouped: GroupedEntries = read_json(&args.grouped)?;
    let conflicts: ConflictSet = read_json(&args.conflicts)?;
    info!(
        "Loaded {} clusters, {} under dispute",
        grouped.len(),
        conflicts.len()
    );

    let mut resolver = config.resolver_config();
    if let Some(results) = args.results {
        resolver.paths.ledger = results;
    }

    let output = if dry_run {
        info!("Dry run: answering with the mock oracle");
        run(MockOracle::default(), config, resolver, &grouped, &conflicts).await?
    } else {
        let oracle = OracleClient::from_config(&config.oracle)?;
        run(oracle, config, resolver, &grouped, &conflicts).await?
    };

    write_json(&args.output, &output.0)?;
    Ok(output.1)
}

async fn run<O: Oracle>(
    oracle: O,
    config: &ConcordConfig,
    resolver: ResolverConfig,
    grouped: &GroupedEntries,
    conflicts: &ConflictSet,
) -> Result<(GroupedEntries, ResolverMetrics)> {
    let (assembler, builder) = assembly_parts(config).await?;
    let workflow = Workflow::new(assembler, builder, oracle, resolver)?;
    let run = workflow.run(grouped, conflicts).await?;
    Ok((run.grouped, run.metrics))
}
