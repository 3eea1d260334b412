//! Prepare command implementation.

use crate::cli::PrepareArgs;
use crate::commands::{assembly_parts, read_json};
use crate::config::ConcordConfig;
use crate::error::Result;
use concord_domain::ConflictSet;
use concord_ledger::MessagesFile;
use concord_resolver::{MessagePreparer, ResolverMetrics};
use tracing::info;

/// Execute the prepare command.
pub async fn execute_prepare(args: PrepareArgs, config: &ConcordConfig) -> Result<ResolverMetrics> {
    let conflicts: ConflictSet = read_json(&args.conflicts)?;
    let resolver = config.resolver_config();
    let path = args.messages.unwrap_or(resolver.paths.messages);
    let mode = args.mode.map(Into::into).unwrap_or(resolver.prompt_mode);
    let style = args.style.map(Into::into).unwrap_or(resolver.prompt_style);
    info!("Preparing {:?} prompts in {:?} mode", style, mode);

    let (assembler, builder) = assembly_parts(config).await?;
    let preparer = MessagePreparer::new(assembler, builder, style, mode);
    Ok(preparer.prepare(&conflicts, &MessagesFile::open(path)).await?)
}
