//! Writing prompts ahead of a separate inference step

use crate::error::ResolverError;
use crate::metrics::ResolverMetrics;
use concord_assembler::{ConflictAssembler, MessageBuilder, PromptMode, PromptStyle};
use concord_domain::{ConflictGroup, ConflictSet, LinkEnricher, Prompt};
use concord_ledger::MessagesFile;
use tracing::{error, info};

/// Assembles conflicts and appends their prompts to a messages file
pub struct MessagePreparer<E> {
    assembler: ConflictAssembler<E>,
    builder: MessageBuilder,
    style: PromptStyle,
    mode: PromptMode,
}

impl<E: LinkEnricher> MessagePreparer<E> {
    /// Create a preparer producing prompts in `style` and `mode`
    pub fn new(
        assembler: ConflictAssembler<E>,
        builder: MessageBuilder,
        style: PromptStyle,
        mode: PromptMode,
    ) -> Self {
        Self {
            assembler,
            builder,
            style,
            mode,
        }
    }

    /// Build the prompt for one conflict
    pub async fn prompt_for(&self, group: &ConflictGroup) -> Result<Prompt, ResolverError> {
        let conflict = self.assembler.build_full_conflict(group).await;
        Ok(self.builder.build_prompt(conflict, self.style, self.mode)?)
    }

    /// Prepare every conflict whose key is not yet in `file`
    ///
    /// A conflict that cannot be assembled is logged and left out, so the
    /// next run tries it again.
    pub async fn prepare(
        &self,
        conflicts: &ConflictSet,
        file: &MessagesFile,
    ) -> Result<ResolverMetrics, ResolverError> {
        let existing = file.keys()?;
        let mut metrics = ResolverMetrics::new();
        info!("Preparing messages for {} conflicts", conflicts.len());

        for (key, group) in conflicts {
            if existing.contains(key) {
                info!("Skipping conflict {}, already prepared", key);
                metrics.skipped += 1;
                continue;
            }

            let prompt = match self.prompt_for(group).await {
                Ok(prompt) => prompt,
                Err(e) => {
                    error!("Could not prepare conflict {}: {}", key, e);
                    metrics.failed += 1;
                    continue;
                }
            };

            match file.append(key, &prompt) {
                Ok(()) => metrics.prepared += 1,
                Err(e) => {
                    error!("Could not write messages for {}: {}", key, e);
                    metrics.ledger_errors += 1;
                }
            }
        }

        info!("Prepared {} prompts", metrics.prepared);
        Ok(metrics)
    }
}
