//! Per-run counters

/// Counts collected during one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverMetrics {
    /// Conflicts skipped because they were already done
    pub skipped: usize,

    /// Prompts written to the messages file
    pub prepared: usize,

    /// Conflicts with a verdict other than Unclear
    pub resolved: usize,

    /// Conflicts sent to human review
    pub unclear: usize,

    /// Answers with no structured result
    pub unparsed: usize,

    /// Conflicts that failed and will be retried
    pub failed: usize,

    /// Oracle requests issued
    pub oracle_calls: usize,

    /// Ledger writes that failed
    pub ledger_errors: usize,

    /// Raw answer or usage files that could not be written
    pub artifact_errors: usize,
}

impl ResolverMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Conflicts that reached a verdict this run
    pub fn total_answered(&self) -> usize {
        self.resolved + self.unclear
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Resolution Summary".to_string(),
            "==================".to_string(),
            format!("Skipped (already done): {}", self.skipped),
        ];
        if self.prepared > 0 {
            lines.push(format!("Prepared: {}", self.prepared));
        }
        lines.push(format!("Oracle calls: {}", self.oracle_calls));
        lines.push(format!("Resolved: {}", self.resolved));
        lines.push(format!("Unclear (sent to review): {}", self.unclear));
        lines.push(format!("Unparsable answers: {}", self.unparsed));
        lines.push(format!("Failed: {}", self.failed));
        if self.ledger_errors > 0 {
            lines.push(format!("Ledger write errors: {}", self.ledger_errors));
        }
        if self.artifact_errors > 0 {
            lines.push(format!("Artifact write errors: {}", self.artifact_errors));
        }
        lines.join("\n")
    }
}
