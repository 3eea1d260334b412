//! Per-conflict states of the resolution workflow

use std::fmt;
use tracing::debug;

/// Where one conflict key is in the workflow
///
/// `Unseen → Assembling → AwaitingOracle → Resolved | Unclear | Failed`.
/// Keys already in the ledger go straight to `Solved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictState {
    /// Not in the ledger yet
    Unseen,
    /// Gathering evidence and building messages
    Assembling,
    /// Oracle call in flight
    AwaitingOracle,
    /// Verdict other than Unclear; entries regrouped
    Resolved,
    /// Unclear verdict; recorded and sent to review
    Unclear,
    /// Error; not recorded, retried next run
    Failed,
    /// Found in the ledger at start; stored result reused
    Solved,
}

impl ConflictState {
    /// True for states a conflict never leaves during a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConflictState::Resolved
                | ConflictState::Unclear
                | ConflictState::Failed
                | ConflictState::Solved
        )
    }

    /// Whether moving to `next` is allowed
    pub fn can_transition_to(&self, next: ConflictState) -> bool {
        use ConflictState::*;
        matches!(
            (self, next),
            (Unseen, Assembling)
                | (Unseen, Solved)
                | (Assembling, AwaitingOracle)
                | (Assembling, Failed)
                | (AwaitingOracle, Resolved)
                | (AwaitingOracle, Unclear)
                | (AwaitingOracle, Failed)
        )
    }

    /// Move to `next`, logging the transition
    pub fn advance(&mut self, key: &str, next: ConflictState) {
        debug_assert!(
            self.can_transition_to(next),
            "invalid transition {} -> {}",
            self,
            next
        );
        debug!("Conflict {}: {} -> {}", key, self, next);
        *self = next;
    }
}

impl fmt::Display for ConflictState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictState::Unseen => "unseen",
            ConflictState::Assembling => "assembling",
            ConflictState::AwaitingOracle => "awaiting-oracle",
            ConflictState::Resolved => "resolved",
            ConflictState::Unclear => "unclear",
            ConflictState::Failed => "failed",
            ConflictState::Solved => "solved",
        };
        f.write_str(name)
    }
}
