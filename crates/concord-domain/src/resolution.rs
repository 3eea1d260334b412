//! Oracle verdicts and usage accounting

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The oracle's decision about a conflict
///
/// Known verdicts are matched case-insensitively; anything else is kept
/// verbatim so no information from the oracle is lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    /// The entries describe the same software
    Same,
    /// The entries describe different software
    Different,
    /// The oracle could not decide; needs a human
    Unclear,
    /// Any other verdict string
    Other(String),
}

impl Verdict {
    /// True for the terminal "Unclear" verdict
    pub fn is_unclear(&self) -> bool {
        matches!(self, Verdict::Unclear)
    }

    /// Canonical string form
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Same => "Same",
            Verdict::Different => "Different",
            Verdict::Unclear => "Unclear",
            Verdict::Other(s) => s,
        }
    }
}

impl From<String> for Verdict {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "same" => Verdict::Same,
            "different" => Verdict::Different,
            "unclear" => Verdict::Unclear,
            _ => Verdict::Other(s),
        }
    }
}

impl From<&str> for Verdict {
    fn from(s: &str) -> Self {
        Verdict::from(s.to_string())
    }
}

impl From<Verdict> for String {
    fn from(v: Verdict) -> Self {
        v.as_str().to_string()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence reported by the oracle (or a human reviewer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    /// Numeric score, usually in [0, 1]
    Score(f64),
    /// Qualitative label such as "high"
    Label(String),
}

/// Structured verdict for one conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// The decision
    pub verdict: Verdict,

    /// How sure the oracle is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,

    /// Free-text rationale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    /// Key features behind the decision (benchmarking mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Value>,

    /// Corrected partition as lists of entry ids (production mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Vec<String>>>,

    /// Review payload the oracle drafted for unclear cases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_issue: Option<Value>,

    /// Anything else the oracle returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolutionResult {
    /// A result carrying only a verdict
    pub fn new(verdict: impl Into<Verdict>) -> Self {
        Self {
            verdict: verdict.into(),
            confidence: None,
            explanation: None,
            features: None,
            groups: None,
            github_issue: None,
            extra: Map::new(),
        }
    }

    /// Set a numeric confidence
    pub fn with_confidence(mut self, score: f64) -> Self {
        self.confidence = Some(Confidence::Score(score));
        self
    }

    /// Set the explanation
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Set the corrected partition
    pub fn with_groups(mut self, groups: Vec<Vec<String>>) -> Self {
        self.groups = Some(groups);
        self
    }
}

/// Token accounting returned alongside an oracle answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Tokens in the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,

    /// Tokens in the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,

    /// Sum reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,

    /// Sub-provider that actually served the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Provider-specific fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UsageMetadata {
    /// True when nothing was reported
    pub fn is_empty(&self) -> bool {
        self.prompt_tokens.is_none()
            && self.completion_tokens.is_none()
            && self.total_tokens.is_none()
            && self.provider.is_none()
            && self.extra.is_empty()
    }
}

/// Answer text plus usage accounting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleReply {
    /// Raw answer text, empty when the provider gave nothing usable
    pub answer: String,
    /// Usage accounting, empty when unavailable
    pub usage: UsageMetadata,
}

impl OracleReply {
    /// A reply with text and usage
    pub fn new(answer: impl Into<String>, usage: UsageMetadata) -> Self {
        Self {
            answer: answer.into(),
            usage,
        }
    }

    /// The degraded reply: empty answer, empty metadata
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when there is no answer text
    pub fn is_empty(&self) -> bool {
        self.answer.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verdict_matching_is_case_insensitive() {
        assert_eq!(Verdict::from("unclear"), Verdict::Unclear);
        assert_eq!(Verdict::from(" Same "), Verdict::Same);
        assert_eq!(Verdict::from("Partially"), Verdict::Other("Partially".to_string()));
        assert!(Verdict::from("UNCLEAR").is_unclear());
    }

    #[test]
    fn test_minimal_result_serializes_compactly() {
        let result = ResolutionResult::new("Same").with_confidence(0.9);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"verdict": "Same", "confidence": 0.9}));
    }

    #[test]
    fn test_result_keeps_unknown_fields() {
        let result: ResolutionResult = serde_json::from_value(json!({
            "verdict": "Different",
            "confidence": "high",
            "notes": "license differs"
        }))
        .unwrap();
        assert_eq!(result.verdict, Verdict::Different);
        assert_eq!(result.confidence, Some(Confidence::Label("high".to_string())));
        assert_eq!(result.extra["notes"], "license differs");
    }

    #[test]
    fn test_result_requires_verdict() {
        let parsed = serde_json::from_value::<ResolutionResult>(json!({"confidence": 0.3}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_usage_metadata_extra_fields() {
        let usage: UsageMetadata = serde_json::from_value(json!({
            "prompt_tokens": 100,
            "completion_tokens": 20,
            "total_tokens": 120,
            "cost": 0.0
        }))
        .unwrap();
        assert_eq!(usage.total_tokens, Some(120));
        assert!(usage.extra.contains_key("cost"));
        assert!(!usage.is_empty());
        assert!(UsageMetadata::default().is_empty());
    }
}
