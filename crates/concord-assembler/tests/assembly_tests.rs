//! Integration tests for conflict assembly and message building
//!
//! The link enricher is replaced by an in-memory fake that counts calls.

use async_trait::async_trait;
use concord_assembler::{
    parse_result, AssemblyError, BudgetConfig, ConflictAssembler, MessageBuilder, PromptMode,
    PromptStyle, TemplateRegistry,
};
use concord_domain::{
    labels, ConflictGroup, EvidenceRecord, Fetch, LinkEnricher, Prompt, RepositoryKind,
    SoftwareEntry, Verdict,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CountingEnricher {
    calls: Mutex<HashMap<String, usize>>,
}

impl CountingEnricher {
    fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl LinkEnricher for CountingEnricher {
    async fn enrich(&self, url: &str) -> EvidenceRecord {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        let mut record = EvidenceRecord::empty(url);
        if url.contains("github.com") {
            record.repo_metadata = Fetch::Found(json!({"stars": 12, "language": "Python"}));
            record.readme_content = Fetch::Found("# Tool\n\nAligns short reads fast.".to_string());
        } else if url.contains("broken") {
            record.content = Fetch::Failed("connection refused".to_string());
        } else {
            record.content = Fetch::Found("Tool home page with documentation".to_string());
        }
        record
    }
}

fn words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn budget(max_total_tokens: usize) -> BudgetConfig {
    BudgetConfig {
        max_tokens_per_chunk: 3,
        max_total_tokens,
        tokenizer_model: "gpt-4".to_string(),
    }
}

fn shared_url_group() -> ConflictGroup {
    let a = SoftwareEntry::new("a", "tool")
        .with_repository("https://github.com/org/tool", RepositoryKind::Github)
        .with_webpage("https://tool.example.org");
    let b = SoftwareEntry::new("b", "tool").with_webpage("https://github.com/org/tool");
    ConflictGroup::new(vec![a], vec![b])
}

#[tokio::test]
async fn test_shared_url_enriched_once() {
    let assembler = ConflictAssembler::new(CountingEnricher::default(), Arc::new(words), &budget(130_000));

    let full = assembler.build_full_conflict(&shared_url_group()).await;

    assert_eq!(assembler.enricher().calls_for("https://github.com/org/tool"), 1);
    assert_eq!(assembler.enricher().total_calls(), 2);
    assert_eq!(full.webpage_contents.len(), 2);
    let github_keys = full
        .webpage_contents
        .keys()
        .filter(|url| url.contains("github.com"))
        .count();
    assert_eq!(github_keys, 1);
}

#[tokio::test]
async fn test_references_stripped_and_evidence_chunked() {
    let assembler = ConflictAssembler::new(CountingEnricher::default(), Arc::new(words), &budget(130_000));

    let full = assembler.build_full_conflict(&shared_url_group()).await;

    assert!(full.disconnected[0].repository.is_empty());
    assert!(full.disconnected[0].webpage.is_empty());
    assert!(full.remaining[0].webpage.is_empty());

    let github = &full.webpage_contents["https://github.com/org/tool"];
    assert_eq!(github[labels::README], vec!["# Tool Aligns", "short reads fast."]);
    assert_eq!(github[labels::REPOSITORY_METADATA].len(), 1);

    let page = &full.webpage_contents["https://tool.example.org"];
    assert_eq!(page[labels::CONTENT].len(), 2);
}

#[tokio::test]
async fn test_failed_url_does_not_abort_assembly() {
    let a = SoftwareEntry::new("a", "tool").with_webpage("https://broken.example.org");
    let b = SoftwareEntry::new("b", "tool").with_webpage("https://tool.example.org");
    let assembler = ConflictAssembler::new(CountingEnricher::default(), Arc::new(words), &budget(130_000))
        .with_concurrency(1);

    let full = assembler.build_full_conflict(&ConflictGroup::new(vec![a], vec![b])).await;

    assert!(full.webpage_contents["https://broken.example.org"].is_empty());
    assert!(!full.webpage_contents["https://tool.example.org"].is_empty());
}

#[tokio::test]
async fn test_messages_follow_assembly() {
    let assembler = ConflictAssembler::new(CountingEnricher::default(), Arc::new(words), &budget(130_000));
    let full = assembler.build_full_conflict(&shared_url_group()).await;

    let builder = MessageBuilder::new(
        Arc::new(TemplateRegistry::builtin().unwrap()),
        Arc::new(words),
        budget(130_000),
    );
    let prompt = builder
        .build_prompt(full, PromptStyle::Production, PromptMode::Chat)
        .unwrap();
    let Prompt::Chat(messages) = prompt else {
        panic!("expected chat prompt");
    };

    // instruction, 1 remaining, 1 disconnected, 2 github labels, 1 page label, closing
    assert_eq!(messages.len(), 7);
    assert!(messages[3].content.starts_with("Content from https://github.com/org/tool:"));
    assert!(messages[6].content.contains("'groups'"));
}

#[tokio::test]
async fn test_budget_exceeded_is_reported() {
    let assembler = ConflictAssembler::new(CountingEnricher::default(), Arc::new(words), &budget(130_000));
    let full = assembler.build_full_conflict(&shared_url_group()).await;

    let builder = MessageBuilder::new(
        Arc::new(TemplateRegistry::builtin().unwrap()),
        Arc::new(words),
        budget(50),
    );
    let result = builder.build_prompt(full, PromptStyle::Production, PromptMode::Flattened);
    assert!(matches!(result, Err(AssemblyError::BudgetExceeded { limit: 50, .. })));
}

#[test]
fn test_tolerant_parsing() {
    let answer = "Here is the result:\n```json\n{\"verdict\": \"Same\", \"confidence\": 0.9}\n```";
    let result = parse_result(answer).unwrap();
    assert_eq!(result.verdict, Verdict::Same);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"verdict": "Same", "confidence": 0.9})
    );

    assert!(parse_result("No structured answer today.").is_err());
}
