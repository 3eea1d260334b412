//! Integration tests for the resolution workflow, preparation and inference
//!
//! Network access is replaced by an in-memory link enricher and the mock
//! oracle; every run writes into a temporary directory.

use async_trait::async_trait;
use concord_assembler::{BudgetConfig, ConflictAssembler, MessageBuilder, TemplateRegistry};
use concord_domain::{
    Cluster, ConflictGroup, ConflictSet, EvidenceRecord, Fetch, GroupedEntries, LinkEnricher,
    ResolutionResult, SoftwareEntry, TokenCounter, Verdict,
};
use concord_ledger::{ArtifactStore, ErrorLog, Ledger, MessagesFile, ReviewQueue};
use concord_llm::MockOracle;
use concord_resolver::{InferenceRunner, MessagePreparer, OutputPaths, ResolverConfig, Workflow};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const ALPHA_ANSWER: &str = r#"Here is the result:
```json
{"verdict": "Different", "confidence": 0.9, "explanation": "Distinct repositories", "groups": [["a1"], ["a2"]]}
```"#;

const BETA_ANSWER: &str =
    r#"{"verdict": "Unclear", "confidence": 0.4, "explanation": "Both pages are empty"}"#;

struct StaticEnricher;

#[async_trait]
impl LinkEnricher for StaticEnricher {
    async fn enrich(&self, url: &str) -> EvidenceRecord {
        let mut record = EvidenceRecord::empty(url);
        record.content = Fetch::Found(format!("Home page at {}", url));
        record
    }
}

fn words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn config(dir: &Path) -> ResolverConfig {
    ResolverConfig {
        model: "test-model".to_string(),
        paths: OutputPaths {
            ledger: dir.join("results.jsonl"),
            messages: dir.join("messages.jsonl"),
            raw_results_dir: dir.join("raw"),
            review_queue: dir.join("issues.jsonl"),
            error_log: dir.join("errors.jsonl"),
        },
        ..Default::default()
    }
}

fn parts(max_total_tokens: usize) -> (ConflictAssembler<StaticEnricher>, MessageBuilder) {
    let counter: Arc<dyn TokenCounter> = Arc::new(words);
    let budget = BudgetConfig {
        max_tokens_per_chunk: 8000,
        max_total_tokens,
        tokenizer_model: "gpt-4".to_string(),
    };
    let assembler = ConflictAssembler::new(StaticEnricher, counter.clone(), &budget);
    let builder = MessageBuilder::new(
        Arc::new(TemplateRegistry::builtin().unwrap()),
        counter,
        budget,
    );
    (assembler, builder)
}

fn workflow(
    oracle: MockOracle,
    config: ResolverConfig,
    max_total_tokens: usize,
) -> Workflow<StaticEnricher, MockOracle> {
    let (assembler, builder) = parts(max_total_tokens);
    Workflow::new(assembler, builder, oracle, config).unwrap()
}

fn scripted_oracle() -> MockOracle {
    let mut oracle = MockOracle::default();
    oracle.add_response("alphatool", ALPHA_ANSWER);
    oracle.add_response("betatool", BETA_ANSWER);
    oracle
}

fn instance(id: &str, name: &str) -> serde_json::Value {
    json!({"_id": id, "data": {"name": name}})
}

fn grouped() -> GroupedEntries {
    GroupedEntries::from([
        (
            "alpha".to_string(),
            Cluster {
                instances: vec![instance("a1", "alphatool"), instance("a2", "alphatool")],
            },
        ),
        (
            "beta".to_string(),
            Cluster {
                instances: vec![instance("b1", "betatool"), instance("b2", "betatool")],
            },
        ),
        (
            "gamma".to_string(),
            Cluster {
                instances: vec![instance("g1", "gammatool")],
            },
        ),
    ])
}

fn pair(name: &str, first: &str, second: &str) -> ConflictGroup {
    ConflictGroup::new(
        vec![SoftwareEntry::new(first, name).with_webpage(format!("https://{}.example.org", name))],
        vec![SoftwareEntry::new(second, name)],
    )
}

fn conflicts() -> ConflictSet {
    ConflictSet::from([
        ("alpha".to_string(), pair("alphatool", "a1", "a2")),
        ("beta".to_string(), pair("betatool", "b1", "b2")),
    ])
}

#[tokio::test]
async fn test_resolved_clusters_are_regrouped() {
    let dir = TempDir::new().unwrap();
    let oracle = scripted_oracle();
    let workflow = workflow(oracle.clone(), config(dir.path()), 130_000);

    let run = workflow.run(&grouped(), &conflicts()).await.unwrap();

    assert_eq!(oracle.call_count(), 2);
    assert_eq!(run.metrics.resolved, 1);
    assert_eq!(run.metrics.unclear, 1);
    assert_eq!(run.metrics.failed, 0);

    let alpha = &run.grouped["alpha"].instances;
    assert_eq!(alpha.len(), 2);
    assert_eq!(alpha[0][0]["_id"], "a1");
    assert_eq!(alpha[1][0]["_id"], "a2");

    // Unclear and undisputed clusters pass through untouched
    assert_eq!(run.grouped["beta"], grouped()["beta"]);
    assert_eq!(run.grouped["gamma"], grouped()["gamma"]);

    let solved = Ledger::open(dir.path().join("results.jsonl"))
        .load_solved_keys()
        .unwrap();
    assert!(solved.contains("alpha"));
    assert!(solved.contains("beta"));

    let artifacts = ArtifactStore::new(dir.path().join("raw"));
    assert!(artifacts.raw_path("alpha").exists());
    assert!(artifacts.meta_path("beta").exists());
}

#[tokio::test]
async fn test_unclear_verdict_is_recorded_and_reviewed() {
    let dir = TempDir::new().unwrap();
    let workflow = workflow(scripted_oracle(), config(dir.path()), 130_000);

    let run = workflow.run(&grouped(), &conflicts()).await.unwrap();

    assert_eq!(run.results["beta"].verdict, Verdict::Unclear);
    let stored = Ledger::open(dir.path().join("results.jsonl"))
        .load_results()
        .unwrap();
    assert!(stored["beta"].verdict.is_unclear());

    let items = ReviewQueue::open(dir.path().join("issues.jsonl")).load().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["key"], "beta");
    assert_eq!(items[0]["explanation"], "Both pages are empty");
}

#[tokio::test]
async fn test_review_item_prefers_drafted_issue() {
    let dir = TempDir::new().unwrap();
    let mut oracle = MockOracle::default();
    oracle.add_response(
        "betatool",
        r#"{"verdict": "Unclear", "github_issue": {"title": "Check betatool", "body": "Two entries"}}"#,
    );
    let workflow = workflow(oracle, config(dir.path()), 130_000);

    let conflicts = ConflictSet::from([("beta".to_string(), pair("betatool", "b1", "b2"))]);
    workflow.run(&grouped(), &conflicts).await.unwrap();

    let items = ReviewQueue::open(dir.path().join("issues.jsonl")).load().unwrap();
    assert_eq!(items, vec![json!({"title": "Check betatool", "body": "Two entries"})]);
}

#[tokio::test]
async fn test_solved_keys_skip_the_oracle() {
    let dir = TempDir::new().unwrap();
    Ledger::open(dir.path().join("results.jsonl"))
        .append(
            "alpha",
            &ResolutionResult::new("Different").with_groups(vec![
                vec!["a2".to_string()],
                vec!["a1".to_string()],
            ]),
        )
        .unwrap();

    let oracle = scripted_oracle();
    let workflow = workflow(oracle.clone(), config(dir.path()), 130_000);
    let conflicts = ConflictSet::from([("alpha".to_string(), pair("alphatool", "a1", "a2"))]);

    let run = workflow.run(&grouped(), &conflicts).await.unwrap();

    assert_eq!(oracle.call_count(), 0);
    assert_eq!(run.metrics.skipped, 1);
    assert_eq!(run.results["alpha"].verdict, Verdict::Different);
    // Stored groups are applied again
    assert_eq!(run.grouped["alpha"].instances[0][0]["_id"], "a2");
}

#[tokio::test]
async fn test_failed_conflict_does_not_stop_the_batch() {
    let dir = TempDir::new().unwrap();
    let mut oracle = MockOracle::default();
    oracle.add_error("alphatool", "connection reset");
    oracle.add_response("betatool", BETA_ANSWER);
    let first = workflow(oracle.clone(), config(dir.path()), 130_000);

    let run = first.run(&grouped(), &conflicts()).await.unwrap();

    assert_eq!(oracle.call_count(), 2);
    assert_eq!(run.metrics.failed, 1);
    assert_eq!(run.metrics.unclear, 1);
    assert_eq!(run.grouped["alpha"], grouped()["alpha"]);

    let ledger = Ledger::open(dir.path().join("results.jsonl"));
    let solved = ledger.load_solved_keys().unwrap();
    assert!(!solved.contains("alpha"));
    assert!(solved.contains("beta"));

    let failures = ErrorLog::open(dir.path().join("errors.jsonl")).load().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].key, "alpha");
    assert!(failures[0].error.contains("connection reset"));

    // The next run retries only the failed key
    let retry_oracle = scripted_oracle();
    let retry = workflow(retry_oracle.clone(), config(dir.path()), 130_000);
    let run = retry.run(&grouped(), &conflicts()).await.unwrap();
    assert_eq!(retry_oracle.call_count(), 1);
    assert_eq!(run.metrics.skipped, 1);
    assert_eq!(run.metrics.resolved, 1);
}

#[tokio::test]
async fn test_unwritable_artifacts_keep_the_verdict() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path());
    // A plain file where the artifact folder should go
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, "not a directory").unwrap();
    config.paths.raw_results_dir = blocked;
    let oracle = scripted_oracle();
    let workflow = workflow(oracle.clone(), config, 130_000);

    let run = workflow.run(&grouped(), &conflicts()).await.unwrap();

    assert_eq!(run.metrics.failed, 0);
    assert_eq!(run.metrics.resolved, 1);
    assert_eq!(run.metrics.unclear, 1);
    assert_eq!(run.metrics.artifact_errors, 4);
    let solved = Ledger::open(dir.path().join("results.jsonl"))
        .load_solved_keys()
        .unwrap();
    assert!(solved.contains("alpha"));
    assert!(solved.contains("beta"));

    // Nothing is asked twice on the next run
    let rerun = workflow.run(&grouped(), &conflicts()).await.unwrap();
    assert_eq!(rerun.metrics.skipped, 2);
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_budget_exceeded_never_reaches_the_oracle() {
    let dir = TempDir::new().unwrap();
    let oracle = scripted_oracle();
    let workflow = workflow(oracle.clone(), config(dir.path()), 10);

    let run = workflow.run(&grouped(), &conflicts()).await.unwrap();

    assert_eq!(oracle.call_count(), 0);
    assert_eq!(run.metrics.failed, 2);
    assert!(run.results.is_empty());

    let failures = ErrorLog::open(dir.path().join("errors.jsonl")).load().unwrap();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|f| f.error.contains("Prompt too long")));
    assert!(Ledger::open(dir.path().join("results.jsonl"))
        .load_solved_keys()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_unparsable_answer_stays_unsolved() {
    let dir = TempDir::new().unwrap();
    let oracle = MockOracle::new("I could not decide.");
    let workflow = workflow(oracle, config(dir.path()), 130_000);

    let run = workflow.run(&grouped(), &conflicts()).await.unwrap();

    assert_eq!(run.metrics.unparsed, 2);
    assert!(Ledger::open(dir.path().join("results.jsonl"))
        .load_solved_keys()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_unparsable_answer_persisted_on_request() {
    let dir = TempDir::new().unwrap();
    let config = ResolverConfig {
        persist_unparsed: true,
        ..config(dir.path())
    };
    let oracle = MockOracle::new("I could not decide.");
    let workflow = workflow(oracle.clone(), config, 130_000);

    workflow.run(&grouped(), &conflicts()).await.unwrap();
    let run = workflow.run(&grouped(), &conflicts()).await.unwrap();

    assert_eq!(oracle.call_count(), 2);
    assert_eq!(run.metrics.skipped, 2);
    assert_eq!(run.grouped["alpha"], grouped()["alpha"]);
}

#[tokio::test]
async fn test_prepare_then_infer() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    let messages = MessagesFile::open(&config.paths.messages);

    let (assembler, builder) = parts(130_000);
    let preparer = MessagePreparer::new(assembler, builder, config.prompt_style, config.prompt_mode);
    let metrics = preparer.prepare(&conflicts(), &messages).await.unwrap();
    assert_eq!(metrics.prepared, 2);

    let again = preparer.prepare(&conflicts(), &messages).await.unwrap();
    assert_eq!(again.prepared, 0);
    assert_eq!(again.skipped, 2);
    assert_eq!(messages.load().unwrap().len(), 2);

    let oracle = scripted_oracle();
    let runner = InferenceRunner::new(oracle.clone(), &config).unwrap();
    let metrics = runner.run(&messages).await.unwrap();
    assert_eq!(metrics.resolved, 1);
    assert_eq!(metrics.unclear, 1);

    let results = runner.ledger().load_results().unwrap();
    assert_eq!(results["alpha"].verdict, Verdict::Different);
    assert!(ArtifactStore::new(&config.paths.raw_results_dir)
        .raw_path("beta")
        .exists());

    let rerun = runner.run(&messages).await.unwrap();
    assert_eq!(oracle.call_count(), 2);
    assert_eq!(rerun.skipped, 2);
}

#[tokio::test]
async fn test_inference_survives_unwritable_artifacts() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path());
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, "not a directory").unwrap();
    config.paths.raw_results_dir = blocked;

    let messages = MessagesFile::open(&config.paths.messages);
    let (assembler, builder) = parts(130_000);
    MessagePreparer::new(assembler, builder, config.prompt_style, config.prompt_mode)
        .prepare(&conflicts(), &messages)
        .await
        .unwrap();

    let runner = InferenceRunner::new(scripted_oracle(), &config).unwrap();
    let metrics = runner.run(&messages).await.unwrap();

    assert_eq!(metrics.failed, 0);
    assert_eq!(metrics.total_answered(), 2);
    assert!(metrics.artifact_errors > 0);
    assert_eq!(runner.ledger().load_solved_keys().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_model_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = ResolverConfig {
        model: String::new(),
        ..config(dir.path())
    };
    let (assembler, builder) = parts(130_000);
    assert!(Workflow::new(assembler, builder, MockOracle::default(), config).is_err());
}
