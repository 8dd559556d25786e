//! End-to-end tests for the orchestrator state machine.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

use codereview::ai::{
    AiError, AugmentSource, AugmentedResult, Augmentor, StaticCredentials,
};
use codereview::{
    EngineConfig, EngineError, InputError, Language, Orchestrator, OrchestratorState, Rating,
};

/// Holds the AI pass open until released.
struct Gated {
    release: Arc<Notify>,
}

#[async_trait]
impl Augmentor for Gated {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn augment(
        &self,
        _source: &str,
        _language: Language,
    ) -> Result<AugmentedResult, AiError> {
        self.release.notified().await;
        Ok(AugmentedResult {
            quality_score: 91,
            summary: "looks good".to_string(),
            suggestions: vec![],
            source: AugmentSource::Remote,
        })
    }
}

struct Failing;

#[async_trait]
impl Augmentor for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn augment(
        &self,
        _source: &str,
        _language: Language,
    ) -> Result<AugmentedResult, AiError> {
        Err(AiError::Status(503))
    }
}

fn config(debounce_ms: u64) -> EngineConfig {
    EngineConfig {
        debounce_ms,
        ..EngineConfig::default()
    }
}

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name);
    std::fs::read_to_string(path).expect("fixture should exist")
}

fn with_augmentor(augmentor: Arc<dyn Augmentor>) -> Orchestrator {
    Orchestrator::builder()
        .config(config(0))
        .credentials(Arc::new(StaticCredentials::new("sk-test")))
        .augmentor(augmentor)
        .build()
}

#[tokio::test]
async fn test_submission_refused_while_busy() {
    let release = Arc::new(Notify::new());
    let orch = Arc::new(with_augmentor(Arc::new(Gated {
        release: Arc::clone(&release),
    })));
    let mut states = orch.subscribe();

    let first = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.submit("x = 1", Language::Python, true).await })
    };

    states
        .wait_for(|s| *s == OrchestratorState::AiAnalyzing)
        .await
        .unwrap();
    assert!(!orch.submit("y = 2", Language::Python, false).await.unwrap());
    assert_eq!(orch.current_source().as_deref(), Some("x = 1"));

    release.notify_one();
    assert!(first.await.unwrap().unwrap());

    assert_eq!(orch.state(), OrchestratorState::ReportReady);
    let report = orch.current_report().unwrap();
    let ai = report.ai().unwrap();
    assert_eq!(ai.quality_score, 91);
    assert_eq!(ai.source, AugmentSource::Remote);
}

#[tokio::test]
async fn test_clear_discards_in_flight_result() {
    let release = Arc::new(Notify::new());
    let orch = Arc::new(with_augmentor(Arc::new(Gated {
        release: Arc::clone(&release),
    })));
    let mut states = orch.subscribe();

    let task = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.submit("x = 1", Language::Python, true).await })
    };
    states
        .wait_for(|s| *s == OrchestratorState::AiAnalyzing)
        .await
        .unwrap();

    orch.clear();
    release.notify_one();
    task.await.unwrap().unwrap();

    assert_eq!(orch.state(), OrchestratorState::Idle);
    assert!(orch.current_report().is_none());
}

#[tokio::test]
async fn test_failed_ai_falls_back_locally() {
    let orch = with_augmentor(Arc::new(Failing));
    assert!(orch
        .submit("eval(userInput)", Language::Generic, true)
        .await
        .unwrap());

    let report = orch.current_report().unwrap();
    let ai = report.ai().unwrap();
    assert_eq!(ai.source, AugmentSource::LocalFallback);
    assert_eq!(ai.quality_score, 70);

    // The AI pass never changes the base report.
    assert_eq!(report.findings().len(), 1);
    assert_eq!(report.rating(), Rating::Good);
}

#[tokio::test]
async fn test_no_credential_skips_ai_state() {
    let orch = Orchestrator::builder()
        .config(config(0))
        .credentials(Arc::new(StaticCredentials::none()))
        .augmentor(Arc::new(Failing))
        .build();
    let mut states = orch.subscribe();

    orch.submit("x = 1", Language::Python, true).await.unwrap();
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), OrchestratorState::ReportReady);
    assert!(orch.current_report().unwrap().ai().is_none());
}

#[tokio::test]
async fn test_invalid_input_leaves_state_alone() {
    let orch = with_augmentor(Arc::new(Failing));
    orch.submit("x = 1", Language::Python, false).await.unwrap();

    let err = orch.submit("   \n", Language::Python, false).await.unwrap_err();
    assert_eq!(err, EngineError::InvalidInput(InputError::Empty));
    assert_eq!(orch.state(), OrchestratorState::ReportReady);
    assert_eq!(orch.current_source().as_deref(), Some("x = 1"));
}

#[tokio::test]
async fn test_debounce_window() {
    let orch = Orchestrator::builder()
        .config(config(500))
        .credentials(Arc::new(StaticCredentials::none()))
        .build();
    let t = Instant::now();

    assert!(orch.submit_at("a = 1", Language::Python, false, t).await.unwrap());
    let inside = t + Duration::from_millis(499);
    assert!(!orch.submit_at("a = 2", Language::Python, false, inside).await.unwrap());
    let boundary = t + Duration::from_millis(500);
    assert!(orch.submit_at("a = 3", Language::Python, false, boundary).await.unwrap());
    assert_eq!(orch.current_source().as_deref(), Some("a = 3"));
}

#[tokio::test]
async fn test_fix_round_trip_on_python_fixture() {
    let orch = Orchestrator::builder()
        .config(config(60_000))
        .credentials(Arc::new(StaticCredentials::none()))
        .build();
    orch.submit(&fixture("sample.py"), Language::Python, false)
        .await
        .unwrap();
    let before = orch.current_report().unwrap();
    assert_eq!(before.rating(), Rating::NeedsImprovement);

    let fixes = orch.current_fixes();
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].id, "python_bare_except:6");

    let patched = orch.apply_fix("python_bare_except:6").await.unwrap();
    assert!(patched.contains("    except Exception:\n"));

    let after = orch.current_report().unwrap();
    assert_eq!(after.findings().len(), before.findings().len() - 1);
    assert_eq!(after.rating(), Rating::NeedsImprovement);
    assert_eq!(orch.current_source().as_deref(), Some(patched.as_str()));
}

#[tokio::test]
async fn test_fix_emptying_source_is_rejected() {
    let orch = Orchestrator::builder()
        .config(config(0))
        .credentials(Arc::new(StaticCredentials::none()))
        .build();
    orch.submit("console.log(x)", Language::JavaScript, false)
        .await
        .unwrap();
    let before = orch.current_report().unwrap();

    let err = orch.apply_fix("js_console_log:1").await.unwrap_err();
    assert_eq!(err, EngineError::InvalidInput(InputError::Empty));
    assert_eq!(orch.state(), OrchestratorState::ReportReady);
    assert_eq!(orch.current_report(), Some(before));
}

#[tokio::test]
async fn test_concurrent_submissions_admit_one() {
    let orch = Orchestrator::builder()
        .config(config(60_000))
        .credentials(Arc::new(StaticCredentials::none()))
        .build();

    let sources: Vec<String> = (0..8).map(|i| format!("value = {}", i)).collect();
    let outcomes = futures::future::join_all(
        sources
            .iter()
            .map(|source| orch.submit(source, Language::Python, false)),
    )
    .await;

    let admitted = outcomes
        .into_iter()
        .map(|r| r.unwrap())
        .filter(|admitted| *admitted)
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(orch.state(), OrchestratorState::ReportReady);
}

#[tokio::test]
async fn test_dropped_request_does_not_wedge_engine() {
    let release = Arc::new(Notify::new());
    let orch = Arc::new(with_augmentor(Arc::new(Gated {
        release: Arc::clone(&release),
    })));
    let mut states = orch.subscribe();

    let task = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.submit("x = 1", Language::Python, true).await })
    };
    states
        .wait_for(|s| *s == OrchestratorState::AiAnalyzing)
        .await
        .unwrap();

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert_eq!(orch.state(), OrchestratorState::Idle);
    assert!(orch.current_source().is_none());
    assert_eq!(*states.borrow_and_update(), OrchestratorState::Idle);

    assert!(orch.submit("y = 2", Language::Python, false).await.unwrap());
    assert_eq!(orch.state(), OrchestratorState::ReportReady);
    assert_eq!(orch.current_source().as_deref(), Some("y = 2"));
}

#[tokio::test]
async fn test_dropped_request_restores_previous_report() {
    let release = Arc::new(Notify::new());
    let orch = Arc::new(with_augmentor(Arc::new(Gated {
        release: Arc::clone(&release),
    })));

    orch.submit("eval(userInput)", Language::Generic, false)
        .await
        .unwrap();
    let before = orch.current_report().unwrap();
    let mut states = orch.subscribe();

    let task = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.submit("x = 1", Language::Python, true).await })
    };
    states
        .wait_for(|s| *s == OrchestratorState::AiAnalyzing)
        .await
        .unwrap();
    task.abort();
    let _ = task.await;

    assert_eq!(orch.state(), OrchestratorState::ReportReady);
    assert_eq!(orch.current_report(), Some(before));
    assert_eq!(orch.current_source().as_deref(), Some("eval(userInput)"));
}
