//! The outward-facing engine: a small state machine sequencing the debounce
//! gate, the analyzers, the AI augmentor and the fix applicator.
//!
//! ```text
//! idle --submit--> analyzing --(want_ai && credential)--> ai_analyzing --> report_ready
//!                           \------------------------------------------> report_ready
//! report_ready --apply_fix--> analyzing        any --clear--> idle
//! ```
//!
//! Only one request is in flight at a time: submissions while analyzing
//! are refused rather than queued, so reports are delivered in submission
//! order. A caller that drops a request before it completes rolls the
//! session back to what it was before that request was admitted.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;

use crate::ai::{
    Augmentor, ChainedCredentials, CredentialStore, EnvCredentials, FileCredentials,
    LocalAugmentor, RemoteAugmentor, ResilientAugmentor,
};
use crate::config::EngineConfig;
use crate::detect::{AnalysisRequest, Coordinator, Language};
use crate::fix::{self, Fix};
use crate::gate::DebounceGate;
use crate::report::Report;

/// Why a source text was rejected before analysis.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("no input: the source is empty")]
    Empty,
    #[error("input too large: {len} characters (maximum is {max})")]
    TooLarge { len: usize, max: usize },
}

/// Failures surfaced to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
    #[error("fix {fix_id} is not applicable: its original text is no longer in the source")]
    FixNotApplicable { fix_id: String },
    #[error("unknown fix: {0}")]
    UnknownFix(String),
    #[error("no report is ready")]
    NoReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrchestratorState {
    Idle,
    Analyzing,
    AiAnalyzing,
    ReportReady,
}

impl OrchestratorState {
    /// Whether a request is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, OrchestratorState::Analyzing | OrchestratorState::AiAnalyzing)
    }
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorState::Idle => write!(f, "idle"),
            OrchestratorState::Analyzing => write!(f, "analyzing"),
            OrchestratorState::AiAnalyzing => write!(f, "aiAnalyzing"),
            OrchestratorState::ReportReady => write!(f, "reportReady"),
        }
    }
}

/// Reject empty or oversized source text.
pub fn validate_source(source: &str, max_chars: usize) -> Result<(), InputError> {
    if source.trim().is_empty() {
        return Err(InputError::Empty);
    }
    let len = source.chars().count();
    if len > max_chars {
        return Err(InputError::TooLarge { len, max: max_chars });
    }
    Ok(())
}

/// Mutable state guarded by the orchestrator's lock.
///
/// `generation` changes on every accepted submission and on `clear()`; a
/// run only publishes its report if the generation is unchanged.
struct Session {
    state: OrchestratorState,
    generation: u64,
    request: Option<AnalysisRequest>,
    report: Option<Report>,
    fixes: Vec<Fix>,
}

/// What `begin` replaced, restored if the run is abandoned.
struct Snapshot {
    request: Option<AnalysisRequest>,
    report: Option<Report>,
    fixes: Vec<Fix>,
}

/// Held by a run until it publishes. Dropping it early (the caller's future
/// was cancelled, or the analysis task failed) restores the snapshot.
struct InFlight<'a> {
    orchestrator: &'a Orchestrator,
    generation: u64,
    previous: Option<Snapshot>,
}

impl InFlight<'_> {
    fn disarm(&mut self) {
        self.previous = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.orchestrator.abandon(self.generation, previous);
        }
    }
}

pub struct Orchestrator {
    config: EngineConfig,
    coordinator: Arc<Coordinator>,
    gate: DebounceGate,
    augmentor: ResilientAugmentor,
    credentials: Arc<dyn CredentialStore>,
    session: Mutex<Session>,
    state_tx: watch::Sender<OrchestratorState>,
}

impl Orchestrator {
    /// Orchestrator with the default credential chain and remote augmentor.
    pub fn new(config: EngineConfig) -> Self {
        OrchestratorBuilder::new().config(config).build()
    }

    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn state(&self) -> OrchestratorState {
        self.session().state
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.state_tx.subscribe()
    }

    pub fn has_credential(&self) -> bool {
        self.credentials.has_credential()
    }

    pub fn current_report(&self) -> Option<Report> {
        self.session().report.clone()
    }

    /// Fixes derived from the current report.
    pub fn current_fixes(&self) -> Vec<Fix> {
        self.session().fixes.clone()
    }

    /// Source text of the current (or in-flight) request.
    pub fn current_source(&self) -> Option<String> {
        self.session().request.as_ref().map(|r| r.source.clone())
    }

    /// Submit source text for analysis.
    ///
    /// Returns `Ok(false)` when the request is dropped, either because one is
    /// already in flight or because the debounce gate refused it. On
    /// `Ok(true)` the report is available from [`current_report`] once this
    /// returns (unless a `clear()` raced with it).
    ///
    /// [`current_report`]: Orchestrator::current_report
    pub async fn submit(
        &self,
        source: &str,
        language: Language,
        want_ai: bool,
    ) -> Result<bool, EngineError> {
        self.submit_at(source, language, want_ai, Instant::now())
            .await
    }

    /// [`submit`](Orchestrator::submit) with an explicit arrival time.
    pub async fn submit_at(
        &self,
        source: &str,
        language: Language,
        want_ai: bool,
        now: Instant,
    ) -> Result<bool, EngineError> {
        validate_source(source, self.config.max_source_chars)?;

        let request = AnalysisRequest::new(source, language, want_ai);
        let (generation, previous) = {
            let mut session = self.session();
            if session.state.is_busy() {
                tracing::debug!(state = %session.state, "request refused, analysis in flight");
                return Ok(false);
            }
            if !self.gate.should_admit(now) {
                tracing::debug!("request debounced");
                return Ok(false);
            }
            self.begin(&mut session, request.clone())
        };

        tracing::info!(%language, chars = source.len(), want_ai, "request admitted");
        self.run(request, generation, previous).await;
        Ok(true)
    }

    /// Apply one of the current report's fixes and re-analyze the result.
    ///
    /// Bypasses the debounce gate. Returns the patched source text. On any
    /// error the current report is left untouched.
    pub async fn apply_fix(&self, fix_id: &str) -> Result<String, EngineError> {
        let (request, generation, previous) = {
            let mut session = self.session();
            if session.state != OrchestratorState::ReportReady {
                return Err(EngineError::NoReport);
            }
            let fix = session
                .fixes
                .iter()
                .find(|f| f.id == fix_id)
                .cloned()
                .ok_or_else(|| EngineError::UnknownFix(fix_id.to_string()))?;
            let current = session.request.as_ref().ok_or(EngineError::NoReport)?;

            let patched = fix::apply(&current.source, &fix).map_err(|_| {
                EngineError::FixNotApplicable {
                    fix_id: fix_id.to_string(),
                }
            })?;
            validate_source(&patched, self.config.max_source_chars)?;

            let request = AnalysisRequest::new(patched, current.language, current.want_ai);
            let (generation, previous) = self.begin(&mut session, request.clone());
            (request, generation, previous)
        };

        tracing::info!(fix_id, "fix applied, re-analyzing");
        let patched = request.source.clone();
        self.run(request, generation, previous).await;
        Ok(patched)
    }

    /// Discard any report and return to idle. An in-flight run finishes but
    /// its result is dropped.
    pub fn clear(&self) {
        let mut session = self.session();
        session.generation += 1;
        session.request = None;
        session.report = None;
        session.fixes.clear();
        self.set_state(&mut session, OrchestratorState::Idle);
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, session: &mut Session, state: OrchestratorState) {
        session.state = state;
        self.state_tx.send_replace(state);
        tracing::debug!(%state, "state changed");
    }

    /// Enter `analyzing` for a new request. Returns its generation and the
    /// session contents it replaced.
    fn begin(&self, session: &mut Session, request: AnalysisRequest) -> (u64, Snapshot) {
        session.generation += 1;
        let previous = Snapshot {
            request: session.request.replace(request),
            report: session.report.take(),
            fixes: std::mem::take(&mut session.fixes),
        };
        self.set_state(session, OrchestratorState::Analyzing);
        (session.generation, previous)
    }

    /// Roll back a run that will never publish.
    fn abandon(&self, generation: u64, previous: Snapshot) {
        let mut session = self.session();
        if session.generation != generation {
            return;
        }
        session.generation += 1;
        let state = if previous.report.is_some() {
            OrchestratorState::ReportReady
        } else {
            OrchestratorState::Idle
        };
        session.request = previous.request;
        session.report = previous.report;
        session.fixes = previous.fixes;
        tracing::debug!(%state, "request abandoned, session restored");
        self.set_state(&mut session, state);
    }

    /// Move to `state` if `generation` is still current.
    fn advance(&self, generation: u64, state: OrchestratorState) -> bool {
        let mut session = self.session();
        if session.generation != generation {
            return false;
        }
        self.set_state(&mut session, state);
        true
    }

    async fn run(&self, request: AnalysisRequest, generation: u64, previous: Snapshot) {
        let mut in_flight = InFlight {
            orchestrator: self,
            generation,
            previous: Some(previous),
        };

        // The analyzer fan-out is CPU-bound; keep it off the async workers.
        let coordinator = Arc::clone(&self.coordinator);
        let analyzed = {
            let request = request.clone();
            tokio::task::spawn_blocking(move || {
                let report = coordinator.run_analysis(&request);
                let fixes = fix::suggest_fixes(&request.source, report.findings());
                (report, fixes)
            })
            .await
        };
        let (report, fixes) = match analyzed {
            Ok(analyzed) => analyzed,
            Err(e) => {
                tracing::warn!(error = %e, "analysis task failed");
                return;
            }
        };

        let report = if request.want_ai && self.credentials.has_credential() {
            if !self.advance(generation, OrchestratorState::AiAnalyzing) {
                tracing::debug!("request superseded before AI pass");
                return;
            }
            let ai = self.augmentor.assess(&request.source, request.language).await;
            report.with_augmentation(ai)
        } else {
            report
        };

        let mut session = self.session();
        if session.generation != generation {
            tracing::debug!("discarding superseded report");
            return;
        }
        tracing::info!(
            rating = %report.rating(),
            findings = report.findings().len(),
            fixes = fixes.len(),
            "report ready"
        );
        session.report = Some(report);
        session.fixes = fixes;
        self.set_state(&mut session, OrchestratorState::ReportReady);
        in_flight.disarm();
    }
}

/// Builds an [`Orchestrator`].
///
/// By default credentials come from the configured environment variable,
/// then the user's `api_key` file, and the primary augmentor is the remote
/// endpoint. Whatever primary augmentor is chosen, failures fall back to the
/// local one.
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: EngineConfig,
    augmentor: Option<Arc<dyn Augmentor>>,
    credentials: Option<Arc<dyn CredentialStore>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the primary (remote) augmentor.
    pub fn augmentor(mut self, augmentor: Arc<dyn Augmentor>) -> Self {
        self.augmentor = Some(augmentor);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn build(self) -> Orchestrator {
        let config = self.config;
        let coordinator = Arc::new(Coordinator::new(config.thresholds.clone()));

        let credentials: Arc<dyn CredentialStore> = match self.credentials {
            Some(credentials) => credentials,
            None => Arc::new(
                ChainedCredentials::default()
                    .with(EnvCredentials::new(config.ai.api_key_env.clone()))
                    .with(FileCredentials::new()),
            ),
        };
        let primary: Arc<dyn Augmentor> = match self.augmentor {
            Some(augmentor) => augmentor,
            None => Arc::new(RemoteAugmentor::new(
                config.ai.clone(),
                Arc::clone(&credentials),
            )),
        };
        let augmentor =
            ResilientAugmentor::new(primary, LocalAugmentor::new(Arc::clone(&coordinator)));

        let (state_tx, _) = watch::channel(OrchestratorState::Idle);

        Orchestrator {
            gate: DebounceGate::new(config.debounce_interval()),
            coordinator,
            augmentor,
            credentials,
            session: Mutex::new(Session {
                state: OrchestratorState::Idle,
                generation: 0,
                request: None,
                report: None,
                fixes: Vec::new(),
            }),
            state_tx,
            config,
        }
    }
}
