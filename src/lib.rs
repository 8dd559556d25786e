//! codereview - severity-ranked code review engine.
//!
//! Accepts a block of source code, fans it out to a fixed set of heuristic
//! analyzers in parallel, and aggregates their findings into a rated
//! report. An optional AI pass asks a chat-completion endpoint for a
//! quality assessment and degrades to a local estimate when that fails.
//! Suggested fixes are literal line rewrites applied on demand.
//!
//! # Architecture
//!
//! - `detect`: findings vocabulary, analyzers and the parallel coordinator
//! - `score`: rating table and local quality score
//! - `report`: the report model and output formatting (pretty, JSON)
//! - `gate`: debounce gate limiting request frequency
//! - `ai`: augmentor capability with remote and local implementations
//! - `fix`: fix derivation and the exact-span fix applicator
//! - `orchestrator`: the state machine tying everything together
//! - `config`: YAML engine configuration
//!
//! # Example
//!
//! ```no_run
//! use codereview::{EngineConfig, Language, Orchestrator};
//!
//! # async fn demo() -> Result<(), codereview::EngineError> {
//! let engine = Orchestrator::new(EngineConfig::default());
//! if engine.submit("eval(userInput)", Language::Generic, false).await? {
//!     let report = engine.current_report().unwrap();
//!     println!("{}", report.rating());
//! }
//! # Ok(())
//! # }
//! ```

pub mod ai;
pub mod cli;
pub mod config;
pub mod detect;
pub mod fix;
pub mod gate;
pub mod orchestrator;
pub mod report;
pub mod score;

pub use ai::{AugmentSource, AugmentedResult, Augmentor, CredentialStore};
pub use config::EngineConfig;
pub use detect::{AnalysisRequest, Category, Coordinator, Finding, Language, Rule, Severity};
pub use fix::Fix;
pub use gate::DebounceGate;
pub use orchestrator::{EngineError, InputError, Orchestrator, OrchestratorState};
pub use report::{Metrics, Report};
pub use score::Rating;
