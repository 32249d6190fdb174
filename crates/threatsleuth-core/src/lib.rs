/// ThreatSleuth Core: detection, aggregation, and data model.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (GUI, CLI, TUI).
///
/// # Modules
///
/// - [`model`]: File identities, threat records, and OS samples.
/// - [`registry`]: Deduplicating threat registry and CSV export.
/// - [`scanner`]: Denylist-based filesystem scanning, inline or on a worker thread.
/// - [`collector`]: Process and network connection snapshot sources.
/// - [`stats`]: Dashboard counters derived from current state.
/// - [`dashboard`]: The controller state object tying it all together.
/// - [`config`]: User-tunable settings loaded from JSON.
/// - [`error`]: Error taxonomy shared by all modules.
pub mod collector;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod registry;
pub mod scanner;
pub mod stats;
