//! Change-driven re-scan loop.
//!
//! [`DisclosureEngine::scan`] classifies every tile not seen before;
//! [`DisclosureEngine::run`] repeats it after each quiet
//! [`TrailingDebounce`] window following a document change.

pub mod debounce;
pub mod engine;

pub use debounce::TrailingDebounce;
pub use engine::{DisclosureEngine, EngineBuilder, EngineError, ScanReport};
