//! Per-entry verification.
//!
//! - [`DetailPageVerifier`]: fetch the entry's detail page, look for the marker
//! - [`VerificationQueue`]: deduplicated, strictly sequential, delay-separated drain

pub mod queue;
pub mod verifier;

pub use queue::{ResolutionSink, VerificationQueue};
pub use verifier::{
    detail_page_url, marker_pattern, DetailPageVerifier, DisclosureVerifier, Inconclusive,
    Verification,
};
