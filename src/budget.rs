//! Token-budget admission check.
//!
//! Runs exactly once per generation request, on the combined file tree and
//! README, before any model call is made. The estimate is a deliberately
//! cheap whitespace word count: it does not need to match any tokenizer,
//! only to be deterministic and monotonic in text length.

/// Corpora at or below this estimate always proceed.
pub const SOFT_TOKEN_LIMIT: usize = 50_000;

/// Corpora at or above this estimate never proceed, credential or not; the
/// backend's maximum context cannot fit them.
pub const HARD_TOKEN_LIMIT: usize = 195_000;

/// Deterministic, model-agnostic token estimate.
///
/// ```
/// use diagramsmith::budget::estimate_tokens;
///
/// assert_eq!(estimate_tokens("fn main() {}"), 3);
/// assert_eq!(estimate_tokens(""), 0);
/// ```
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Admission decision for one generation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    /// Over the default budget; the caller may retry with their own
    /// credential.
    RejectOverSoftLimit { count: usize },
    /// Over the backend's maximum context; rejected unconditionally.
    RejectOverHardLimit { count: usize },
}

/// Apply the admission thresholds to an estimated count.
///
/// `has_own_credential` is true when the caller supplied their own API key,
/// which relaxes the soft limit (but never the hard one).
pub fn check(count: usize, has_own_credential: bool) -> GateDecision {
    if count >= HARD_TOKEN_LIMIT {
        GateDecision::RejectOverHardLimit { count }
    } else if count > SOFT_TOKEN_LIMIT && !has_own_credential {
        GateDecision::RejectOverSoftLimit { count }
    } else {
        GateDecision::Proceed
    }
}
