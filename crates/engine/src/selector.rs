//! Pluggable choice among a rule's candidate fixers.
//!
//! The engine's correctness never depends on the selector: any index
//! it returns is clamped to the candidate range, and the deterministic
//! [`FirstFixer`] default is a fully correct substitute for an
//! adaptive policy.

pub trait ActionSelector: Send + Sync {
    /// Picks one of `candidates` fixers (candidates >= 1) for the
    /// given rule. Out-of-range answers are clamped by the caller.
    fn choose(&self, rule_id: &str, candidates: usize) -> usize;
}

/// Always the first registered fixer.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstFixer;

impl ActionSelector for FirstFixer {
    fn choose(&self, _rule_id: &str, _candidates: usize) -> usize {
        0
    }
}
