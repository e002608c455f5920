//! Search limits shared by constructors and verifiers.

/// Explicit caps that keep the exhaustive searches from running away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum assignments tried by the permutation search
    pub max_steps: usize,
    /// Maximum DFS node expansions per cycle query; `None` means unbounded
    pub cycle_search_budget: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_steps: 5_000_000,
            cycle_search_budget: None,
        }
    }
}
