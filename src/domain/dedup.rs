//! Per-parent name deduplication.

use std::collections::{HashMap, HashSet};

/// Tie-breaker appended when a suffixed name still collides.
const TIE_BREAKER: char = '_';

/// Name-collision scope for the direct children of one parent.
///
/// Counts how often each base name was requested and remembers every name
/// handed out, so `[a, a, a]` resolves to `[a, a_1, a_2]`.
#[derive(Debug, Default, Clone)]
pub struct DedupScope {
    counters: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl DedupScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `name` to a name not yet handed out in this scope.
    pub fn resolve(&mut self, name: &str) -> String {
        let ctr = self.counters.get(name).copied().unwrap_or(0);
        self.counters.insert(name.to_string(), ctr + 1);

        let mut resolved = if ctr > 0 {
            format!("{}_{}", name, ctr)
        } else {
            name.to_string()
        };
        while self.taken.contains(&resolved) {
            resolved.push(TIE_BREAKER);
        }
        self.taken.insert(resolved.clone());
        resolved
    }
}

/// Resolve `name` within `scope`; without a scope the name passes through.
pub fn dedup_name(scope: Option<&mut DedupScope>, name: &str) -> String {
    match scope {
        Some(scope) => scope.resolve(name),
        None => name.to_string(),
    }
}
