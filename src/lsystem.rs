//! The rewrite engine: a seed string expanded through character rules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Character-to-string production rules.
///
/// A character with no entry rewrites to itself, so placeholder symbols can
/// be threaded through a grammar without registering identity rules.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: HashMap<char, String>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule (builder pattern). A later rule for the same key wins.
    pub fn with_rule(mut self, key: char, replacement: impl Into<String>) -> Self {
        self.insert(key, replacement);
        self
    }

    /// Inserts a rule, returning the replacement it overrode, if any.
    pub fn insert(&mut self, key: char, replacement: impl Into<String>) -> Option<String> {
        self.rules.insert(key, replacement.into())
    }

    /// The explicit replacement for `key`, if one is registered.
    pub fn get(&self, key: char) -> Option<&str> {
        self.rules.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.rules.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Length in bytes `c` contributes to the next generation.
    fn rewritten_len(&self, c: char) -> usize {
        self.get(c).map_or(c.len_utf8(), str::len)
    }

    fn rewrite_into(&self, c: char, out: &mut String) {
        match self.rules.get(&c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
}

impl<S: Into<String>> FromIterator<(char, S)> for RuleTable {
    fn from_iter<I: IntoIterator<Item = (char, S)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

/// Rewrites `seed` through `iterations` generations of `rules`.
///
/// Every pass replaces each character in order with its rule, or with
/// itself when it has none; the output of one pass is the input of the
/// next. Zero iterations return the seed unchanged.
///
/// Output length grows exponentially with the replacement lengths, so
/// callers are expected to bound `iterations` (see
/// [`MAX_ITERATIONS`](crate::MAX_ITERATIONS)).
pub fn expand(seed: &str, rules: &RuleTable, iterations: u32) -> String {
    let mut current = seed.to_owned();

    for _ in 0..iterations {
        let capacity = current.chars().map(|c| rules.rewritten_len(c)).sum();
        let mut next = String::with_capacity(capacity);
        for c in current.chars() {
            rules.rewrite_into(c, &mut next);
        }
        current = next;
    }

    current
}

/// A seed string together with its production rules.
///
/// Read-only once constructed; the same system can be expanded any number
/// of times, from any number of threads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LSystem {
    seed: String,
    rules: RuleTable,
}

impl LSystem {
    pub fn new(seed: impl Into<String>, rules: RuleTable) -> Self {
        Self {
            seed: seed.into(),
            rules,
        }
    }

    /// The generation-0 string.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Shorthand for [`expand`] over this system's seed and rules.
    pub fn expand(&self, iterations: u32) -> String {
        expand(&self.seed, &self.rules, iterations)
    }
}
