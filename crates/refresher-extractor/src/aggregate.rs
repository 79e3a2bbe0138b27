//! Run-level suggestion aggregate

use refresher_domain::{Category, Fingerprint, Priority, Suggestion};
use std::collections::BTreeMap;

/// Deduplicated suggestions of one run, keyed and ordered by fingerprint
///
/// Filled in a single pass after per-document extraction has finished.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionSet {
    by_fingerprint: BTreeMap<Fingerprint, Suggestion>,
    merges: usize,
}

impl SuggestionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a suggestion, merging it into an existing one with the same
    /// fingerprint. Returns `true` when a merge happened.
    pub fn insert(&mut self, suggestion: Suggestion) -> bool {
        match self.by_fingerprint.get_mut(&suggestion.fingerprint) {
            Some(existing) => {
                existing.merge(suggestion);
                self.merges += 1;
                true
            }
            None => {
                self.by_fingerprint
                    .insert(suggestion.fingerprint.clone(), suggestion);
                false
            }
        }
    }

    /// Number of distinct suggestions
    pub fn len(&self) -> usize {
        self.by_fingerprint.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.by_fingerprint.is_empty()
    }

    /// How many inserts were merged into an existing suggestion
    pub fn merges(&self) -> usize {
        self.merges
    }

    /// Look up a suggestion by fingerprint
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&Suggestion> {
        self.by_fingerprint.get(fingerprint)
    }

    /// Suggestions in fingerprint order
    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.by_fingerprint.values()
    }

    /// Suggestions grouped by category, each group sorted by priority
    /// (high first) then title
    pub fn by_category(&self) -> BTreeMap<Category, Vec<&Suggestion>> {
        let mut groups: BTreeMap<Category, Vec<&Suggestion>> = BTreeMap::new();
        for suggestion in self.iter() {
            groups.entry(suggestion.category).or_default().push(suggestion);
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then_with(|| a.title.cmp(&b.title))
                    .then_with(|| a.fingerprint.cmp(&b.fingerprint))
            });
        }
        groups
    }

    /// Number of suggestions per priority
    pub fn priority_counts(&self) -> BTreeMap<Priority, usize> {
        let mut counts = BTreeMap::new();
        for suggestion in self.iter() {
            *counts.entry(suggestion.priority).or_insert(0) += 1;
        }
        counts
    }

    /// Number of suggestions per category
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for suggestion in self.iter() {
            *counts.entry(suggestion.category).or_insert(0) += 1;
        }
        counts
    }

    /// Consume the set, returning suggestions in fingerprint order
    pub fn into_vec(self) -> Vec<Suggestion> {
        self.by_fingerprint.into_values().collect()
    }
}

impl Extend<Suggestion> for SuggestionSet {
    fn extend<I: IntoIterator<Item = Suggestion>>(&mut self, iter: I) {
        for suggestion in iter {
            self.insert(suggestion);
        }
    }
}

impl FromIterator<Suggestion> for SuggestionSet {
    fn from_iter<I: IntoIterator<Item = Suggestion>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
