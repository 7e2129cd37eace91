//! Maps incoming field names onto feature-vector slots
//!
//! Matching is tiered and the first tier that matches wins:
//!
//! 1. alias table (target must be a known canonical name)
//! 2. exact, case-sensitive
//! 3. case-insensitive
//! 4. normalized (`_` and `-` stripped, case-insensitive)
//! 5. substring containment in either direction, only between names longer
//!    than [`MIN_SUBSTRING_LEN`] characters
//!
//! Exact and alias matches always beat heuristics so a value is never
//! silently routed to a neighbouring physiological slot.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::alias::AliasTable;

/// Names of this length or shorter never take part in substring matching.
pub const MIN_SUBSTRING_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Alias,
    Exact,
    CaseInsensitive,
    Normalized,
    Substring,
}

/// A matched slot and the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub slot: usize,
    pub canonical: String,
    pub tier: MatchTier,
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone)]
pub struct FeatureResolver {
    aliases: Arc<AliasTable>,
    canonical: Vec<String>,
    exact: HashMap<String, usize>,
    lowered: Vec<String>,
    normalized: Vec<String>,
}

impl FeatureResolver {
    pub fn new(aliases: Arc<AliasTable>, canonical: &[String]) -> Self {
        let mut exact = HashMap::with_capacity(canonical.len());
        for (i, name) in canonical.iter().enumerate() {
            exact.entry(name.clone()).or_insert(i);
        }
        Self {
            aliases,
            canonical: canonical.to_vec(),
            exact,
            lowered: canonical.iter().map(|c| c.to_lowercase()).collect(),
            normalized: canonical.iter().map(|c| normalize(c)).collect(),
        }
    }

    pub fn canonical_names(&self) -> &[String] {
        &self.canonical
    }

    fn hit(&self, slot: usize, tier: MatchTier) -> Resolution {
        Resolution {
            slot,
            canonical: self.canonical[slot].clone(),
            tier,
        }
    }

    pub fn resolve(&self, external: &str) -> Option<Resolution> {
        if external.is_empty() {
            return None;
        }

        if let Some(&slot) = self
            .aliases
            .get(external)
            .and_then(|target| self.exact.get(target))
        {
            return Some(self.hit(slot, MatchTier::Alias));
        }

        if let Some(&slot) = self.exact.get(external) {
            return Some(self.hit(slot, MatchTier::Exact));
        }

        let lowered = external.to_lowercase();
        if let Some(slot) = self.lowered.iter().position(|c| *c == lowered) {
            return Some(self.hit(slot, MatchTier::CaseInsensitive));
        }

        let normalized = normalize(external);
        if !normalized.is_empty() {
            if let Some(slot) = self.normalized.iter().position(|c| *c == normalized) {
                return Some(self.hit(slot, MatchTier::Normalized));
            }
        }

        if lowered.chars().count() > MIN_SUBSTRING_LEN {
            let slot = self.lowered.iter().position(|c| {
                c.chars().count() > MIN_SUBSTRING_LEN
                    && (lowered.contains(c.as_str()) || c.contains(lowered.as_str()))
            });
            if let Some(slot) = slot {
                return Some(self.hit(slot, MatchTier::Substring));
            }
        }

        None
    }
}
