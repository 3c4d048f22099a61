//! Keyword extraction. Binds seed categories to phrases taken from the
//! story idea, falling back to random word bank picks.

use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::catalog::WordBank;

/// Character triggers in priority order: `(substring, phrase)`.
pub const CHARACTER_TRIGGERS: &[(&str, &str)] = &[
    ("girl", "young girl"),
    ("boy", "curious boy"),
    ("man", "old man"),
    ("woman", "wise woman"),
    ("robot", "lonely robot"),
    ("detective", "retired detective"),
];

/// Categories seeded for every request unless configured otherwise.
pub const DEFAULT_SEEDS: &[&str] = &["character", "item", "place"];

/// Per-request binding of placeholder names to concrete phrases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMap(BTreeMap<String, String>);

impl KeywordMap {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: &str, phrase: &str) {
        self.0.insert(name.to_string(), phrase.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A fixed substring that, when present in the idea, binds a category to
/// a fixed phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub needle: String,
    pub phrase: String,
}

/// Heuristic keyword extraction. No language understanding: plain
/// substring checks against trigger tables and the word bank.
///
/// Categories with triggers are matched by trigger priority; every other
/// seed category is matched by scanning its word bank list in order.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    seeds: Vec<String>,
    triggers: FxHashMap<String, Vec<Trigger>>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        let mut extractor = Self::empty();
        for seed in DEFAULT_SEEDS {
            extractor = extractor.with_seed(seed);
        }
        for (needle, phrase) in CHARACTER_TRIGGERS {
            extractor = extractor.with_trigger("character", needle, phrase);
        }
        extractor
    }
}

impl KeywordExtractor {
    /// An extractor with no seeds and no triggers.
    pub fn empty() -> Self {
        Self {
            seeds: Vec::new(),
            triggers: FxHashMap::default(),
        }
    }

    /// Seed an additional word bank category.
    pub fn with_seed(mut self, category: &str) -> Self {
        if !self.seeds.iter().any(|s| s == category) {
            self.seeds.push(category.to_string());
        }
        self
    }

    /// Append a trigger to a category. Earlier triggers take priority.
    pub fn with_trigger(mut self, category: &str, needle: &str, phrase: &str) -> Self {
        self.triggers
            .entry(category.to_string())
            .or_default()
            .push(Trigger {
                needle: needle.to_string(),
                phrase: phrase.to_string(),
            });
        self
    }

    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    /// Build the keyword map for one request.
    ///
    /// Each seed first gets a uniformly random phrase from its category,
    /// then at most one idea-derived override. Seeds missing from the word
    /// bank are skipped.
    pub fn extract<R: Rng + ?Sized>(&self, idea: &str, word_bank: &WordBank, rng: &mut R) -> KeywordMap {
        let lowered = idea.to_lowercase();
        let mut keywords = KeywordMap::default();

        for category in &self.seeds {
            let Some(fallback) = word_bank.choose(category, rng) else {
                tracing::warn!(category = %category, "seed category missing from word bank");
                continue;
            };
            keywords.insert(category, fallback);
        }

        for category in &self.seeds {
            if !keywords.0.contains_key(category) {
                continue;
            }
            if let Some(phrase) = self.match_idea(category, &lowered, word_bank) {
                keywords.insert(category, phrase);
            }
        }

        tracing::debug!(?keywords, "extracted keywords");
        keywords
    }

    fn match_idea<'a>(&'a self, category: &str, lowered: &str, word_bank: &'a WordBank) -> Option<&'a str> {
        match self.triggers.get(category) {
            Some(triggers) => triggers
                .iter()
                .find(|t| lowered.contains(t.needle.as_str()))
                .map(|t| t.phrase.as_str()),
            None => word_bank
                .phrases_for(category)?
                .iter()
                .find(|p| lowered.contains(p.as_str()))
                .map(String::as_str),
        }
    }
}
