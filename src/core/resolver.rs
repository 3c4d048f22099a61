//! Placeholder resolution against a keyword map and the word bank.

use rand::Rng;

use crate::core::catalog::WordBank;
use crate::core::keywords::KeywordMap;

/// Resolves `{name}` placeholders in catalog patterns.
#[derive(Debug, Clone, Copy)]
pub struct TemplateResolver<'a> {
    word_bank: &'a WordBank,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(word_bank: &'a WordBank) -> Self {
        Self { word_bank }
    }

    /// Resolve every placeholder in `pattern`.
    ///
    /// Keyword bindings replace all of their occurrences first. Each
    /// remaining placeholder, left to right, gets its own random word bank
    /// draw, so two occurrences of one name may differ. Names that are not
    /// word bank categories are deleted.
    pub fn resolve<R: Rng + ?Sized>(&self, pattern: &str, keywords: &KeywordMap, rng: &mut R) -> String {
        let mut text = pattern.to_string();
        for (name, phrase) in keywords.iter() {
            text = text.replace(&format!("{{{name}}}"), phrase);
        }
        self.fill_remaining(&mut text, rng);
        text
    }

    /// Leftmost-first scan. Word bank phrases never contain braces, so
    /// scanning resumes after each inserted phrase and every step removes
    /// one placeholder.
    fn fill_remaining<R: Rng + ?Sized>(&self, text: &mut String, rng: &mut R) {
        let mut cursor = 0;
        while let Some(open) = text[cursor..].find('{').map(|i| cursor + i) {
            let close = text[open..].find('}').map(|i| open + i);
            debug_assert!(close.is_some(), "unclosed placeholder in {text:?}");
            let Some(close) = close else {
                break;
            };

            let replacement = self
                .word_bank
                .choose(&text[open + 1..close], rng)
                .unwrap_or_default()
                .to_string();
            text.replace_range(open..=close, &replacement);
            cursor = open + replacement.len();
        }
    }
}
