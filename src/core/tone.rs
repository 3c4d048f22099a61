//! Tone and audience rewriting with ordered literal substitution tables
//! applied to resolved text.
//!
//! Substitutions are case-sensitive substring replacements, not
//! word-boundary aware, applied in table order. Later rules see the output
//! of earlier ones.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::schema::story::{Audience, Tone};

/// What a matched substring is replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    Fixed(&'static str),
    /// One candidate drawn at random per application; every occurrence
    /// gets the same pick.
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substitution {
    pub needle: &'static str,
    pub replacement: Replacement,
}

const fn fixed(needle: &'static str, word: &'static str) -> Substitution {
    Substitution {
        needle,
        replacement: Replacement::Fixed(word),
    }
}

const fn one_of(needle: &'static str, words: &'static [&'static str]) -> Substitution {
    Substitution {
        needle,
        replacement: Replacement::OneOf(words),
    }
}

pub const DARK_WORDS: &[&str] = &["sinister", "foreboding", "ominous", "shadowy", "eerie", "chilling"];
pub const FUNNY_WORDS: &[&str] = &["hilarious", "comical", "absurd", "ridiculous", "ludicrous"];
pub const EPIC_WORDS: &[&str] = &["legendary", "monumental", "colossal", "astounding", "breathtaking"];
pub const MYSTERY_WORDS: &[&str] = &["enigmatic", "cryptic", "perplexing", "inscrutable", "puzzling"];

pub const DARK: &[Substitution] = &[
    one_of("mysterious", DARK_WORDS),
    fixed("strange", "ominous"),
    fixed("interesting", "disturbing"),
    fixed("beautiful", "macabre"),
];

pub const HUMOROUS: &[Substitution] = &[
    one_of("strange", FUNNY_WORDS),
    fixed("interesting", "hilarious"),
    fixed("mysterious", "absurd"),
    fixed("serious", "comical"),
];

pub const EPIC: &[Substitution] = &[
    one_of("great", EPIC_WORDS),
    fixed("big", "colossal"),
    fixed("important", "monumental"),
    fixed("interesting", "astounding"),
];

pub const MYSTERIOUS: &[Substitution] = &[
    one_of("mysterious", MYSTERY_WORDS),
    fixed("strange", "enigmatic"),
    fixed("interesting", "perplexing"),
    fixed("secret", "inscrutable"),
];

pub const KIDS: &[Substitution] = &[
    fixed("discovered", "found"),
    fixed("encountered", "met"),
    fixed("investigating", "looking into"),
    fixed("ancient", "very old"),
    fixed("mysterious", "strange"),
    fixed("artifact", "special object"),
    fixed("revelation", "big surprise"),
    fixed("resolution", "ending"),
    fixed("challenge", "test"),
    fixed("triumph", "happy ending"),
];

impl Tone {
    /// The substitution table for this tone. Empty for `Neutral`.
    pub fn substitutions(&self) -> &'static [Substitution] {
        match self {
            Self::Dark => DARK,
            Self::Humorous => HUMOROUS,
            Self::Epic => EPIC,
            Self::Mysterious => MYSTERIOUS,
            Self::Neutral => &[],
        }
    }
}

/// Apply a substitution table in order.
pub fn apply_table<R: Rng + ?Sized>(text: &str, table: &[Substitution], rng: &mut R) -> String {
    let mut out = text.to_string();
    for sub in table {
        if !out.contains(sub.needle) {
            continue;
        }
        let word = match sub.replacement {
            Replacement::Fixed(word) => word,
            Replacement::OneOf(words) => words.choose(rng).copied().unwrap_or(sub.needle),
        };
        out = out.replace(sub.needle, word);
    }
    out
}

pub fn make_darker<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    apply_table(text, DARK, rng)
}

pub fn make_funnier<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    apply_table(text, HUMOROUS, rng)
}

pub fn make_epic<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    apply_table(text, EPIC, rng)
}

pub fn make_mysterious<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    apply_table(text, MYSTERIOUS, rng)
}

/// Children's vocabulary. Fully deterministic.
pub fn simplify_language(text: &str) -> String {
    let mut out = text.to_string();
    for sub in KIDS {
        if let Replacement::Fixed(word) = sub.replacement {
            out = out.replace(sub.needle, word);
        }
    }
    out
}

/// One tone pass followed by the audience pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TonePipeline {
    pub tone: Tone,
    pub audience: Audience,
}

impl TonePipeline {
    pub fn new(tone: Tone, audience: Audience) -> Self {
        Self { tone, audience }
    }

    /// True when `apply` returns its input unchanged.
    pub fn is_noop(&self) -> bool {
        self.tone == Tone::Neutral && self.audience != Audience::Kids
    }

    pub fn apply<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> String {
        let toned = apply_table(text, self.tone.substitutions(), rng);
        match self.audience {
            Audience::Kids => simplify_language(&toned),
            Audience::General => toned,
        }
    }
}
