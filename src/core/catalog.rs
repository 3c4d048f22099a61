//! Genre templates and the word bank: types, placeholder parsing,
//! validation, and RON loading.

use once_cell::sync::OnceCell;
use ron::extensions::Extensions;
use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const BUILTIN_TEMPLATES: &str = include_str!("../../genre_data/templates.ron");
const BUILTIN_WORD_BANK: &str = include_str!("../../genre_data/word_bank.ron");

/// File names looked up when loading a catalog directory.
pub const TEMPLATES_FILE: &str = "templates.ron";
pub const WORD_BANK_FILE: &str = "word_bank.ron";

static BUILTIN: OnceCell<Arc<Catalog>> = OnceCell::new();

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("template parse error in {context}: {message}")]
    TemplateParse { context: String, message: String },
    #[error("{context} references unknown category '{category}'")]
    UnknownCategory { context: String, category: String },
    #[error("word bank category '{0}' has no phrases")]
    EmptyCategory(String),
    #[error("phrase '{phrase}' in category '{category}' contains a brace")]
    BracedPhrase { category: String, phrase: String },
    #[error("genre '{0}' has no templates")]
    EmptyGenre(String),
    #[error("template '{0}' has no scenes")]
    EmptyTemplate(String),
    #[error("no default genre declared")]
    NoDefaultGenre,
    #[error("default genre '{0}' is not in the catalog")]
    MissingDefaultGenre(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Extract the placeholder names of a pattern, in order of appearance.
///
/// Syntax: `{name}` is a placeholder, everything else is literal text.
/// Nested, empty, unclosed and stray closing braces are rejected.
pub fn placeholders(pattern: &str) -> Result<Vec<&str>, String> {
    let mut names = Vec::new();
    let mut open: Option<usize> = None;

    for (i, c) in pattern.char_indices() {
        match (c, open) {
            ('{', Some(_)) => return Err("nested braces are not allowed".to_string()),
            ('{', None) => open = Some(i),
            ('}', None) => return Err("unmatched closing brace".to_string()),
            ('}', Some(start)) => {
                let name = &pattern[start + 1..i];
                if name.is_empty() {
                    return Err("empty braces".to_string());
                }
                names.push(name);
                open = None;
            }
            _ => {}
        }
    }

    if open.is_some() {
        return Err("unclosed brace".to_string());
    }
    Ok(names)
}

/// Category-keyed candidate phrases used to resolve placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordBank {
    categories: FxHashMap<String, Vec<String>>,
}

impl WordBank {
    /// Phrases for a category, in declared order.
    pub fn phrases_for(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// Draw one phrase uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, category: &str, rng: &mut R) -> Option<&str> {
        self.categories
            .get(category)?
            .choose(rng)
            .map(String::as_str)
    }

    /// Category names, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn insert(&mut self, category: &str, phrases: Vec<String>) {
        self.categories.insert(category.to_string(), phrases);
    }

    /// Parse a word bank from a RON map of category to phrase list.
    pub fn parse_ron(input: &str) -> Result<WordBank, CatalogError> {
        let bank: WordBank = ron::from_str(input)?;
        bank.validate()?;
        Ok(bank)
    }

    pub fn load_from_ron(path: &Path) -> Result<WordBank, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Merge another bank into this one. Categories from `other` replace
    /// categories of the same name.
    pub fn merge(&mut self, other: WordBank) {
        self.categories.extend(other.categories);
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (category, phrases) in &self.categories {
            if phrases.is_empty() {
                return Err(CatalogError::EmptyCategory(category.clone()));
            }
            if let Some(phrase) = phrases.iter().find(|p| p.contains(['{', '}'])) {
                return Err(CatalogError::BracedPhrase {
                    category: category.clone(),
                    phrase: phrase.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Placeholder-bearing patterns for one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePattern {
    pub title: String,
    pub text: String,
    pub image_prompt: String,
}

/// A story template: a title pattern plus ordered scene patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryTemplate {
    pub title: String,
    pub scenes: Vec<ScenePattern>,
}

impl StoryTemplate {
    /// Every pattern in the template with a short label for diagnostics.
    pub fn patterns(&self) -> Vec<(String, &str)> {
        let mut out = vec![("title".to_string(), self.title.as_str())];
        for (i, scene) in self.scenes.iter().enumerate() {
            out.push((format!("scene {} title", i + 1), scene.title.as_str()));
            out.push((format!("scene {} text", i + 1), scene.text.as_str()));
            out.push((
                format!("scene {} image_prompt", i + 1),
                scene.image_prompt.as_str(),
            ));
        }
        out
    }
}

// RON deserialization helper: the file carries the default genre next
// to the genre map. Override files may leave the default out.
#[derive(Debug, Deserialize)]
struct RonTemplates {
    #[serde(default)]
    default_genre: Option<String>,
    genres: FxHashMap<String, Vec<StoryTemplate>>,
}

impl RonTemplates {
    // `implicit_some` lets files write `default_genre: "fantasy"` for the
    // optional field.
    fn parse(input: &str) -> Result<RonTemplates, CatalogError> {
        let options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
        Ok(options.from_str(input)?)
    }

    fn load(path: &Path) -> Result<RonTemplates, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }
}

/// Genre-keyed story templates with a designated fallback genre.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCatalog {
    default_genre: String,
    genres: FxHashMap<String, Vec<StoryTemplate>>,
}

impl TemplateCatalog {
    pub fn new(
        default_genre: &str,
        genres: FxHashMap<String, Vec<StoryTemplate>>,
    ) -> Result<TemplateCatalog, CatalogError> {
        let catalog = TemplateCatalog {
            default_genre: default_genre.to_string(),
            genres,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a template catalog from a RON string.
    pub fn parse_ron(input: &str) -> Result<TemplateCatalog, CatalogError> {
        let raw = RonTemplates::parse(input)?;
        let default_genre = raw.default_genre.ok_or(CatalogError::NoDefaultGenre)?;
        Self::new(&default_genre, raw.genres)
    }

    pub fn load_from_ron(path: &Path) -> Result<TemplateCatalog, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn default_genre(&self) -> &str {
        &self.default_genre
    }

    /// The genre actually used for a request: the requested one when it
    /// exists, the default genre otherwise.
    pub fn resolve_genre<'a>(&'a self, genre: &'a str) -> &'a str {
        if self.genres.contains_key(genre) {
            genre
        } else {
            &self.default_genre
        }
    }

    /// Templates for a genre, falling back to the default genre.
    pub fn templates_for(&self, genre: &str) -> &[StoryTemplate] {
        self.genres
            .get(self.resolve_genre(genre))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Pick one template for a genre uniformly at random. Validation
    /// guarantees every genre, the default included, has a template.
    pub fn choose<R: Rng + ?Sized>(&self, genre: &str, rng: &mut R) -> &StoryTemplate {
        let templates = self.templates_for(genre);
        &templates[rng.gen_range(0..templates.len())]
    }

    /// Genre names, sorted.
    pub fn genres(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.genres.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Merge another catalog into this one. Genres from `other` replace
    /// genres of the same name and its default genre takes over.
    pub fn merge(&mut self, other: TemplateCatalog) {
        self.genres.extend(other.genres);
        self.default_genre = other.default_genre;
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if !self.genres.contains_key(&self.default_genre) {
            return Err(CatalogError::MissingDefaultGenre(self.default_genre.clone()));
        }
        for (genre, templates) in &self.genres {
            if templates.is_empty() {
                return Err(CatalogError::EmptyGenre(genre.clone()));
            }
            for template in templates {
                if template.scenes.is_empty() {
                    return Err(CatalogError::EmptyTemplate(template.title.clone()));
                }
                for (label, pattern) in template.patterns() {
                    placeholders(pattern).map_err(|message| CatalogError::TemplateParse {
                        context: format!("{} / '{}' {}", genre, template.title, label),
                        message,
                    })?;
                }
            }
        }
        Ok(())
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &StoryTemplate)> {
        self.genres
            .iter()
            .flat_map(|(genre, templates)| templates.iter().map(move |t| (genre.as_str(), t)))
    }
}

/// Templates plus the word bank they draw from. Cross-checked so that
/// every placeholder names a word bank category.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    templates: TemplateCatalog,
    word_bank: WordBank,
}

impl Catalog {
    pub fn new(templates: TemplateCatalog, word_bank: WordBank) -> Result<Catalog, CatalogError> {
        let catalog = Catalog {
            templates,
            word_bank,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog compiled into the library, parsed once per process.
    pub fn builtin() -> Result<Arc<Catalog>, CatalogError> {
        BUILTIN
            .get_or_try_init(|| {
                Self::parse_ron(BUILTIN_TEMPLATES, BUILTIN_WORD_BANK).map(Arc::new)
            })
            .cloned()
    }

    pub fn parse_ron(templates: &str, word_bank: &str) -> Result<Catalog, CatalogError> {
        Self::new(
            TemplateCatalog::parse_ron(templates)?,
            WordBank::parse_ron(word_bank)?,
        )
    }

    /// Load `templates.ron` and `word_bank.ron` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Catalog, CatalogError> {
        Self::new(
            TemplateCatalog::load_from_ron(&dir.join(TEMPLATES_FILE))?,
            WordBank::load_from_ron(&dir.join(WORD_BANK_FILE))?,
        )
    }

    /// Layer the catalog files found in `dir` over this catalog. Either
    /// file may be missing, and the templates file may omit the default
    /// genre; the merged result is validated as a whole.
    pub fn with_overrides_from_dir(&self, dir: &Path) -> Result<Catalog, CatalogError> {
        let mut templates = self.templates.clone();
        let mut word_bank = self.word_bank.clone();

        let templates_path = dir.join(TEMPLATES_FILE);
        if templates_path.exists() {
            let raw = RonTemplates::load(&templates_path)?;
            let mut genres = templates.genres;
            genres.extend(raw.genres);
            let default_genre = raw.default_genre.unwrap_or(templates.default_genre);
            templates = TemplateCatalog::new(&default_genre, genres)?;
        }
        let word_bank_path = dir.join(WORD_BANK_FILE);
        if word_bank_path.exists() {
            word_bank.merge(WordBank::load_from_ron(&word_bank_path)?);
        }

        Self::new(templates, word_bank)
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn word_bank(&self) -> &WordBank {
        &self.word_bank
    }

    /// Word bank categories that no template references.
    pub fn unused_categories(&self) -> Vec<&str> {
        let used: FxHashSet<&str> = self
            .templates
            .iter()
            .flat_map(|(_, t)| t.patterns())
            .flat_map(|(_, pattern)| placeholders(pattern).unwrap_or_default())
            .collect();
        self.word_bank
            .categories()
            .into_iter()
            .filter(|c| !used.contains(c))
            .collect()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (genre, template) in self.templates.iter() {
            for (label, pattern) in template.patterns() {
                let names = placeholders(pattern).map_err(|message| CatalogError::TemplateParse {
                    context: format!("{} / '{}' {}", genre, template.title, label),
                    message,
                })?;
                if let Some(missing) = names.into_iter().find(|n| !self.word_bank.contains(n)) {
                    return Err(CatalogError::UnknownCategory {
                        context: format!("{} / '{}' {}", genre, template.title, label),
                        category: missing.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SMALL_TEMPLATES: &str = r#"(
        default_genre: "fairy tale",
        genres: {
            "fairy tale": [
                (
                    title: "The {item} of {place}",
                    scenes: [
                        (title: "Once", text: "{character} lost a {item}.", image_prompt: "{character} searching"),
                    ],
                ),
            ],
        },
    )"#;

    const SMALL_BANK: &str = r#"{
        "character": ["miller's daughter", "woodcutter"],
        "item": ["spindle", "golden egg"],
        "place": ["dark wood"],
    }"#;

    #[test]
    fn placeholders_in_order() {
        let names = placeholders("{character} found a {item} in the {place}.").unwrap();
        assert_eq!(names, vec!["character", "item", "place"]);
    }

    #[test]
    fn placeholders_literal_only() {
        assert!(placeholders("The Discovery").unwrap().is_empty());
    }

    #[test]
    fn placeholders_empty_braces_error() {
        assert!(placeholders("Bad {} here").is_err());
    }

    #[test]
    fn placeholders_nested_braces_error() {
        assert!(placeholders("Bad {outer{inner}} here").is_err());
    }

    #[test]
    fn placeholders_unclosed_brace_error() {
        assert!(placeholders("Bad {unclosed here").is_err());
    }

    #[test]
    fn placeholders_unmatched_close_error() {
        assert!(placeholders("Bad } here").is_err());
    }

    #[test]
    fn parse_small_catalog() {
        let catalog = Catalog::parse_ron(SMALL_TEMPLATES, SMALL_BANK).unwrap();
        assert_eq!(catalog.templates().default_genre(), "fairy tale");
        assert_eq!(catalog.templates().genres(), vec!["fairy tale"]);
        assert_eq!(catalog.word_bank().len(), 3);
        assert_eq!(
            catalog.word_bank().phrases_for("character").unwrap(),
            &["miller's daughter".to_string(), "woodcutter".to_string()]
        );
    }

    #[test]
    fn unknown_genre_falls_back_to_default() {
        let catalog = Catalog::parse_ron(SMALL_TEMPLATES, SMALL_BANK).unwrap();
        let templates = catalog.templates();
        assert_eq!(templates.resolve_genre("western"), "fairy tale");
        assert_eq!(templates.templates_for("western").len(), 1);
        assert_eq!(templates.templates_for("western"), templates.templates_for("fairy tale"));
    }

    #[test]
    fn choose_template_is_seeded() {
        let catalog = Catalog::parse_ron(SMALL_TEMPLATES, SMALL_BANK).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let template = catalog.templates().choose("anything", &mut rng);
        assert_eq!(template.title, "The {item} of {place}");
    }

    #[test]
    fn unknown_category_rejected() {
        let bank = r#"{ "character": ["woodcutter"], "item": ["spindle"] }"#;
        let err = Catalog::parse_ron(SMALL_TEMPLATES, bank).unwrap_err();
        assert!(
            matches!(&err, CatalogError::UnknownCategory { category, .. } if category == "place"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn malformed_template_rejected_at_load() {
        let templates = r#"(
            default_genre: "x",
            genres: { "x": [ (title: "Broken {item", scenes: [ (title: "a", text: "b", image_prompt: "c") ]) ] },
        )"#;
        let err = TemplateCatalog::parse_ron(templates).unwrap_err();
        assert!(matches!(err, CatalogError::TemplateParse { .. }));
    }

    #[test]
    fn missing_default_genre_rejected() {
        let templates = r#"(
            default_genre: "missing",
            genres: { "x": [ (title: "t", scenes: [ (title: "a", text: "b", image_prompt: "c") ]) ] },
        )"#;
        assert!(matches!(
            TemplateCatalog::parse_ron(templates),
            Err(CatalogError::MissingDefaultGenre(g)) if g == "missing"
        ));
    }

    #[test]
    fn default_genre_written_as_plain_string() {
        let raw = RonTemplates::parse(SMALL_TEMPLATES).unwrap();
        assert_eq!(raw.default_genre.as_deref(), Some("fairy tale"));
        let raw = RonTemplates::parse(r#"(genres: {})"#).unwrap();
        assert_eq!(raw.default_genre, None);
    }

    #[test]
    fn undeclared_default_genre_rejected() {
        let templates = r#"(genres: { "x": [ (title: "t", scenes: [ (title: "a", text: "b", image_prompt: "c") ]) ] })"#;
        assert!(matches!(
            TemplateCatalog::parse_ron(templates),
            Err(CatalogError::NoDefaultGenre)
        ));
    }

    #[test]
    fn empty_genre_and_template_rejected() {
        let empty_genre = r#"(default_genre: "x", genres: { "x": [] })"#;
        assert!(matches!(
            TemplateCatalog::parse_ron(empty_genre),
            Err(CatalogError::EmptyGenre(_))
        ));

        let empty_template = r#"(default_genre: "x", genres: { "x": [ (title: "t", scenes: []) ] })"#;
        assert!(matches!(
            TemplateCatalog::parse_ron(empty_template),
            Err(CatalogError::EmptyTemplate(_))
        ));
    }

    #[test]
    fn empty_category_rejected() {
        assert!(matches!(
            WordBank::parse_ron(r#"{ "item": [] }"#),
            Err(CatalogError::EmptyCategory(c)) if c == "item"
        ));
    }

    #[test]
    fn braced_phrase_rejected() {
        assert!(matches!(
            WordBank::parse_ron(r#"{ "item": ["a {thing}"] }"#),
            Err(CatalogError::BracedPhrase { .. })
        ));
    }

    #[test]
    fn word_bank_merge_precedence() {
        let mut base = WordBank::parse_ron(SMALL_BANK).unwrap();
        let overrides = WordBank::parse_ron(r#"{ "item": ["glass slipper"], "animal": ["frog"] }"#).unwrap();
        base.merge(overrides);
        assert_eq!(base.phrases_for("item").unwrap(), &["glass slipper".to_string()]);
        assert!(base.contains("animal"));
        assert!(base.contains("character"));
    }

    #[test]
    fn template_merge_replaces_default_genre() {
        let mut base = TemplateCatalog::parse_ron(SMALL_TEMPLATES).unwrap();
        let other = TemplateCatalog::parse_ron(
            r#"(default_genre: "fable", genres: { "fable": [ (title: "The {item}", scenes: [ (title: "a", text: "b", image_prompt: "c") ]) ] })"#,
        )
        .unwrap();
        base.merge(other);
        assert_eq!(base.default_genre(), "fable");
        assert_eq!(base.genres(), vec!["fable", "fairy tale"]);
    }

    #[test]
    fn builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.templates().default_genre(), "fantasy");
        assert_eq!(catalog.templates().genres(), vec!["fantasy", "mystery", "sci-fi"]);
        for genre in ["fantasy", "sci-fi", "mystery"] {
            assert_eq!(catalog.templates().templates_for(genre)[0].scenes.len(), 4);
        }
        assert_eq!(catalog.word_bank().len(), 22);
    }

    #[test]
    fn builtin_catalog_is_shared() {
        let a = Catalog::builtin().unwrap();
        let b = Catalog::builtin().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unused_categories_reported() {
        let bank = r#"{
            "character": ["woodcutter"],
            "item": ["spindle"],
            "place": ["dark wood"],
            "weather": ["fog"],
        }"#;
        let catalog = Catalog::parse_ron(SMALL_TEMPLATES, bank).unwrap();
        assert_eq!(catalog.unused_categories(), vec!["weather"]);
    }
}
