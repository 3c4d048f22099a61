/// Catalog integration tests — built-in data coverage and directory loading.

use rand::rngs::StdRng;
use rand::SeedableRng;
use storybook_engine::core::catalog::{placeholders, Catalog, CatalogError};
use storybook_engine::core::keywords::KeywordExtractor;
use storybook_engine::core::resolver::TemplateResolver;

#[test]
fn builtin_genres_present() {
    let catalog = Catalog::builtin().unwrap();
    let templates = catalog.templates();
    for genre in ["fantasy", "sci-fi", "mystery"] {
        assert!(
            !templates.templates_for(genre).is_empty(),
            "Missing genre: {}",
            genre
        );
        assert_eq!(templates.resolve_genre(genre), genre);
    }
}

#[test]
fn every_builtin_pattern_resolves_without_braces() {
    let catalog = Catalog::builtin().unwrap();
    let bank = catalog.word_bank();
    let resolver = TemplateResolver::new(bank);
    let extractor = KeywordExtractor::default();
    let templates = catalog.templates();

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let keywords = extractor.extract("", bank, &mut rng);
        for genre in templates.genres() {
            for template in templates.templates_for(genre) {
                for (label, pattern) in template.patterns() {
                    let out = resolver.resolve(pattern, &keywords, &mut rng);
                    assert!(
                        !out.contains('{') && !out.contains('}'),
                        "{} / '{}' {} left placeholders: {}",
                        genre,
                        template.title,
                        label,
                        out
                    );
                }
            }
        }
    }
}

#[test]
fn no_builtin_placeholder_references_missing_category() {
    let catalog = Catalog::builtin().unwrap();
    let templates = catalog.templates();
    for genre in templates.genres() {
        for template in templates.templates_for(genre) {
            for (label, pattern) in template.patterns() {
                for name in placeholders(pattern).unwrap() {
                    assert!(
                        catalog.word_bank().contains(name),
                        "{} / '{}' {} references non-existent category '{}'",
                        genre,
                        template.title,
                        label,
                        name
                    );
                }
            }
        }
    }
}

#[test]
fn builtin_word_bank_has_no_unused_categories() {
    let catalog = Catalog::builtin().unwrap();
    assert!(
        catalog.unused_categories().is_empty(),
        "unused: {:?}",
        catalog.unused_categories()
    );
}

#[test]
fn directory_overrides_layer_over_builtin() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("templates.ron"),
        r#"(
            default_genre: "fantasy",
            genres: {
                "western": [
                    (
                        title: "Showdown at the {place}",
                        scenes: [
                            (title: "High Noon", text: "{character} rode into the {town}.", image_prompt: "{character} on horseback"),
                        ],
                    ),
                ],
            },
        )"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("word_bank.ron"),
        r#"{ "town": ["dusty town", "border town"] }"#,
    )
    .unwrap();

    let base = Catalog::builtin().unwrap();
    let catalog = base.with_overrides_from_dir(dir.path()).unwrap();
    assert_eq!(
        catalog.templates().genres(),
        vec!["fantasy", "mystery", "sci-fi", "western"]
    );
    assert!(catalog.word_bank().contains("town"));
    assert!(catalog.word_bank().contains("character"));
    // The shared built-in catalog is untouched.
    assert!(!base.word_bank().contains("town"));
}

#[test]
fn directory_override_without_default_genre_keeps_base_default() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("templates.ron"),
        r#"(
            genres: {
                "fairy tale": [
                    (
                        title: "The {item} in the {place}",
                        scenes: [
                            (title: "Once", text: "{character} lost a {item}.", image_prompt: "{character} searching a {place}"),
                        ],
                    ),
                ],
            },
        )"#,
    )
    .unwrap();

    let catalog = Catalog::builtin()
        .unwrap()
        .with_overrides_from_dir(dir.path())
        .unwrap();
    assert_eq!(catalog.templates().default_genre(), "fantasy");
    assert!(catalog.templates().genres().contains(&"fairy tale"));
    assert_eq!(catalog.templates().resolve_genre("western"), "fantasy");
}

#[test]
fn directory_override_can_replace_default_genre() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("templates.ron"),
        r#"(default_genre: "mystery", genres: {})"#,
    )
    .unwrap();

    let catalog = Catalog::builtin()
        .unwrap()
        .with_overrides_from_dir(dir.path())
        .unwrap();
    assert_eq!(catalog.templates().default_genre(), "mystery");
    assert_eq!(catalog.templates().resolve_genre("western"), "mystery");
}

#[test]
fn directory_override_with_unknown_category_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("templates.ron"),
        r#"(
            default_genre: "fantasy",
            genres: {
                "western": [
                    (title: "{sheriff}", scenes: [ (title: "a", text: "b", image_prompt: "c") ]),
                ],
            },
        )"#,
    )
    .unwrap();

    let err = Catalog::builtin()
        .unwrap()
        .with_overrides_from_dir(dir.path())
        .unwrap_err();
    assert!(matches!(err, CatalogError::UnknownCategory { category, .. } if category == "sheriff"));
}

#[test]
fn standalone_directory_requires_both_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("word_bank.ron"), r#"{ "item": ["key"] }"#).unwrap();
    assert!(matches!(
        Catalog::load_from_dir(dir.path()),
        Err(CatalogError::Io(_))
    ));
}
