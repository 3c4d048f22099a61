//! Catalog Linter — validates templates against the word bank and reports
//! coverage.
//!
//! Usage: catalog_linter [<catalog_dir>] [--standalone]
//!
//! Without a directory the built-in catalog is checked. With one, its
//! `templates.ron` / `word_bank.ron` are layered over the built-in catalog,
//! or loaded on their own with `--standalone`.

use std::path::Path;
use std::process;
use storybook_engine::core::catalog::{placeholders, Catalog};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: catalog_linter [<catalog_dir>] [--standalone]");
        process::exit(0);
    }

    let mut catalog_dir = None;
    let mut standalone = false;
    for arg in &args[1..] {
        match arg.as_str() {
            "--standalone" => standalone = true,
            other if catalog_dir.is_none() => catalog_dir = Some(other.to_string()),
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
    }

    let loaded = match catalog_dir.as_deref() {
        None => Catalog::builtin().map(|c| c.as_ref().clone()),
        Some(dir) if !Path::new(dir).is_dir() => {
            eprintln!("ERROR: Path '{}' is not a directory", dir);
            process::exit(1);
        }
        Some(dir) if standalone => Catalog::load_from_dir(Path::new(dir)),
        Some(dir) => Catalog::builtin().and_then(|c| c.with_overrides_from_dir(Path::new(dir))),
    };

    let catalog = match loaded {
        Ok(catalog) => catalog,
        Err(e) => {
            println!("\n=== Catalog Lint Report ===\n");
            println!("ERROR: {}", e);
            println!("\nSummary: 1 errors, 0 warnings");
            process::exit(1);
        }
    };

    let warnings = lint_catalog(&catalog);

    println!("\n=== Catalog Lint Report ===\n");

    let templates = catalog.templates();
    for genre in templates.genres() {
        let default_marker = if genre == templates.default_genre() {
            " (default)"
        } else {
            ""
        };
        let genre_templates = templates.templates_for(genre);
        let scenes: usize = genre_templates.iter().map(|t| t.scenes.len()).sum();
        println!(
            "{}{}: {} templates, {} scenes",
            genre,
            default_marker,
            genre_templates.len(),
            scenes
        );
    }
    println!("Word bank: {} categories\n", catalog.word_bank().len());

    if warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    println!("\nSummary: 0 errors, {} warnings", warnings.len());
}

fn lint_catalog(catalog: &Catalog) -> Vec<String> {
    let mut warnings = Vec::new();

    for category in catalog.unused_categories() {
        warnings.push(format!(
            "Category '{}' is not referenced by any template",
            category
        ));
    }

    let bank = catalog.word_bank();
    for category in bank.categories() {
        let count = bank.phrases_for(category).map_or(0, <[String]>::len);
        if count < 3 {
            warnings.push(format!(
                "Category '{}' has only {} phrases (minimum 3 recommended)",
                category, count
            ));
        }
    }

    let templates = catalog.templates();
    for genre in templates.genres() {
        for template in templates.templates_for(genre) {
            let has_placeholder = template
                .patterns()
                .iter()
                .any(|(_, pattern)| placeholders(pattern).map_or(false, |p| !p.is_empty()));
            if !has_placeholder {
                warnings.push(format!(
                    "Template '{}' in genre '{}' has no placeholders",
                    template.title, genre
                ));
            }
        }
    }

    warnings
}
