//! The story pipeline: request → Story orchestration.
//!
//! Wires together template choice, keyword extraction, placeholder
//! resolution, tone rewriting, and scene illustration.

use chrono::Utc;
use futures_util::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ConfigError, StoryConfig, DEFAULT_IMAGE_TIMEOUT_SECS};
use crate::core::catalog::{Catalog, CatalogError};
use crate::core::illustration::{IllustrationError, Illustrator};
use crate::core::keywords::{KeywordExtractor, KeywordMap};
use crate::core::resolver::TemplateResolver;
use crate::core::tone::TonePipeline;
use crate::schema::story::{ArtStyle, Audience, Scene, Story, StoryRequest, Tone};

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// The top-level story generator. Built via `StoryAssembler::builder()`.
///
/// Holds only immutable data besides the generation counter, so one
/// assembler can serve any number of concurrent requests.
pub struct StoryAssembler {
    catalog: Arc<Catalog>,
    extractor: KeywordExtractor,
    illustrator: Option<Arc<dyn Illustrator>>,
    illustration_timeout: Duration,
    seed: Option<u64>,
    generation_count: AtomicU64,
}

/// Builder for constructing a `StoryAssembler`.
pub struct StoryAssemblerBuilder {
    catalog_dir: Option<PathBuf>,
    seed: Option<u64>,
    illustration_timeout: Duration,
    /// Directly provided catalog (for testing without files).
    catalog: Option<Arc<Catalog>>,
    extractor: Option<KeywordExtractor>,
    illustrator: Option<Arc<dyn Illustrator>>,
}

impl StoryAssembler {
    pub fn builder() -> StoryAssemblerBuilder {
        StoryAssemblerBuilder {
            catalog_dir: None,
            seed: None,
            illustration_timeout: Duration::from_secs(DEFAULT_IMAGE_TIMEOUT_SECS),
            catalog: None,
            extractor: None,
            illustrator: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Generate a complete story, illustrations included.
    ///
    /// With a fixed seed, successive calls use `seed + n` for the n-th
    /// generation; without one each call draws fresh entropy.
    pub async fn generate(&self, request: &StoryRequest) -> Result<Story, StoryError> {
        let mut rng = self.next_rng();
        self.generate_with_rng(request, &mut rng).await
    }

    /// Generate with a caller-owned random source.
    ///
    /// All text is composed before the first illustration call. Dropping
    /// the returned future abandons in-flight illustration calls.
    pub async fn generate_with_rng<R: Rng + Send + ?Sized>(
        &self,
        request: &StoryRequest,
        rng: &mut R,
    ) -> Result<Story, StoryError> {
        if let Some(illustrator) = &self.illustrator {
            illustrator.check_credentials()?;
        }

        let mut story = self.compose(request, rng);

        if let Some(illustrator) = &self.illustrator {
            let style = ArtStyle::parse(&request.art_style);
            let urls = join_all(story.scenes.iter().enumerate().map(|(index, scene)| {
                self.illustrate_scene(illustrator.as_ref(), index, &scene.image_prompt, style)
            }))
            .await;
            for (scene, url) in story.scenes.iter_mut().zip(urls) {
                scene.image_url = url;
            }
        }

        tracing::info!(
            title = %story.title,
            scenes = story.scenes.len(),
            illustrated = story.illustrated_count(),
            "generated story"
        );
        Ok(story)
    }

    /// Build the story text without illustrations.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        request: &StoryRequest,
        rng: &mut R,
    ) -> Story {
        let templates = self.catalog.templates();
        let genre = templates.resolve_genre(&request.genre);
        if genre != request.genre {
            tracing::debug!(requested = %request.genre, fallback = %genre, "unknown genre");
        }
        let template = templates.choose(genre, rng);
        tracing::debug!(genre = %genre, template = %template.title, "selected template");

        let keywords = self
            .extractor
            .extract(&request.idea, self.catalog.word_bank(), rng);
        let renderer = Renderer {
            resolver: TemplateResolver::new(self.catalog.word_bank()),
            tone: TonePipeline::new(Tone::parse(&request.tone), Audience::parse(&request.audience)),
            keywords: &keywords,
        };

        let title = renderer.render(&template.title, rng);
        let scenes = template
            .scenes
            .iter()
            .map(|pattern| Scene {
                title: renderer.render(&pattern.title, rng),
                body: renderer.render(&pattern.text, rng),
                image_prompt: renderer.render(&pattern.image_prompt, rng),
                image_url: None,
            })
            .collect();

        Story {
            title,
            scenes,
            original_idea: request.idea.clone(),
            art_style: request.art_style.clone(),
            generated_at: Utc::now(),
        }
    }

    async fn illustrate_scene(
        &self,
        illustrator: &dyn Illustrator,
        index: usize,
        prompt: &str,
        style: ArtStyle,
    ) -> Option<String> {
        let result = tokio::time::timeout(self.illustration_timeout, illustrator.illustrate(prompt, style))
            .await
            .unwrap_or(Err(IllustrationError::Timeout(self.illustration_timeout)));

        match result {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(scene = index + 1, error = %e, "illustration failed, continuing without image");
                None
            }
        }
    }

    fn next_rng(&self) -> StdRng {
        let count = self.generation_count.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(count)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Resolution + tone for one request.
struct Renderer<'a> {
    resolver: TemplateResolver<'a>,
    tone: TonePipeline,
    keywords: &'a KeywordMap,
}

impl Renderer<'_> {
    fn render<R: Rng + ?Sized>(&self, pattern: &str, rng: &mut R) -> String {
        let resolved = self.resolver.resolve(pattern, self.keywords, rng);
        self.tone.apply(&resolved, rng)
    }
}

impl StoryAssemblerBuilder {
    /// Apply seed, catalog directory and illustration timeout from config.
    /// The illustrator itself is chosen by the caller.
    pub fn config(mut self, config: &StoryConfig) -> Self {
        self.seed = config.seed;
        self.catalog_dir = config.catalog_dir.clone();
        self.illustration_timeout = config.illustration.timeout;
        self
    }

    /// Layer `templates.ron` / `word_bank.ron` from `path` over the base
    /// catalog.
    pub fn catalog_dir(mut self, path: &str) -> Self {
        self.catalog_dir = Some(PathBuf::from(path));
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn illustration_timeout(mut self, timeout: Duration) -> Self {
        self.illustration_timeout = timeout;
        self
    }

    /// Provide the catalog directly instead of the built-in one.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    pub fn with_extractor(mut self, extractor: KeywordExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn illustrator(mut self, illustrator: Arc<dyn Illustrator>) -> Self {
        self.illustrator = Some(illustrator);
        self
    }

    pub fn build(self) -> Result<StoryAssembler, StoryError> {
        let mut catalog = match self.catalog {
            Some(catalog) => catalog,
            None => Catalog::builtin()?,
        };

        // Directory overrides layer over the base catalog
        if let Some(ref dir) = self.catalog_dir {
            if dir.exists() {
                catalog = Arc::new(catalog.with_overrides_from_dir(dir)?);
                tracing::info!(dir = %dir.display(), "loaded catalog overrides");
            } else {
                tracing::warn!(dir = %dir.display(), "catalog directory not found, using base catalog");
            }
        }

        Ok(StoryAssembler {
            catalog,
            extractor: self.extractor.unwrap_or_default(),
            illustrator: self.illustrator,
            illustration_timeout: self.illustration_timeout,
            seed: self.seed,
            generation_count: AtomicU64::new(0),
        })
    }
}
