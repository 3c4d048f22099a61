//! Preview — generate one story from the command line.
//!
//! Usage: preview [options] <idea...>
//!
//! Options:
//!   --genre <name>       fantasy, sci-fi, mystery (default: fantasy)
//!   --tone <name>        dark, humorous, epic, mysterious, anything else = none
//!   --audience <name>    kids, anything else = general (default: teens)
//!   --style <name>       realistic, cartoon, anime, watercolor, "digital art", "oil painting"
//!   --seed <n>           fixed RNG seed (overrides STORY_SEED)
//!   --catalog <dir>      layer templates.ron / word_bank.ron over the built-in catalog
//!   --images <backend>   none, placeholder, openai (default: none)
//!   --json               print the story as JSON

use anyhow::{bail, Context};
use std::sync::Arc;
use storybook_engine::core::illustration::{OpenAiIllustrator, PlaceholderIllustrator};
use storybook_engine::{Story, StoryAssembler, StoryConfig, StoryRequest};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageBackend {
    None,
    Placeholder,
    OpenAi,
}

struct Options {
    request: StoryRequest,
    seed: Option<u64>,
    catalog_dir: Option<String>,
    images: ImageBackend,
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storybook_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let options = parse_args(&args)?;
    let config = StoryConfig::from_env().context("reading configuration")?;

    let mut builder = StoryAssembler::builder().config(&config);
    if let Some(seed) = options.seed {
        builder = builder.seed(seed);
    }
    if let Some(ref dir) = options.catalog_dir {
        builder = builder.catalog_dir(dir);
    }
    builder = match options.images {
        ImageBackend::None => builder,
        ImageBackend::Placeholder => builder.illustrator(Arc::new(PlaceholderIllustrator::default())),
        ImageBackend::OpenAi => {
            builder.illustrator(Arc::new(OpenAiIllustrator::new(&config.illustration)))
        }
    };
    let assembler = builder.build()?;

    let story = assembler.generate(&options.request).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&story)?);
    } else {
        print_story(&story);
    }
    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let mut request = StoryRequest::new("");
    let mut idea_words = Vec::new();
    let mut seed = None;
    let mut catalog_dir = None;
    let mut images = ImageBackend::None;
    let mut json = false;

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let takes_value = matches!(
            flag,
            "--genre" | "--tone" | "--audience" | "--style" | "--seed" | "--catalog" | "--images"
        );
        if takes_value && i + 1 >= args.len() {
            bail!("missing value for {}", flag);
        }

        match flag {
            "--genre" => request.genre = args[i + 1].clone(),
            "--tone" => request.tone = args[i + 1].clone(),
            "--audience" => request.audience = args[i + 1].clone(),
            "--style" => request.art_style = args[i + 1].clone(),
            "--seed" => {
                seed = Some(
                    args[i + 1]
                        .parse()
                        .with_context(|| format!("invalid seed: {}", args[i + 1]))?,
                )
            }
            "--catalog" => catalog_dir = Some(args[i + 1].clone()),
            "--images" => {
                images = match args[i + 1].as_str() {
                    "none" => ImageBackend::None,
                    "placeholder" => ImageBackend::Placeholder,
                    "openai" => ImageBackend::OpenAi,
                    other => bail!("unknown image backend: {}", other),
                }
            }
            "--json" => json = true,
            other if other.starts_with("--") => bail!("unknown argument: {}", other),
            word => idea_words.push(word.to_string()),
        }
        i += if takes_value { 2 } else { 1 };
    }

    request.idea = idea_words.join(" ");
    Ok(Options {
        request,
        seed,
        catalog_dir,
        images,
        json,
    })
}

fn print_story(story: &Story) {
    println!("\n=== {} ===", story.title);
    println!("Idea: {}", story.original_idea);
    println!("Art style: {}", story.art_style);
    println!("Generated: {}", story.generated_at.format("%Y-%m-%d %H:%M:%S"));

    for (i, scene) in story.scenes.iter().enumerate() {
        println!("\n--- Scene {}: {} ---", i + 1, scene.title);
        println!("{}", scene.body);
        println!("  [prompt] {}", scene.image_prompt);
        match scene.image_url {
            Some(ref url) => println!("  [image]  {}", url),
            None => println!("  [image]  none"),
        }
    }
    println!();
}

fn print_usage() {
    println!("Preview — generate one story from the command line.");
    println!();
    println!("Usage: preview [options] <idea...>");
    println!();
    println!("  --genre <name>       fantasy, sci-fi, mystery (default: fantasy)");
    println!("  --tone <name>        dark, humorous, epic, mysterious");
    println!("  --audience <name>    kids or teens (default: teens)");
    println!("  --style <name>       realistic, cartoon, anime, watercolor, \"digital art\", \"oil painting\"");
    println!("  --seed <n>           fixed RNG seed");
    println!("  --catalog <dir>      directory with templates.ron / word_bank.ron overrides");
    println!("  --images <backend>   none, placeholder, openai (default: none)");
    println!("  --json               print JSON instead of text");
}
