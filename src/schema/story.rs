//! Story requests, generated stories, and the selector enums that steer
//! generation (tone, audience, art style).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tone rewrite applied to every resolved string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    Dark,
    Humorous,
    Epic,
    Mysterious,
    /// Any unrecognised tone. Leaves text untouched.
    Neutral,
}

impl Tone {
    /// Exact, case-sensitive match against the recognised tone names.
    pub fn parse(s: &str) -> Self {
        match s {
            "dark" => Self::Dark,
            "humorous" => Self::Humorous,
            "epic" => Self::Epic,
            "mysterious" => Self::Mysterious,
            _ => Self::Neutral,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Humorous => "humorous",
            Self::Epic => "epic",
            Self::Mysterious => "mysterious",
            Self::Neutral => "neutral",
        }
    }
}

/// Target readership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Audience {
    /// Simplified vocabulary for children.
    Kids,
    General,
}

impl Audience {
    pub fn parse(s: &str) -> Self {
        match s {
            "kids" => Self::Kids,
            _ => Self::General,
        }
    }
}

/// Illustration style. Each style carries the modifier appended to the
/// prompt sent to the illustration service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtStyle {
    Realistic,
    Cartoon,
    Anime,
    Watercolor,
    DigitalArt,
    OilPainting,
}

impl ArtStyle {
    pub const ALL: [ArtStyle; 6] = [
        Self::Realistic,
        Self::Cartoon,
        Self::Anime,
        Self::Watercolor,
        Self::DigitalArt,
        Self::OilPainting,
    ];

    /// Unrecognised style names fall back to `Realistic`.
    pub fn parse(s: &str) -> Self {
        match s {
            "cartoon" => Self::Cartoon,
            "anime" => Self::Anime,
            "watercolor" => Self::Watercolor,
            "digital art" => Self::DigitalArt,
            "oil painting" => Self::OilPainting,
            _ => Self::Realistic,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Realistic => "realistic",
            Self::Cartoon => "cartoon",
            Self::Anime => "anime",
            Self::Watercolor => "watercolor",
            Self::DigitalArt => "digital art",
            Self::OilPainting => "oil painting",
        }
    }

    pub fn modifier(&self) -> &'static str {
        match self {
            Self::Realistic => "photorealistic, detailed, realistic",
            Self::Cartoon => "cartoon style, vibrant colors, animated",
            Self::Anime => "anime style, Japanese animation, vibrant",
            Self::Watercolor => "watercolor painting, soft edges, artistic",
            Self::DigitalArt => "digital art, concept art, dramatic lighting",
            Self::OilPainting => "oil painting, classic art, textured",
        }
    }
}

fn default_idea() -> String {
    "A mysterious story".to_string()
}

fn default_genre() -> String {
    "fantasy".to_string()
}

fn default_tone() -> String {
    "lighthearted".to_string()
}

fn default_audience() -> String {
    "teens".to_string()
}

fn default_art_style() -> String {
    ArtStyle::Realistic.name().to_string()
}

/// Parameters for one generation request.
///
/// Selectors are kept as the raw strings the caller supplied; unknown
/// values have defined fallbacks and are never rejected. Missing JSON
/// fields take the same defaults as [`StoryRequest::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRequest {
    #[serde(rename = "story_idea", default = "default_idea")]
    pub idea: String,
    #[serde(default = "default_genre")]
    pub genre: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_art_style")]
    pub art_style: String,
}

impl StoryRequest {
    pub fn new(idea: &str) -> Self {
        Self {
            idea: idea.to_string(),
            genre: default_genre(),
            tone: default_tone(),
            audience: default_audience(),
            art_style: default_art_style(),
        }
    }

    pub fn genre(mut self, genre: &str) -> Self {
        self.genre = genre.to_string();
        self
    }

    pub fn tone(mut self, tone: &str) -> Self {
        self.tone = tone.to_string();
        self
    }

    pub fn audience(mut self, audience: &str) -> Self {
        self.audience = audience.to_string();
        self
    }

    pub fn art_style(mut self, art_style: &str) -> Self {
        self.art_style = art_style.to_string();
        self
    }
}

/// One resolved scene of a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub title: String,
    #[serde(rename = "text")]
    pub body: String,
    pub image_prompt: String,
    /// Absent when no illustrator is configured or the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A complete generated story. Never mutated after it is handed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub scenes: Vec<Scene>,
    #[serde(rename = "idea")]
    pub original_idea: String,
    pub art_style: String,
    pub generated_at: DateTime<Utc>,
}

impl Story {
    /// Number of scenes that received an illustration.
    pub fn illustrated_count(&self) -> usize {
        self.scenes.iter().filter(|s| s.image_url.is_some()).count()
    }
}
