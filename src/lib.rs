//! Storybook Engine — short illustrated stories from genre templates.
//!
//! Resolves genre templates against keywords pulled from a story idea and
//! a category word bank, rewrites the text for tone and audience, and
//! optionally asks an image service for one illustration per scene.

pub mod config;
pub mod core;
pub mod schema;

pub use crate::config::{ConfigError, StoryConfig};
pub use crate::core::pipeline::{StoryAssembler, StoryError};
pub use crate::schema::story::{Scene, Story, StoryRequest};
