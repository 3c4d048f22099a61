pub mod catalog;
pub mod illustration;
pub mod keywords;
pub mod pipeline;
pub mod resolver;
pub mod tone;
