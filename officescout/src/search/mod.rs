//! The scan itself: traversal, per-file processing and keyword matching.
//!
//! [`engine::run`] owns the two passes over the tree, [`FileProcessor`] turns
//! one classified file into [`MatchRecord`](crate::results::MatchRecord)s, and
//! [`KeywordMatcher`] does the string work for both cell and text content.
pub mod engine;
pub mod markup;
pub mod matcher;
pub mod processor;

pub use engine::{run, validate_root};
pub use markup::{looks_like_markup, MarkupPolicy};
pub use matcher::{simple_lowercase, KeywordMatcher, TextMatch};
pub use processor::FileProcessor;
