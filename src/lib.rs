pub mod error;
pub mod frequency;
pub mod grouping;
pub mod metadata;
pub mod parser;
pub mod scanner;
pub mod template;

pub use error::{InferenceError, Result};
pub use grouping::{Classification, Classifier, Fallback, classify};
pub use metadata::EpisodeMetadata;
pub use parser::{EpisodeOracle, SingleFileParser};
pub use template::{Template, find_pair_template, restore_template};
