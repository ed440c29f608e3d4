pub mod batch;
pub mod compile;
pub mod detector;
pub mod frequencies;
pub mod lexicon;
pub mod matcher;
pub mod nlp;
pub mod normalize;
pub mod pattern;

pub use detector::{DetectorConfig, MultiwordTermDetector};
pub use matcher::{Confidence, Match};
pub use nlp::{Pipeline, PipelineError, TokenizationCache};
