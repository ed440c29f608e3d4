use crate::compile::compile;
use crate::lexicon::{LexiconError, load_lexicon};
use crate::matcher::{Match, find};
use crate::nlp::{Adapter, ParsedSentence, Pipeline};
use crate::pattern::PatternSet;
use language_utils::Language;
use std::path::Path;

/// Which variants the compiler emits, and for which language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    pub language: Language,
    /// "qu'est-ce qu'" for "qu'est-ce que".
    pub contraction_variants: bool,
    /// Negation particles between a verb and its complement.
    pub negation_variants: bool,
    /// Hyphen-bound subject clitics ("n'est-ce pas à lui").
    pub inversion_variants: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            language: Language::French,
            contraction_variants: true,
            negation_variants: true,
            inversion_variants: true,
        }
    }
}

/// Finds lexicon terms in sentences.
///
/// Parses the lexicon once at construction; afterwards every call only parses the sentence
/// and runs the matcher against the shared pattern set.
#[derive(Debug)]
pub struct MultiwordTermDetector<P> {
    adapter: Adapter<P>,
    patterns: PatternSet,
}

impl<P: Pipeline> MultiwordTermDetector<P> {
    pub fn new(pipeline: P, lexicon: &[String], config: &DetectorConfig) -> Self {
        let adapter = Adapter::new(pipeline, config.language);
        let patterns = compile(&adapter, lexicon, config);
        Self { adapter, patterns }
    }

    pub fn from_lexicon_file(
        pipeline: P,
        path: &Path,
        config: &DetectorConfig,
    ) -> Result<Self, LexiconError> {
        let lexicon = load_lexicon(path, config.language)?;
        Ok(Self::new(pipeline, &lexicon, config))
    }

    /// Terms realized in `sentence`, ordered by span start.
    pub fn find_multiword_terms(&self, sentence: &str) -> Vec<Match> {
        self.detect(sentence).1
    }

    /// Like [`Self::find_multiword_terms`], also returning the parse the spans refer to.
    pub fn detect(&self, sentence: &str) -> (ParsedSentence, Vec<Match>) {
        let parsed = self.adapter.parse(sentence);
        if parsed.is_empty() {
            return (parsed, vec![]);
        }
        let matches = find(&self.patterns, &parsed);
        (parsed, matches)
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }
}
