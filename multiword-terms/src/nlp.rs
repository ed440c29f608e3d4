use crate::normalize::normalize_word;
use language_utils::text_cleanup::normalize_sentence_key;
use language_utils::{DepRel, DocToken, Language, PartOfSpeech};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Sentence has not been analyzed: {0:?}")]
    NotAnalyzed(String),

    #[error("Failed to read tokenization file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed tokenization at {path}:{line}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A linguistic pipeline: tokenizer, lemmatizer, tagger and dependency parser.
pub trait Pipeline {
    fn analyze(&self, text: &str) -> Result<Vec<DocToken>, PipelineError>;
}

/// Tokenized sentence for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizedSentence {
    pub sentence: String,
    pub tokens: Vec<DocToken>,
}

/// A [`Pipeline`] backed by the JSONL tokenization files the NLP model writes.
///
/// Each line is a [`TokenizedSentence`]. Lookups ignore typographic and whitespace
/// differences (curly apostrophes, narrow no-break spaces before `?`).
#[derive(Debug, Default)]
pub struct TokenizationCache {
    sentences: FxHashMap<String, Vec<DocToken>>,
}

impl TokenizationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let file = std::fs::File::open(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut cache = Self::new();
        for (line_number, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| PipelineError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let tokenized: TokenizedSentence =
                serde_json::from_str(&line).map_err(|source| PipelineError::Malformed {
                    path: path.to_path_buf(),
                    line: line_number + 1,
                    source,
                })?;
            cache.insert(tokenized);
        }

        log::info!(
            "Loaded {} tokenized sentences from {}",
            cache.len(),
            path.display()
        );
        Ok(cache)
    }

    pub fn insert(&mut self, tokenized: TokenizedSentence) {
        self.sentences
            .insert(normalize_sentence_key(&tokenized.sentence), tokenized.tokens);
    }

    pub fn contains(&self, text: &str) -> bool {
        self.sentences.contains_key(&normalize_sentence_key(text))
    }

    /// The texts among `texts` that still need to go through the NLP model.
    pub fn missing<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        texts
            .into_iter()
            .filter(|text| !text.trim().is_empty() && !self.contains(text))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

impl Pipeline for TokenizationCache {
    fn analyze(&self, text: &str) -> Result<Vec<DocToken>, PipelineError> {
        self.sentences
            .get(&normalize_sentence_key(text))
            .cloned()
            .ok_or_else(|| PipelineError::NotAnalyzed(text.to_string()))
    }
}

/// One token of a parsed sentence, with normalized form and lemma.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub index: usize,
    pub text: String,
    pub whitespace: String,
    pub form: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
    pub dep: DepRel,
    pub head: usize,
}

impl Token {
    /// Hyphen-bound to the previous word, as in "est-ce" or "elles-mêmes".
    pub fn is_attached(&self) -> bool {
        self.form.len() > 1 && self.form.starts_with('-')
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSentence {
    pub text: String,
    pub tokens: Vec<Token>,
}

impl ParsedSentence {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The head of `index`, or `None` for roots and degenerate edges.
    pub fn head_of(&self, index: usize) -> Option<usize> {
        let token = self.tokens.get(index)?;
        if token.dep == DepRel::Root || token.head == index || token.head >= self.tokens.len() {
            None
        } else {
            Some(token.head)
        }
    }

    /// Whether `ancestor` dominates `descendant` (strictly).
    pub fn is_descendant(&self, ancestor: usize, descendant: usize) -> bool {
        let mut current = descendant;
        // a well-formed tree has at most len - 1 edges above any token
        for _ in 0..self.tokens.len() {
            match self.head_of(current) {
                Some(head) if head == ancestor => return true,
                Some(head) => current = head,
                None => return false,
            }
        }
        false
    }

    /// Byte range of a token span in the reconstructed sentence text.
    pub fn char_range(&self, span: Range<usize>) -> Range<usize> {
        let mut offset = 0;
        let mut start = 0;
        let mut end = 0;
        for (index, token) in self.tokens.iter().enumerate() {
            if index == span.start {
                start = offset;
            }
            offset += token.text.len();
            if index + 1 == span.end {
                end = offset;
            }
            offset += token.whitespace.len();
        }
        start..end.max(start)
    }

    /// Surface text of a token span, with the original whitespace between tokens.
    pub fn span_text(&self, span: Range<usize>) -> String {
        let tokens = self
            .tokens
            .get(span.start..span.end.min(self.tokens.len()))
            .unwrap_or_default();
        let mut text = String::new();
        for (position, token) in tokens.iter().enumerate() {
            text.push_str(&token.text);
            if position + 1 < tokens.len() {
                text.push_str(&token.whitespace);
            }
        }
        text
    }
}

/// Turns pipeline output into [`ParsedSentence`]s.
///
/// Owns the pipeline; construct it once and reuse it for every sentence and lexicon term.
#[derive(Debug)]
pub struct Adapter<P> {
    pipeline: P,
    language: Language,
}

impl<P: Pipeline> Adapter<P> {
    pub fn new(pipeline: P, language: Language) -> Self {
        Self { pipeline, language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse a sentence. Empty input or a pipeline failure yields an empty sentence.
    pub fn parse(&self, sentence: &str) -> ParsedSentence {
        if sentence.trim().is_empty() {
            return ParsedSentence::default();
        }

        let doc = match self.pipeline.analyze(sentence) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("Failed to analyze sentence '{sentence}': {e}");
                return ParsedSentence {
                    text: sentence.to_string(),
                    tokens: vec![],
                };
            }
        };

        let tokens = doc
            .into_iter()
            .enumerate()
            .map(|(index, token)| {
                let word = normalize_word(self.language, &token.text, &token.lemma, token.pos);
                Token {
                    index,
                    text: token.text,
                    whitespace: token.whitespace,
                    form: word.form,
                    lemma: word.lemma,
                    pos: word.pos,
                    dep: token.dep,
                    head: token.head,
                }
            })
            .collect();

        ParsedSentence {
            text: sentence.to_string(),
            tokens,
        }
    }
}

#[cfg(test)]
pub(crate) fn doc_token(
    text: &str,
    whitespace: &str,
    lemma: &str,
    pos: PartOfSpeech,
    dep: &str,
    head: usize,
) -> DocToken {
    DocToken {
        text: text.to_string(),
        whitespace: whitespace.to_string(),
        pos,
        lemma: lemma.to_string(),
        dep: DepRel::from_label(dep),
        head,
    }
}
