use crate::detector::MultiwordTermDetector;
use crate::matcher::Confidence;
use crate::nlp::{Pipeline, TokenizationCache};
use crate::pattern::Variant;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use indexmap::IndexSet;
use language_utils::Sentence;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A corpus record with the terms found in each of its sentence variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedSentence {
    #[serde(flatten)]
    pub sentence: Sentence,
    pub multiword_terms: Vec<DiscoveredTerm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredTerm {
    pub term: String,
    /// Which of the record's sentence variants the term was found in.
    pub sentence: usize,
    pub start: usize,
    pub end: usize,
    /// Byte offsets of the span in the sentence text.
    pub start_char: usize,
    pub end_char: usize,
    /// Surface text of the span.
    pub text: String,
    pub variant: Variant,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub records: usize,
    pub sentences: usize,
    pub terms: usize,
}

pub fn annotate_record<P: Pipeline>(
    detector: &MultiwordTermDetector<P>,
    sentence: Sentence,
) -> AnnotatedSentence {
    let mut multiword_terms = Vec::new();
    for (index, variant) in sentence.french.iter().enumerate() {
        let (parsed, matches) = detector.detect(variant);
        multiword_terms.extend(matches.into_iter().map(|m| {
            let chars = parsed.char_range(m.start..m.end);
            DiscoveredTerm {
                text: parsed.span_text(m.start..m.end),
                term: m.term,
                sentence: index,
                start: m.start,
                end: m.end,
                start_char: chars.start,
                end_char: chars.end,
                variant: m.variant,
                confidence: m.confidence,
            }
        }));
    }
    AnnotatedSentence {
        sentence,
        multiword_terms,
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({per_sec}, {eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

fn read_records(input: &Path) -> Result<Vec<Sentence>> {
    let file = File::open(input)
        .with_context(|| format!("Failed to open records file {}", input.display()))?;
    let mut records = Vec::new();
    for (line_number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", input.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Sentence = serde_json::from_str(&line).with_context(|| {
            format!("Malformed record at {}:{}", input.display(), line_number + 1)
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Write lines to `output` atomically: nothing appears at `output` unless every line was written.
fn write_atomically(
    output: &Path,
    write: impl FnOnce(&mut BufWriter<&mut tempfile::NamedTempFile>) -> Result<()>,
) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;
    {
        let mut writer = BufWriter::new(&mut temp_file);
        write(&mut writer)?;
        writer.flush()?;
    }
    temp_file
        .persist(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

/// Annotate every record of a JSONL file and write the result as JSONL.
pub fn annotate_file<P: Pipeline>(
    detector: &MultiwordTermDetector<P>,
    input: &Path,
    output: &Path,
) -> Result<BatchStats> {
    let records = read_records(input)?;
    println!("Annotating {} records...", records.len());

    let pb = progress_bar(records.len());
    let mut stats = BatchStats::default();

    write_atomically(output, |writer| {
        for record in records {
            let annotated = annotate_record(detector, record);
            stats.records += 1;
            stats.sentences += annotated.sentence.french.len();
            stats.terms += annotated.multiword_terms.len();

            let json = serde_json::to_string(&annotated)?;
            writeln!(writer, "{json}")?;
            pb.inc(1);
        }
        Ok(())
    })?;

    pb.finish();
    println!(
        "Found {} multiword terms in {} sentences",
        stats.terms, stats.sentences
    );
    Ok(stats)
}

/// Lexicon terms and record sentences the tokenization cache does not cover yet.
pub fn pending_texts(
    cache: &TokenizationCache,
    lexicon: &[String],
    records: &[Sentence],
) -> Vec<String> {
    let texts = lexicon
        .iter()
        .chain(records.iter().flat_map(|record| record.french.iter()))
        .map(|text| text.trim())
        .collect::<IndexSet<_>>();
    cache
        .missing(texts)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Write [`pending_texts`] one per line, for the pipeline to tokenize.
pub fn write_pending_file(
    cache: &TokenizationCache,
    lexicon: &[String],
    input: &Path,
    output: &Path,
) -> Result<usize> {
    let records = read_records(input)?;
    let pending = pending_texts(cache, lexicon, &records);

    write_atomically(output, |writer| {
        for text in &pending {
            writeln!(writer, "{text}")?;
        }
        Ok(())
    })?;

    println!("{} texts still need to be tokenized", pending.len());
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorConfig;
    use crate::nlp::{TokenizedSentence, doc_token};
    use language_utils::PartOfSpeech;

    fn cache() -> TokenizationCache {
        let mut cache = TokenizationCache::new();
        cache.insert(TokenizedSentence {
            sentence: "c'est ça".to_string(),
            tokens: vec![
                doc_token("c'", "", "ce", PartOfSpeech::Pron, "nsubj", 2),
                doc_token("est", " ", "être", PartOfSpeech::Aux, "cop", 2),
                doc_token("ça", "", "ça", PartOfSpeech::Pron, "ROOT", 2),
            ],
        });
        cache.insert(TokenizedSentence {
            sentence: "C'est ça !".to_string(),
            tokens: vec![
                doc_token("C'", "", "ce", PartOfSpeech::Pron, "nsubj", 2),
                doc_token("est", " ", "être", PartOfSpeech::Aux, "cop", 2),
                doc_token("ça", " ", "ça", PartOfSpeech::Pron, "ROOT", 2),
                doc_token("!", "", "!", PartOfSpeech::Punct, "punct", 2),
            ],
        });
        cache
    }

    fn detector() -> MultiwordTermDetector<TokenizationCache> {
        MultiwordTermDetector::new(cache(), &["c'est ça".to_string()], &DetectorConfig::default())
    }

    fn record(french: &[&str]) -> Sentence {
        Sentence {
            french: french.iter().map(|s| s.to_string()).collect(),
            english: "That's it!".to_string(),
        }
    }

    #[test]
    fn test_annotate_record() {
        let annotated = annotate_record(&detector(), record(&["Bof.", "C'est ça !"]));
        assert_eq!(annotated.multiword_terms.len(), 1);
        let term = &annotated.multiword_terms[0];
        assert_eq!(term.sentence, 1);
        assert_eq!(term.text, "C'est ça");
        // "ç" is two bytes
        assert_eq!((term.start_char, term.end_char), (0, 9));
        assert_eq!(term.confidence, Confidence::High);
    }

    #[test]
    fn test_annotated_record_keeps_input_fields() {
        let annotated = annotate_record(&detector(), record(&["C'est ça !"]));
        let json: serde_json::Value = serde_json::to_value(&annotated).unwrap();
        assert_eq!(json["english"], "That's it!");
        assert_eq!(json["french"][0], "C'est ça !");
        assert_eq!(json["multiword_terms"][0]["variant"], "plain");
        assert_eq!(json["multiword_terms"][0]["confidence"], "high");
    }

    #[test]
    fn test_annotate_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sentences.jsonl");
        let output = dir.path().join("annotated.jsonl");
        let lines = [
            serde_json::to_string(&record(&["C'est ça !"])).unwrap(),
            String::new(),
            serde_json::to_string(&record(&["Bof."])).unwrap(),
        ];
        std::fs::write(&input, lines.join("\n")).unwrap();

        let stats = annotate_file(&detector(), &input, &output).unwrap();
        assert_eq!(
            stats,
            BatchStats {
                records: 2,
                sentences: 2,
                terms: 1
            }
        );

        let written = std::fs::read_to_string(&output).unwrap();
        let annotated: Vec<AnnotatedSentence> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(annotated.len(), 2);
        assert!(annotated[1].multiword_terms.is_empty());
    }

    #[test]
    fn test_malformed_record_is_fatal_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sentences.jsonl");
        let output = dir.path().join("annotated.jsonl");
        std::fs::write(&input, "{\"french\": \"not a list\"}\n").unwrap();

        let error = annotate_file(&detector(), &input, &output).unwrap_err();
        assert!(error.to_string().contains(":1"));
        assert!(!output.exists());
    }

    #[test]
    fn test_pending_texts() {
        let records = vec![record(&["C'est ça !", "Bof."]), record(&["Bof."])];
        let lexicon = vec!["c'est ça".to_string(), "être à".to_string()];
        let pending = pending_texts(&cache(), &lexicon, &records);
        assert_eq!(pending, vec!["être à", "Bof."]);
    }
}
