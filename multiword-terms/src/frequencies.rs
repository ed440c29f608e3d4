use crate::batch::AnnotatedSentence;
use crate::matcher::Confidence;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use language_utils::Language;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub term: String,
    pub count: u32,
}

/// Count how often each term occurs in the annotated corpus.
///
/// Low-confidence terms count for 30% of a high-confidence
/// term, except for French terms that start with "ne",
/// which count fully.
pub fn compute_frequencies(
    sentences: &[AnnotatedSentence],
    language: Language,
) -> BTreeMap<String, u32> {
    let mut frequencies: BTreeMap<String, f32> = BTreeMap::new();

    let pb = ProgressBar::new(sentences.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} sentences ({per_sec}, {eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    for sentence in sentences {
        pb.inc(1);
        for found in &sentence.multiword_terms {
            let weight = match found.confidence {
                Confidence::High => 1.0,
                Confidence::Low
                    if language == Language::French && found.term.starts_with("ne ") =>
                {
                    1.0
                }
                Confidence::Low => 0.3,
            };
            *frequencies.entry(found.term.clone()).or_insert(0.0) += weight;
        }
    }

    pb.finish();

    // Round fractional counts to integers for output
    frequencies
        .into_iter()
        .map(|(term, count)| (term, count.ceil() as u32))
        .collect()
}

pub fn read_annotated_file(input: &Path) -> Result<Vec<AnnotatedSentence>> {
    let file = File::open(input)
        .with_context(|| format!("Failed to open annotated file {}", input.display()))?;
    let mut sentences = Vec::new();
    for (line_number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let sentence = serde_json::from_str(&line).with_context(|| {
            format!("Malformed annotated record at {}:{}", input.display(), line_number + 1)
        })?;
        sentences.push(sentence);
    }
    Ok(sentences)
}

pub fn write_frequencies_file(
    frequencies: BTreeMap<String, u32>,
    output_path: &Path,
) -> Result<()> {
    let mut frequencies: Vec<FrequencyEntry> = frequencies
        .into_iter()
        .map(|(term, count)| FrequencyEntry { term, count })
        .collect();

    // stable sort, so equal counts stay in term order
    frequencies.sort_by_key(|entry| Reverse(entry.count));

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    for entry in frequencies {
        let json = serde_json::to_string(&entry)?;
        writeln!(writer, "{json}")?;
    }
    writer.flush()?;

    Ok(())
}
