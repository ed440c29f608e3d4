use crate::normalize::rules;
use indexmap::IndexSet;
use language_utils::Language;
use language_utils::text_cleanup::normalize_typography;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("Failed to read lexicon file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read a lexicon file: one multiword term per line.
pub fn load_lexicon(path: &Path, language: Language) -> Result<Vec<String>, LexiconError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LexiconError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let terms = clean_terms(contents.lines(), language);
    log::info!("Loaded {} terms from {}", terms.len(), path.display());
    Ok(terms)
}

/// Normalize lexicon lines, dropping blanks, duplicates and terms that never surface in text.
///
/// Dictionaries write placeholders as "..." ("ne ... pas"); those are removed.
pub fn clean_terms<'a>(
    lines: impl IntoIterator<Item = &'a str>,
    language: Language,
) -> Vec<String> {
    let banned_terms = rules(language).banned_terms;

    let mut terms = IndexSet::new();
    for line in lines {
        let mut term = normalize_typography(line).replace("...", "");
        while term.contains("  ") {
            term = term.replace("  ", " ");
        }
        let term = term.trim();

        if term.is_empty() {
            continue;
        }
        if banned_terms.contains(&term) {
            log::debug!("Skipping banned term '{term}'");
            continue;
        }
        terms.insert(term.to_string());
    }
    terms.into_iter().collect()
}
