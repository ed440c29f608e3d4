use language_utils::text_cleanup::normalize_typography;
use language_utils::{Language, PartOfSpeech};

type NormalizeWordFn = fn(&str, &str, PartOfSpeech) -> (String, String, PartOfSpeech);

/// Word lists the compiler and matcher consult for one language.
#[derive(Debug)]
pub struct LanguageRules {
    /// Verbs that attach to their predicate as `cop` instead of heading the clause.
    pub copulas: &'static [&'static str],
    /// Particles that may sit between a verb and its complement in a negated clause.
    pub negation_particles: &'static [&'static str],
    /// Lemma that opens a split negation ("ne ... pas").
    pub negation_opener: Option<&'static str>,
    /// Second halves of a split negation, as lemma sequences.
    pub negation_closers: &'static [&'static [&'static str]],
    /// Closers that share a head with the opener (as opposed to merely following it).
    pub sibling_closers: &'static [&'static str],
    /// Clitic pronouns that may precede an infinitive inside a term.
    pub leading_clitics: &'static [&'static str],
    /// A reflexive clitic and the person-inflected lemmas that realize it.
    pub reflexive: Option<(&'static str, &'static [&'static str])>,
    /// (full form, elided form) pairs.
    pub elisions: &'static [(&'static str, &'static str)],
    /// Lexicon entries that are tokenizer artifacts and never surface in text.
    pub banned_terms: &'static [&'static str],
}

static FRENCH_RULES: LanguageRules = LanguageRules {
    copulas: &["être"],
    negation_particles: &["ne", "pas", "plus", "jamais", "guère", "point"],
    negation_opener: Some("ne"),
    negation_closers: &[
        &["pas"],
        &["plus"],
        &["que"],
        &["jamais"],
        &["guère"],
        &["point"],
        &["rien"],
        &["personne"],
        &["aucun"],
        &["nul", "part"],
    ],
    sibling_closers: &["pas", "plus", "jamais", "guère", "point", "rien"],
    leading_clitics: &["se", "en", "y", "le", "la", "les", "lui", "leur"],
    reflexive: Some(("se", &["se", "me", "te", "nous", "vous"])),
    elisions: &[
        ("que", "qu'"),
        ("ce", "c'"),
        ("ne", "n'"),
        ("le", "l'"),
        ("la", "l'"),
        ("de", "d'"),
        ("je", "j'"),
        ("me", "m'"),
        ("te", "t'"),
        ("se", "s'"),
        ("jusque", "jusqu'"),
        ("lorsque", "lorsqu'"),
        ("puisque", "puisqu'"),
        ("quoique", "quoiqu'"),
        ("presque", "presqu'"),
        ("quelque", "quelqu'"),
    ],
    banned_terms: &["de le", "de les", "à le", "à les"],
};

static GENERIC_RULES: LanguageRules = LanguageRules {
    copulas: &[],
    negation_particles: &[],
    negation_opener: None,
    negation_closers: &[],
    sibling_closers: &[],
    leading_clitics: &[],
    reflexive: None,
    elisions: &[],
    banned_terms: &[],
};

pub fn rules(language: Language) -> &'static LanguageRules {
    match language {
        Language::French => &FRENCH_RULES,
        Language::English | Language::Spanish | Language::German => &GENERIC_RULES,
    }
}

impl LanguageRules {
    pub fn is_copula(&self, lemma: &str) -> bool {
        self.copulas.contains(&lemma)
    }

    pub fn is_negation_particle(&self, lemma: &str) -> bool {
        self.negation_particles.contains(&lemma)
    }

    pub fn is_elidable(&self, form: &str) -> bool {
        self.elisions
            .iter()
            .any(|(full, elided)| *full == form || *elided == form)
    }

    /// Other surface realizations of an elidable word ("que" <-> "qu'").
    pub fn alternate_forms(&self, form: &str) -> Vec<&'static str> {
        let mut alternates = Vec::new();
        for (full, elided) in self.elisions {
            if *full == form && !alternates.contains(elided) {
                alternates.push(*elided);
            } else if *elided == form && !alternates.contains(full) {
                alternates.push(*full);
            }
        }
        alternates
    }

    /// Lemmas a term word matches: a reflexive clitic also matches its inflected forms.
    pub fn lemma_alternatives(&self, lemma: &str) -> Vec<String> {
        match self.reflexive {
            Some((reflexive, forms)) if reflexive == lemma => {
                forms.iter().map(|form| form.to_string()).collect()
            }
            _ => vec![lemma.to_string()],
        }
    }
}

pub(crate) fn strip_punctuation(text: &str) -> &str {
    text.trim_matches(|c| matches!(c, '.' | ',' | '!' | '?' | ':' | ';'))
}

/// Normalized view of one pipeline token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedWord {
    /// Lowercased surface with typographic variants folded; keeps a leading hyphen.
    pub form: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
}

/// Normalize a token's surface, lemma and part of speech.
///
/// Unlike heteronym extraction this never drops a token: punctuation and numbers come back
/// with their form as lemma, so token indices stay aligned with the pipeline's.
pub fn normalize_word(
    language: Language,
    text: &str,
    lemma: &str,
    pos: PartOfSpeech,
) -> NormalizedWord {
    let text = normalize_typography(text);
    let lemma = normalize_typography(lemma);

    if matches!(pos, PartOfSpeech::Punct | PartOfSpeech::Space)
        || strip_punctuation(&text).is_empty()
    {
        let form = text.to_lowercase();
        return NormalizedWord {
            lemma: form.clone(),
            form,
            pos,
        };
    }

    let normalize: NormalizeWordFn = match language {
        Language::French => normalize_french_word,
        Language::English | Language::Spanish | Language::German => normalize_generic_word,
    };

    let (form, lemma, pos) = normalize(&text, &lemma, pos);
    NormalizedWord { form, lemma, pos }
}

fn clean_lemma(lemma: &str) -> String {
    let lemma = lemma.strip_prefix('-').unwrap_or(lemma);
    let lemma = lemma.strip_suffix('.').unwrap_or(lemma);
    lemma.to_lowercase()
}

fn normalize_generic_word(
    text: &str,
    lemma: &str,
    pos: PartOfSpeech,
) -> (String, String, PartOfSpeech) {
    (text.to_lowercase(), clean_lemma(lemma), pos)
}

/// Expands French elisions to their full lemma and fixes lemmas the pipeline gets wrong.
///
/// Without morphology we can't tell "l'" (le) from "l'" (la), so it always lemmatizes to "le".
fn normalize_french_word(
    text: &str,
    lemma: &str,
    pos: PartOfSpeech,
) -> (String, String, PartOfSpeech) {
    let form = text.to_lowercase();

    // Abbreviations keep their dot, so match them before anything else
    match &form[..] {
        "m." => return (form, "monsieur".to_string(), PartOfSpeech::Noun),
        "mme" | "mme." => return (form, "madame".to_string(), PartOfSpeech::Noun),
        "mlle" | "mlle." => return (form, "mademoiselle".to_string(), PartOfSpeech::Noun),
        _ => {}
    }

    let lemma = clean_lemma(lemma);

    if form == "lui" && pos == PartOfSpeech::Pron {
        return (form, "lui".to_string(), pos);
    }

    let (lemma, pos) = match &form[..] {
        "elle" | "elles" => ("elle".to_string(), PartOfSpeech::Pron),
        // expand elisions
        "j'" => ("je".to_string(), PartOfSpeech::Pron),
        "m'" => ("me".to_string(), PartOfSpeech::Pron),
        "t'" => ("te".to_string(), PartOfSpeech::Pron),
        "-t" | "-t-" => ("t".to_string(), PartOfSpeech::Part),
        "s'" => {
            if pos == PartOfSpeech::Sconj {
                ("si".to_string(), PartOfSpeech::Sconj)
            } else {
                ("se".to_string(), PartOfSpeech::Pron)
            }
        }
        // either DET or PRON depending on context
        "c'" => ("ce".to_string(), pos),
        "n'" => ("ne".to_string(), PartOfSpeech::Adv),
        "l'" => ("le".to_string(), pos),
        "d'" => ("de".to_string(), PartOfSpeech::Adp),
        "qu'" => ("que".to_string(), pos),
        "quelqu'" => ("quelque".to_string(), pos),
        "jusqu'" => ("jusque".to_string(), PartOfSpeech::Adp),
        "lorsqu'" => ("lorsque".to_string(), PartOfSpeech::Sconj),
        "puisqu'" => ("puisque".to_string(), PartOfSpeech::Sconj),
        "quoiqu'" => ("quoique".to_string(), PartOfSpeech::Sconj),
        "presqu'" => ("presque".to_string(), PartOfSpeech::Adv),
        _ => (lemma, pos),
    };

    (form, lemma, pos)
}
