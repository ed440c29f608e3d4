pub mod text_cleanup;

#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Copy,
)]
pub enum PartOfSpeech {
    #[serde(rename = "ADJ")]
    Adj, // adjective
    #[serde(rename = "ADP")]
    Adp, // adposition
    #[serde(rename = "ADV")]
    Adv, // adverb
    #[serde(rename = "AUX")]
    Aux, // auxiliary
    #[serde(rename = "CCONJ", alias = "CONJ")]
    Cconj, // coordinating conjunction
    #[serde(rename = "DET")]
    Det, // determiner
    #[serde(rename = "INTJ")]
    Intj, // interjection
    #[serde(rename = "NOUN")]
    Noun, // noun
    #[serde(rename = "NUM")]
    Num, // numeral
    #[serde(rename = "PART")]
    Part, // particle
    #[serde(rename = "PRON")]
    Pron, // pronoun
    #[serde(rename = "PROPN")]
    Propn, // proper noun
    #[serde(rename = "PUNCT")]
    Punct, // punctuation
    #[serde(rename = "SCONJ")]
    Sconj, // subordinating conjunction
    #[serde(rename = "SYM")]
    Sym, // symbol
    #[serde(rename = "VERB")]
    Verb, // verb
    #[serde(rename = "SPACE")]
    Space, // space
    #[serde(rename = "X")]
    X, // other
}

impl PartOfSpeech {
    pub fn is_verbal(&self) -> bool {
        matches!(self, PartOfSpeech::Verb | PartOfSpeech::Aux)
    }

    /// Closed-class words that attach to a content word rather than heading a phrase.
    pub fn is_function_word(&self) -> bool {
        matches!(
            self,
            PartOfSpeech::Adp
                | PartOfSpeech::Det
                | PartOfSpeech::Cconj
                | PartOfSpeech::Sconj
                | PartOfSpeech::Part
                | PartOfSpeech::Punct
        )
    }

    /// Tags that taggers routinely swap for the same word.
    ///
    /// `Verb`/`Aux` and `Noun`/`Propn` are merged; every other tag is its own class.
    pub fn coarse_class(&self) -> &'static [PartOfSpeech] {
        match self {
            PartOfSpeech::Verb | PartOfSpeech::Aux => &[PartOfSpeech::Verb, PartOfSpeech::Aux],
            PartOfSpeech::Noun | PartOfSpeech::Propn => {
                &[PartOfSpeech::Noun, PartOfSpeech::Propn]
            }
            PartOfSpeech::Adj => &[PartOfSpeech::Adj],
            PartOfSpeech::Adp => &[PartOfSpeech::Adp],
            PartOfSpeech::Adv => &[PartOfSpeech::Adv],
            PartOfSpeech::Cconj => &[PartOfSpeech::Cconj],
            PartOfSpeech::Det => &[PartOfSpeech::Det],
            PartOfSpeech::Intj => &[PartOfSpeech::Intj],
            PartOfSpeech::Num => &[PartOfSpeech::Num],
            PartOfSpeech::Part => &[PartOfSpeech::Part],
            PartOfSpeech::Pron => &[PartOfSpeech::Pron],
            PartOfSpeech::Punct => &[PartOfSpeech::Punct],
            PartOfSpeech::Sconj => &[PartOfSpeech::Sconj],
            PartOfSpeech::Sym => &[PartOfSpeech::Sym],
            PartOfSpeech::Space => &[PartOfSpeech::Space],
            PartOfSpeech::X => &[PartOfSpeech::X],
        }
    }
}

impl std::fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let word = match self {
            PartOfSpeech::Adj => "adjective",
            PartOfSpeech::Adp => "adposition",
            PartOfSpeech::Adv => "adverb",
            PartOfSpeech::Aux => "auxiliary",
            PartOfSpeech::Cconj => "coordinating conjunction",
            PartOfSpeech::Det => "determiner",
            PartOfSpeech::Intj => "interjection",
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Num => "numeral",
            PartOfSpeech::Part => "particle",
            PartOfSpeech::Pron => "pronoun",
            PartOfSpeech::Propn => "proper noun",
            PartOfSpeech::Punct => "punctuation",
            PartOfSpeech::Sconj => "subordinating conjunction",
            PartOfSpeech::Sym => "symbol",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Space => "space",
            PartOfSpeech::X => "other",
        };
        write!(f, "{word}")
    }
}

/// Universal Dependencies relation, without its language-specific subtype.
///
/// Pipelines emit labels such as `obl:mod`, `expl:pv` or `ROOT`; [`DepRel::from_label`]
/// keeps the part before the colon and falls back to [`DepRel::Dep`] for anything unknown.
#[derive(
    Clone,
    Copy,
    Debug,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    parse_display::Display,
    parse_display::FromStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[display(style = "lowercase")]
#[serde(from = "String", into = "String")]
pub enum DepRel {
    Acl,
    Advcl,
    Advmod,
    Amod,
    Appos,
    Aux,
    Case,
    Cc,
    Ccomp,
    Clf,
    Compound,
    Conj,
    Cop,
    Csubj,
    Dep,
    Det,
    Discourse,
    Dislocated,
    Expl,
    Fixed,
    Flat,
    Goeswith,
    Iobj,
    List,
    Mark,
    Nmod,
    Nsubj,
    Nummod,
    Obj,
    Obl,
    Orphan,
    Parataxis,
    Punct,
    Reparandum,
    Root,
    Vocative,
    Xcomp,
}

impl DepRel {
    pub fn from_label(label: &str) -> Self {
        let base = label.split(':').next().unwrap_or(label).trim();
        base.to_lowercase().parse().unwrap_or(DepRel::Dep)
    }

    pub fn is_subject(&self) -> bool {
        matches!(self, DepRel::Nsubj | DepRel::Csubj | DepRel::Expl)
    }
}

impl From<String> for DepRel {
    fn from(label: String) -> Self {
        DepRel::from_label(&label)
    }
}

impl From<DepRel> for String {
    fn from(rel: DepRel) -> Self {
        rel.to_string()
    }
}

#[derive(
    Copy,
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    PartialEq,
    Eq,
    Ord,
    PartialOrd,
    Hash,
)]
pub enum Language {
    French,
    English,
    Spanish,
    German,
}

impl Language {
    pub fn from_iso_639_3(code: &str) -> Option<Self> {
        match code {
            "fra" => Some(Language::French),
            "eng" => Some(Language::English),
            "spa" => Some(Language::Spanish),
            "deu" => Some(Language::German),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::French => write!(f, "French"),
            Language::English => write!(f, "English"),
            Language::Spanish => write!(f, "Spanish"),
            Language::German => write!(f, "German"),
        }
    }
}

/// One corpus record: the target-language variants of a sentence and their reference translation.
#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
pub struct Sentence {
    pub french: Vec<String>,
    pub english: String,
}

/// A token as emitted by the linguistic pipeline.
///
/// `head` is the index of the syntactic head within the same sentence; the root
/// points at itself.
#[derive(
    Clone,
    Debug,
    serde::Serialize,
    serde::Deserialize,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
pub struct DocToken {
    pub text: String,
    #[serde(default)]
    pub whitespace: String,
    pub pos: PartOfSpeech,
    pub lemma: String,
    pub dep: DepRel,
    pub head: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dep_rel_strips_subtype() {
        assert_eq!(DepRel::from_label("obl:mod"), DepRel::Obl);
        assert_eq!(DepRel::from_label("expl:pv"), DepRel::Expl);
        assert_eq!(DepRel::from_label("acl:relcl"), DepRel::Acl);
    }

    #[test]
    fn test_dep_rel_accepts_spacy_root() {
        assert_eq!(DepRel::from_label("ROOT"), DepRel::Root);
        assert_eq!(DepRel::Root.to_string(), "root");
    }

    #[test]
    fn test_dep_rel_unknown_label_is_dep() {
        assert_eq!(DepRel::from_label("nonsense"), DepRel::Dep);
        assert_eq!(DepRel::from_label(""), DepRel::Dep);
    }

    #[test]
    fn test_doc_token_from_pipeline_json() {
        let json = r#"{"text":"n'","whitespace":"","pos":"ADV","lemma":"ne","dep":"advmod","head":2}"#;
        let token: DocToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.pos, PartOfSpeech::Adv);
        assert_eq!(token.dep, DepRel::Advmod);
        assert_eq!(token.head, 2);

        let round_trip = serde_json::to_string(&token).unwrap();
        assert!(round_trip.contains(r#""dep":"advmod""#));
    }

    #[test]
    fn test_sentence_record_shape() {
        let json = r#"{"french":["Qu'est-ce qui se passe ?"],"english":"What's going on?"}"#;
        let sentence: Sentence = serde_json::from_str(json).unwrap();
        assert_eq!(sentence.french.len(), 1);
        assert_eq!(sentence.english, "What's going on?");
    }

    #[test]
    fn test_coarse_class_merges_verb_and_aux() {
        assert!(PartOfSpeech::Aux.coarse_class().contains(&PartOfSpeech::Verb));
        assert!(!PartOfSpeech::Adj.coarse_class().contains(&PartOfSpeech::Adv));
    }
}
