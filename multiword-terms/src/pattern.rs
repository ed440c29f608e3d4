use crate::nlp::Token;
use language_utils::{DepRel, Language, PartOfSpeech};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A lexicon entry as the compiler saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconTerm {
    /// The term as written in the lexicon.
    pub text: String,
    /// Lemmas of the term's words, punctuation excluded.
    pub lemmas: Vec<String>,
}

/// Which structural alternative of a term produced a match.
///
/// Ordered so that when several variants find the same span, the simplest one is reported.
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
    Serialize,
    Deserialize,
)]
#[display(style = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Plain,
    Contracted,
    Negated,
    Inverted,
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, parse_display::Display)]
#[display(style = "kebab-case")]
pub enum Shape {
    Fixed,
    Contraction,
    VerbComplement,
    SplitNegation,
}

#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct NodeConstraint {
    /// Accepted lemmas; empty accepts any word.
    pub lemmas: Vec<String>,
    pub pos: Vec<PartOfSpeech>,
    /// Accepted normalized surface forms.
    pub forms: Vec<String>,
    /// The surface must be hyphen-bound to the previous word.
    pub attached: bool,
    /// Realized nodes are words of the term. Only they count towards the span.
    pub realized: bool,
}

impl NodeConstraint {
    pub fn word(lemmas: Vec<String>) -> Self {
        Self {
            lemmas,
            realized: true,
            ..Default::default()
        }
    }

    pub fn wildcard() -> Self {
        Self::default()
    }

    pub fn is_wildcard(&self) -> bool {
        self.lemmas.is_empty()
    }

    pub fn accepts(&self, token: &Token) -> bool {
        if token.pos == PartOfSpeech::Punct && !self.pos.contains(&PartOfSpeech::Punct) {
            return false;
        }
        (self.lemmas.is_empty() || self.lemmas.contains(&token.lemma))
            && (self.pos.is_empty() || self.pos.contains(&token.pos))
            && (self.forms.is_empty() || self.forms.contains(&token.form))
            && (!self.attached || token.is_attached())
    }
}

/// A relation between two pattern nodes, by node index.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum EdgeConstraint {
    /// `child` depends directly on `head`, through one of `relations` (any, if empty).
    Child {
        head: usize,
        child: usize,
        relations: Vec<DepRel>,
    },
    Sibling {
        a: usize,
        b: usize,
    },
    Descendant {
        ancestor: usize,
        descendant: usize,
    },
    Adjacent {
        left: usize,
        right: usize,
    },
}

impl EdgeConstraint {
    pub fn endpoints(&self) -> (usize, usize) {
        match *self {
            EdgeConstraint::Child { head, child, .. } => (head, child),
            EdgeConstraint::Sibling { a, b } => (a, b),
            EdgeConstraint::Descendant {
                ancestor,
                descendant,
            } => (ancestor, descendant),
            EdgeConstraint::Adjacent { left, right } => (left, right),
        }
    }
}

/// What may sit between the bound tokens of a match.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Gap {
    Contiguous,
    /// Only tokens dominated by a bound token. Negation particles and inverted
    /// subject clitics only when allowed.
    Dependents {
        negation: bool,
        inverted_subject: bool,
    },
    Any,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchPattern {
    /// Index into [`PatternSet::terms`].
    pub term: usize,
    pub nodes: Vec<NodeConstraint>,
    pub edges: Vec<EdgeConstraint>,
    pub gap: Gap,
    pub variant: Variant,
    pub shape: Shape,
}

impl MatchPattern {
    /// The node matching starts from: the verb of a verb-complement term, otherwise the
    /// first node with a lemma.
    pub fn anchor(&self) -> Option<usize> {
        if self.shape == Shape::VerbComplement {
            let verb = self.nodes.iter().position(|node| {
                !node.is_wildcard() && node.pos.iter().any(|pos| pos.is_verbal())
            });
            if verb.is_some() {
                return verb;
            }
        }
        self.nodes.iter().position(|node| !node.is_wildcard())
    }

    pub fn specificity(&self) -> usize {
        self.nodes.iter().filter(|node| !node.is_wildcard()).count()
    }

    pub fn is_satisfiable(&self) -> bool {
        let in_range = |index: usize| index < self.nodes.len();
        self.specificity() > 0
            && self.nodes.iter().any(|node| node.realized)
            && self.edges.iter().all(|edge| {
                let (a, b) = edge.endpoints();
                in_range(a) && in_range(b) && a != b
            })
    }

    /// Same constraints, regardless of which term or variant they came from.
    pub fn same_structure(&self, other: &MatchPattern) -> bool {
        self.shape == other.shape
            && self.gap == other.gap
            && self.nodes == other.nodes
            && self.edges == other.edges
    }
}

/// Compiled lexicon: immutable once built, shared read-only between threads.
#[derive(Debug, Clone)]
pub struct PatternSet {
    language: Language,
    terms: Vec<LexiconTerm>,
    patterns: Vec<MatchPattern>,
    by_anchor: FxHashMap<String, Vec<usize>>,
}

impl PatternSet {
    pub fn new(language: Language, terms: Vec<LexiconTerm>) -> Self {
        Self {
            language,
            terms,
            patterns: Vec::new(),
            by_anchor: FxHashMap::default(),
        }
    }

    /// Add a pattern unless it is unsatisfiable or already present. Returns whether it was added.
    pub(crate) fn push(&mut self, pattern: MatchPattern) -> bool {
        if pattern.term >= self.terms.len() || !pattern.is_satisfiable() {
            return false;
        }
        if self.patterns.iter().any(|p| p.same_structure(&pattern)) {
            return false;
        }
        let Some(anchor) = pattern.anchor() else {
            return false;
        };

        let index = self.patterns.len();
        for lemma in &pattern.nodes[anchor].lemmas {
            let entry = self.by_anchor.entry(lemma.clone()).or_default();
            if !entry.contains(&index) {
                entry.push(index);
            }
        }
        self.patterns.push(pattern);
        true
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn terms(&self) -> &[LexiconTerm] {
        &self.terms
    }

    pub fn term(&self, pattern: &MatchPattern) -> &LexiconTerm {
        &self.terms[pattern.term]
    }

    pub fn patterns(&self) -> &[MatchPattern] {
        &self.patterns
    }

    /// Patterns whose anchor node accepts `lemma`.
    pub fn anchored_at(&self, lemma: &str) -> &[usize] {
        self.by_anchor.get(lemma).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(form: &str, lemma: &str, pos: PartOfSpeech) -> Token {
        Token {
            index: 0,
            text: form.to_string(),
            whitespace: String::new(),
            form: form.to_string(),
            lemma: lemma.to_string(),
            pos,
            dep: DepRel::Dep,
            head: 0,
        }
    }

    fn etre_a(term: usize) -> MatchPattern {
        MatchPattern {
            term,
            nodes: vec![
                NodeConstraint {
                    pos: vec![PartOfSpeech::Verb, PartOfSpeech::Aux],
                    ..NodeConstraint::word(vec!["être".to_string()])
                },
                NodeConstraint::word(vec!["à".to_string()]),
                NodeConstraint::wildcard(),
            ],
            edges: vec![
                EdgeConstraint::Child {
                    head: 2,
                    child: 0,
                    relations: vec![DepRel::Cop],
                },
                EdgeConstraint::Child {
                    head: 2,
                    child: 1,
                    relations: vec![DepRel::Case, DepRel::Mark],
                },
            ],
            gap: Gap::Dependents {
                negation: false,
                inverted_subject: false,
            },
            variant: Variant::Plain,
            shape: Shape::VerbComplement,
        }
    }

    #[test]
    fn test_node_accepts() {
        let node = NodeConstraint {
            forms: vec!["qu'".to_string()],
            ..NodeConstraint::word(vec!["que".to_string()])
        };
        assert!(node.accepts(&token("qu'", "que", PartOfSpeech::Pron)));
        assert!(!node.accepts(&token("que", "que", PartOfSpeech::Sconj)));

        let attached = NodeConstraint {
            attached: true,
            ..NodeConstraint::word(vec!["même".to_string()])
        };
        assert!(attached.accepts(&token("-mêmes", "même", PartOfSpeech::Adj)));
        assert!(!attached.accepts(&token("même", "même", PartOfSpeech::Adv)));
    }

    #[test]
    fn test_wildcard_never_binds_punctuation() {
        let wildcard = NodeConstraint::wildcard();
        assert!(wildcard.accepts(&token("toi", "toi", PartOfSpeech::Pron)));
        assert!(!wildcard.accepts(&token(".", ".", PartOfSpeech::Punct)));
    }

    #[test]
    fn test_anchor_and_specificity() {
        let pattern = etre_a(0);
        assert_eq!(pattern.anchor(), Some(0));
        assert_eq!(pattern.specificity(), 2);
        assert!(pattern.is_satisfiable());
    }

    #[test]
    fn test_unsatisfiable_patterns_rejected() {
        let mut set = PatternSet::new(
            Language::French,
            vec![LexiconTerm {
                text: "être à".to_string(),
                lemmas: vec!["être".to_string(), "à".to_string()],
            }],
        );

        let mut self_loop = etre_a(0);
        self_loop.edges.push(EdgeConstraint::Adjacent { left: 1, right: 1 });
        assert!(!set.push(self_loop));

        let mut out_of_range = etre_a(0);
        out_of_range.edges.push(EdgeConstraint::Sibling { a: 0, b: 7 });
        assert!(!set.push(out_of_range));

        let mut only_wildcards = etre_a(0);
        only_wildcards.nodes = vec![NodeConstraint::wildcard(); 3];
        assert!(!set.push(only_wildcards));

        assert!(set.push(etre_a(0)));
        assert!(!set.push(etre_a(0)), "structural duplicates are emitted once");
        assert_eq!(set.anchored_at("être"), &[0]);
        assert!(set.anchored_at("avoir").is_empty());
    }

    #[test]
    fn test_variant_order_and_display() {
        assert!(Variant::Plain < Variant::Contracted);
        assert!(Variant::Negated < Variant::Inverted);
        assert_eq!(Variant::Negated.to_string(), "negated");
        assert_eq!("inverted".parse::<Variant>().unwrap(), Variant::Inverted);
        assert_eq!(Shape::SplitNegation.to_string(), "split-negation");
    }
}
