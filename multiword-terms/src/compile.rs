//! Turns lexicon entries into dependency patterns.
//!
//! Each term is parsed with the same adapter as the sentences it will be matched against,
//! classified by shape, and compiled into one pattern per variant the shape supports.

use crate::detector::DetectorConfig;
use crate::nlp::{Adapter, Pipeline};
use crate::normalize::{LanguageRules, rules};
use crate::pattern::{
    EdgeConstraint, Gap, LexiconTerm, MatchPattern, NodeConstraint, PatternSet, Shape, Variant,
};
use itertools::Itertools;
use language_utils::{DepRel, PartOfSpeech};
use rustc_hash::FxHashMap;

const VERBAL: [PartOfSpeech; 2] = [PartOfSpeech::Verb, PartOfSpeech::Aux];

/// One word of a lexicon term.
#[derive(Debug, Clone)]
struct TermWord {
    form: String,
    lemma: String,
    pos: PartOfSpeech,
    attached: bool,
}

impl TermWord {
    fn is_content(&self) -> bool {
        !self.pos.is_function_word()
    }

    fn node(&self, pin_form: bool) -> NodeConstraint {
        NodeConstraint {
            forms: if pin_form {
                vec![self.form.clone()]
            } else {
                vec![]
            },
            attached: self.attached,
            ..NodeConstraint::word(vec![self.lemma.clone()])
        }
    }
}

struct AnalyzedTerm {
    text: String,
    words: Vec<TermWord>,
    shape: Shape,
}

/// A pattern before it is tied to its term.
struct Draft {
    nodes: Vec<NodeConstraint>,
    edges: Vec<EdgeConstraint>,
    gap: Gap,
    variant: Variant,
}

pub fn compile<P: Pipeline>(
    adapter: &Adapter<P>,
    lexicon: &[String],
    config: &DetectorConfig,
) -> PatternSet {
    let rules = rules(adapter.language());

    let analyzed = lexicon
        .iter()
        .filter_map(|raw| analyze_term(adapter, rules, raw))
        .collect_vec();

    // terms that only differ by surface (e.g. "qu'est-ce que" / "qu'est-ce qu'") are told
    // apart by their forms
    let mut lemma_sequences: FxHashMap<(Shape, Vec<&str>), usize> = FxHashMap::default();
    for term in &analyzed {
        let lemmas = term.words.iter().map(|word| word.lemma.as_str()).collect();
        *lemma_sequences.entry((term.shape, lemmas)).or_default() += 1;
    }
    let pinned = analyzed
        .iter()
        .map(|term| {
            let lemmas: Vec<&str> = term.words.iter().map(|word| word.lemma.as_str()).collect();
            lemma_sequences.get(&(term.shape, lemmas)).copied().unwrap_or(0) > 1
        })
        .collect_vec();

    let terms = analyzed
        .iter()
        .map(|term| LexiconTerm {
            text: term.text.clone(),
            lemmas: term.words.iter().map(|word| word.lemma.clone()).collect(),
        })
        .collect_vec();
    let mut set = PatternSet::new(adapter.language(), terms);

    for (index, (term, pin)) in analyzed.iter().zip(pinned).enumerate() {
        let drafts = match term.shape {
            Shape::SplitNegation => split_negation(rules, &term.words),
            Shape::VerbComplement => verb_complement(rules, &term.words, pin, config),
            Shape::Contraction => contraction(rules, &term.words, pin, config),
            Shape::Fixed => fixed(&term.words, pin),
        };

        let mut added = 0;
        for draft in drafts {
            let pattern = MatchPattern {
                term: index,
                nodes: draft.nodes,
                edges: draft.edges,
                gap: draft.gap,
                variant: draft.variant,
                shape: term.shape,
            };
            log::debug!(
                "Pattern for '{}' ({}, {}): {:?}",
                term.text,
                pattern.shape,
                pattern.variant,
                pattern.nodes
            );
            if set.push(pattern) {
                added += 1;
            }
        }
        if added == 0 {
            log::debug!("No new pattern for term '{}'", term.text);
        }
    }

    log::info!(
        "Compiled {} patterns for {} terms",
        set.len(),
        set.terms().len()
    );
    set
}

fn analyze_term<P: Pipeline>(
    adapter: &Adapter<P>,
    rules: &LanguageRules,
    raw: &str,
) -> Option<AnalyzedTerm> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let parsed = adapter.parse(text);
    let words = parsed
        .tokens
        .iter()
        .filter(|token| !matches!(token.pos, PartOfSpeech::Punct | PartOfSpeech::Space))
        .map(|token| TermWord {
            form: token.form.clone(),
            lemma: token.lemma.clone(),
            pos: token.pos,
            attached: token.is_attached(),
        })
        .collect_vec();

    if words.is_empty() {
        log::warn!("Skipping term '{text}': it has no words after parsing");
        return None;
    }

    let shape = classify(rules, &words);
    Some(AnalyzedTerm {
        text: text.to_string(),
        words,
        shape,
    })
}

fn leading_clitics(rules: &LanguageRules, words: &[TermWord]) -> usize {
    words
        .iter()
        .take_while(|word| rules.leading_clitics.contains(&word.lemma.as_str()))
        .count()
}

fn classify(rules: &LanguageRules, words: &[TermWord]) -> Shape {
    if let Some(opener) = rules.negation_opener {
        let rest = words.iter().skip(1).map(|word| word.lemma.as_str()).collect_vec();
        if words[0].lemma == opener
            && rules
                .negation_closers
                .iter()
                .any(|closer| closer[..] == rest[..])
        {
            return Shape::SplitNegation;
        }
    }

    let clitics = leading_clitics(rules, words);
    if let Some(verb) = words.get(clitics) {
        if verb.pos.is_verbal() && verb.form == verb.lemma && words.len() > clitics + 1 {
            return Shape::VerbComplement;
        }
    }

    if words
        .iter()
        .any(|word| word.pos.is_verbal() && word.form != word.lemma)
    {
        return Shape::Contraction;
    }

    Shape::Fixed
}

fn relations_for(pos: PartOfSpeech) -> Vec<DepRel> {
    match pos {
        PartOfSpeech::Adp => vec![DepRel::Case, DepRel::Mark],
        PartOfSpeech::Det => vec![DepRel::Det],
        _ => vec![],
    }
}

/// Verb + complement. A copula hangs off its predicate; any other verb heads the term.
fn verb_complement(
    rules: &LanguageRules,
    words: &[TermWord],
    pin: bool,
    config: &DetectorConfig,
) -> Vec<Draft> {
    let verb = leading_clitics(rules, words);
    let copula = rules.is_copula(&words[verb].lemma);

    let mut nodes = words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i < verb {
                NodeConstraint {
                    attached: word.attached,
                    ..NodeConstraint::word(rules.lemma_alternatives(&word.lemma))
                }
            } else if i == verb {
                NodeConstraint {
                    pos: VERBAL.to_vec(),
                    ..word.node(false)
                }
            } else {
                word.node(pin && !word.pos.is_verbal())
            }
        })
        .collect_vec();

    let first_content = (verb + 1..words.len()).find(|&i| words[i].is_content());
    let head = if copula {
        match first_content {
            Some(predicate) => predicate,
            None => {
                nodes.push(NodeConstraint::wildcard());
                nodes.len() - 1
            }
        }
    } else {
        verb
    };

    let mut edges = vec![];
    if copula {
        edges.push(EdgeConstraint::Child {
            head,
            child: verb,
            relations: vec![DepRel::Cop],
        });
    }
    for clitic in 0..verb {
        edges.push(EdgeConstraint::Child {
            head: verb,
            child: clitic,
            relations: vec![],
        });
    }

    let mut trailing = None;
    for i in verb + 1..words.len() {
        if words[i].is_content() {
            if i == head {
                continue;
            }
            if !copula && Some(i) == first_content {
                edges.push(EdgeConstraint::Child {
                    head,
                    child: i,
                    relations: vec![],
                });
            } else {
                edges.push(EdgeConstraint::Descendant {
                    ancestor: head,
                    descendant: i,
                });
            }
            continue;
        }

        let relations = relations_for(words[i].pos);
        match (i + 1..words.len()).find(|&j| words[j].is_content()) {
            Some(content) => edges.push(EdgeConstraint::Child {
                head: content,
                child: i,
                relations,
            }),
            // "être à": the predicate is the object of the preposition
            None if copula && first_content.is_none() => edges.push(EdgeConstraint::Child {
                head,
                child: i,
                relations,
            }),
            // "avoir besoin de", "tenir à": the object is outside the term
            None => {
                let object = *trailing.get_or_insert_with(|| {
                    nodes.push(NodeConstraint::wildcard());
                    let object = nodes.len() - 1;
                    edges.push(EdgeConstraint::Descendant {
                        ancestor: head,
                        descendant: object,
                    });
                    object
                });
                edges.push(EdgeConstraint::Child {
                    head: object,
                    child: i,
                    relations,
                });
            }
        }
    }

    let mut gaps = vec![(
        Variant::Plain,
        Gap::Dependents {
            negation: false,
            inverted_subject: false,
        },
    )];
    if config.negation_variants {
        gaps.push((
            Variant::Negated,
            Gap::Dependents {
                negation: true,
                inverted_subject: false,
            },
        ));
    }
    if config.inversion_variants {
        gaps.push((
            Variant::Inverted,
            Gap::Dependents {
                negation: true,
                inverted_subject: true,
            },
        ));
    }

    gaps.into_iter()
        .map(|(variant, gap)| Draft {
            nodes: nodes.clone(),
            edges: edges.clone(),
            gap,
            variant,
        })
        .collect()
}

/// Contiguous match on lemmas, with elided words pinned to the surface they were written with.
fn contraction(
    rules: &LanguageRules,
    words: &[TermWord],
    pin: bool,
    config: &DetectorConfig,
) -> Vec<Draft> {
    let nodes = words
        .iter()
        .map(|word| {
            if word.pos.is_verbal() {
                NodeConstraint {
                    pos: VERBAL.to_vec(),
                    ..word.node(false)
                }
            } else {
                word.node(pin || rules.is_elidable(&word.form))
            }
        })
        .collect_vec();

    let mut drafts = vec![Draft {
        nodes: nodes.clone(),
        edges: vec![],
        gap: Gap::Contiguous,
        variant: Variant::Plain,
    }];

    let last = words.len() - 1;
    if config.contraction_variants && !words[last].pos.is_verbal() {
        for alternate in rules.alternate_forms(&words[last].form) {
            let mut nodes = nodes.clone();
            nodes[last].forms = vec![alternate.to_string()];
            drafts.push(Draft {
                nodes,
                edges: vec![],
                gap: Gap::Contiguous,
                variant: Variant::Contracted,
            });
        }
    }

    drafts
}

fn fixed(words: &[TermWord], pin: bool) -> Vec<Draft> {
    let nodes = words
        .iter()
        .map(|word| NodeConstraint {
            pos: word.pos.coarse_class().to_vec(),
            ..word.node(pin)
        })
        .collect_vec();

    vec![Draft {
        nodes,
        edges: vec![],
        gap: Gap::Contiguous,
        variant: Variant::Plain,
    }]
}

/// "ne ... pas" and friends: both halves hang off the same clause, anything may sit between.
fn split_negation(rules: &LanguageRules, words: &[TermWord]) -> Vec<Draft> {
    let mut nodes = words.iter().map(|word| word.node(false)).collect_vec();
    nodes.push(NodeConstraint::wildcard());
    let clause = nodes.len() - 1;

    let mut edges = vec![EdgeConstraint::Child {
        head: clause,
        child: 0,
        relations: vec![DepRel::Advmod],
    }];
    if rules.sibling_closers.contains(&words[1].lemma.as_str()) {
        edges.push(EdgeConstraint::Sibling { a: 0, b: 1 });
    } else {
        edges.push(EdgeConstraint::Descendant {
            ancestor: clause,
            descendant: 1,
        });
    }
    for i in 2..words.len() {
        edges.push(EdgeConstraint::Adjacent {
            left: i - 1,
            right: i,
        });
    }

    vec![Draft {
        nodes,
        edges,
        gap: Gap::Any,
        variant: Variant::Plain,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::{TokenizationCache, TokenizedSentence, doc_token};
    use language_utils::{DocToken, Language};

    fn tok(text: &str, lemma: &str, pos: PartOfSpeech, dep: &str, head: usize) -> DocToken {
        doc_token(text, " ", lemma, pos, dep, head)
    }

    fn adapter(terms: Vec<(&str, Vec<DocToken>)>) -> Adapter<TokenizationCache> {
        let mut cache = TokenizationCache::new();
        for (sentence, tokens) in terms {
            cache.insert(TokenizedSentence {
                sentence: sentence.to_string(),
                tokens,
            });
        }
        Adapter::new(cache, Language::French)
    }

    fn compile_terms(terms: Vec<(&str, Vec<DocToken>)>, config: &DetectorConfig) -> PatternSet {
        let lexicon = terms.iter().map(|(text, _)| text.to_string()).collect_vec();
        compile(&adapter(terms), &lexicon, config)
    }

    fn etre_a() -> (&'static str, Vec<DocToken>) {
        (
            "être à",
            vec![
                tok("être", "être", PartOfSpeech::Aux, "ROOT", 0),
                tok("à", "à", PartOfSpeech::Adp, "case", 0),
            ],
        )
    }

    fn qu_est_ce_que() -> (&'static str, Vec<DocToken>) {
        (
            "qu'est-ce que",
            vec![
                tok("qu'", "que", PartOfSpeech::Pron, "obj", 1),
                tok("est", "être", PartOfSpeech::Aux, "ROOT", 1),
                tok("-ce", "ce", PartOfSpeech::Pron, "nsubj", 1),
                tok("que", "que", PartOfSpeech::Sconj, "mark", 1),
            ],
        )
    }

    #[test]
    fn test_copula_without_content_gets_wildcard_predicate() {
        let set = compile_terms(vec![etre_a()], &DetectorConfig::default());
        let variants = set.patterns().iter().map(|p| p.variant).collect_vec();
        assert_eq!(
            variants,
            vec![Variant::Plain, Variant::Negated, Variant::Inverted]
        );

        let plain = &set.patterns()[0];
        assert_eq!(plain.shape, Shape::VerbComplement);
        assert_eq!(plain.nodes.len(), 3);
        assert!(!plain.nodes[2].realized);
        assert!(plain.edges.contains(&EdgeConstraint::Child {
            head: 2,
            child: 0,
            relations: vec![DepRel::Cop],
        }));
        assert!(plain.edges.contains(&EdgeConstraint::Child {
            head: 2,
            child: 1,
            relations: vec![DepRel::Case, DepRel::Mark],
        }));
    }

    #[test]
    fn test_copula_with_predicate() {
        let set = compile_terms(
            vec![(
                "être à l'ouest",
                vec![
                    tok("être", "être", PartOfSpeech::Aux, "cop", 3),
                    tok("à", "à", PartOfSpeech::Adp, "case", 3),
                    tok("l'", "le", PartOfSpeech::Det, "det", 3),
                    tok("ouest", "ouest", PartOfSpeech::Noun, "ROOT", 3),
                ],
            )],
            &DetectorConfig::default(),
        );
        let plain = &set.patterns()[0];
        assert_eq!(plain.nodes.len(), 4);
        assert_eq!(plain.specificity(), 4);
        assert_eq!(plain.anchor(), Some(0));
        assert!(plain.edges.contains(&EdgeConstraint::Child {
            head: 3,
            child: 2,
            relations: vec![DepRel::Det],
        }));
    }

    #[test]
    fn test_light_verb_with_trailing_preposition() {
        let set = compile_terms(
            vec![(
                "avoir besoin de",
                vec![
                    tok("avoir", "avoir", PartOfSpeech::Verb, "ROOT", 0),
                    tok("besoin", "besoin", PartOfSpeech::Noun, "obj", 0),
                    tok("de", "de", PartOfSpeech::Adp, "dep", 1),
                ],
            )],
            &DetectorConfig::default(),
        );
        let plain = &set.patterns()[0];
        assert_eq!(plain.nodes.len(), 4);
        assert_eq!(
            plain.edges,
            vec![
                EdgeConstraint::Child {
                    head: 0,
                    child: 1,
                    relations: vec![],
                },
                EdgeConstraint::Descendant {
                    ancestor: 0,
                    descendant: 3,
                },
                EdgeConstraint::Child {
                    head: 3,
                    child: 2,
                    relations: vec![DepRel::Case, DepRel::Mark],
                },
            ]
        );
    }

    #[test]
    fn test_reflexive_clitic_accepts_all_persons() {
        let set = compile_terms(
            vec![(
                "se rendre compte",
                vec![
                    tok("se", "se", PartOfSpeech::Pron, "expl:comp", 1),
                    tok("rendre", "rendre", PartOfSpeech::Verb, "ROOT", 1),
                    tok("compte", "compte", PartOfSpeech::Noun, "obj", 1),
                ],
            )],
            &DetectorConfig::default(),
        );
        let plain = &set.patterns()[0];
        assert_eq!(plain.shape, Shape::VerbComplement);
        assert!(plain.nodes[0].lemmas.contains(&"vous".to_string()));
        assert_eq!(plain.anchor(), Some(1));
    }

    #[test]
    fn test_contraction_gets_contracted_variant() {
        let set = compile_terms(vec![qu_est_ce_que()], &DetectorConfig::default());
        assert_eq!(set.len(), 2);
        let [plain, contracted] = set.patterns() else {
            panic!("expected two patterns");
        };
        assert_eq!(plain.shape, Shape::Contraction);
        assert_eq!(plain.gap, Gap::Contiguous);
        assert_eq!(plain.nodes[0].forms, vec!["qu'".to_string()]);
        assert!(plain.nodes[2].attached);
        assert_eq!(plain.nodes[3].forms, vec!["que".to_string()]);
        assert_eq!(contracted.variant, Variant::Contracted);
        assert_eq!(contracted.nodes[3].forms, vec!["qu'".to_string()]);
    }

    #[test]
    fn test_config_disables_variants() {
        let config = DetectorConfig {
            contraction_variants: false,
            negation_variants: false,
            inversion_variants: false,
            ..DetectorConfig::default()
        };
        let set = compile_terms(vec![etre_a(), qu_est_ce_que()], &config);
        assert!(set.patterns().iter().all(|p| p.variant == Variant::Plain));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_fixed_phrase_uses_coarse_pos() {
        let set = compile_terms(
            vec![(
                "elles-mêmes",
                vec![
                    tok("elles", "elle", PartOfSpeech::Pron, "ROOT", 0),
                    tok("-mêmes", "même", PartOfSpeech::Adj, "amod", 0),
                ],
            )],
            &DetectorConfig::default(),
        );
        let pattern = &set.patterns()[0];
        assert_eq!(pattern.shape, Shape::Fixed);
        assert_eq!(pattern.nodes[1].pos, vec![PartOfSpeech::Adj]);
        assert!(pattern.nodes[1].attached);
        assert!(!pattern.nodes[0].attached);
    }

    #[test]
    fn test_split_negation() {
        let set = compile_terms(
            vec![
                (
                    "ne pas",
                    vec![
                        tok("ne", "ne", PartOfSpeech::Adv, "advmod", 1),
                        tok("pas", "pas", PartOfSpeech::Adv, "ROOT", 1),
                    ],
                ),
                (
                    "ne nulle part",
                    vec![
                        tok("ne", "ne", PartOfSpeech::Adv, "advmod", 2),
                        tok("nulle", "nul", PartOfSpeech::Adj, "amod", 2),
                        tok("part", "part", PartOfSpeech::Noun, "ROOT", 2),
                    ],
                ),
            ],
            &DetectorConfig::default(),
        );
        let [ne_pas, nulle_part] = set.patterns() else {
            panic!("expected two patterns");
        };
        assert_eq!(ne_pas.shape, Shape::SplitNegation);
        assert_eq!(ne_pas.gap, Gap::Any);
        assert!(ne_pas.edges.contains(&EdgeConstraint::Sibling { a: 0, b: 1 }));
        assert!(nulle_part.edges.contains(&EdgeConstraint::Adjacent { left: 1, right: 2 }));
        assert!(nulle_part.edges.contains(&EdgeConstraint::Descendant {
            ancestor: 3,
            descendant: 1,
        }));
    }

    #[test]
    fn test_terms_with_same_lemmas_are_pinned() {
        let set = compile_terms(
            vec![
                (
                    "le fait",
                    vec![
                        tok("le", "le", PartOfSpeech::Det, "det", 1),
                        tok("fait", "fait", PartOfSpeech::Noun, "ROOT", 1),
                    ],
                ),
                (
                    "la fait",
                    vec![
                        tok("la", "le", PartOfSpeech::Det, "det", 1),
                        tok("fait", "fait", PartOfSpeech::Noun, "ROOT", 1),
                    ],
                ),
            ],
            &DetectorConfig::default(),
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.patterns()[0].nodes[0].forms, vec!["le".to_string()]);
        assert_eq!(set.patterns()[1].nodes[0].forms, vec!["la".to_string()]);
    }

    #[test]
    fn test_unparseable_term_skipped() {
        let set = compile(
            &adapter(vec![etre_a()]),
            &["être à".to_string(), "jamais vu".to_string(), "  ".to_string()],
            &DetectorConfig::default(),
        );
        assert_eq!(set.terms().len(), 1);
        assert_eq!(set.len(), 3);
    }
}
