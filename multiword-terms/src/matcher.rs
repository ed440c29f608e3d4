use crate::nlp::{ParsedSentence, Token};
use crate::normalize::{LanguageRules, rules};
use crate::pattern::{EdgeConstraint, Gap, MatchPattern, PatternSet, Variant};
use itertools::Itertools;
use language_utils::PartOfSpeech;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// How closely the sentence follows the term's own wording.
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
pub enum Confidence {
    /// The words of the term appear contiguously, lemma for lemma.
    High,
    /// The term was recovered through the dependency structure.
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub term: String,
    /// First token of the span.
    pub start: usize,
    /// One past the last token of the span.
    pub end: usize,
    pub variant: Variant,
    pub specificity: usize,
    pub confidence: Confidence,
}

impl Match {
    fn overlaps(&self, other: &Match) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A full node assignment for one pattern.
struct Binding {
    tokens: Vec<usize>,
    start: usize,
    end: usize,
}

/// Find every term of `patterns` realized in `sentence`.
///
/// Matches come back ordered by start, then most specific first, then longest first.
pub fn find(patterns: &PatternSet, sentence: &ParsedSentence) -> Vec<Match> {
    let rules = rules(patterns.language());

    // (term, start, end) -> best match for that span
    let mut found: FxHashMap<(usize, usize, usize), Match> = FxHashMap::default();

    for (anchor_token, token) in sentence.tokens.iter().enumerate() {
        for &pattern_index in patterns.anchored_at(&token.lemma) {
            let pattern = &patterns.patterns()[pattern_index];
            let Some(binding) = tightest_binding(rules, pattern, sentence, anchor_token) else {
                continue;
            };

            let term = patterns.term(pattern);
            let candidate = Match {
                term: term.text.clone(),
                start: binding.start,
                end: binding.end,
                variant: pattern.variant,
                specificity: pattern.specificity(),
                confidence: confidence(pattern, sentence, &binding, &term.lemmas),
            };

            log::trace!(
                "'{}' matched tokens {}..{} as {}",
                candidate.term,
                candidate.start,
                candidate.end,
                candidate.variant
            );

            found
                .entry((pattern.term, binding.start, binding.end))
                .and_modify(|existing| {
                    if (candidate.variant, candidate.confidence)
                        < (existing.variant, existing.confidence)
                    {
                        *existing = candidate.clone();
                    }
                })
                .or_insert(candidate);
        }
    }

    // a match only loses to a more specific match that is itself kept
    let mut kept: Vec<Match> = Vec::new();
    for candidate in found
        .into_values()
        .sorted_by_key(|m| (Reverse(m.specificity), m.start, Reverse(m.end)))
    {
        if !kept
            .iter()
            .any(|other| other.specificity > candidate.specificity && other.overlaps(&candidate))
        {
            kept.push(candidate);
        }
    }

    kept.into_iter()
        .sorted_by(|a, b| {
            (a.start, Reverse(a.specificity), Reverse(a.end), &a.term).cmp(&(
                b.start,
                Reverse(b.specificity),
                Reverse(b.end),
                &b.term,
            ))
        })
        .collect()
}

fn confidence(
    pattern: &MatchPattern,
    sentence: &ParsedSentence,
    binding: &Binding,
    term_lemmas: &[String],
) -> Confidence {
    let realized = pattern
        .nodes
        .iter()
        .zip(&binding.tokens)
        .filter(|(node, _)| node.realized)
        .map(|(_, &token)| token)
        .collect_vec();

    let contiguous = realized.len() == binding.end - binding.start;
    let same_words = realized
        .iter()
        .map(|&token| &sentence.tokens[token].lemma)
        .eq(term_lemmas.iter());

    if contiguous && same_words {
        Confidence::High
    } else {
        Confidence::Low
    }
}

/// The shortest (then leftmost) complete binding of `pattern` with its anchor on `anchor_token`.
fn tightest_binding(
    rules: &LanguageRules,
    pattern: &MatchPattern,
    sentence: &ParsedSentence,
    anchor_token: usize,
) -> Option<Binding> {
    let anchor = pattern.anchor()?;
    if !pattern.nodes[anchor].accepts(&sentence.tokens[anchor_token]) {
        return None;
    }

    // lemma nodes first so wildcards are mostly pinned down by edges when we reach them
    let order = std::iter::once(anchor)
        .chain(
            (0..pattern.nodes.len())
                .filter(|&node| node != anchor)
                .sorted_by_key(|&node| pattern.nodes[node].is_wildcard()),
        )
        .collect_vec();

    let mut search = Search {
        rules,
        pattern,
        sentence,
        order: &order,
        assignment: vec![None; pattern.nodes.len()],
        best: None,
    };
    search.assignment[anchor] = Some(anchor_token);
    if search.consistent(anchor) {
        search.extend(1);
    }
    search.best
}

struct Search<'a> {
    rules: &'a LanguageRules,
    pattern: &'a MatchPattern,
    sentence: &'a ParsedSentence,
    order: &'a [usize],
    assignment: Vec<Option<usize>>,
    best: Option<Binding>,
}

impl Search<'_> {
    fn extend(&mut self, depth: usize) {
        let Some(&node) = self.order.get(depth) else {
            self.complete();
            return;
        };

        for token in self.candidates(node) {
            if self.assignment.contains(&Some(token))
                || !self.pattern.nodes[node].accepts(&self.sentence.tokens[token])
            {
                continue;
            }
            self.assignment[node] = Some(token);
            if self.consistent(node) {
                self.extend(depth + 1);
            }
            self.assignment[node] = None;
        }
    }

    /// Tokens worth trying for `node`: the head of an already bound child if there is one.
    fn candidates(&self, node: usize) -> Vec<usize> {
        for edge in &self.pattern.edges {
            if let EdgeConstraint::Child { head, child, .. } = *edge {
                if head == node {
                    if let Some(child_token) = self.assignment[child] {
                        return self.sentence.head_of(child_token).into_iter().collect();
                    }
                }
            }
        }
        (0..self.sentence.len()).collect()
    }

    /// Check the constraints that became decidable once `node` was bound.
    fn consistent(&self, node: usize) -> bool {
        let Some(token) = self.assignment[node] else {
            return false;
        };

        // realized nodes keep the term's word order
        if self.pattern.nodes[node].realized {
            for (other, other_node) in self.pattern.nodes.iter().enumerate() {
                let Some(other_token) = self.assignment[other] else {
                    continue;
                };
                if other == node || !other_node.realized {
                    continue;
                }
                if (other < node) != (other_token < token) {
                    return false;
                }
            }
        }

        self.pattern.edges.iter().all(|edge| {
            let (a, b) = edge.endpoints();
            if a != node && b != node {
                return true;
            }
            match (self.assignment[a], self.assignment[b]) {
                (Some(a), Some(b)) => self.edge_holds(edge, a, b),
                _ => true,
            }
        })
    }

    fn edge_holds(&self, edge: &EdgeConstraint, a: usize, b: usize) -> bool {
        let sentence = self.sentence;
        match edge {
            EdgeConstraint::Child { relations, .. } => {
                sentence.head_of(b) == Some(a)
                    && (relations.is_empty() || relations.contains(&sentence.tokens[b].dep))
            }
            EdgeConstraint::Sibling { .. } => {
                sentence.head_of(a).is_some() && sentence.head_of(a) == sentence.head_of(b)
            }
            EdgeConstraint::Descendant { .. } => sentence.is_descendant(a, b),
            EdgeConstraint::Adjacent { .. } => a + 1 == b,
        }
    }

    fn complete(&mut self) {
        let tokens = self.assignment.iter().flatten().copied().collect_vec();
        if tokens.len() != self.pattern.nodes.len() {
            return;
        }

        let realized = self
            .pattern
            .nodes
            .iter()
            .zip(&tokens)
            .filter(|(node, _)| node.realized)
            .map(|(_, &token)| token);
        let Some((start, last)) = realized.minmax().into_option() else {
            return;
        };
        let end = last + 1;

        if let Some(best) = &self.best {
            if (end - start, start) >= (best.end - best.start, best.start) {
                return;
            }
        }
        if !self.gap_allowed(&tokens, start, end) {
            return;
        }

        self.best = Some(Binding { tokens, start, end });
    }

    fn gap_allowed(&self, bound: &[usize], start: usize, end: usize) -> bool {
        let unbound = (start..end).filter(|token| !bound.contains(token));
        match self.pattern.gap {
            Gap::Any => true,
            Gap::Contiguous => unbound.count() == 0,
            Gap::Dependents {
                negation,
                inverted_subject,
            } => unbound.into_iter().all(|index| {
                let token = &self.sentence.tokens[index];
                if token.pos == PartOfSpeech::Punct {
                    false
                } else if self.rules.is_negation_particle(&token.lemma) {
                    negation
                } else if is_inverted_subject(token) {
                    inverted_subject
                } else {
                    bound
                        .iter()
                        .any(|&ancestor| self.sentence.is_descendant(ancestor, index))
                }
            }),
        }
    }
}

/// "-ce", "-il", "-t": a subject clitic hyphen-bound after its verb.
fn is_inverted_subject(token: &Token) -> bool {
    token.is_attached()
        && (token.pos == PartOfSpeech::Pron || token.dep.is_subject() || token.lemma == "t")
}
