//! Query classification
//!
//! Several cues often co-occur in one question (a how-to question can also
//! contain "mean"), so cues are checked in a fixed priority order and the
//! first one that fires decides the type. More specific cues come first.

use std::sync::Arc;

use crate::emitter::TagVocabulary;
use crate::{GrammarKind, HowToKind, QueryType};

/// Lowercased question with its word tokens
struct Question {
    lower: String,
    words: Vec<String>,
    language: String,
}

impl Question {
    fn new(text: &str, language: &str) -> Self {
        let lower = text.to_lowercase();
        let words = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            lower,
            words,
            language: language.to_lowercase(),
        }
    }

    fn has(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    fn has_word(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// `first` appears as a word and `then` appears as a later word
    fn has_words_in_order(&self, first: &str, then: &str) -> bool {
        self.words
            .iter()
            .position(|w| w == first)
            .is_some_and(|i| self.words[i + 1..].iter().any(|w| w == then))
    }
}

type Cue = fn(&Question) -> Option<QueryType>;

fn context_cue(q: &Question) -> Option<QueryType> {
    q.has("in what context")
        .then_some(QueryType::HowTo(HowToKind::Context))
}

fn usage_choice_cue(q: &Question) -> Option<QueryType> {
    q.has("when should i use")
        .then_some(QueryType::HowTo(HowToKind::UsageChoice))
}

fn comparison_cue(q: &Question) -> Option<QueryType> {
    q.has("difference between").then_some(QueryType::Comparison)
}

fn say_in_cue(q: &Question) -> Option<QueryType> {
    q.has_words_in_order("say", "in")
        .then_some(QueryType::TranslateToTarget)
}

fn translate_cue(q: &Question) -> Option<QueryType> {
    if !q.has("translat") {
        return None;
    }
    let to_english = q.has("to english") || q.has("into english");
    let to_target = q.has(&format!("to {}", q.language)) || q.has(&format!("into {}", q.language));
    if to_target && !to_english {
        Some(QueryType::TranslateToTarget)
    } else {
        Some(QueryType::TranslateToEnglish)
    }
}

fn plural_cue(q: &Question) -> Option<QueryType> {
    q.has("plural").then_some(QueryType::Grammar(GrammarKind::Plural))
}

fn conjugation_cue(q: &Question) -> Option<QueryType> {
    q.has("conjugat")
        .then_some(QueryType::Grammar(GrammarKind::Conjugation))
}

fn grammar_cue(q: &Question) -> Option<QueryType> {
    q.has("grammar")
        .then_some(QueryType::Grammar(GrammarKind::General))
}

fn how_cue(q: &Question) -> Option<QueryType> {
    q.has_word("how")
        .then_some(QueryType::HowTo(HowToKind::General))
}

fn mean_cue(q: &Question) -> Option<QueryType> {
    q.has("mean").then_some(QueryType::Definition)
}

/// Cues in priority order
const CUES: &[(&str, Cue)] = &[
    ("in what context", context_cue),
    ("when should i use", usage_choice_cue),
    ("difference between", comparison_cue),
    ("say ... in", say_in_cue),
    ("translate", translate_cue),
    ("plural", plural_cue),
    ("conjugat", conjugation_cue),
    ("grammar", grammar_cue),
    ("how", how_cue),
    ("mean", mean_cue),
];

/// Assigns a query type to a user turn
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    vocabulary: Arc<TagVocabulary>,
}

impl QueryClassifier {
    pub fn new(vocabulary: Arc<TagVocabulary>) -> Self {
        Self { vocabulary }
    }

    /// Names of the cues, in the order they are checked
    pub fn cue_order() -> impl Iterator<Item = &'static str> {
        CUES.iter().map(|(name, _)| *name)
    }

    /// Classify a question. Questions that do not mention the target
    /// language, or that match no cue, yield `None`.
    pub fn classify(&self, user: &str) -> Option<QueryType> {
        let question = Question::new(user, self.vocabulary.language());
        if !question.has(&question.language) {
            return None;
        }

        let (cue, query) = CUES
            .iter()
            .find_map(|(name, cue)| cue(&question).map(|query| (*name, query)))?;
        tracing::debug!(cue, query = %query, "classified question");
        Some(query)
    }
}
