//! lexitag Extractor - Query classification and canonical tagging
//!
//! Turns loosely structured lexicon question/answer records into canonical
//! tagged text:
//! - Classifier: assigns a query type from ordered cues in the user turn
//! - Extractor: runs per-type cascades of patterns over the assistant turn
//! - Emitter: renders the extraction in a fixed tag order
//!
//! Author: hephaex@gmail.com

use serde::{Deserialize, Serialize};

pub mod cascade;
pub mod classifier;
pub mod cleanup;
pub mod emitter;
pub mod extract;
pub mod pipeline;
pub mod spans;

pub use classifier::QueryClassifier;
pub use emitter::{CanonicalEmitter, TagVocabulary};
pub use extract::Extractor;
pub use pipeline::LocalTagger;
pub use spans::validate_spans;

// ============================================================================
// Query Types
// ============================================================================

/// Kind of question a record asks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Definition,
    TranslateToEnglish,
    TranslateToTarget,
    Comparison,
    HowTo(HowToKind),
    Grammar(GrammarKind),
}

/// Flavours of how-to and usage questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HowToKind {
    /// "In what context is ... used"
    Context,
    /// "When should I use X instead of Y"
    UsageChoice,
    General,
}

/// Flavours of grammar questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarKind {
    Plural,
    Conjugation,
    General,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::TranslateToEnglish => "translate_to_english",
            Self::TranslateToTarget => "translate_to_target",
            Self::Comparison => "comparison",
            Self::HowTo(HowToKind::Context) => "how_to/context",
            Self::HowTo(HowToKind::UsageChoice) => "how_to/usage_choice",
            Self::HowTo(HowToKind::General) => "how_to",
            Self::Grammar(GrammarKind::Plural) => "grammar/plural",
            Self::Grammar(GrammarKind::Conjugation) => "grammar/conjugation",
            Self::Grammar(GrammarKind::General) => "grammar",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Extraction Result
// ============================================================================

/// The term a block of spans is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Headword {
    Term(String),
    /// Nothing matched; rendered as a bare `<RESPONSE>` marker
    Placeholder,
}

impl Headword {
    pub fn term(&self) -> Option<&str> {
        match self {
            Self::Term(word) => Some(word),
            Self::Placeholder => None,
        }
    }
}

/// One headword with the roles found for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermEntry {
    pub headword: Headword,
    pub pos: Option<String>,
    pub definition: Option<String>,
    pub usage: Option<String>,
}

impl TermEntry {
    pub fn new(headword: Headword) -> Self {
        Self {
            headword,
            pos: None,
            definition: None,
            usage: None,
        }
    }

    pub fn word(word: impl Into<String>) -> Self {
        Self::new(Headword::Term(word.into()))
    }

    fn is_bare_placeholder(&self) -> bool {
        self.headword == Headword::Placeholder
            && self.pos.is_none()
            && self.definition.is_none()
            && self.usage.is_none()
    }
}

/// An example sentence and its translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamplePair {
    pub sentence: String,
    pub translation: String,
}

impl ExamplePair {
    pub fn new(sentence: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
            translation: translation.into(),
        }
    }
}

/// "How <aux> <concept>" frame of a how-to question without a headword
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HowFrame {
    pub aux: String,
    pub concept: String,
}

/// Entities recovered from one record. Absent roles stay `None`/empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub terms: Vec<TermEntry>,
    /// Text in the target language (translation records)
    pub phrase: Option<String>,
    /// English rendering (translation records)
    pub translation: Option<String>,
    pub literal: Option<String>,
    pub examples: Vec<ExamplePair>,
    pub related_forms: Option<String>,
    pub grammatical: Option<String>,
    pub how_frame: Option<HowFrame>,
}

impl Extraction {
    /// True when nothing worth emitting was found.
    /// A lone placeholder headword does not count as an entity.
    pub fn is_empty(&self) -> bool {
        self.terms.iter().all(TermEntry::is_bare_placeholder)
            && self.phrase.is_none()
            && self.translation.is_none()
            && self.literal.is_none()
            && self.examples.is_empty()
            && self.related_forms.is_none()
            && self.grammatical.is_none()
    }
}
