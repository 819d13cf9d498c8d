//! Tag kinds of the canonical vocabulary
//!
//! The marker text for each kind (e.g. `WORD`, `EXAMPLE_YANOMAMI`) is owned
//! by the tag vocabulary of the emitter, since two of the names depend on the
//! target language.

use serde::{Deserialize, Serialize};

/// Typed span kinds recognized in canonical documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Word,
    Pos,
    Definition,
    Examples,
    /// Example sentence in the target language
    ExampleLanguage,
    ExampleTranslation,
    Query,
    /// Free text in the target language
    LanguageText,
    Translation,
    Literal,
    RelatedForms,
    Usage,
    Grammatical,
}

impl TagKind {
    /// Every kind, in vocabulary order
    pub const ALL: [TagKind; 13] = [
        Self::Word,
        Self::Pos,
        Self::Definition,
        Self::Examples,
        Self::ExampleLanguage,
        Self::ExampleTranslation,
        Self::Query,
        Self::LanguageText,
        Self::Translation,
        Self::Literal,
        Self::RelatedForms,
        Self::Usage,
        Self::Grammatical,
    ];

    /// Short description, used when describing the vocabulary to a remote model
    pub fn description(&self) -> &'static str {
        match self {
            Self::Word => "words in the target language",
            Self::Pos => "grammatical categories (Noun, Verb, Adjective, etc.)",
            Self::Definition => "word definitions",
            Self::Examples => "the examples section",
            Self::ExampleLanguage => "examples in the target language",
            Self::ExampleTranslation => "example translations",
            Self::Query => "the question being asked",
            Self::LanguageText => "other phrases in the target language",
            Self::Translation => "translations",
            Self::Literal => "literal translations",
            Self::RelatedForms => "related forms",
            Self::Usage => "usage information",
            Self::Grammatical => "additional grammar information",
        }
    }
}

/// A typed region of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpan {
    pub kind: TagKind,
    pub text: String,
}

impl TagSpan {
    pub fn new(kind: TagKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}
