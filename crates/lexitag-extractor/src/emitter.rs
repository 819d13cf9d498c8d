//! Canonical tag emission
//!
//! [`TagVocabulary`] is the single owner of the marker names. The classifier,
//! extractor and remote tagger all receive it from here instead of keeping
//! their own lists.

use std::collections::HashMap;
use std::sync::Arc;

use lexitag_core::TagKind;

use crate::cascade::first_quoted;
use crate::{Extraction, Headword, HowToKind, QueryType, TermEntry};

/// Literal marker emitted when no headword could be found
pub const PLACEHOLDER: &str = "<RESPONSE>";

// ============================================================================
// Tag Vocabulary
// ============================================================================

/// Marker names for every tag kind, for one target language
#[derive(Debug, Clone)]
pub struct TagVocabulary {
    language: String,
    names: HashMap<TagKind, String>,
}

impl TagVocabulary {
    /// Build the vocabulary for a language. The language-text tags are
    /// named after it (`Yanomami` gives `YANOMAMI` and `EXAMPLE_YANOMAMI`).
    pub fn new(language: impl Into<String>) -> Self {
        let language = language.into();
        let language_tag: String = language
            .trim()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();

        let names = TagKind::ALL
            .iter()
            .map(|&kind| {
                let name = match kind {
                    TagKind::Word => "WORD".to_string(),
                    TagKind::Pos => "POS".to_string(),
                    TagKind::Definition => "DEFINITION".to_string(),
                    TagKind::Examples => "EXAMPLES".to_string(),
                    TagKind::ExampleLanguage => format!("EXAMPLE_{language_tag}"),
                    TagKind::ExampleTranslation => "EXAMPLE_TRANSLATION".to_string(),
                    TagKind::Query => "QUERY".to_string(),
                    TagKind::LanguageText => language_tag.clone(),
                    TagKind::Translation => "TRANSLATION".to_string(),
                    TagKind::Literal => "LITERAL".to_string(),
                    TagKind::RelatedForms => "RELATED_FORMS".to_string(),
                    TagKind::Usage => "USAGE".to_string(),
                    TagKind::Grammatical => "GRAMMATICAL".to_string(),
                };
                (kind, name)
            })
            .collect();

        Self { language, names }
    }

    /// Target language name, as configured
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn name(&self, kind: TagKind) -> &str {
        self.names.get(&kind).map(String::as_str).unwrap_or_default()
    }

    /// Reverse lookup of a marker name
    pub fn kind_of(&self, name: &str) -> Option<TagKind> {
        self.names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(kind, _)| *kind)
    }

    pub fn open(&self, kind: TagKind) -> String {
        format!("<{}>", self.name(kind))
    }

    pub fn close(&self, kind: TagKind) -> String {
        format!("</{}>", self.name(kind))
    }

    pub fn wrap(&self, kind: TagKind, text: &str) -> String {
        format!("{}{}{}", self.open(kind), text, self.close(kind))
    }

    /// Whether the text already holds an opening marker of this kind
    pub fn contains(&self, text: &str, kind: TagKind) -> bool {
        text.contains(&self.open(kind))
    }

    /// Replace every single-quoted token with a WORD span
    pub fn wrap_quoted_words(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find('\'') {
            let after = &rest[start + 1..];
            match after.find('\'') {
                // '' never matches; resume at the second quote
                Some(0) => {
                    out.push_str(&rest[..=start]);
                    rest = after;
                }
                Some(end) => {
                    out.push_str(&rest[..start]);
                    out.push_str(&self.wrap(TagKind::Word, &after[..end]));
                    rest = &after[end + 1..];
                }
                None => break,
            }
        }

        out.push_str(rest);
        out
    }

    /// One line per tag pair, with a short description of each
    pub fn describe(&self) -> String {
        TagKind::ALL
            .iter()
            .map(|&kind| {
                format!(
                    "- {}{} for {}",
                    self.open(kind),
                    self.close(kind),
                    kind.description()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self::new("Yanomami")
    }
}

// ============================================================================
// Canonical Emitter
// ============================================================================

/// Renders extractions as canonical tagged text
#[derive(Debug, Clone)]
pub struct CanonicalEmitter {
    vocabulary: Arc<TagVocabulary>,
}

impl CanonicalEmitter {
    pub fn new(vocabulary: Arc<TagVocabulary>) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &TagVocabulary {
        &self.vocabulary
    }

    /// Render the assistant turn.
    ///
    /// Text already holding a WORD span is returned unchanged, as is text for
    /// which nothing was extracted. Otherwise spans follow the fixed order
    /// WORD, POS, DEFINITION, USAGE, EXAMPLES, RELATED_FORMS, GRAMMATICAL,
    /// LITERAL, after the phrase pair of translation records.
    pub fn assistant_turn(&self, query: QueryType, extraction: &Extraction, original: &str) -> String {
        if self.vocabulary.contains(original, TagKind::Word) || extraction.is_empty() {
            return original.to_string();
        }

        let v = &self.vocabulary;
        let mut sections = Vec::new();

        let phrase = extraction.phrase.as_deref().map(|p| v.wrap(TagKind::LanguageText, p));
        let translation = extraction.translation.as_deref().map(|t| v.wrap(TagKind::Translation, t));
        match query {
            QueryType::TranslateToTarget => sections.extend(translation.into_iter().chain(phrase)),
            _ => sections.extend(phrase.into_iter().chain(translation)),
        }

        let blocks: Vec<String> = extraction.terms.iter().map(|t| self.term_block(t)).collect();
        if !blocks.is_empty() {
            sections.push(blocks.join("\n"));
        }

        if !extraction.examples.is_empty() {
            sections.push(self.examples_block(extraction));
        }

        let trailing = [
            (TagKind::RelatedForms, &extraction.related_forms),
            (TagKind::Grammatical, &extraction.grammatical),
            (TagKind::Literal, &extraction.literal),
        ];
        for (kind, value) in trailing {
            if let Some(text) = value {
                sections.push(v.wrap(kind, text));
            }
        }

        let separator = if extraction.terms.len() > 1 { "\n" } else { " " };
        sections.join(separator)
    }

    /// Render the user turn: the question wrapped in a QUERY span with its
    /// recognized words wrapped in WORD spans. Questions that do not fit
    /// their template are wrapped as they are.
    pub fn user_turn(&self, query: QueryType, extraction: &Extraction, original: &str) -> String {
        let v = &self.vocabulary;
        let language = v.language();
        let words: Vec<String> = extraction
            .terms
            .iter()
            .filter_map(|t| t.headword.term())
            .map(|w| v.wrap(TagKind::Word, w))
            .collect();

        let question = match (query, words.as_slice()) {
            (QueryType::Definition, [word, ..]) => {
                Some(format!("What does {word} mean in {language}?"))
            }
            (QueryType::TranslateToEnglish, _) => extraction.phrase.as_deref().map(|p| {
                format!(
                    "Translate this {language} phrase to English: {}",
                    v.wrap(TagKind::LanguageText, p)
                )
            }),
            (QueryType::TranslateToTarget, _) => extraction.translation.as_deref().map(|t| {
                format!(
                    "How do you say {} in {language}?",
                    v.wrap(TagKind::Translation, t)
                )
            }),
            (QueryType::Comparison, [first, second, ..]) => Some(format!(
                "What is the difference between {first} and {second} in {language}?"
            )),
            (QueryType::HowTo(HowToKind::Context), [word, ..]) => {
                Some(format!("In what context is the word {word} used in {language}?"))
            }
            (QueryType::HowTo(HowToKind::UsageChoice), [first, second, ..]) => Some(format!(
                "When should I use {first} instead of {second} in {language}?"
            )),
            (QueryType::HowTo(HowToKind::UsageChoice), [word]) => {
                Some(format!("When should I use {word} in {language}?"))
            }
            (QueryType::HowTo(HowToKind::General), [word, ..]) => Some(format!(
                "How do I use the word {word} in a {language} sentence?"
            )),
            (QueryType::HowTo(HowToKind::General), []) => extraction
                .how_frame
                .as_ref()
                .map(|f| format!("How {} {}?", f.aux, f.concept)),
            (QueryType::Grammar(_), _) => first_quoted(original)
                .filter(|(_, inner)| !inner.is_empty())
                .map(|(range, inner)| {
                    format!(
                        "{}{}{}",
                        &original[..range.start],
                        v.wrap(TagKind::Word, inner),
                        &original[range.end..]
                    )
                }),
            _ => None,
        };

        v.wrap(TagKind::Query, question.as_deref().unwrap_or(original))
    }

    fn term_block(&self, term: &TermEntry) -> String {
        let v = &self.vocabulary;
        let head = match &term.headword {
            Headword::Term(word) => v.wrap(TagKind::Word, word),
            Headword::Placeholder => PLACEHOLDER.to_string(),
        };

        let roles = [
            (TagKind::Pos, &term.pos),
            (TagKind::Definition, &term.definition),
            (TagKind::Usage, &term.usage),
        ];

        std::iter::once(head)
            .chain(
                roles
                    .into_iter()
                    .filter_map(|(kind, value)| value.as_deref().map(|text| v.wrap(kind, text))),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn examples_block(&self, extraction: &Extraction) -> String {
        let v = &self.vocabulary;
        let pairs = extraction
            .examples
            .iter()
            .map(|pair| {
                format!(
                    "{} {}",
                    v.wrap(TagKind::ExampleLanguage, &pair.sentence),
                    v.wrap(TagKind::ExampleTranslation, &pair.translation)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        v.wrap(TagKind::Examples, &pairs)
    }
}

// ============================================================================
// Tests
// ============================================================================
