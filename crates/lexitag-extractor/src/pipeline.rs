//! Regex-only record tagging
//!
//! Wires classifier, extractor and emitter into a pure `Record -> Record`
//! transformation. The input record is never modified.

use std::sync::Arc;

use lexitag_core::{Record, Result, TagKind};

use crate::{validate_spans, CanonicalEmitter, Extractor, QueryClassifier, TagVocabulary};

/// Local (regex-only) tagger for dataset records
pub struct LocalTagger {
    vocabulary: Arc<TagVocabulary>,
    classifier: QueryClassifier,
    extractor: Extractor,
    emitter: CanonicalEmitter,
}

impl LocalTagger {
    /// Create a tagger for the given target language
    pub fn new(language: &str) -> Result<Self> {
        Self::with_vocabulary(Arc::new(TagVocabulary::new(language)))
    }

    pub fn with_vocabulary(vocabulary: Arc<TagVocabulary>) -> Result<Self> {
        Ok(Self {
            classifier: QueryClassifier::new(Arc::clone(&vocabulary)),
            extractor: Extractor::new(Arc::clone(&vocabulary))?,
            emitter: CanonicalEmitter::new(Arc::clone(&vocabulary)),
            vocabulary,
        })
    }

    pub fn vocabulary(&self) -> &TagVocabulary {
        &self.vocabulary
    }

    /// Tag one record.
    ///
    /// Returns `Ok(None)` when the record passes through unchanged: its
    /// question is already tagged, matches no query type, or the rewrite
    /// would not have well-formed spans. Records without a user/assistant
    /// pair are an error.
    pub fn tag(&self, record: &Record) -> Result<Option<Record>> {
        let (user, assistant) = record.turns()?;

        if user.trim_start().starts_with(&self.vocabulary.open(TagKind::Query)) {
            tracing::debug!("question already tagged");
            return Ok(None);
        }

        let Some(query) = self.classifier.classify(user) else {
            tracing::debug!("no query type");
            return Ok(None);
        };

        let extraction = self.extractor.extract(query, user, assistant)?;
        let new_user = self.emitter.user_turn(query, &extraction, user);
        let new_assistant = self.emitter.assistant_turn(query, &extraction, assistant);

        for (role, text) in [("user", &new_user), ("assistant", &new_assistant)] {
            if let Err(err) = validate_spans(text, &self.vocabulary) {
                tracing::warn!(role, error = %err, "rewrite has malformed spans, keeping record");
                return Ok(None);
            }
        }

        Ok(Some(record.with_turns(new_user, new_assistant)))
    }
}
