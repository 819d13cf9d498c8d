//! Entity extraction
//!
//! Each query type has its own set of cascades. A role whose cascade misses
//! is simply left out of the [`Extraction`]; extraction never fails because
//! something was not found.
//!
//! Cascades that do not depend on a headword are compiled once in
//! [`Extractor::new`]. Headword-anchored cascades (comparison and usage
//! records) are built per record with the word escaped into the pattern.

use std::sync::Arc;

use regex::Regex;

use lexitag_core::Result;

use crate::cascade::{clip, compile, first_capture, first_quoted, last_quoted, Cascade};
use crate::emitter::TagVocabulary;
use crate::{
    ExamplePair, Extraction, GrammarKind, Headword, HowFrame, HowToKind, QueryType, TermEntry,
};

const EXAMPLES_TRIGGER: &str = "Here are some examples:";

/// Cascade-driven extractor for all query types
pub struct Extractor {
    vocabulary: Arc<TagVocabulary>,

    // Headwords
    question_word: Cascade,
    answer_word: Cascade,
    context_word: Cascade,
    conjugated_verb: Cascade,

    // Definition records
    meaning: Cascade,
    sentence_pos: Cascade,
    examples_until_related: Cascade,
    related_forms: Cascade,

    // Translation records
    quoted_phrase: Cascade,
    rendered_as: Cascade,
    literal: Cascade,
    english_phrase: Cascade,
    target_phrase: Cascade,
    loose_examples: Cascade,

    // Comparison records
    meaning_section: Cascade,
    category_section: Cascade,
    usage_section: Cascade,
    numbered_examples: Cascade,
    compared_pair: Regex,

    // How-to records
    usage_frame: Regex,
    how_frame: Regex,
    general_pos: Cascade,
    general_definition: Cascade,
    grammar_note: Cascade,
    usage_note: Cascade,
    trailing_examples: Cascade,
    labelled_pair: Regex,
    should_use: Regex,

    // Grammar records
    singular: Cascade,
    plural: Cascade,
    explanation: Cascade,
    stated_pos: Cascade,

    quoted_any: Regex,
}

impl Extractor {
    pub fn new(vocabulary: Arc<TagVocabulary>) -> Result<Self> {
        let lang = regex::escape(vocabulary.language());

        let usage_frame = compile(
            r#"(?i)when should i use ['"]*([^'"]+)['"]*\s+instead of\s+['"]*([^'"]+)['"]*"#,
        )?;
        let frame_for_words = usage_frame.clone();

        Ok(Self {
            question_word: Cascade::new("word")
                .rule("quoted", |text| quoted_inner(text))
                .pattern("the-word", r#"(?i)the word ([^\s'"]+)"#)?
                .rule("usage-frame", move |text| first_capture(&frame_for_words, text)),
            answer_word: Cascade::new("word")
                .rule("quoted-first-line", |text| {
                    text.lines().next().and_then(quoted_inner)
                })
                .pattern("the-word", r#"the word '([^']*)'|the word "([^"]*)""#)?,
            context_word: Cascade::new("word")
                .pattern(
                    "context-quoted",
                    r#"(?i)in what contexts? (?:is|are) (?:the )?(?:word |phrase |expression |term |concept )?['"]+([^'"]+)['"]+"#,
                )?
                .pattern(
                    "context-bare",
                    r"(?i)in what contexts? (?:is|are) (?:the )?(?:word |phrase |expression |term |concept )?([^?]+)",
                )?,
            conjugated_verb: Cascade::new("word")
                .pattern("verb", r#"verb '([^']*)'|verb "([^"]*)""#)?
                .rule("quoted", |text| quoted_inner(text)),

            meaning: Cascade::new("definition")
                .pattern(
                    "means-quoted",
                    &format!(r#"means '([^']*)'|in {lang} means '([^']*)'|means "([^"]*)""#),
                )?
                .rule("first-sentence", |text| {
                    let sentence = text.split('.').next()?;
                    let (_, rest) = sentence.rsplit_once("means")?;
                    Some(rest.trim_matches([' ', '\'', '"', '.']).to_string())
                }),
            sentence_pos: Cascade::new("pos")
                .pattern("it-is-a", r"It is an? ([A-Za-z]+(?: [A-Za-z]+)?)\.")?,
            examples_until_related: Cascade::new("examples")
                .pattern("here-are", r"(?s)Here are some examples:(.*?)(?:Related forms:|$)")?,
            related_forms: Cascade::new("related_forms")
                .pattern("related", r"Related forms: (.*?)$")?,

            quoted_phrase: Cascade::new("phrase")
                .pattern("double", r#""([^"]*)""#)?
                .pattern("single", r"'([^']*)'")?,
            rendered_as: Cascade::new("translation")
                .pattern("is-quoted", r#"is '([^']*)'|is "([^"]*)""#)?,
            literal: Cascade::new("literal")
                .pattern("literal", r#"Literal: '([^']*)'|Literal: "([^"]*)""#)?,
            english_phrase: Cascade::new("translation")
                .pattern("quoted-or-say", r#""([^"]*)"|'([^']*)'|(?i:how do you say) ([^\s'"]+) in"#)?,
            target_phrase: {
                let last = compile(r#"'([^']*)'|"([^"]*)""#)?;
                Cascade::new("phrase")
                    .pattern("in-lang-double", &format!(r#"In {lang}, "([^"]*)""#))?
                    .pattern("in-lang-single", &format!(r"In {lang}, '([^']*)'"))?
                    .pattern("is-single", &format!(r"in {lang} is '([^']*)'"))?
                    .pattern("is-double", &format!(r#"in {lang} is "([^"]*)""#))?
                    .pattern("the-x-is", &format!(r"The .* in {lang} is '([^']*)'"))?
                    .rule("last-quoted", move |text| last_quoted(&last, text))
            },
            loose_examples: Cascade::new("examples")
                .pattern("examples", r"(?si)Examples?:(.*?)(?:$|\n\n)")?,

            meaning_section: Cascade::new("section")
                .pattern("meaning", r"(?s)1\.\s*Meaning:(.*?)(?:2\.|$)")?,
            category_section: Cascade::new("section")
                .pattern("category", r"(?s)2\.\s*Grammatical category:(.*?)(?:3\.|$)")?,
            usage_section: Cascade::new("section")
                .pattern("usage", r"(?s)3\.\s*Usage:(.*?)(?:4\.|$)")?,
            numbered_examples: Cascade::new("section")
                .pattern("examples", r"(?s)4\.\s*Examples:(.*?)$")?,
            compared_pair: compile(
                r#"(?i)difference between\s+['"]*([^'"]+)['"]*\s+and\s+['"]*([^'"]+)['"]*"#,
            )?,

            usage_frame,
            how_frame: compile(r"(?i)how (do|does|to|can|would) ([^?]*)")?,
            general_pos: Cascade::new("pos")
                .pattern("is-a", r"is an? ([A-Za-z]+(?: \([A-Za-z]+\))?)")?,
            general_definition: Cascade::new("definition").pattern(
                "means-or-and-is",
                r#"means '([^']*)'|means "([^"]*)"|'([^']*)'\s+and is an?|"([^"]*)"\s+and is an?"#,
            )?,
            grammar_note: Cascade::new("grammatical").pattern(
                "in-lang-grammar",
                &format!(r"(?s)In {lang} grammar,(.*?)(?:Here are some examples:|$)"),
            )?,
            usage_note: Cascade::new("usage").pattern(
                "remember-that",
                r"When using this (?:verb|word), remember that ([^.]*)\.",
            )?,
            trailing_examples: Cascade::new("examples")
                .pattern("here-are", r"(?s)Here are some examples:(.*?)$")?,
            labelled_pair: compile(&format!(
                r"(?m)^-?\s*{lang}:\s*([^\n]+)\n-?\s*Translation:\s*([^\n]+)"
            ))?,
            should_use: compile(r#"(?i)You should use ['"]*([^'"]+)['"]*\s+when\s+([^\n.]*)"#)?,

            singular: Cascade::new("singular").pattern("singular", r"Singular:\s*([^\n]+)")?,
            plural: Cascade::new("plural").pattern("plural", r"Plural:\s*([^\n]+)")?,
            explanation: Cascade::new("grammatical")
                .pattern("before-singular", r"(?s)^(.*?)(?:Singular:|$)")?,
            stated_pos: Cascade::new("pos").pattern("it-is-a", r"it is an? ([^,.]+)")?,

            quoted_any: compile(r#"'([^']*)'|"([^"]*)""#)?,
            vocabulary,
        })
    }

    /// Recover the entities of one record
    pub fn extract(&self, query: QueryType, user: &str, assistant: &str) -> Result<Extraction> {
        let extraction = match query {
            QueryType::Definition => self.definition(user, assistant),
            QueryType::TranslateToEnglish => self.to_english(user, assistant),
            QueryType::TranslateToTarget => self.to_target(user, assistant),
            QueryType::Comparison => self.comparison(user, assistant)?,
            QueryType::HowTo(HowToKind::Context) => self.context(user, assistant)?,
            QueryType::HowTo(HowToKind::UsageChoice) => self.usage_choice(user, assistant)?,
            QueryType::HowTo(HowToKind::General) => self.how_to(user, assistant),
            QueryType::Grammar(kind) => self.grammar(kind, user, assistant),
        };

        tracing::debug!(
            query = %query,
            terms = extraction.terms.len(),
            examples = extraction.examples.len(),
            "extracted entities"
        );
        Ok(extraction)
    }

    /// Headword cascade: question first, then the answer, then a placeholder
    pub fn headword(&self, user: &str, assistant: &str) -> Headword {
        self.question_word
            .first(user)
            .or_else(|| self.answer_word.first(assistant))
            .map(Headword::Term)
            .unwrap_or(Headword::Placeholder)
    }

    // ------------------------------------------------------------------------
    // Definitions and translations
    // ------------------------------------------------------------------------

    fn definition(&self, user: &str, assistant: &str) -> Extraction {
        let term = TermEntry {
            pos: self.sentence_pos.first(assistant),
            definition: self.meaning.first(assistant),
            ..TermEntry::new(self.headword(user, assistant))
        };

        Extraction {
            terms: vec![term],
            examples: self.pairs_from(&self.examples_until_related, assistant),
            related_forms: self.related_forms.first(assistant),
            ..Default::default()
        }
    }

    fn to_english(&self, user: &str, assistant: &str) -> Extraction {
        Extraction {
            phrase: self.quoted_phrase.first(user),
            translation: self.rendered_as.first(assistant),
            literal: self.literal.first(assistant),
            ..Default::default()
        }
    }

    fn to_target(&self, user: &str, assistant: &str) -> Extraction {
        Extraction {
            translation: self.english_phrase.first(user),
            phrase: self.target_phrase.first(assistant),
            examples: self.pairs_from(&self.loose_examples, assistant),
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------------
    // Comparisons
    // ------------------------------------------------------------------------

    fn compared_words(&self, user: &str) -> Option<(String, String)> {
        let quoted: Vec<String> = self
            .quoted_any
            .captures_iter(user)
            .filter_map(|caps| {
                caps.iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str().trim())
                    .find(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .collect();

        if let [first, second, ..] = quoted.as_slice() {
            return Some((first.clone(), second.clone()));
        }

        let caps = self.compared_pair.captures(user)?;
        let stops = self.language_stops();
        let first = clip(caps.get(1)?.as_str(), &stops);
        let second = clip(caps.get(2)?.as_str(), &stops);
        (!first.is_empty() && !second.is_empty()).then_some((first, second))
    }

    fn comparison(&self, user: &str, assistant: &str) -> Result<Extraction> {
        let Some((first, second)) = self.compared_words(user) else {
            return Ok(Extraction::default());
        };

        let meaning_section = self.meaning_section.first(assistant);
        let category_section = self.category_section.first(assistant);
        let usage_section = self.usage_section.first(assistant);

        let mut terms = Vec::with_capacity(2);
        for (word, other) in [(&first, &second), (&second, &first)] {
            let cascades = ComparisonCascades::build(word, other)?;

            let definition = cascades.definition.first(assistant).or_else(|| {
                meaning_section.as_deref().and_then(|section| {
                    cascades
                        .section_definition
                        .first(section)
                })
            });
            let pos = category_section
                .as_deref()
                .and_then(|section| cascades.pos.first(section))
                .or_else(|| cascades.pos.first(assistant));
            let usage = usage_section
                .as_deref()
                .and_then(|section| cascades.usage.first(section));

            terms.push(TermEntry {
                pos,
                definition,
                usage,
                ..TermEntry::word(word.as_str())
            });
        }

        let examples = match self.numbered_examples.first(assistant) {
            Some(section) => self.comparison_examples(&section, &first, &second)?,
            None => Vec::new(),
        };

        Ok(Extraction {
            terms,
            examples,
            ..Default::default()
        })
    }

    /// Examples grouped under "With 'w':" headings, else the whole section
    fn comparison_examples(&self, section: &str, first: &str, second: &str) -> Result<Vec<ExamplePair>> {
        let (a, b) = (regex::escape(first), regex::escape(second));
        let groups = [
            compile(&format!(r"(?s)With '{a}':(.*?)(?:With '{b}':|$)"))?,
            compile(&format!(r"(?s)With '{b}':(.*?)$"))?,
        ];

        let mut pairs: Vec<ExamplePair> = groups
            .iter()
            .filter_map(|re| first_capture(re, section))
            .flat_map(|group| self.example_pairs(&group))
            .collect();

        if pairs.is_empty() {
            pairs = self.example_pairs(section);
        }
        Ok(pairs)
    }

    // ------------------------------------------------------------------------
    // How-to records
    // ------------------------------------------------------------------------

    fn context(&self, user: &str, assistant: &str) -> Result<Extraction> {
        let stops = vec![" used".to_string(), format!(" in {}", self.vocabulary.language())];
        let word = self
            .context_word
            .first(user)
            .map(|w| clip(&w, &stops))
            .filter(|w| !w.is_empty())
            .or_else(|| self.question_word.first(user));

        let Some(word) = word else {
            return Ok(Extraction::default());
        };

        let w = regex::escape(&word);
        let pos = Cascade::new("pos").pattern("quoted-is-a", &format!(r"(?i)'{w}'\s+is\s+an?\s+([A-Za-z]+)"))?;
        let definition = Cascade::new("definition")
            .pattern("quoted-means", &format!(r#"(?i)'{w}'\s+means\s+['"]*([^'"]+)['"]*"#))?;

        let mut examples: Vec<ExamplePair> = self
            .labelled_pair
            .captures_iter(assistant)
            .map(|caps| ExamplePair::new(caps[1].trim(), caps[2].trim()))
            .collect();
        if examples.is_empty() {
            examples = self.pairs_from(&self.trailing_examples, assistant);
        }

        Ok(Extraction {
            terms: vec![TermEntry {
                pos: pos.first(assistant),
                definition: definition.first(assistant),
                ..TermEntry::word(word)
            }],
            examples,
            ..Default::default()
        })
    }

    fn usage_choice(&self, user: &str, assistant: &str) -> Result<Extraction> {
        let stops = self.language_stops();
        let frame = self.usage_frame.captures(user).and_then(|caps| {
            let first = clip(caps.get(1)?.as_str(), &stops);
            let second = clip(caps.get(2)?.as_str(), &stops);
            (!first.is_empty() && !second.is_empty()).then_some((first, second))
        });

        let Some((first, second)) = frame else {
            return self.single_usage_choice(user, assistant);
        };

        let mut terms = Vec::with_capacity(2);
        for word in [&first, &second] {
            let definition = usage_meaning(word)?
                .rule("line-scan", {
                    let word = word.to_lowercase();
                    move |text: &str| {
                        text.lines()
                            .map(str::trim)
                            .find(|line| {
                                let lower = line.to_lowercase();
                                lower.contains(&word) && lower.contains("means")
                            })
                            .and_then(|line| line.split_once("means"))
                            .map(|(_, rest)| rest.trim().trim_matches(['\'', '"', ',', '.']).trim().to_string())
                    }
                });
            terms.push(TermEntry {
                definition: definition.first(assistant),
                ..TermEntry::word(word.as_str())
            });
        }

        // "Use 'A' when X. Use 'B' when Y." sets both usages
        let (a, b) = (regex::escape(&first), regex::escape(&second));
        let two_clause = compile(&format!(r"(?i)Use '{a}' when ([^.]+)\. Use '{b}' when ([^.]+)"))?;
        if let Some(caps) = two_clause.captures(assistant) {
            terms[0].usage = caps.get(1).map(|m| m.as_str().trim().to_string());
            terms[1].usage = caps.get(2).map(|m| m.as_str().trim().to_string());
        } else if let Some(caps) = self.should_use.captures(assistant) {
            let named = caps.get(1).map(|m| m.as_str().trim().to_lowercase());
            let clause = caps.get(2).map(|m| m.as_str().trim().to_string());
            let index = terms
                .iter()
                .position(|t| t.headword.term().map(str::to_lowercase) == named)
                .unwrap_or(0);
            terms[index].usage = clause.filter(|c| !c.is_empty());
        }

        Ok(Extraction {
            terms,
            ..Default::default()
        })
    }

    fn single_usage_choice(&self, user: &str, assistant: &str) -> Result<Extraction> {
        let Some(word) = self.question_word.first(user) else {
            return Ok(Extraction::default());
        };

        let w = regex::escape(&word);
        let definition = Cascade::new("definition").pattern(
            "means",
            &format!(r#"(?i)'{w}' means ['"]*([^'"]+)['"]*|{w} means ['"]*([^'"]+)['"]*"#),
        )?;
        let usage = Cascade::new("usage").pattern(
            "should-use",
            &format!(r#"(?i)You should use ['"]*{w}['"]*\s+when\s+([^\n.]*)"#),
        )?;

        Ok(Extraction {
            terms: vec![TermEntry {
                definition: definition.first(assistant),
                usage: usage.first(assistant),
                ..TermEntry::word(word)
            }],
            ..Default::default()
        })
    }

    fn how_to(&self, user: &str, assistant: &str) -> Extraction {
        let how_frame = self.how_frame.captures(user).and_then(|caps| {
            let concept = caps.get(2)?.as_str().trim().to_string();
            Some(HowFrame {
                aux: caps.get(1)?.as_str().to_lowercase(),
                concept,
            })
        });

        let term = TermEntry {
            pos: self.general_pos.first(assistant),
            definition: self.general_definition.first(assistant),
            usage: self.usage_note.first(assistant),
            ..TermEntry::new(self.headword(user, assistant))
        };

        Extraction {
            terms: vec![term],
            examples: self.pairs_from(&self.trailing_examples, assistant),
            grammatical: self.grammar_note.first(assistant),
            how_frame,
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------------
    // Grammar records
    // ------------------------------------------------------------------------

    fn grammar(&self, kind: GrammarKind, user: &str, assistant: &str) -> Extraction {
        let body = assistant
            .split(EXAMPLES_TRIGGER)
            .next()
            .unwrap_or(assistant)
            .trim()
            .to_string();
        let mut examples = self.pairs_from(&self.trailing_examples, assistant);
        let word = quoted_inner(user);

        match kind {
            GrammarKind::Plural => {
                let forms = self.singular.first(assistant).zip(self.plural.first(assistant));
                let Some((singular, plural)) = forms else {
                    return Extraction {
                        grammatical: non_empty(body),
                        examples,
                        ..Default::default()
                    };
                };

                examples.insert(0, ExamplePair::new(singular, plural));
                Extraction {
                    terms: word.map(TermEntry::word).into_iter().collect(),
                    grammatical: self.explanation.first(assistant),
                    examples,
                    ..Default::default()
                }
            }
            GrammarKind::Conjugation => {
                let lower = assistant.to_lowercase();
                let pos = if lower.contains("not a verb") || lower.contains("is an adverb") {
                    self.stated_pos.first(&lower)
                } else {
                    None
                };

                let terms = self
                    .conjugated_verb
                    .first(user)
                    .map(|verb| TermEntry {
                        pos,
                        ..TermEntry::word(verb)
                    })
                    .into_iter()
                    .collect();

                Extraction {
                    terms,
                    grammatical: non_empty(body),
                    examples,
                    ..Default::default()
                }
            }
            GrammarKind::General => Extraction {
                grammatical: non_empty(body),
                examples,
                ..Default::default()
            },
        }
    }

    // ------------------------------------------------------------------------
    // Example pairs
    // ------------------------------------------------------------------------

    fn pairs_from(&self, section: &Cascade, text: &str) -> Vec<ExamplePair> {
        section
            .first(text)
            .map(|s| self.example_pairs(&s))
            .unwrap_or_default()
    }

    /// Pair up alternating sentence and translation lines.
    ///
    /// Blank lines are skipped, bullets and `Translation:` / `<Language>:`
    /// labels are stripped, and an odd trailing line is dropped.
    pub fn example_pairs(&self, section: &str) -> Vec<ExamplePair> {
        let language_label = format!("{}:", self.vocabulary.language());
        let lines: Vec<String> = section
            .lines()
            .map(|line| line.trim_matches(['-', ' ']).trim())
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.strip_prefix("Translation:")
                    .or_else(|| line.strip_prefix(language_label.as_str()))
                    .unwrap_or(line)
                    .trim()
                    .to_string()
            })
            .collect();

        lines
            .chunks_exact(2)
            .map(|pair| ExamplePair::new(pair[0].clone(), pair[1].clone()))
            .collect()
    }

    fn language_stops(&self) -> Vec<String> {
        vec![format!(" in {}", self.vocabulary.language())]
    }
}

/// Word-anchored cascades for one side of a comparison
struct ComparisonCascades {
    definition: Cascade,
    section_definition: Cascade,
    pos: Cascade,
    usage: Cascade,
}

impl ComparisonCascades {
    fn build(word: &str, other: &str) -> Result<Self> {
        let w = regex::escape(word);
        let o = regex::escape(other);

        let strict = [
            format!(r#"'{w}' means '([^']*)'|'{w}' means "([^"]*)""#),
            format!(r"- '{w}' means '([^']*)'|'{w}' is a ([^\n]*)"),
            format!(r"'{w}' is an? ([^\n,]*)"),
        ];
        let loose = [
            format!(r"'{w}'\s+means\s+([^\n.]*)"),
            format!(r#"{w}\s+means\s+'([^']*)'|{w}\s+means\s+"([^"]*)""#),
            format!(r"{w}\s+means\s+([^\n.]*)"),
        ];

        let mut definition = Cascade::new("definition");
        for (i, pattern) in strict.iter().chain(loose.iter()).enumerate() {
            definition = definition.pattern(format!("def-{i}"), &format!("(?i){pattern}"))?;
        }

        // The numbered section is searched case-sensitively
        let mut section_definition = Cascade::new("definition");
        for (i, pattern) in strict.iter().enumerate() {
            section_definition = section_definition.pattern(format!("section-{i}"), pattern)?;
        }
        section_definition = section_definition.pattern(
            "bullet",
            &format!(r#"- '{w}'[^\n]*'([^']*)'|- '{w}'[^\n]*"([^"]*)""#),
        )?;

        let category = r"([A-Za-z]+(?: \([A-Za-z]+\))?)";
        let pos = Cascade::new("pos")
            .pattern("quoted", &format!(r"(?i)'{w}' is an? {category}"))?
            .pattern("bare", &format!(r"(?i){w} is an? {category}"))?
            .pattern("bullet", &format!(r"(?i)- '{w}' is an? {category}"))?;

        let usage = Cascade::new("usage")
            .pattern("quoted", &format!(r"(?i)'{w}' is used ([^\n]*?)(?:'{o}'|$)"))?
            .pattern("bullet", &format!(r"(?i)- '{w}' is used ([^\n]*)"))?
            .pattern("bare", &format!(r"(?i){w} is used ([^\n]*)"))?;

        Ok(Self {
            definition,
            section_definition,
            pos,
            usage,
        })
    }
}

/// Meaning cascade of a usage-choice term
fn usage_meaning(word: &str) -> Result<Cascade> {
    let w = regex::escape(word);
    Cascade::new("definition")
        .pattern("quoted-means", &format!(r#"(?i)'{w}' means ['"]*([^'"]+)['"]*"#))?
        .pattern("bare-means", &format!(r#"(?i){w} means ['"]*([^'"]+)['"]*"#))?
        .pattern("quoted-used-to", &format!(r"(?i)'{w}' is used to ([^\n,.]*)"))?
        .pattern("bare-used-to", &format!(r"(?i){w} is used to ([^\n,.]*)"))?
        .pattern("quoted-is-a", &format!(r"(?i)'{w}' is an? ([^\n,.]*)"))?
        .pattern("bare-is-a", &format!(r"(?i){w} is an? ([^\n,.]*)"))
}

fn quoted_inner(text: &str) -> Option<String> {
    first_quoted(text)
        .map(|(_, inner)| inner.trim().to_string())
        .filter(|inner| !inner.is_empty())
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn extractor() -> Extractor {
        Extractor::new(Arc::new(TagVocabulary::default())).unwrap()
    }

    #[test]
    fn test_definition_record() {
        let e = extractor();
        let x = e
            .extract(
                QueryType::Definition,
                "What does 'pei' mean in Yanomami?",
                "'pei' means 'water' in Yanomami. It is a Noun.",
            )
            .unwrap();

        assert_eq!(x.terms.len(), 1);
        assert_eq!(x.terms[0].headword, Headword::Term("pei".to_string()));
        assert_eq!(x.terms[0].pos.as_deref(), Some("Noun"));
        assert_eq!(x.terms[0].definition.as_deref(), Some("water"));
        assert!(x.examples.is_empty());
        assert!(x.related_forms.is_none());
    }

    #[test]
    fn test_definition_examples_and_related_forms() {
        let e = extractor();
        let answer = "'hii' means 'this' in Yanomami. It is a Demonstrative pronoun.\n\
                      Here are some examples:\n\
                      - Hii a wãha\n\
                      Translation: This is the name\n\
                      \n\
                      - Hii thë\n\
                      Translation: This thing\n\
                      Related forms: hei, hi";
        let x = e.extract(QueryType::Definition, "What does 'hii' mean in Yanomami?", answer).unwrap();

        assert_eq!(x.terms[0].pos.as_deref(), Some("Demonstrative pronoun"));
        assert_eq!(
            x.examples,
            vec![
                ExamplePair::new("Hii a wãha", "This is the name"),
                ExamplePair::new("Hii thë", "This thing"),
            ]
        );
        assert_eq!(x.related_forms.as_deref(), Some("hei, hi"));
    }

    #[test]
    fn test_definition_first_sentence_fallback() {
        let e = extractor();
        let x = e
            .extract(
                QueryType::Definition,
                "What does 'naha' mean in Yanomami?",
                "In Yanomami the word naha means like this. It is used often.",
            )
            .unwrap();
        assert_eq!(x.terms[0].definition.as_deref(), Some("like this"));
    }

    #[test]
    fn test_headword_cascade_order() {
        let e = extractor();
        assert_eq!(
            e.headword("How do I use the word naha in Yanomami?", "whatever"),
            Headword::Term("naha".to_string())
        );
        assert_eq!(
            e.headword("How do I greet someone in Yanomami?", "You can say 'awei'.\nMore text."),
            Headword::Term("awei".to_string())
        );
        assert_eq!(
            e.headword("How do I greet someone in Yanomami?", "There is no single greeting."),
            Headword::Placeholder
        );
    }

    #[test]
    fn test_translate_to_english() {
        let e = extractor();
        let x = e
            .extract(
                QueryType::TranslateToEnglish,
                r#"Translate this Yanomami phrase to English: "Pei kõa""#,
                "The translation is 'drink water'. Literal: 'water drink'",
            )
            .unwrap();
        assert_eq!(x.phrase.as_deref(), Some("Pei kõa"));
        assert_eq!(x.translation.as_deref(), Some("drink water"));
        assert_eq!(x.literal.as_deref(), Some("water drink"));
    }

    #[test]
    fn test_translate_to_target_cascade() {
        let e = extractor();
        let x = e
            .extract(
                QueryType::TranslateToTarget,
                r#"How do you say "good morning" in Yanomami?"#,
                "In Yanomami, \"awei\" is used as a greeting.\n\nExamples:\n- Awei, shori!\nTranslation: Good morning, friend!",
            )
            .unwrap();
        assert_eq!(x.translation.as_deref(), Some("good morning"));
        assert_eq!(x.phrase.as_deref(), Some("awei"));

        let x = e
            .extract(
                QueryType::TranslateToTarget,
                "How do you say water in Yanomami?",
                "You could say 'u' or, more commonly, 'mau u'.",
            )
            .unwrap();
        assert_eq!(x.translation.as_deref(), Some("water"));
        assert_eq!(x.phrase.as_deref(), Some("mau u"));
    }

    #[test]
    fn test_comparison_without_definitions() {
        let e = extractor();
        let x = e
            .extract(
                QueryType::Comparison,
                "What is the difference between 'pei' and 'noki' in Yanomami?",
                "They are used in different situations.",
            )
            .unwrap();
        assert_eq!(x.terms.len(), 2);
        assert!(x.terms.iter().all(|t| t.definition.is_none()));
    }

    #[test]
    fn test_comparison_sections() {
        let e = extractor();
        let answer = "1. Meaning:\n\
                      - 'pei' refers to 'water'\n\
                      - 'noki' refers to 'river'\n\
                      2. Grammatical category:\n\
                      pei is a Noun, noki is a Noun (inanimate)\n\
                      3. Usage:\n\
                      - 'pei' is used for drinking water\n\
                      - 'noki' is used for flowing water\n\
                      4. Examples:\n\
                      With 'pei':\n\
                      - Pei a kõa\n\
                      Translation: Drink the water\n\
                      With 'noki':\n\
                      - Noki ha\n\
                      Translation: At the river";
        let x = e
            .extract(
                QueryType::Comparison,
                "What is the difference between 'pei' and 'noki' in Yanomami?",
                answer,
            )
            .unwrap();

        assert_eq!(x.terms[0].definition.as_deref(), Some("water"));
        assert_eq!(x.terms[1].definition.as_deref(), Some("river"));
        assert_eq!(x.terms[0].pos.as_deref(), Some("Noun"));
        assert_eq!(x.terms[1].pos.as_deref(), Some("Noun (inanimate)"));
        assert_eq!(x.terms[0].usage.as_deref(), Some("for drinking water"));
        assert_eq!(x.terms[1].usage.as_deref(), Some("for flowing water"));
        assert_eq!(
            x.examples,
            vec![
                ExamplePair::new("Pei a kõa", "Drink the water"),
                ExamplePair::new("Noki ha", "At the river"),
            ]
        );
    }

    #[test]
    fn test_comparison_unquoted_words() {
        let e = extractor();
        let x = e
            .extract(
                QueryType::Comparison,
                "What is the difference between pei and noki in Yanomami?",
                "pei means water. noki means river.",
            )
            .unwrap();
        assert_eq!(x.terms[0].headword.term(), Some("pei"));
        assert_eq!(x.terms[1].headword.term(), Some("noki"));
        assert_eq!(x.terms[0].definition.as_deref(), Some("water"));
        assert_eq!(x.terms[1].definition.as_deref(), Some("river"));
    }

    #[test]
    fn test_context_record() {
        let e = extractor();
        let answer = "'hwei' means 'this one' and it is common.\n\
                      - Yanomami: Hwei a totihi\n\
                      - Translation: This one is good";
        let x = e
            .extract(
                QueryType::HowTo(HowToKind::Context),
                "In what context is the word 'hwei' used in Yanomami?",
                answer,
            )
            .unwrap();
        assert_eq!(x.terms[0].headword.term(), Some("hwei"));
        assert_eq!(x.terms[0].definition.as_deref(), Some("this one"));
        assert_eq!(x.examples, vec![ExamplePair::new("Hwei a totihi", "This one is good")]);
    }

    #[test]
    fn test_usage_choice_two_clause() {
        let e = extractor();
        let answer = "'pei' means 'water' and 'noki' means 'river'.\n\
                      Use 'pei' when you are thirsty. Use 'noki' when you travel.";
        let x = e
            .extract(
                QueryType::HowTo(HowToKind::UsageChoice),
                "When should I use 'pei' instead of 'noki' in Yanomami?",
                answer,
            )
            .unwrap();
        assert_eq!(x.terms.len(), 2);
        assert_eq!(x.terms[0].definition.as_deref(), Some("water"));
        assert_eq!(x.terms[1].definition.as_deref(), Some("river"));
        assert_eq!(x.terms[0].usage.as_deref(), Some("you are thirsty"));
        assert_eq!(x.terms[1].usage.as_deref(), Some("you travel"));
    }

    #[test]
    fn test_usage_choice_single_clause_targets_named_word() {
        let e = extractor();
        let x = e
            .extract(
                QueryType::HowTo(HowToKind::UsageChoice),
                "When should I use pei instead of noki in Yanomami?",
                "You should use 'noki' when talking about rivers.",
            )
            .unwrap();
        assert_eq!(x.terms[0].headword.term(), Some("pei"));
        assert_eq!(x.terms[1].headword.term(), Some("noki"));
        assert!(x.terms[0].usage.is_none());
        assert_eq!(x.terms[1].usage.as_deref(), Some("talking about rivers"));
    }

    #[test]
    fn test_how_to_general() {
        let e = extractor();
        let answer = "The word 'huu' is a Verb (transitive). It means \"to go\".\n\
                      In Yanomami grammar, verbs take suffixes.\n\
                      When using this verb, remember that it needs a subject.\n\
                      Here are some examples:\n\
                      - Ya huu\n\
                      Translation: I go";
        let x = e
            .extract(
                QueryType::HowTo(HowToKind::General),
                "How do I use the word 'huu' in a Yanomami sentence?",
                answer,
            )
            .unwrap();
        let term = &x.terms[0];
        assert_eq!(term.headword.term(), Some("huu"));
        assert_eq!(term.pos.as_deref(), Some("Verb (transitive)"));
        assert_eq!(term.definition.as_deref(), Some("to go"));
        assert_eq!(term.usage.as_deref(), Some("it needs a subject"));
        assert!(x.grammatical.as_deref().unwrap().starts_with("verbs take suffixes."));
        assert_eq!(x.examples, vec![ExamplePair::new("Ya huu", "I go")]);
        assert_eq!(x.how_frame.as_ref().map(|f| f.aux.as_str()), Some("do"));
    }

    #[test]
    fn test_grammar_plural() {
        let e = extractor();
        let x = e
            .extract(
                QueryType::Grammar(GrammarKind::Plural),
                "What is the plural of 'thuë' in Yanomami?",
                "Plurals add a suffix.\nSingular: thuë\nPlural: thuëpë",
            )
            .unwrap();
        assert_eq!(x.terms[0].headword.term(), Some("thuë"));
        assert_eq!(x.grammatical.as_deref(), Some("Plurals add a suffix."));
        assert_eq!(x.examples, vec![ExamplePair::new("thuë", "thuëpë")]);
    }

    #[test]
    fn test_grammar_conjugation_not_a_verb() {
        let e = extractor();
        let x = e
            .extract(
                QueryType::Grammar(GrammarKind::Conjugation),
                "How is the verb 'hapo' conjugated in Yanomami?",
                "'hapo' is not a verb; it is an adverb of place, so it is not conjugated.",
            )
            .unwrap();
        assert_eq!(x.terms[0].headword.term(), Some("hapo"));
        assert_eq!(x.terms[0].pos.as_deref(), Some("adverb of place"));
        assert!(x.grammatical.is_some());
    }

    #[test]
    fn test_grammar_general_strips_examples() {
        let e = extractor();
        let x = e
            .extract(
                QueryType::Grammar(GrammarKind::General),
                "Explain negation in Yanomami grammar",
                "Negation uses 'ma'.\nHere are some examples:\n- Ma\nTranslation: No",
            )
            .unwrap();
        assert_eq!(x.grammatical.as_deref(), Some("Negation uses 'ma'."));
        assert_eq!(x.examples, vec![ExamplePair::new("Ma", "No")]);
        assert!(x.terms.is_empty());
    }

    #[test]
    fn test_example_pairs_drop_odd_line() {
        let e = extractor();
        let pairs = e.example_pairs("- A\nTranslation: a\n\n- B\nTranslation: b\n- C");
        assert_eq!(pairs, vec![ExamplePair::new("A", "a"), ExamplePair::new("B", "b")]);
    }

    proptest! {
        #[test]
        fn prop_extraction_is_deterministic(
            word in "[a-zë]{1,8}",
            meaning in "[a-z ]{1,20}",
            noise in "[a-zA-Z .,']{0,60}",
        ) {
            let e = extractor();
            let user = format!("What does '{word}' mean in Yanomami?");
            let answer = format!("'{word}' means '{meaning}' in Yanomami. {noise}");
            let first = e.extract(QueryType::Definition, &user, &answer).unwrap();
            let second = e.extract(QueryType::Definition, &user, &answer).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
