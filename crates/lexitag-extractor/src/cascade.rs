//! Ordered fallback matching
//!
//! A cascade is the ordered list of matchers for one entity role. Matchers
//! are pure functions from text to an optional value; the cascade tries them
//! in order and stops at the first one that yields a non-empty value.

use regex::Regex;

use lexitag_core::{LexitagError, Result};

/// A single matcher: text in, candidate value out
pub type Matcher = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

struct Rule {
    name: String,
    matcher: Matcher,
}

/// Which rule of a cascade produced a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub rule: usize,
    pub value: String,
}

/// Ordered list of matchers for one role
pub struct Cascade {
    role: &'static str,
    rules: Vec<Rule>,
}

impl Cascade {
    pub fn new(role: &'static str) -> Self {
        Self {
            role,
            rules: Vec::new(),
        }
    }

    /// Append a matcher function
    pub fn rule<F>(mut self, name: impl Into<String>, matcher: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            name: name.into(),
            matcher: Box::new(matcher),
        });
        self
    }

    /// Append a regex matcher yielding its first non-empty capture group
    pub fn pattern(self, name: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = compile(pattern)?;
        Ok(self.rule(name, move |text| first_capture(&regex, text)))
    }

    pub fn role(&self) -> &'static str {
        self.role
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    /// Run the rules in order; the first hit wins
    pub fn find(&self, text: &str) -> Option<Hit> {
        self.rules.iter().enumerate().find_map(|(index, rule)| {
            (rule.matcher)(text)
                .filter(|value| !value.is_empty())
                .map(|value| {
                    tracing::trace!(role = self.role, rule = %rule.name, "cascade hit");
                    Hit { rule: index, value }
                })
        })
    }

    /// Value of the first hit, if any
    pub fn first(&self, text: &str) -> Option<String> {
        self.find(text).map(|hit| hit.value)
    }
}

impl std::fmt::Debug for Cascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cascade")
            .field("role", &self.role)
            .field("rules", &self.rule_names().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Compile a pattern, reporting failures as extraction errors
pub fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| LexitagError::Other(e.into()))
}

/// First non-empty capture group of the leftmost match, trimmed.
///
/// Only the leftmost match is considered; if all of its groups are empty the
/// result is `None` even when a later match would have had content.
pub fn first_capture(regex: &Regex, text: &str) -> Option<String> {
    let caps = regex.captures(text)?;
    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str().trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Leftmost quoted token (single or double quotes).
///
/// Returns the byte range of the whole quoted token, quotes included, and
/// the inner text. The inner text may be empty.
pub fn first_quoted(text: &str) -> Option<(std::ops::Range<usize>, &str)> {
    text.char_indices()
        .filter(|(_, c)| *c == '\'' || *c == '"')
        .find_map(|(start, quote)| {
            let inner_start = start + quote.len_utf8();
            text[inner_start..].find(quote).map(|len| {
                let inner_end = inner_start + len;
                (start..inner_end + quote.len_utf8(), &text[inner_start..inner_end])
            })
        })
}

/// Inner text of the last quoted token
pub fn last_quoted(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures_iter(text)
        .last()
        .and_then(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_string())
                .next()
        })
}

/// Cut a free-text capture at the first stop phrase (case-insensitive)
/// and drop trailing punctuation
pub fn clip(value: &str, stops: &[String]) -> String {
    let lower = value.to_lowercase();
    let end = stops
        .iter()
        .filter_map(|stop| lower.find(&stop.to_lowercase()))
        .min()
        .filter(|&end| value.is_char_boundary(end))
        .unwrap_or(value.len());
    value[..end]
        .trim()
        .trim_end_matches(['?', '.', '!'])
        .trim()
        .to_string()
}
