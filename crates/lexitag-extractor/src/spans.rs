//! Span well-formedness checks
//!
//! A tagged text is valid when every opening marker has exactly one matching
//! closing marker, spans close in reverse order of opening, and no span
//! contains another span of the same kind. Markers outside the vocabulary
//! (such as `<RESPONSE>`) are treated as plain text.

use lexitag_core::{LexitagError, Result, TagKind, TagSpan};

use crate::emitter::TagVocabulary;

struct Marker<'a> {
    start: usize,
    end: usize,
    closing: bool,
    name: &'a str,
}

/// Find the next `<NAME>` or `</NAME>` marker at or after `from`
fn next_marker(text: &str, from: usize) -> Option<Marker<'_>> {
    let mut cursor = from;
    while let Some(offset) = text[cursor..].find('<') {
        let start = cursor + offset;
        let body_start = start + 1;
        let closing = text[body_start..].starts_with('/');
        let name_start = if closing { body_start + 1 } else { body_start };
        let name_len = text[name_start..]
            .bytes()
            .take_while(|b| b.is_ascii_uppercase() || *b == b'_')
            .count();

        if name_len > 0 && text[name_start + name_len..].starts_with('>') {
            return Some(Marker {
                start,
                end: name_start + name_len + 1,
                closing,
                name: &text[name_start..name_start + name_len],
            });
        }
        cursor = body_start;
    }
    None
}

/// Check the span invariants of a tagged text.
///
/// On success returns every span in order of its opening marker.
pub fn validate_spans(text: &str, vocabulary: &TagVocabulary) -> Result<Vec<TagSpan>> {
    // (kind, content start, index into spans)
    let mut open: Vec<(TagKind, usize, usize)> = Vec::new();
    let mut spans: Vec<TagSpan> = Vec::new();
    let mut cursor = 0;

    while let Some(marker) = next_marker(text, cursor) {
        cursor = marker.end;
        let Some(kind) = vocabulary.kind_of(marker.name) else {
            continue;
        };

        if !marker.closing {
            if open.iter().any(|(k, _, _)| *k == kind) {
                return Err(LexitagError::InvalidSpans(format!(
                    "{} nested inside another {} at byte {}",
                    marker.name, marker.name, marker.start
                )));
            }
            open.push((kind, marker.end, spans.len()));
            spans.push(TagSpan::new(kind, String::new()));
            continue;
        }

        match open.pop() {
            Some((k, content_start, index)) if k == kind => {
                spans[index].text = text[content_start..marker.start].to_string();
            }
            Some((k, _, _)) => {
                return Err(LexitagError::InvalidSpans(format!(
                    "closing {} at byte {} while {} is open",
                    marker.name,
                    marker.start,
                    vocabulary.name(k)
                )));
            }
            None => {
                return Err(LexitagError::InvalidSpans(format!(
                    "closing {} at byte {} has no opening marker",
                    marker.name, marker.start
                )));
            }
        }
    }

    if let Some((kind, _, _)) = open.last() {
        return Err(LexitagError::InvalidSpans(format!(
            "{} is never closed",
            vocabulary.name(*kind)
        )));
    }

    Ok(spans)
}
