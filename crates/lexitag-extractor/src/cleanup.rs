//! Parenthesis cleanup
//!
//! Some generated answers wrap tags in parentheses, e.g. `(<WORD>x</WORD>)`.
//! The cleanup drops a parenthesis directly adjacent to a marker.

use lexitag_core::Record;

/// Replace `(<` with `<` and `>)` with `>`
pub fn strip_adjacent_parentheses(text: &str) -> String {
    text.replace("(<", "<").replace(">)", ">")
}

/// Clean every message of a record.
///
/// Returns the cleaned record and the number of messages that changed.
pub fn cleanup_record(record: &Record) -> (Record, usize) {
    let mut cleaned = record.clone();
    let mut changed = 0;

    for message in &mut cleaned.messages {
        let Some(content) = message.content() else {
            continue;
        };
        let text = strip_adjacent_parentheses(content);
        if text != content {
            message.set_content(text);
            changed += 1;
        }
    }

    (cleaned, changed)
}
