use lazy_static::lazy_static;
use serde_json::Value;
use std::collections::HashSet;

lazy_static! {
    static ref LEADING: HashSet<char> = ['(', '[', '{', '<', '\'', '"'].into_iter().collect();
    static ref TRAILING: HashSet<char> =
        ['.', '?', '!', ',', ':', ';', ')', ']', '}', '>', '\'', '"'].into_iter().collect();
}

fn trim_word(word: &str) -> &str {
    word.trim_start_matches(|c: char| LEADING.contains(&c))
        .trim_end_matches(|c: char| TRAILING.contains(&c))
}

/// Tokenize text: lowercase, split on whitespace, strip leading openers and
/// trailing punctuation from every word, drop words left empty.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(trim_word)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokenize an arbitrary JSON value. Anything that is not a string yields no tokens.
pub fn tokenize_value(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => tokenize(s),
        _ => Vec::new(),
    }
}

/// Interpret a JSON value as an already tokenized query.
///
/// A non-array, or an array holding anything other than strings, is treated as
/// an empty query rather than an error.
pub fn query_terms(value: &Value) -> Vec<String> {
    let Value::Array(items) = value else { return Vec::new() };
    let mut terms = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => terms.push(s.clone()),
            _ => return Vec::new(),
        }
    }
    terms
}
