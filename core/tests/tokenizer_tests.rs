use okapi_core::tokenizer::{query_terms, tokenize, tokenize_value};
use serde_json::json;

#[test]
fn it_lowercases_and_trims_punctuation() {
    let words = tokenize("The Quick (brown) fox; jumped over: the \"lazy\" <dog>!");
    assert_eq!(words, vec!["the", "quick", "brown", "fox", "jumped", "over", "the", "lazy", "dog"]);
}

#[test]
fn it_keeps_inner_punctuation() {
    let words = tokenize("don't stop-me now, e-mail me@example.com.");
    assert_eq!(words, vec!["don't", "stop-me", "now", "e-mail", "me@example.com"]);
}

#[test]
fn it_drops_words_that_trim_to_nothing() {
    assert_eq!(tokenize("( ... ) -- ?!"), vec!["--"]);
    assert!(tokenize("").is_empty());
    assert!(tokenize("\t\n ").is_empty());
}

#[test]
fn it_ignores_non_strings() {
    assert!(tokenize_value(&json!(null)).is_empty());
    assert!(tokenize_value(&json!(["hello"])).is_empty());
    assert_eq!(tokenize_value(&json!("Hello,")), vec!["hello"]);
    assert!(query_terms(&json!(3.5)).is_empty());
}
