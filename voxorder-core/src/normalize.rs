//! Word-level normalization of ASR output.
//!
//! Maps spoken number words to digit strings and spoken place-code words to
//! single letters. Number words are looked up first. Unknown words pass
//! through unchanged, so canonical tokens are fixed points.

use crate::vocab::Vocabulary;

/// Map one lowercase word to its canonical token.
pub fn normalize_word(word: &str, vocab: &Vocabulary) -> String {
    if let Some(digits) = vocab.number_words.get(word) {
        return digits.clone();
    }
    if let Some(letter) = vocab.alpha_codes.get(word) {
        return letter.clone();
    }
    word.to_string()
}

/// Split a transcript on whitespace and normalize every word.
pub fn normalize_transcript(text: &str, vocab: &Vocabulary) -> Vec<String> {
    text.split_whitespace()
        .map(|word| normalize_word(word, vocab))
        .collect()
}
