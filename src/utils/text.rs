// src/utils/text.rs

//! Text cleanup helpers shared by extractors.

use unicode_segmentation::UnicodeSegmentation;

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed text, or `None` when nothing is left.
pub fn non_empty(text: &str) -> Option<String> {
    let cleaned = normalize_whitespace(text);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Cut text to at most `max` grapheme clusters.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    text.graphemes(true).take(max).collect()
}

/// Title built from a URL slug: `minimax-m2-5` becomes `Minimax M2 5`.
pub fn title_from_slug(slug: &str) -> Option<String> {
    let words: Vec<String> = slug
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();
    (!words.is_empty()).then(|| words.join(" "))
}

/// Title-case a word: a letter is uppercased when it starts a run of
/// letters and lowercased otherwise, so `MiniMax` becomes `Minimax` and
/// `m2x` becomes `M2X`.
fn capitalize(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut prev_is_letter = false;
    for c in word.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
