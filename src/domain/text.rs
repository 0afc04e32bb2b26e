//! Text normalisation shared by classification, caching and guarding

use unicode_segmentation::UnicodeSegmentation;

/// Map accented Latin letters to their base letter
///
/// `ñ` is kept: it is a distinct letter in Spanish and folding it would merge
/// unrelated words ("año"/"ano").
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            other => other,
        })
        .collect()
}

/// Lower-case, fold accents, drop punctuation and collapse whitespace
///
/// Leading "¿" and "¡" disappear along with the rest of the punctuation, so
/// "¿Dónde queda?" and "donde queda" normalise to the same string. Symbols
/// that carry meaning in answers (`$`, `%`, `/`) are kept.
pub fn normalize(text: &str) -> String {
    let folded = fold_accents(&text.to_lowercase());

    let cleaned: String = folded
        .chars()
        .map(|c| match c {
            '¿' | '¡' | '?' | '!' | '.' | ',' | ';' | ':' | '"' | '\'' | '(' | ')' | '«'
            | '»' | '“' | '”' => ' ',
            other => other,
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unicode words of the text, punctuation excluded
pub fn words(text: &str) -> Vec<&str> {
    text.unicode_words().collect()
}

pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cut `text` to at most `max_chars` characters without splitting a word
///
/// The cut lands on the last whitespace at or before the limit. When the first
/// word alone is longer than the limit the result is empty.
pub fn truncate_at_word_boundary(text: &str, max_chars: usize) -> &str {
    if char_len(text) <= max_chars {
        return text;
    }

    let mut cut = 0;

    for (count, (idx, c)) in text.char_indices().enumerate() {
        if count > max_chars {
            break;
        }
        if c.is_whitespace() {
            cut = idx;
        }
    }

    text[..cut].trim_end()
}

/// Char-safe truncation for log fields
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((idx, _)) => format!("{}...", &text[..idx]),
    }
}
