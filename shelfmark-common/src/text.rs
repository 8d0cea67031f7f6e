//! Author-name canonicalization
//!
//! Normalized text is the sole equality key for author identity: two
//! display strings denote the same author iff their normalized forms are
//! character-equal, regardless of full-width/half-width or spacing
//! differences in the rendered source.

/// Canonicalize an author display name.
///
/// Folds the full-width ASCII block (U+FF01..=U+FF5E) to its half-width
/// equivalents, folds the ideographic space (U+3000) to an ASCII space and
/// trims surrounding whitespace. Total and idempotent.
pub fn normalize(input: &str) -> String {
    let folded: String = input
        .chars()
        .map(|c| match c {
            // full-width forms sit 0xFEE0 above their ASCII counterparts
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '\u{3000}' => ' ',
            _ => c,
        })
        .collect();
    folded.trim().to_string()
}

/// Cut extracted author text at the first opening-bracket glyph.
///
/// Trailing parenthetical annotations are not part of the name; `[`, `(`
/// and their full-width forms all start one. Trailing whitespace before
/// the bracket is dropped as well.
pub fn truncate_at_bracket(input: &str) -> &str {
    match input.find(['[', '(', '（', '［']) {
        Some(idx) => input[..idx].trim_end(),
        None => input.trim_end(),
    }
}
