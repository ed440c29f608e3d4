//! Typographic normalization shared by lexicon loading, tokenization lookup and token forms.

use unicode_normalization::UnicodeNormalization;

/// Fold typographic variants to their ASCII equivalents and recompose to NFC.
///
/// - Single quote variants (’, ‘, ʼ, ´, ...) become `'`
/// - Double quote variants (“, ”, „, ...) become `"`
/// - Hyphen and dash variants (‐, ‑, –, −, ...) become `-`
pub fn normalize_typography(text: &str) -> String {
    text.nfc()
        .map(|c| match c {
            // Single quote variants: ' (U+2018), ' (U+2019), ‚ (U+201A), ‛ (U+201B),
            // ′ (U+2032), ‵ (U+2035), ❛ (U+275B), ❜ (U+275C), ＇ (U+FF07),
            // ʻ (U+02BB), ʼ (U+02BC), ʽ (U+02BD), ʹ (U+02B9), `, ´ (U+00B4)
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{2035}'
            | '\u{275B}' | '\u{275C}' | '\u{FF07}' | '\u{02BB}' | '\u{02BC}' | '\u{02BD}'
            | '\u{02B9}' | '`' | '\u{00B4}' => '\'',

            // Double quote variants: " (U+201C), " (U+201D), „ (U+201E), ‟ (U+201F),
            // ″ (U+2033), ‶ (U+2036), ❝ (U+275D), ❞ (U+275E), ＂ (U+FF02)
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{2036}'
            | '\u{275D}' | '\u{275E}' | '\u{FF02}' => '"',

            // Hyphen/dash variants: ‐ (U+2010), ‑ (U+2011), ‒ (U+2012), – (U+2013),
            // — (U+2014), ― (U+2015), − (U+2212), ﹘ (U+FE58), ﹣ (U+FE63), － (U+FF0D)
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' | '\u{FE58}' | '\u{FE63}' | '\u{FF0D}' => '-',

            _ => c,
        })
        .collect()
}

/// Typographic normalization plus whitespace folding.
///
/// French typography puts a (thin) non-breaking space before `?` and `!`; sentence files
/// and tokenization files do not always agree on which one, so lookups go through this.
pub fn normalize_sentence_key(text: &str) -> String {
    normalize_typography(text)
        .split(|c: char| c.is_whitespace() || c == '\u{00A0}' || c == '\u{202F}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
