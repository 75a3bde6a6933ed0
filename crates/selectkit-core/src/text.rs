// crates/selectkit-core/src/text.rs

/// Convert a string into a folded key suitable for indexing and comparison.
///
/// This performs:
/// 1\) Transliterate Unicode → ASCII (e.g. `Bogotá` -> `Bogota`)
/// 2\) Normalize to lowercase
/// 3\) Trim and collapse runs of whitespace to a single space
///
/// # Examples
///
/// ```rust
/// use selectkit_core::text::fold_key;
///
/// assert_eq!(fold_key("  Bogotá   D.C. "), "bogota d.c.");
/// assert_eq!(fold_key("Straße"), "strasse");
/// ```
pub fn fold_key(s: &str) -> String {
    let folded = deunicode::deunicode(s).to_lowercase();
    let mut out = String::with_capacity(folded.len());
    for word in folded.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Compares two strings for equality after folding.
///
/// ```rust
/// use selectkit_core::text::equals_folded;
///
/// assert!(equals_folded("Medellín", "medellin"));
/// assert!(!equals_folded("Cali", "Palmira"));
/// ```
pub fn equals_folded(a: &str, b: &str) -> bool {
    fold_key(a) == fold_key(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_collapses_whitespace_and_case() {
        assert_eq!(fold_key("  ACME   Corp\t"), "acme corp");
        assert_eq!(fold_key(""), "");
        assert_eq!(fold_key("   "), "");
    }

    #[test]
    fn fold_strips_diacritics() {
        assert_eq!(fold_key("Chía"), "chia");
        assert_eq!(fold_key("Zipaquirá"), "zipaquira");
        assert!(equals_folded("München", "munchen"));
    }
}
