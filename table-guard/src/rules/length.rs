//! String length bounds.
//!
//! Length is measured in characters, not bytes.

/// Returns true if `value` has at least `min` characters.
pub fn satisfies_min(value: &str, min: usize) -> bool {
    value.chars().count() >= min
}

/// Returns true if `value` has at most `max` characters.
pub fn satisfies_max(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_boundary() {
        assert!(satisfies_min("abc", 3));
        assert!(!satisfies_min("ab", 3));
        assert!(satisfies_min("abcd", 3));
    }

    #[test]
    fn test_max_boundary() {
        assert!(satisfies_max("abc", 3));
        assert!(!satisfies_max("abcd", 3));
        assert!(satisfies_max("ab", 3));
    }

    #[test]
    fn test_utf8_multibyte_characters() {
        assert!(satisfies_max("你好", 2));
        assert!(satisfies_min("🦀🔥", 2));
        assert!(satisfies_max("café", 4));
    }
}
