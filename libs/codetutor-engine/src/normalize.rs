//! Output Normalizer
//!
//! Canonical form used for every output comparison: leading/trailing
//! whitespace removed and every internal whitespace run (newlines included)
//! collapsed to one space.
//!
//! This is lossy on purpose. `"a  b"` and `"a\nb\n"` compare equal, so a
//! challenge cannot distinguish outputs that differ only in spacing.

/// Canonicalize captured text for comparison
pub fn normalize(output: &str) -> String {
    output.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compare two outputs after normalization
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize(actual) == normalize(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_collapses() {
        assert_eq!(normalize("  hello \t world \r\n"), "hello world");
        assert_eq!(normalize("1\n2\n3\n"), "1 2 3");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t "), "");
    }

    #[test]
    fn test_idempotent() {
        for sample in ["a\nb\n", "  x  ", "", "one\r\n\r\ntwo", "tab\tsep  words "] {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_whitespace_variants_are_equal() {
        assert_eq!(normalize("a\nb\n"), normalize("a   b"));
        assert!(outputs_match("Hello, World!\n", "Hello, World!"));
    }

    #[test]
    fn test_content_differences_are_kept() {
        assert_ne!(normalize("ab"), normalize("a b"));
        assert!(!outputs_match("42", "43"));
        assert!(!outputs_match("Hello", "hello"));
    }
}
