//! Compiled literal patterns
//!
//! Every pattern here is a source literal, so compilation cannot depend on
//! input. A bad literal panics on first use and fails the tests below.

use std::sync::OnceLock;

use regex_lite::Regex;

/// `NNN.xxxxxxxx.js` config script names.
pub(crate) const FILENAME: &str = r"^\d{3}\.[a-z0-9]{8}\.js$";

/// `<%= injectCustomScript %>` in the HTML template.
pub(crate) const PLACEHOLDER: &str = r"<%=\s*injectCustomScript\s*%>";

/// Compile `pattern` once into `cell`.
pub(crate) fn literal(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("invalid literal pattern {:?}: {}", pattern, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_compile() {
        for pattern in [FILENAME, PLACEHOLDER] {
            assert!(Regex::new(pattern).is_ok(), "{}", pattern);
        }
    }

    #[test]
    fn test_literal_is_cached() {
        static CELL: OnceLock<Regex> = OnceLock::new();
        let first = literal(&CELL, FILENAME) as *const Regex;
        let second = literal(&CELL, FILENAME) as *const Regex;
        assert_eq!(first, second);
        assert!(literal(&CELL, FILENAME).is_match("042.k3j9x0ab.js"));
    }
}
