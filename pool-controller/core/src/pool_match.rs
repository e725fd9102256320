//! Pool expression matching.
//!
//! A pool expression is a pool-name pattern where `*` matches any run of
//! characters and everything else is literal. Expressions anchor to the
//! full name: `pool*` covers `pool1` but not `mypool1`.

use ahash::AHashMap as HashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

static PATTERNS: Lazy<RwLock<HashMap<String, Regex>>> = Lazy::new(Default::default);

/// Compiles a pool expression into an anchored regex pattern. Every
/// maximal non-`*` run is quoted, so the only metacharacter is `*`
/// itself; there is no way to escape a literal `*`.
pub fn expr_as_pattern(expr: &str) -> String {
    let quoted = expr
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("^{quoted}$")
}

/// Tests whether `name` is covered by the expression `expr`.
///
/// Compiled patterns are memoized process-wide. Quoting makes every
/// expression a valid pattern, so compilation cannot fail.
pub fn matches(expr: &str, name: &str) -> bool {
    let pattern = expr_as_pattern(expr);
    if let Some(regex) = PATTERNS.read().get(&pattern) {
        return regex.is_match(name);
    }
    let regex = Regex::new(&pattern).expect("should_compile");
    let matched = regex.is_match(name);
    PATTERNS.write().insert(pattern, regex);
    matched
}

/// The number of `*` wildcards in an expression. Fewer wildcards means a
/// more specific expression at equal length.
pub fn wildcards(expr: &str) -> usize {
    expr.matches('*').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_non_wildcard_runs() {
        assert_eq!(expr_as_pattern("pool1"), "^pool1$");
        assert_eq!(expr_as_pattern("*"), "^.*$");
        assert_eq!(expr_as_pattern("pool*"), "^pool.*$");
        assert_eq!(expr_as_pattern("*_dev"), "^.*_dev$");
        assert_eq!(expr_as_pattern("pool.prod"), r"^pool\.prod$");
    }

    #[test]
    fn matches_anchor_to_the_full_name() {
        assert!(matches("pool1", "pool1"));
        assert!(!matches("pool1", "pool12"));
        assert!(!matches("pool1", "apool1"));
        assert!(matches("pool*", "pool1"));
        assert!(matches("pool*", "pool"));
        assert!(!matches("pool*", "mypool1"));
        assert!(matches("*_dev", "pool1_dev"));
        assert!(!matches("*_dev", "pool1_prod"));
        assert!(matches("*", "anything"));
    }

    #[test]
    fn metacharacters_are_literal() {
        assert!(matches("pool.prod", "pool.prod"));
        assert!(!matches("pool.prod", "poolxprod"));
        assert!(!matches("p[0-9]", "p7"));
        assert!(matches("p[0-9]", "p[0-9]"));
    }

    #[test]
    fn counts_wildcards() {
        assert_eq!(wildcards("pool1"), 0);
        assert_eq!(wildcards("pool*"), 1);
        assert_eq!(wildcards("*pool*"), 2);
    }
}
