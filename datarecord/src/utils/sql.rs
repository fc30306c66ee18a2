//! SQL utility functions

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// Use this when building LIKE patterns from user input to prevent
/// unintended pattern matching.
///
/// # Example
///
/// ```
/// use datarecord::utils::sql::escape_like_pattern;
///
/// let user_input = "100% match_test";
/// let pattern = format!("%{}%", escape_like_pattern(user_input));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Quote a string as a SQL string literal, doubling embedded single quotes
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Build a LIKE literal that matches `pattern` anywhere, escaping user input
pub fn contains_literal(pattern: &str) -> String {
    quote_literal(&format!("%{}%", escape_like_pattern(pattern)))
}
