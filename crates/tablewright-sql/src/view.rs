use thiserror::Error;

/// Statement keywords that may never appear in view text.
pub const DENIED_VIEW_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "INSERT", "TRUNCATE", "ALTER", "GRANT", "REVOKE",
];

/// Why view text was rejected by [`check_view_sql`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewSqlError {
    #[error("view SQL must not be empty")]
    Empty,

    #[error("view SQL must start with SELECT or CREATE")]
    NotSelect,

    #[error("view SQL must not contain {0}")]
    DeniedKeyword(&'static str),
}

/// Check view text before it is sent anywhere.
///
/// The text must be non-empty, start with `SELECT` or `CREATE`, and contain
/// none of [`DENIED_VIEW_KEYWORDS`]. Keywords are matched as whole words,
/// case-insensitively, anywhere in the text (string literals and comments
/// included).
pub fn check_view_sql(sql: &str) -> Result<(), ViewSqlError> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(ViewSqlError::Empty);
    }

    let upper = trimmed.to_ascii_uppercase();
    if !upper.starts_with("SELECT") && !upper.starts_with("CREATE") {
        return Err(ViewSqlError::NotSelect);
    }

    for word in words(&upper) {
        if let Some(kw) = DENIED_VIEW_KEYWORDS.iter().find(|kw| **kw == word.1) {
            return Err(ViewSqlError::DeniedKeyword(kw));
        }
    }

    Ok(())
}

/// Extract the `SELECT ...` body from view text.
///
/// A leading `CREATE [OR REPLACE] VIEW name AS` wrapper is stripped; plain
/// `SELECT` text is returned trimmed. Trailing semicolons are dropped so the
/// body can be embedded in a larger statement.
///
/// # Example
/// ```
/// use tablewright_sql::view_body;
/// assert_eq!(view_body("CREATE VIEW v AS SELECT 1;"), "SELECT 1");
/// assert_eq!(view_body("  SELECT id FROM t "), "SELECT id FROM t");
/// ```
pub fn view_body(sql: &str) -> &str {
    let trimmed = sql.trim();
    let upper = trimmed.to_ascii_uppercase();

    let body = if upper.starts_with("CREATE") {
        match words(&upper).find(|(_, w)| *w == "AS") {
            Some((end, _)) => &trimmed[end..],
            None => trimmed,
        }
    } else {
        trimmed
    };

    body.trim().trim_end_matches(';').trim_end()
}

/// Iterate over the identifier-like words of `s`, yielding each word together
/// with the byte offset just past it.
fn words(s: &str) -> impl Iterator<Item = (usize, &str)> {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut rest = 0;
    std::iter::from_fn(move || {
        let tail = &s[rest..];
        let start = rest + tail.find(is_word)?;
        let len = s[start..].find(|c| !is_word(c)).unwrap_or(s.len() - start);
        rest = start + len;
        Some((rest, &s[start..rest]))
    })
}
