//! Quoting and validation helpers shared by the tablewright crates.
//!
//! Everything in here is pure string work: nothing touches a database.
//! DDL text is built by interpolating identifiers and literals, so every
//! name that ends up in a statement goes through [`quote_ident`] (or
//! [`Ident`]) and every literal through [`quote_literal`] (or [`Lit`]).

mod name;
pub use name::*;

mod view;
pub use view::*;

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes.
///
/// # Example
/// ```
/// use tablewright_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use tablewright_sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// Quote a string literal for SQL, doubling embedded single quotes.
pub fn quote_literal(s: &str) -> String {
    format!("{}", Lit(s))
}

/// Quote a PostgreSQL identifier.
///
/// Always quotes, so reserved words like `user` or `order` are safe.
/// Embedded double quotes are doubled.
pub fn quote_ident(name: &str) -> String {
    format!("{}", Ident(name))
}

/// Quote a schema-qualified name: `"schema"."name"`.
pub fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", Ident(schema), Ident(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quotes_plain_identifiers() {
        assert_eq!(quote_ident("t1"), "\"t1\"");
        assert_eq!(qualified("s1", "t1"), "\"s1\".\"t1\"");
    }

    #[test]
    fn escapes_embedded_quotes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(quote_literal(""), "''");
    }

    /// Undo `quote_literal`/`quote_ident` by stripping the outer quotes and
    /// collapsing doubled inner ones.
    fn unquote(quoted: &str, q: char) -> Option<String> {
        let inner = quoted.strip_prefix(q)?.strip_suffix(q)?;
        let doubled: String = [q, q].iter().collect();
        let single: String = [q].iter().collect();
        if inner.replace(&doubled, "").contains(q) {
            return None;
        }
        Some(inner.replace(&doubled, &single))
    }

    proptest! {
        #[test]
        fn literal_quoting_is_reversible(s in ".*") {
            prop_assert_eq!(unquote(&quote_literal(&s), '\''), Some(s));
        }

        #[test]
        fn identifier_quoting_is_reversible(s in ".*") {
            prop_assert_eq!(unquote(&quote_ident(&s), '"'), Some(s));
        }
    }
}
