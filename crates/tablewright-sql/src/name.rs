use thiserror::Error;

/// Postgres truncates identifiers longer than this (NAMEDATALEN - 1).
pub const MAX_IDENT_LEN: usize = 63;

/// Why a name was rejected by [`validate_name`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name must not be empty")]
    Empty,

    #[error("name is {len} characters long, the limit is {MAX_IDENT_LEN}")]
    TooLong { len: usize },

    #[error("name must start with an ASCII letter, found {0:?}")]
    BadStart(char),

    #[error("name may only contain ASCII letters, digits and underscores, found {0:?}")]
    BadChar(char),
}

/// Check that a table, schema, column or index name is a plain identifier.
///
/// Accepted names match `[A-Za-z][A-Za-z0-9_]*` and are at most
/// [`MAX_IDENT_LEN`] characters long.
///
/// # Example
/// ```
/// use tablewright_sql::{validate_name, NameError};
/// assert!(validate_name("valid_name_1").is_ok());
/// assert_eq!(validate_name("1table"), Err(NameError::BadStart('1')));
/// ```
pub fn validate_name(name: &str) -> Result<(), NameError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(NameError::Empty);
    };

    let len = name.chars().count();
    if len > MAX_IDENT_LEN {
        return Err(NameError::TooLong { len });
    }

    if !first.is_ascii_alphabetic() {
        return Err(NameError::BadStart(first));
    }

    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(NameError::BadChar(bad));
    }

    Ok(())
}
