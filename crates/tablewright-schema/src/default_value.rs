//! Turning raw default-value strings into SQL default expressions.
//!
//! Field descriptors carry defaults as free text. Before a default can go
//! into a `DEFAULT` clause it is checked against the column's native type:
//! values that cannot be valid for the type are dropped (no default is
//! emitted) instead of failing the whole statement.

use crate::PgType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use tablewright_sql::quote_literal;

/// Date-only literal format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-time literal format.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Time-of-day literal format.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Date/time functions accepted verbatim as defaults for temporal columns.
const TEMPORAL_FUNCTIONS: &[&str] = &[
    "now()",
    "current_timestamp",
    "current_date",
    "current_time",
    "localtimestamp",
    "localtime",
    "transaction_timestamp()",
    "statement_timestamp()",
    "clock_timestamp()",
];

/// UUID generators accepted verbatim as defaults for `uuid` columns.
const UUID_FUNCTIONS: &[&str] = &["gen_random_uuid()", "uuid_generate_v4()", "uuid_generate_v1()"];

fn is_one_of(value: &str, functions: &[&str]) -> bool {
    functions.iter().any(|f| f.eq_ignore_ascii_case(value))
}

/// Format a requested default value for a column of type `ty`.
///
/// Returns `None` when no default should be emitted:
/// - an empty value, unless the column is a character type, where it becomes `''`
/// - a boolean that is not one of `true/1/yes/on` or `false/0/no/off`
/// - a date, timestamp or time that does not parse
/// - a uuid that is neither a generator call nor shaped like a uuid literal
///
/// Character values are always quoted. Every other type passes the value
/// through unmodified.
pub fn format_default(value: &str, ty: PgType) -> Option<String> {
    let v = value.trim();
    match ty {
        PgType::Varchar | PgType::Text => Some(quote_literal(value)),
        _ if v.is_empty() => None,
        PgType::Boolean => match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some("true".to_string()),
            "false" | "0" | "no" | "off" => Some("false".to_string()),
            _ => None,
        },
        PgType::Timestamp => {
            if is_one_of(v, TEMPORAL_FUNCTIONS) {
                return Some(v.to_string());
            }
            let ok = NaiveDateTime::parse_from_str(v, DATETIME_FORMAT).is_ok()
                || DateTime::parse_from_rfc3339(v).is_ok()
                || NaiveDate::parse_from_str(v, DATE_FORMAT).is_ok();
            ok.then(|| quote_literal(v))
        }
        PgType::Date => {
            if is_one_of(v, TEMPORAL_FUNCTIONS) {
                return Some(v.to_string());
            }
            let ok = NaiveDate::parse_from_str(v, DATE_FORMAT).is_ok()
                || NaiveDateTime::parse_from_str(v, DATETIME_FORMAT).is_ok();
            ok.then(|| quote_literal(v))
        }
        PgType::Time => {
            if is_one_of(v, TEMPORAL_FUNCTIONS) {
                return Some(v.to_string());
            }
            NaiveTime::parse_from_str(v, TIME_FORMAT)
                .is_ok()
                .then(|| quote_literal(v))
        }
        PgType::Uuid => {
            if is_one_of(v, UUID_FUNCTIONS) {
                return Some(v.to_string());
            }
            let shaped = v.len() == 36 && v.matches('-').count() == 4;
            shaped.then(|| quote_literal(v))
        }
        PgType::SmallInt
        | PgType::Integer
        | PgType::BigInt
        | PgType::Real
        | PgType::DoublePrecision
        | PgType::Numeric
        | PgType::Money
        | PgType::Bytea
        | PgType::Interval
        | PgType::Json
        | PgType::Jsonb
        | PgType::Inet
        | PgType::Cidr
        | PgType::Macaddr
        | PgType::Point
        | PgType::Line
        | PgType::Box
        | PgType::Circle => Some(value.to_string()),
    }
}
