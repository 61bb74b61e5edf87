use std::fmt;

/// Length of the bounded character type used for `string`/`varchar` fields
/// and for unrecognized semantic types.
pub const VARCHAR_LEN: u32 = 255;

/// Semantic data types, as tagged by the interface-configuration layer.
///
/// Tags are matched case-insensitively and several aliases collapse onto one
/// variant (`int`/`integer`, `datetime`/`timestamp`, ...). A tag outside the
/// vocabulary parses to [`SemanticType::Unrecognized`], which maps to a
/// bounded `VARCHAR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Integer,
    BigInt,
    SmallInt,
    /// `string` or `varchar`
    String,
    Text,
    Boolean,
    /// `datetime` or `timestamp`
    DateTime,
    Date,
    Time,
    /// `decimal` or `numeric`
    Decimal,
    /// `float` or `real`
    Float,
    Double,
    Json,
    Jsonb,
    Uuid,
    Inet,
    Cidr,
    Macaddr,
    Bytea,
    Money,
    Interval,
    Point,
    Line,
    Box,
    Circle,
    Unrecognized,
}

impl SemanticType {
    /// Parse a semantic type tag. Never fails: unknown tags become
    /// [`SemanticType::Unrecognized`].
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Self::Integer,
            "bigint" => Self::BigInt,
            "smallint" => Self::SmallInt,
            "string" | "varchar" => Self::String,
            "text" => Self::Text,
            "boolean" | "bool" => Self::Boolean,
            "datetime" | "timestamp" => Self::DateTime,
            "date" => Self::Date,
            "time" => Self::Time,
            "decimal" | "numeric" => Self::Decimal,
            "float" | "real" => Self::Float,
            "double" => Self::Double,
            "json" => Self::Json,
            "jsonb" => Self::Jsonb,
            "uuid" => Self::Uuid,
            "inet" => Self::Inet,
            "cidr" => Self::Cidr,
            "macaddr" => Self::Macaddr,
            "bytea" => Self::Bytea,
            "money" => Self::Money,
            "interval" => Self::Interval,
            "point" => Self::Point,
            "line" => Self::Line,
            "box" => Self::Box,
            "circle" => Self::Circle,
            _ => Self::Unrecognized,
        }
    }

    /// Whether the tag was part of the known vocabulary.
    pub fn is_recognized(self) -> bool {
        self != Self::Unrecognized
    }

    /// The native Postgres type this semantic type is stored as.
    pub fn pg_type(self) -> PgType {
        match self {
            Self::Integer => PgType::Integer,
            Self::BigInt => PgType::BigInt,
            Self::SmallInt => PgType::SmallInt,
            Self::String => PgType::Varchar,
            Self::Text => PgType::Text,
            Self::Boolean => PgType::Boolean,
            Self::DateTime => PgType::Timestamp,
            Self::Date => PgType::Date,
            Self::Time => PgType::Time,
            Self::Decimal => PgType::Numeric,
            Self::Float => PgType::Real,
            Self::Double => PgType::DoublePrecision,
            Self::Json => PgType::Json,
            Self::Jsonb => PgType::Jsonb,
            Self::Uuid => PgType::Uuid,
            Self::Inet => PgType::Inet,
            Self::Cidr => PgType::Cidr,
            Self::Macaddr => PgType::Macaddr,
            Self::Bytea => PgType::Bytea,
            Self::Money => PgType::Money,
            Self::Interval => PgType::Interval,
            Self::Point => PgType::Point,
            Self::Line => PgType::Line,
            Self::Box => PgType::Box,
            Self::Circle => PgType::Circle,
            Self::Unrecognized => PgType::Varchar,
        }
    }
}

/// Postgres column types the engine creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PgType {
    /// SMALLINT (2 bytes)
    SmallInt,
    /// INTEGER (4 bytes)
    Integer,
    /// BIGINT (8 bytes)
    BigInt,
    /// REAL (4 bytes floating point)
    Real,
    /// DOUBLE PRECISION (8 bytes floating point)
    DoublePrecision,
    /// NUMERIC (arbitrary precision)
    Numeric,
    /// MONEY
    Money,
    /// BOOLEAN
    Boolean,
    /// VARCHAR(255)
    Varchar,
    /// TEXT
    Text,
    /// BYTEA (binary)
    Bytea,
    /// TIMESTAMP (without time zone)
    Timestamp,
    /// DATE
    Date,
    /// TIME (without time zone)
    Time,
    /// INTERVAL
    Interval,
    /// UUID
    Uuid,
    /// JSON
    Json,
    /// JSONB
    Jsonb,
    /// INET
    Inet,
    /// CIDR
    Cidr,
    /// MACADDR
    Macaddr,
    /// POINT
    Point,
    /// LINE
    Line,
    /// BOX
    Box,
    /// CIRCLE
    Circle,
}

impl PgType {
    /// The spelling `format_type()` reports for a column of this type.
    ///
    /// Live columns are compared against this, so a column created from a
    /// field compares equal to that field on the next pass.
    pub fn catalog_name(&self) -> &'static str {
        match self {
            PgType::SmallInt => "smallint",
            PgType::Integer => "integer",
            PgType::BigInt => "bigint",
            PgType::Real => "real",
            PgType::DoublePrecision => "double precision",
            PgType::Numeric => "numeric",
            PgType::Money => "money",
            PgType::Boolean => "boolean",
            PgType::Varchar => "character varying(255)",
            PgType::Text => "text",
            PgType::Bytea => "bytea",
            PgType::Timestamp => "timestamp without time zone",
            PgType::Date => "date",
            PgType::Time => "time without time zone",
            PgType::Interval => "interval",
            PgType::Uuid => "uuid",
            PgType::Json => "json",
            PgType::Jsonb => "jsonb",
            PgType::Inet => "inet",
            PgType::Cidr => "cidr",
            PgType::Macaddr => "macaddr",
            PgType::Point => "point",
            PgType::Line => "line",
            PgType::Box => "box",
            PgType::Circle => "circle",
        }
    }

    /// Whether a live column's reported type is this type.
    pub fn matches_catalog(&self, live: &str) -> bool {
        live.trim().eq_ignore_ascii_case(self.catalog_name())
    }
}

impl fmt::Display for PgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgType::SmallInt => write!(f, "SMALLINT"),
            PgType::Integer => write!(f, "INTEGER"),
            PgType::BigInt => write!(f, "BIGINT"),
            PgType::Real => write!(f, "REAL"),
            PgType::DoublePrecision => write!(f, "DOUBLE PRECISION"),
            PgType::Numeric => write!(f, "NUMERIC"),
            PgType::Money => write!(f, "MONEY"),
            PgType::Boolean => write!(f, "BOOLEAN"),
            PgType::Varchar => write!(f, "VARCHAR({VARCHAR_LEN})"),
            PgType::Text => write!(f, "TEXT"),
            PgType::Bytea => write!(f, "BYTEA"),
            PgType::Timestamp => write!(f, "TIMESTAMP"),
            PgType::Date => write!(f, "DATE"),
            PgType::Time => write!(f, "TIME"),
            PgType::Interval => write!(f, "INTERVAL"),
            PgType::Uuid => write!(f, "UUID"),
            PgType::Json => write!(f, "JSON"),
            PgType::Jsonb => write!(f, "JSONB"),
            PgType::Inet => write!(f, "INET"),
            PgType::Cidr => write!(f, "CIDR"),
            PgType::Macaddr => write!(f, "MACADDR"),
            PgType::Point => write!(f, "POINT"),
            PgType::Line => write!(f, "LINE"),
            PgType::Box => write!(f, "BOX"),
            PgType::Circle => write!(f, "CIRCLE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_semantic_tags() {
        let cases = [
            ("integer", PgType::Integer),
            ("int", PgType::Integer),
            ("bigint", PgType::BigInt),
            ("string", PgType::Varchar),
            ("varchar", PgType::Varchar),
            ("text", PgType::Text),
            ("boolean", PgType::Boolean),
            ("bool", PgType::Boolean),
            ("datetime", PgType::Timestamp),
            ("timestamp", PgType::Timestamp),
            ("date", PgType::Date),
            ("time", PgType::Time),
            ("decimal", PgType::Numeric),
            ("numeric", PgType::Numeric),
            ("float", PgType::Real),
            ("real", PgType::Real),
            ("double", PgType::DoublePrecision),
            ("json", PgType::Json),
            ("jsonb", PgType::Jsonb),
            ("uuid", PgType::Uuid),
            ("inet", PgType::Inet),
            ("cidr", PgType::Cidr),
            ("macaddr", PgType::Macaddr),
            ("bytea", PgType::Bytea),
            ("JSONB", PgType::Jsonb),
        ];
        for (tag, expected) in cases {
            assert_eq!(SemanticType::parse(tag).pg_type(), expected, "tag {tag}");
        }
    }

    #[test]
    fn unknown_tags_fall_back_to_bounded_varchar() {
        let ty = SemanticType::parse("unknown_type");
        assert!(!ty.is_recognized());
        assert_eq!(ty.pg_type(), PgType::Varchar);
        assert_eq!(ty.pg_type().to_string(), "VARCHAR(255)");
    }

    #[test]
    fn catalog_names_match_format_type() {
        assert!(PgType::Varchar.matches_catalog("character varying(255)"));
        assert!(PgType::Timestamp.matches_catalog("timestamp without time zone"));
        assert!(PgType::Text.matches_catalog("TEXT"));
        assert!(!PgType::Text.matches_catalog("character varying(255)"));
        assert!(!PgType::Varchar.matches_catalog("character varying(64)"));
    }
}
