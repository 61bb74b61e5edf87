use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A column as the catalog reports it.
///
/// Read fresh on every call; the engine keeps no copy between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    /// Column name
    pub name: String,
    /// Type as rendered by `format_type()`, e.g. `character varying(255)`
    pub data_type: String,
    /// Whether the column allows NULL
    pub nullable: bool,
    /// Default expression text, if any
    pub default: Option<String>,
    /// Column comment, if any
    pub comment: Option<String>,
    /// Whether the column is part of the primary key
    pub primary_key: bool,
    /// Whether the column is part of a unique constraint
    pub unique: bool,
    /// 1-based ordinal position
    pub position: i32,
    /// Maximum length for character types
    pub max_length: Option<i32>,
    /// Numeric precision
    pub precision: Option<i32>,
    /// Numeric scale
    pub scale: Option<i32>,
}

/// Kind of table constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
    Exclusion,
}

impl ConstraintKind {
    /// Decode `pg_constraint.contype`.
    pub fn from_contype(code: &str) -> Option<Self> {
        match code {
            "p" => Some(Self::PrimaryKey),
            "f" => Some(Self::ForeignKey),
            "u" => Some(Self::Unique),
            "c" => Some(Self::Check),
            "x" => Some(Self::Exclusion),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PrimaryKey => "primary_key",
            Self::ForeignKey => "foreign_key",
            Self::Unique => "unique",
            Self::Check => "check",
            Self::Exclusion => "exclusion",
        };
        f.write_str(s)
    }
}

/// A constraint on a live table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    /// Participating columns, in constraint order.
    pub columns: Vec<String>,
    /// Full definition as rendered by `pg_get_constraintdef()`.
    pub definition: String,
    /// The CHECK clause, for check constraints.
    pub check: Option<String>,
}

/// An index on a live table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    /// Indexed columns, in index order.
    pub columns: Vec<String>,
    pub unique: bool,
    /// Whether this index backs the primary key.
    pub primary: bool,
    /// Access method name (`btree`, `gin`, ...).
    pub method: String,
    /// `CREATE INDEX` text as reported by `pg_indexes.indexdef`.
    pub definition: String,
}

/// Index access methods accepted by `create_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexMethod {
    #[default]
    BTree,
    Hash,
    Gist,
    Gin,
    Brin,
    SpGist,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown index method {0:?}")]
pub struct UnknownIndexMethod(pub String);

impl FromStr for IndexMethod {
    type Err = UnknownIndexMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "btree" => Ok(Self::BTree),
            "hash" => Ok(Self::Hash),
            "gist" => Ok(Self::Gist),
            "gin" => Ok(Self::Gin),
            "brin" => Ok(Self::Brin),
            "spgist" => Ok(Self::SpGist),
            _ => Err(UnknownIndexMethod(s.to_string())),
        }
    }
}

impl fmt::Display for IndexMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BTree => "btree",
            Self::Hash => "hash",
            Self::Gist => "gist",
            Self::Gin => "gin",
            Self::Brin => "brin",
            Self::SpGist => "spgist",
        };
        f.write_str(s)
    }
}

/// Everything the catalog knows about one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub schema: String,
    pub name: String,
    pub comment: Option<String>,
    pub columns: Vec<LiveColumn>,
    pub constraints: Vec<Constraint>,
    pub indexes: Vec<Index>,
}

impl TableDefinition {
    pub fn column(&self, name: &str) -> Option<&LiveColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary-key column names, in constraint order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::PrimaryKey)
            .map(|c| c.columns.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
