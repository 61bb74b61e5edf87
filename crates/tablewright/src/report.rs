use std::fmt;

/// Which best-effort sub-step produced a [`Warning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningStep {
    TableComment,
    ColumnComment,
    /// The pre-emptive `SET NOT NULL` before adding a primary key.
    PrimaryKeyNotNull,
    /// Granting a view to one of the baseline roles.
    BaselineGrant,
    /// Looking up roles that already read the schema.
    ExtraGrantDiscovery,
    /// Granting a view to a discovered role.
    ExtraGrant,
    /// A field's semantic type was not recognized and became `VARCHAR(255)`.
    UnrecognizedType,
    /// A field's default did not validate for its type and was left out.
    DroppedDefault,
    /// Mirroring a schema into the schema registry table.
    SchemaRegistry,
}

impl fmt::Display for WarningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TableComment => "table comment",
            Self::ColumnComment => "column comment",
            Self::PrimaryKeyNotNull => "primary key not-null",
            Self::BaselineGrant => "baseline grant",
            Self::ExtraGrantDiscovery => "grantee discovery",
            Self::ExtraGrant => "grant",
            Self::UnrecognizedType => "unrecognized type",
            Self::DroppedDefault => "dropped default",
            Self::SchemaRegistry => "schema registry",
        };
        f.write_str(s)
    }
}

/// A non-fatal failure during an otherwise successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub step: WarningStep,
    /// The statement that failed, if the warning came from one.
    pub sql: Option<String>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// What a mutating operation did.
///
/// `statements` holds every statement that succeeded, in execution order.
/// `warnings` holds every best-effort step that did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    pub statements: Vec<String>,
    pub warnings: Vec<Warning>,
}

impl Applied {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn warnings_for(&self, step: WarningStep) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.step == step)
    }

    pub(crate) fn applied(&mut self, sql: impl Into<String>) {
        self.statements.push(sql.into());
    }

    /// Record a warning and log it.
    pub(crate) fn warn(
        &mut self,
        step: WarningStep,
        sql: Option<&str>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        match sql {
            Some(sql) => tracing::warn!(step = %step, sql = %sql, "{message}"),
            None => tracing::warn!(step = %step, "{message}"),
        }
        self.warnings.push(Warning {
            step,
            sql: sql.map(str::to_string),
            message,
        });
    }
}
