use crate::{PgType, SemanticType};

/// One desired column, as declared by the interface-configuration layer.
///
/// Descriptors are built fresh for every reconciliation call and never
/// stored. Storage names must be unique within one field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredField {
    /// Human-facing name, used in the column comment.
    pub display_name: String,
    /// Column name in the database.
    pub name: String,
    /// Semantic type tag (`integer`, `string`, `datetime`, ...).
    pub data_type: String,
    /// Whether the column allows NULL.
    pub nullable: bool,
    /// Raw default value. `None` means no default was requested.
    pub default: Option<String>,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
    /// Whether the column has a unique constraint.
    pub unique: bool,
    /// CHECK expression, without the surrounding `CHECK (...)`.
    pub check: Option<String>,
    /// Free-text description, used in the column comment.
    pub description: Option<String>,
    /// Column position at creation time.
    pub order: i32,
}

impl DesiredField {
    /// A nullable field with no default, key, or constraints.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            display_name: String::new(),
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
            primary_key: false,
            unique: false,
            check: None,
            description: None,
            order: 0,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn check(mut self, expr: impl Into<String>) -> Self {
        self.check = Some(expr.into());
        self
    }

    pub fn describe(
        mut self,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.display_name = display_name.into();
        self.description = Some(description.into());
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn semantic_type(&self) -> SemanticType {
        SemanticType::parse(&self.data_type)
    }

    pub fn pg_type(&self) -> PgType {
        self.semantic_type().pg_type()
    }

    /// Nullability as it will be enforced: primary-key columns never allow NULL.
    pub fn allows_null(&self) -> bool {
        self.nullable && !self.primary_key
    }

    /// Column comment text, if the field has a non-empty description.
    pub fn comment(&self) -> Option<String> {
        let description = self.description.as_deref().map(str::trim).unwrap_or("");
        if description.is_empty() {
            return None;
        }
        let display = self.display_name.trim();
        if display.is_empty() {
            Some(description.to_string())
        } else {
            Some(format!("{display} - {description}"))
        }
    }
}

/// Order fields for table creation: by `order`, ties keep their list position.
pub fn creation_order(fields: &[DesiredField]) -> Vec<&DesiredField> {
    let mut sorted: Vec<&DesiredField> = fields.iter().collect();
    sorted.sort_by_key(|f| f.order);
    sorted
}

/// Primary-key column names, in creation order.
pub fn primary_key_columns(fields: &[DesiredField]) -> Vec<String> {
    creation_order(fields)
        .into_iter()
        .filter(|f| f.primary_key)
        .map(|f| f.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_text() {
        let plain = DesiredField::new("a", "text");
        assert_eq!(plain.comment(), None);

        let described = DesiredField::new("a", "text").describe("Name", "the user's name");
        assert_eq!(described.comment().as_deref(), Some("Name - the user's name"));

        let anonymous = DesiredField::new("a", "text").describe("", "only a description");
        assert_eq!(anonymous.comment().as_deref(), Some("only a description"));

        let blank = DesiredField::new("a", "text").describe("Name", "   ");
        assert_eq!(blank.comment(), None);
    }

    #[test]
    fn primary_keys_follow_order_not_list_position() {
        let fields = vec![
            DesiredField::new("code", "string").primary_key().order(2),
            DesiredField::new("id", "integer").primary_key().order(1),
            DesiredField::new("note", "text").order(3),
        ];
        assert_eq!(primary_key_columns(&fields), vec!["id", "code"]);
    }

    #[test]
    fn primary_keys_never_allow_null() {
        let mut field = DesiredField::new("id", "integer").primary_key();
        field.nullable = true;
        assert!(!field.allows_null());
        assert!(DesiredField::new("x", "text").allows_null());
    }
}
