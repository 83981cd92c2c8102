//! Static per-table configuration.

use crate::error::{RecordError, RecordResult};
use crate::fields::Fields;
use crate::ident::Ident;

/// Primary key column used when none is configured.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Table name, primary key and optional column allow-list of one entity.
///
/// Every name here is validated at construction, and incoming field maps are
/// checked against the allow-list by [`check_fields`](Self::check_fields)
/// before they are turned into SQL.
///
/// # Example
/// ```ignore
/// let users = EntityDescriptor::new("users")?
///     .fields(["name", "email"])?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    table: Ident,
    primary_key: Ident,
    fields: Option<Vec<Ident>>,
}

impl EntityDescriptor {
    /// Describe `table` with primary key `id` and no allow-list.
    pub fn new(table: &str) -> RecordResult<Self> {
        let table = Ident::parse(table.trim())
            .map_err(|e| RecordError::validation(format!("invalid table name: {e}")))?;
        Ok(Self {
            table,
            primary_key: Ident::column(DEFAULT_PRIMARY_KEY)?,
            fields: None,
        })
    }

    /// Override the primary key column.
    pub fn primary_key(mut self, column: &str) -> RecordResult<Self> {
        self.primary_key = Ident::column(column)?;
        Ok(self)
    }

    /// Declare the columns callers may write and filter on.
    ///
    /// The primary key is always permitted in addition to these.
    pub fn fields<I, S>(mut self, columns: I) -> RecordResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed: Vec<Ident> = Vec::new();
        for column in columns {
            let ident = Ident::column(column.as_ref())?;
            if !allowed.contains(&ident) {
                allowed.push(ident);
            }
        }
        self.fields = Some(allowed);
        Ok(self)
    }

    /// The table name as rendered in SQL.
    pub fn table(&self) -> &str {
        self.table.as_sql()
    }

    pub fn primary_key_column(&self) -> &str {
        self.primary_key.as_sql()
    }

    /// Declared columns, if an allow-list was configured.
    pub fn allowed_fields(&self) -> Option<impl Iterator<Item = &str>> {
        self.fields
            .as_ref()
            .map(|fields| fields.iter().map(Ident::as_sql))
    }

    /// Reject any name that is not a valid column or not in the allow-list.
    pub fn check_fields(&self, fields: &Fields) -> RecordResult<()> {
        for name in fields.names() {
            let ident = Ident::column(name).map_err(|e| {
                RecordError::validation(format!("invalid column `{name}` on {}: {e}", self.table))
            })?;
            if !self.permits(&ident) {
                return Err(RecordError::validation(format!(
                    "unknown column `{name}` on {}",
                    self.table
                )));
            }
        }
        Ok(())
    }

    fn permits(&self, column: &Ident) -> bool {
        if *column == self.primary_key {
            return true;
        }
        match &self.fields {
            Some(allowed) => allowed.contains(column),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn defaults_to_id_key() {
        let d = EntityDescriptor::new("users").unwrap();
        assert_eq!(d.table(), "users");
        assert_eq!(d.primary_key_column(), "id");
        assert!(d.allowed_fields().is_none());
    }

    #[test]
    fn rejects_bad_table_names() {
        assert!(EntityDescriptor::new("").is_err());
        assert!(EntityDescriptor::new("users; --").is_err());
        assert!(EntityDescriptor::new("public.users").is_ok());
    }

    #[test]
    fn rejects_qualified_primary_key() {
        let err = EntityDescriptor::new("users")
            .unwrap()
            .primary_key("users.id")
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn allow_list_is_enforced() {
        let d = EntityDescriptor::new("users")
            .unwrap()
            .fields(["name", "email", "name"])
            .unwrap();
        assert_eq!(d.allowed_fields().unwrap().collect::<Vec<_>>(), ["name", "email"]);

        assert!(d.check_fields(&fields! { "name" => "x", "id" => 1 }).is_ok());
        let err = d.check_fields(&fields! { "password" => "x" }).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: unknown column `password` on users");
    }

    #[test]
    fn names_are_validated_without_allow_list() {
        let d = EntityDescriptor::new("users").unwrap();
        assert!(d.check_fields(&fields! { "anything" => 1 }).is_ok());
        assert!(d.check_fields(&fields! { "1=1 OR name" => 1 }).is_err());
    }
}
