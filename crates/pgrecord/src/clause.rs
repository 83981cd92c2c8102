//! Clause builder: field maps in, SQL fragments and bound values out.
//!
//! Column names are copied into the SQL text verbatim; callers restrict them
//! to known identifiers before they get here (see
//! [`EntityDescriptor::check_fields`](crate::EntityDescriptor::check_fields)).
//! Values are never copied into SQL text; each becomes a placeholder and is
//! returned in the matching position of the value list.
//!
//! ```ignore
//! use pgrecord::{clause, fields};
//!
//! let w = clause::build_where_clause(&fields! { "a" => 1, "b" => 2 });
//! assert_eq!(w.sql, "a = $1 AND b = $2");
//! ```

use crate::error::{RecordError, RecordResult};
use crate::fields::Fields;
use crate::value::Value;

/// Placeholder token convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// PostgreSQL: `$1`, `$2`, ...
    #[default]
    Dollar,
    /// `?` for every parameter.
    Question,
}

/// Output of [`build_insert_clause`]: three sequences of equal length.
///
/// `columns[i]` is written with `values[i]`, bound through `placeholders[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertClause {
    pub columns: Vec<String>,
    pub placeholders: Vec<String>,
    pub values: Vec<Value>,
}

impl InsertClause {
    /// `a, b, c`
    pub fn column_list(&self) -> String {
        self.columns.join(", ")
    }

    /// `$1, $2, $3`
    pub fn placeholder_list(&self) -> String {
        self.placeholders.join(", ")
    }
}

/// A rendered SET or WHERE fragment with its bound values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clause {
    pub sql: String,
    pub values: Vec<Value>,
}

impl Clause {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Numbers placeholders across the fragments of one statement.
///
/// A builder is cheap and meant to live for a single statement, so that a
/// SET clause and the WHERE clause after it share one `$n` sequence.
#[derive(Debug, Clone)]
pub struct ClauseBuilder {
    style: PlaceholderStyle,
    next: usize,
}

impl Default for ClauseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseBuilder {
    /// `$n` placeholders starting at `$1`.
    pub fn new() -> Self {
        Self::with_style(PlaceholderStyle::Dollar)
    }

    pub fn with_style(style: PlaceholderStyle) -> Self {
        Self { style, next: 1 }
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// How many placeholders have been handed out so far.
    pub fn bound(&self) -> usize {
        self.next - 1
    }

    /// Allocate the next placeholder token.
    pub fn placeholder(&mut self) -> String {
        let n = self.next;
        self.next += 1;
        match self.style {
            PlaceholderStyle::Dollar => format!("${n}"),
            PlaceholderStyle::Question => "?".to_string(),
        }
    }

    /// Column, placeholder and value lists for an INSERT.
    pub fn insert(&mut self, fields: &Fields) -> RecordResult<InsertClause> {
        if fields.is_empty() {
            return Err(RecordError::empty_fields("insert"));
        }

        let mut clause = InsertClause {
            columns: Vec::with_capacity(fields.len()),
            placeholders: Vec::with_capacity(fields.len()),
            values: Vec::with_capacity(fields.len()),
        };
        for (name, value) in fields.iter() {
            clause.columns.push(name.to_string());
            clause.placeholders.push(self.placeholder());
            clause.values.push(value.clone());
        }
        Ok(clause)
    }

    /// `a = $1, b = $2` for an UPDATE.
    pub fn set(&mut self, fields: &Fields) -> RecordResult<Clause> {
        if fields.is_empty() {
            return Err(RecordError::empty_fields("update"));
        }
        Ok(self.join_eq(fields, ", "))
    }

    /// `a = $1 AND b = $2`; empty input gives an empty clause (no filter).
    pub fn where_eq(&mut self, fields: &Fields) -> Clause {
        self.join_eq(fields, " AND ")
    }

    fn join_eq(&mut self, fields: &Fields, sep: &str) -> Clause {
        let mut clause = Clause {
            sql: String::new(),
            values: Vec::with_capacity(fields.len()),
        };
        for (i, (name, value)) in fields.iter().enumerate() {
            if i > 0 {
                clause.sql.push_str(sep);
            }
            let placeholder = self.placeholder();
            clause.sql.push_str(name);
            clause.sql.push_str(" = ");
            clause.sql.push_str(&placeholder);
            clause.values.push(value.clone());
        }
        clause
    }
}

/// INSERT triples numbered from `$1`. Fails on an empty map.
pub fn build_insert_clause(fields: &Fields) -> RecordResult<InsertClause> {
    ClauseBuilder::new().insert(fields)
}

/// SET clause numbered from `$1`. Fails on an empty map.
pub fn build_set_clause(fields: &Fields) -> RecordResult<Clause> {
    ClauseBuilder::new().set(fields)
}

/// WHERE clause numbered from `$1`. An empty map yields an empty clause.
pub fn build_where_clause(fields: &Fields) -> Clause {
    ClauseBuilder::new().where_eq(fields)
}
