//! Table-level CRUD on top of the clause builder.
//!
//! An [`Entity`] pairs an [`EntityDescriptor`] with an [`Executor`]. Concrete
//! models are just values: a `users` entity and a `posts` entity are the same
//! type with different descriptors.
//!
//! ```ignore
//! use pgrecord::{Entity, EntityDescriptor, PoolExecutor, fields};
//!
//! let users = Entity::new(
//!     EntityDescriptor::new("users")?.fields(["name", "email"])?,
//!     PoolExecutor::new(pool),
//! );
//!
//! let created = users.create(&fields! { "name" => "alice", "email" => "a@example.com" }).await?;
//! let alice = users.find_by_id(created.id.clone().unwrap()).await?;
//! let active = users.find(&fields! { "name" => "alice" }).await?;
//! users.update(&fields! { "email" => "alice@example.com" }, 1).await?;
//! users.delete(1).await?;
//! ```

use crate::clause::ClauseBuilder;
use crate::descriptor::EntityDescriptor;
use crate::error::{RecordError, RecordResult};
use crate::executor::Executor;
use crate::fields::{Fields, Record};
use crate::value::Value;
use std::sync::Arc;

/// Result of [`Entity::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    /// Rows inserted (1 on success).
    pub affected: u64,
    /// Primary key of the new row, as returned by `RETURNING`.
    pub id: Option<Value>,
}

/// CRUD operations for one table.
#[derive(Debug, Clone)]
pub struct Entity<E> {
    descriptor: Arc<EntityDescriptor>,
    executor: E,
}

impl<E: Executor> Entity<E> {
    pub fn new(descriptor: impl Into<Arc<EntityDescriptor>>, executor: E) -> Self {
        Self {
            descriptor: descriptor.into(),
            executor,
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn table(&self) -> &str {
        self.descriptor.table()
    }

    /// All rows matching every `column = value` pair in `filter`.
    ///
    /// An empty filter returns the whole table.
    pub async fn find(&self, filter: &Fields) -> RecordResult<Vec<Record>> {
        self.descriptor.check_fields(filter)?;
        let (sql, params) = self.select_sql(filter, None);
        trace_op(self.table(), "find");
        self.executor.query(&sql, &params).await
    }

    /// Same as [`find`](Self::find).
    pub async fn find_where(&self, filter: &Fields) -> RecordResult<Vec<Record>> {
        self.find(filter).await
    }

    /// First row matching `filter`, or `None`.
    pub async fn find_one(&self, filter: &Fields) -> RecordResult<Option<Record>> {
        self.descriptor.check_fields(filter)?;
        let (sql, params) = self.select_sql(filter, Some(1));
        trace_op(self.table(), "find_one");
        let rows = self.executor.query(&sql, &params).await?;
        Ok(rows.into_iter().next())
    }

    /// Row whose primary key equals `id`, or `None`.
    pub async fn find_by_id(&self, id: impl Into<Value>) -> RecordResult<Option<Record>> {
        let id = require_id(id, "find_by_id")?;
        let mut filter = Fields::with_capacity(1);
        filter.set(self.descriptor.primary_key_column(), id);
        self.find_one(&filter).await
    }

    /// Insert one row and return the affected count plus the generated key.
    pub async fn create(&self, fields: &Fields) -> RecordResult<Created> {
        if fields.is_empty() {
            return Err(RecordError::empty_fields("create"));
        }
        self.descriptor.check_fields(fields)?;

        let insert = ClauseBuilder::new().insert(fields)?;
        let pk = self.descriptor.primary_key_column();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            self.table(),
            insert.column_list(),
            insert.placeholder_list(),
            pk
        );

        trace_op(self.table(), "create");
        let rows = self.executor.query(&sql, &insert.values).await?;
        let id = rows
            .first()
            .and_then(|row| row.get(pk).or_else(|| row.values().next()))
            .cloned();
        Ok(Created {
            affected: rows.len() as u64,
            id,
        })
    }

    /// Update the row with primary key `id`; returns the affected count.
    pub async fn update(&self, fields: &Fields, id: impl Into<Value>) -> RecordResult<u64> {
        if fields.is_empty() {
            return Err(RecordError::validation("update requires at least one field"));
        }
        let id = require_id(id, "update")?;
        self.descriptor.check_fields(fields)?;

        let mut builder = ClauseBuilder::new();
        let set = builder.set(fields)?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.table(),
            set.sql,
            self.descriptor.primary_key_column(),
            builder.placeholder()
        );
        let mut params = set.values;
        params.push(id);

        trace_op(self.table(), "update");
        self.executor.execute(&sql, &params).await
    }

    /// Delete the row with primary key `id`; returns the affected count
    /// (0 if it did not exist).
    pub async fn delete(&self, id: impl Into<Value>) -> RecordResult<u64> {
        let id = require_id(id, "delete")?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            self.table(),
            self.descriptor.primary_key_column(),
            ClauseBuilder::new().placeholder()
        );

        trace_op(self.table(), "delete");
        self.executor.execute(&sql, &[id]).await
    }

    fn select_sql(&self, filter: &Fields, limit: Option<u32>) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT * FROM {}", self.table());
        let clause = ClauseBuilder::new().where_eq(filter);
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause.sql);
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        (sql, clause.values)
    }
}

fn require_id(id: impl Into<Value>, operation: &str) -> RecordResult<Value> {
    let id = id.into();
    if id.is_null() {
        return Err(RecordError::validation(format!(
            "{operation} requires a primary key value"
        )));
    }
    Ok(id)
}

#[cfg(feature = "tracing")]
fn trace_op(table: &str, operation: &'static str) {
    tracing::debug!(target: "pgrecord.entity", table, operation);
}

#[cfg(not(feature = "tracing"))]
fn trace_op(_: &str, _: &'static str) {}
