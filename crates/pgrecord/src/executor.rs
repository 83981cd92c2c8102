//! The statement execution contract entities are built on.

use crate::error::RecordResult;
use crate::fields::{Fields, Record};
use crate::value::Value;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Runs one parameterized statement.
///
/// Implementations own connection handling. The entity layer calls exactly
/// one method per operation, never holds anything between calls, and passes
/// failures through untouched, so retry and timeout policy belong here.
///
/// Tests can implement this directly to observe or script what the entity
/// layer sends without a database.
pub trait Executor: Send + Sync {
    /// Run a statement that returns rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = RecordResult<Vec<Record>>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = RecordResult<u64>> + Send;
}

/// Borrow values as the parameter slice `tokio_postgres` expects.
pub(crate) fn to_sql_params(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl Executor for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> RecordResult<Vec<Record>> {
        let rows = tokio_postgres::Client::query(self, sql, &to_sql_params(params)).await?;
        rows.iter().map(Fields::from_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> RecordResult<u64> {
        Ok(tokio_postgres::Client::execute(self, sql, &to_sql_params(params)).await?)
    }
}

impl<E: Executor> Executor for &E {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = RecordResult<Vec<Record>>> + Send {
        (**self).query(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = RecordResult<u64>> + Send {
        (**self).execute(sql, params)
    }
}

impl<E: Executor> Executor for Arc<E> {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = RecordResult<Vec<Record>>> + Send {
        (**self).query(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = RecordResult<u64>> + Send {
        (**self).execute(sql, params)
    }
}
