//! Statement monitoring: timing, counters and SQL logging.
//!
//! [`InstrumentedExecutor`] wraps any [`Executor`], records every statement
//! into a shared [`StatsMonitor`] and, with the `tracing` feature, emits one
//! event per statement on the `pgrecord.sql` target.
//!
//! ```ignore
//! let exec = InstrumentedExecutor::new(PoolExecutor::new(pool)).max_sql_length(120);
//! let stats = exec.monitor();
//! let users = Entity::new(descriptor, exec);
//! // ...
//! println!("{:?}", stats.stats());
//! ```

use crate::error::{RecordError, RecordResult};
use crate::executor::Executor;
use crate::fields::Record;
use crate::value::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// The type of SQL statement being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// Anything else (DDL, custom SQL)
    Other,
}

impl QueryType {
    /// Classify a statement by its leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or_default();

        if keyword.eq_ignore_ascii_case("SELECT") {
            QueryType::Select
        } else if keyword.eq_ignore_ascii_case("INSERT") {
            QueryType::Insert
        } else if keyword.eq_ignore_ascii_case("UPDATE") {
            QueryType::Update
        } else if keyword.eq_ignore_ascii_case("DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

/// Snapshot of collected statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    /// Total number of statements run.
    pub total_queries: u64,
    /// Statements that returned an error.
    pub failed_queries: u64,
    /// Total execution time.
    pub total_duration: Duration,
    /// Slowest single statement.
    pub max_duration: Duration,
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
}

/// Lock-free statement counters.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    total_queries: AtomicU64,
    failed_queries: AtomicU64,
    total_duration_nanos: AtomicU64,
    max_duration_nanos: AtomicU64,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
}

impl StatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished statement.
    pub fn record(&self, query_type: QueryType, elapsed: Duration, failed: bool) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);

        self.total_queries.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }
        self.total_duration_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.max_duration_nanos.fetch_max(nanos, Ordering::Relaxed);

        let counter = match query_type {
            QueryType::Select => &self.select_count,
            QueryType::Insert => &self.insert_count,
            QueryType::Update => &self.update_count,
            QueryType::Delete => &self.delete_count,
            QueryType::Other => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> QueryStats {
        QueryStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        for counter in [
            &self.total_queries,
            &self.failed_queries,
            &self.total_duration_nanos,
            &self.max_duration_nanos,
            &self.select_count,
            &self.insert_count,
            &self.update_count,
            &self.delete_count,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Outcome passed to the SQL log line.
enum Outcome<'a> {
    Rows(usize),
    Affected(u64),
    Failed(&'a RecordError),
}

/// An [`Executor`] wrapper that times, counts and logs every statement.
#[derive(Debug, Clone)]
pub struct InstrumentedExecutor<E> {
    inner: E,
    monitor: Arc<StatsMonitor>,
    max_sql_length: Option<usize>,
}

impl<E: Executor> InstrumentedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            monitor: Arc::new(StatsMonitor::new()),
            max_sql_length: Some(200),
        }
    }

    /// Share an existing monitor, e.g. one per process across several pools.
    pub fn with_monitor(mut self, monitor: Arc<StatsMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Set maximum SQL length to log (in bytes, cut on a char boundary).
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn monitor(&self) -> Arc<StatsMonitor> {
        Arc::clone(&self.monitor)
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub(crate) fn truncate_sql<'s>(&self, sql: &'s str) -> std::borrow::Cow<'s, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => {
                let mut end = max;
                while !sql.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &sql[..end]).into()
            }
            _ => sql.into(),
        }
    }

    fn finish(&self, sql: &str, param_count: usize, started: Instant, outcome: Outcome<'_>) {
        let query_type = QueryType::from_sql(sql);
        let elapsed = started.elapsed();
        self.monitor
            .record(query_type, elapsed, matches!(outcome, Outcome::Failed(_)));
        self.log(query_type, sql, param_count, elapsed, outcome);
    }

    #[cfg(feature = "tracing")]
    fn log(
        &self,
        query_type: QueryType,
        sql: &str,
        param_count: usize,
        elapsed: Duration,
        outcome: Outcome<'_>,
    ) {
        let sql = self.truncate_sql(sql);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        match outcome {
            Outcome::Rows(rows) => tracing::debug!(
                target: "pgrecord.sql",
                query_type = ?query_type,
                param_count,
                elapsed_ms,
                rows,
                sql = %sql,
            ),
            Outcome::Affected(affected) => tracing::debug!(
                target: "pgrecord.sql",
                query_type = ?query_type,
                param_count,
                elapsed_ms,
                affected,
                sql = %sql,
            ),
            Outcome::Failed(error) => tracing::warn!(
                target: "pgrecord.sql",
                query_type = ?query_type,
                param_count,
                elapsed_ms,
                error = %error,
                sql = %sql,
            ),
        }
    }

    #[cfg(not(feature = "tracing"))]
    fn log(&self, _: QueryType, _: &str, _: usize, _: Duration, _: Outcome<'_>) {}
}

impl<E: Executor> Executor for InstrumentedExecutor<E> {
    async fn query(&self, sql: &str, params: &[Value]) -> RecordResult<Vec<Record>> {
        let started = Instant::now();
        let result = self.inner.query(sql, params).await;
        let outcome = match &result {
            Ok(rows) => Outcome::Rows(rows.len()),
            Err(e) => Outcome::Failed(e),
        };
        self.finish(sql, params.len(), started, outcome);
        result
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> RecordResult<u64> {
        let started = Instant::now();
        let result = self.inner.execute(sql, params).await;
        let outcome = match &result {
            Ok(affected) => Outcome::Affected(*affected),
            Err(e) => Outcome::Failed(e),
        };
        self.finish(sql, params.len(), started, outcome);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatabaseError;

    struct Scripted {
        fail: bool,
    }

    impl Executor for Scripted {
        async fn query(&self, _: &str, _: &[Value]) -> RecordResult<Vec<Record>> {
            if self.fail {
                return Err(DatabaseError::Other("boom".into()).into());
            }
            Ok(vec![Record::new(), Record::new()])
        }

        async fn execute(&self, _: &str, _: &[Value]) -> RecordResult<u64> {
            Ok(1)
        }
    }

    #[test]
    fn query_type_detection() {
        assert_eq!(QueryType::from_sql("SELECT * FROM users"), QueryType::Select);
        assert_eq!(QueryType::from_sql("  select 1"), QueryType::Select);
        assert_eq!(
            QueryType::from_sql("INSERT INTO users (name) VALUES ($1)"),
            QueryType::Insert
        );
        assert_eq!(QueryType::from_sql("UPDATE users SET a = $1"), QueryType::Update);
        assert_eq!(QueryType::from_sql("delete FROM users"), QueryType::Delete);
        assert_eq!(QueryType::from_sql("CREATE TABLE t (id int)"), QueryType::Other);
        assert_eq!(QueryType::from_sql(""), QueryType::Other);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let exec = InstrumentedExecutor::new(Scripted { fail: false }).max_sql_length(10);
        assert_eq!(exec.truncate_sql("SELECT * FROM users"), "SELECT * F...");
        assert_eq!(exec.truncate_sql("SELECT 1"), "SELECT 1");

        let exec = exec.max_sql_length(2);
        assert_eq!(exec.truncate_sql("héllo"), "h...");
    }

    #[tokio::test]
    async fn counts_statements_by_type() {
        let exec = InstrumentedExecutor::new(Scripted { fail: false });
        exec.query("SELECT * FROM t", &[]).await.unwrap();
        exec.execute("DELETE FROM t WHERE id = $1", &[Value::Int(1)])
            .await
            .unwrap();
        exec.execute("UPDATE t SET a = $1 WHERE id = $2", &[Value::Int(1), Value::Int(2)])
            .await
            .unwrap();

        let stats = exec.monitor().stats();
        assert_eq!(stats.total_queries, 3);
        assert_eq!(stats.failed_queries, 0);
        assert_eq!(stats.select_count, 1);
        assert_eq!(stats.delete_count, 1);
        assert_eq!(stats.update_count, 1);
        assert!(stats.max_duration <= stats.total_duration);
    }

    #[tokio::test]
    async fn failures_pass_through_and_are_counted() {
        let exec = InstrumentedExecutor::new(Scripted { fail: true });
        let err = exec.query("SELECT 1", &[]).await.unwrap_err();
        assert!(err.is_database());

        let monitor = exec.monitor();
        assert_eq!(monitor.stats().failed_queries, 1);
        monitor.reset();
        assert_eq!(monitor.stats(), QueryStats::default());
    }
}
