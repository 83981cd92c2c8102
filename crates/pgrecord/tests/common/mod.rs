//! In-memory executor for integration tests.
//!
//! Understands exactly the statement shapes the entity layer generates
//! (`SELECT * FROM t [WHERE ..] [LIMIT n]`, `INSERT .. RETURNING id`,
//! `UPDATE .. SET .. WHERE id = $n`, `DELETE FROM t WHERE id = $1`) and
//! keeps rows in a map keyed by table name. Primary keys are `id`, assigned
//! from a per-table sequence.

#![allow(dead_code)]

use pgrecord::{DatabaseError, Executor, Fields, Record, RecordResult, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<Fields>,
}

#[derive(Default)]
pub struct MemoryExecutor {
    tables: Mutex<HashMap<String, Table>>,
    pub statements: AtomicUsize,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.load(Ordering::SeqCst)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map_or(0, |t| t.rows.len())
    }
}

fn unsupported(sql: &str) -> pgrecord::RecordError {
    DatabaseError::Other(format!("memory executor cannot run: {sql}")).into()
}

/// Parse `a = $1<sep>b = $2` into (column, bound value) pairs.
fn parse_eqs(clause: &str, sep: &str, params: &[Value]) -> Option<Vec<(String, Value)>> {
    clause
        .split(sep)
        .map(|part| {
            let (col, ph) = part.split_once(" = ")?;
            let idx: usize = ph.trim().strip_prefix('$')?.parse().ok()?;
            Some((col.trim().to_string(), params.get(idx.checked_sub(1)?)?.clone()))
        })
        .collect()
}

fn matches(row: &Fields, filter: &[(String, Value)]) -> bool {
    filter.iter().all(|(col, v)| row.get(col) == Some(v))
}

impl Executor for MemoryExecutor {
    async fn query(&self, sql: &str, params: &[Value]) -> RecordResult<Vec<Record>> {
        self.statements.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();

        if let Some(rest) = sql.strip_prefix("SELECT * FROM ") {
            let (rest, limit) = match rest.split_once(" LIMIT ") {
                Some((head, n)) => (head, n.parse::<usize>().ok()),
                None => (rest, None),
            };
            let (table, filter) = match rest.split_once(" WHERE ") {
                Some((table, clause)) => (
                    table,
                    parse_eqs(clause, " AND ", params).ok_or_else(|| unsupported(sql))?,
                ),
                None => (rest, Vec::new()),
            };
            let rows: Vec<Record> = tables
                .get(table)
                .map(|t| {
                    t.rows
                        .iter()
                        .filter(|row| matches(row, &filter))
                        .take(limit.unwrap_or(usize::MAX))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            return Ok(rows);
        }

        if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
            let (table, rest) = rest.split_once(" (").ok_or_else(|| unsupported(sql))?;
            let (cols, _) = rest.split_once(")").ok_or_else(|| unsupported(sql))?;

            let t = tables.entry(table.to_string()).or_default();
            t.next_id += 1;
            let id = t.next_id;

            let mut row = Fields::new().with("id", id);
            for (col, value) in cols.split(", ").zip(params) {
                row.set(col, value.clone());
            }
            t.rows.push(row);
            return Ok(vec![Fields::new().with("id", id)]);
        }

        Err(unsupported(sql))
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> RecordResult<u64> {
        self.statements.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();

        if let Some(rest) = sql.strip_prefix("UPDATE ") {
            let (table, rest) = rest.split_once(" SET ").ok_or_else(|| unsupported(sql))?;
            let (set, filter) = rest.split_once(" WHERE ").ok_or_else(|| unsupported(sql))?;
            let set = parse_eqs(set, ", ", params).ok_or_else(|| unsupported(sql))?;
            let filter = parse_eqs(filter, " AND ", params).ok_or_else(|| unsupported(sql))?;

            let Some(t) = tables.get_mut(table) else {
                return Ok(0);
            };
            let mut affected = 0;
            for row in t.rows.iter_mut().filter(|row| matches(row, &filter)) {
                for (col, value) in &set {
                    row.set(col.as_str(), value.clone());
                }
                affected += 1;
            }
            return Ok(affected);
        }

        if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
            let (table, clause) = rest.split_once(" WHERE ").ok_or_else(|| unsupported(sql))?;
            let filter = parse_eqs(clause, " AND ", params).ok_or_else(|| unsupported(sql))?;

            let Some(t) = tables.get_mut(table) else {
                return Ok(0);
            };
            let before = t.rows.len();
            t.rows.retain(|row| !matches(row, &filter));
            return Ok((before - t.rows.len()) as u64);
        }

        Err(unsupported(sql))
    }
}
