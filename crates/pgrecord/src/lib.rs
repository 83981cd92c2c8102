//! # pgrecord
//!
//! A minimal active-record style data-access layer for PostgreSQL.
//!
//! ## Features
//!
//! - **Ordered field maps**: [`Fields`] keeps insertion order, so generated
//!   columns, placeholders and bound values always line up
//! - **Injection-safe**: values are only ever bound as parameters; column and
//!   table names are validated identifiers checked against an allow-list
//! - **Composition over inheritance**: an [`Entity`] is a descriptor value
//!   plus an injected [`Executor`], not a subclass per table
//! - **Pooled execution**: [`PoolExecutor`] checks out one connection per
//!   statement from a `deadpool-postgres` pool
//! - **Monitoring**: [`InstrumentedExecutor`] counts, times and logs statements
//!
//! ## Example
//!
//! ```ignore
//! use pgrecord::prelude::*;
//!
//! let pool = create_pool("postgres://postgres@localhost/app")?;
//! let users = Entity::new(
//!     EntityDescriptor::new("users")?.fields(["name", "email"])?,
//!     PoolExecutor::new(pool),
//! );
//!
//! let created = users.create(&fields! { "name" => "alice" }).await?;
//! let everyone = users.find(&Fields::new()).await?;
//! let alice = users.find_one(&fields! { "name" => "alice" }).await?;
//! users.update(&fields! { "email" => "alice@example.com" }, created.id.clone().unwrap()).await?;
//! users.delete(created.id.unwrap()).await?;
//! ```

pub mod clause;
pub mod config;
pub mod descriptor;
pub mod entity;
pub mod error;
pub mod executor;
pub mod fields;
pub mod ident;
pub mod monitor;
pub mod prelude;
pub mod value;

pub use clause::{
    Clause, ClauseBuilder, InsertClause, PlaceholderStyle, build_insert_clause, build_set_clause,
    build_where_clause,
};
pub use config::{DatabaseConfig, EntityConfig, RecordConfig};
pub use descriptor::{DEFAULT_PRIMARY_KEY, EntityDescriptor};
pub use entity::{Created, Entity};
pub use error::{DatabaseError, RecordError, RecordResult};
pub use executor::Executor;
pub use fields::{Fields, Record};
pub use ident::Ident;
pub use monitor::{InstrumentedExecutor, QueryStats, QueryType, StatsMonitor};
pub use value::{Value, ValueTypeError};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{
    PoolExecutor, create_pool, create_pool_from_config, create_pool_with_config,
    create_pool_with_tls,
};
