//! Convenient imports for typical `pgrecord` usage.
//!
//! ```ignore
//! use pgrecord::prelude::*;
//! ```

pub use crate::{
    Created, Entity, EntityDescriptor, Executor, Fields, Record, RecordConfig, RecordError,
    RecordResult, Value, fields,
};

#[cfg(feature = "pool")]
pub use crate::{PoolExecutor, create_pool, create_pool_with_config};
