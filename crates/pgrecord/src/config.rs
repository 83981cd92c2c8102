//! TOML configuration for the database connection and entity descriptors.
//!
//! ```toml
//! [database]
//! url = "${DATABASE_URL}"
//! max_size = 16
//! query_timeout_ms = 5000
//!
//! [[entities]]
//! table = "users"
//! fields = ["name", "email"]
//! ```
//!
//! `${VAR}` references in string values are expanded from the environment.

use crate::descriptor::{DEFAULT_PRIMARY_KEY, EntityDescriptor};
use crate::error::{RecordError, RecordResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct RecordConfig {
    pub database: DatabaseConfig,

    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Per-statement timeout applied by the pool executor.
    #[serde(default)]
    pub query_timeout_ms: Option<u64>,
}

impl DatabaseConfig {
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }
}

fn default_max_size() -> usize {
    16
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Column allow-list; omitted means any valid column name.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

impl EntityConfig {
    pub fn descriptor(&self) -> RecordResult<EntityDescriptor> {
        let descriptor = EntityDescriptor::new(&self.table)?.primary_key(&self.primary_key)?;
        match &self.fields {
            Some(fields) => descriptor.fields(fields),
            None => Ok(descriptor),
        }
    }
}

impl RecordConfig {
    /// Read, expand and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> RecordResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RecordError::config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            RecordError::Config(msg) => {
                RecordError::config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml_str(raw: &str) -> RecordResult<Self> {
        let mut config: RecordConfig = toml::from_str(raw)
            .map_err(|e| RecordError::config(format!("failed to parse config: {e}")))?;
        config.expand_env(&|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Descriptor for every `[[entities]]` entry, in file order.
    pub fn descriptors(&self) -> RecordResult<Vec<EntityDescriptor>> {
        self.entities.iter().map(EntityConfig::descriptor).collect()
    }

    /// Descriptor for the entity configured for `table`.
    pub fn descriptor(&self, table: &str) -> RecordResult<EntityDescriptor> {
        self.entities
            .iter()
            .find(|e| e.table == table)
            .ok_or_else(|| RecordError::config(format!("no entity configured for table `{table}`")))?
            .descriptor()
    }

    /// Expand `${VAR}` in every string value.
    fn expand_env(&mut self, lookup: &dyn Fn(&str) -> Option<String>) -> RecordResult<()> {
        self.database.url = expand_with(&self.database.url, lookup)?;
        for entity in &mut self.entities {
            entity.table = expand_with(&entity.table, lookup)?;
            entity.primary_key = expand_with(&entity.primary_key, lookup)?;
            if let Some(fields) = &mut entity.fields {
                for field in fields.iter_mut() {
                    *field = expand_with(field, lookup)?;
                }
            }
        }
        Ok(())
    }

    fn validate(&self) -> RecordResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(RecordError::config("database.url is required"));
        }
        if self.database.max_size == 0 {
            return Err(RecordError::config("database.max_size must be at least 1"));
        }

        let mut seen = HashSet::new();
        for entity in &self.entities {
            if entity.table.trim().is_empty() {
                return Err(RecordError::config("entities[].table is required"));
            }
            if !seen.insert(entity.table.as_str()) {
                return Err(RecordError::config(format!(
                    "duplicate entity for table `{}`",
                    entity.table
                )));
            }
            entity
                .descriptor()
                .map_err(|e| RecordError::config(format!("entity `{}`: {e}", entity.table)))?;
        }
        Ok(())
    }
}

fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> RecordResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            RecordError::config(format!("unterminated env var reference in `{input}`"))
        })?;
        let key = &after[..end];
        if key.is_empty() {
            return Err(RecordError::config("invalid env var reference: ${}"));
        }
        let value = lookup(key).ok_or_else(|| {
            RecordError::config(format!("missing env var for config expansion: {key}"))
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}
