//! Entity metadata: which table backs an entity and how its key is typed.

use crate::{QueryCacheError, Result};
use once_cell::sync::Lazy;
use qrcache_types::KeyKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

pub(crate) fn is_identifier(s: &str) -> bool {
    IDENTIFIER_REGEX.is_match(s)
}

/// Description of one queryable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Entity name used in load contexts.
    pub name: String,
    /// Backing table; defaults to the entity name.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    pub key_kind: KeyKind,
    /// Column that is non-null for soft-deleted rows.
    #[serde(default)]
    pub soft_delete_column: Option<String>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl EntityMeta {
    pub fn new(name: impl Into<String>, key_kind: KeyKind) -> Self {
        Self {
            name: name.into(),
            table: None,
            primary_key: default_primary_key(),
            key_kind,
            soft_delete_column: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn with_soft_delete(mut self, column: impl Into<String>) -> Self {
        self.soft_delete_column = Some(column.into());
        self
    }

    pub fn table(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    fn validate(&self) -> Result<()> {
        let columns = [Some(self.table()), Some(self.primary_key.as_str())]
            .into_iter()
            .chain(std::iter::once(self.soft_delete_column.as_deref()))
            .flatten();
        for identifier in columns {
            if !is_identifier(identifier) {
                return Err(QueryCacheError::InvalidQuery(format!(
                    "entity '{}' uses invalid identifier '{}'",
                    self.name, identifier
                )));
            }
        }
        Ok(())
    }
}

/// Registry of entity metadata keyed by entity name.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entities: HashMap<String, EntityMeta>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting entries whose identifiers are not plain SQL names.
    pub fn from_entities(entities: impl IntoIterator<Item = EntityMeta>) -> Result<Self> {
        let mut catalog = Self::new();
        for entity in entities {
            catalog.register(entity)?;
        }
        Ok(catalog)
    }

    pub fn register(&mut self, entity: EntityMeta) -> Result<()> {
        entity.validate()?;
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&EntityMeta> {
        self.entities
            .get(name)
            .ok_or_else(|| QueryCacheError::UnknownEntity(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
