//! Entity primary keys and the storage column each kind maps to.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Primary key of a cached entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EntityId {
    String(String),
    Long(i64),
    Int(i32),
    Uuid(Uuid),
}

impl EntityId {
    pub fn kind(&self) -> KeyKind {
        match self {
            EntityId::String(_) => KeyKind::String,
            EntityId::Long(_) => KeyKind::Long,
            EntityId::Int(_) => KeyKind::Int,
            EntityId::Uuid(_) => KeyKind::Uuid,
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Long(value)
    }
}

impl From<i32> for EntityId {
    fn from(value: i32) -> Self {
        EntityId::Int(value)
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        EntityId::Uuid(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::String(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::String(value.to_string())
    }
}

/// Kind of primary key, which decides the result-table column it is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    String,
    Long,
    Int,
    /// UUID keys, the default key type of generated entities.
    Uuid,
}

impl KeyKind {
    /// Column of `SYS_QUERY_RESULT` holding ids of this kind.
    pub fn column(self) -> &'static str {
        match self {
            KeyKind::String => "STRING_ENTITY_ID",
            KeyKind::Long => "LONG_ENTITY_ID",
            KeyKind::Int => "INT_ENTITY_ID",
            KeyKind::Uuid => "ENTITY_ID",
        }
    }

    /// Resolve the single kind shared by every id in the list.
    ///
    /// Returns `Ok(None)` for an empty list and an error when the list mixes kinds.
    pub fn resolve(ids: &[EntityId]) -> Result<Option<KeyKind>, MixedKeyKinds> {
        let Some(first) = ids.first() else {
            return Ok(None);
        };
        let expected = first.kind();
        for (index, id) in ids.iter().enumerate().skip(1) {
            let found = id.kind();
            if found != expected {
                return Err(MixedKeyKinds {
                    expected,
                    found,
                    index,
                });
            }
        }
        Ok(Some(expected))
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyKind::String => "string",
            KeyKind::Long => "long",
            KeyKind::Int => "int",
            KeyKind::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// An id list contained more than one key kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mixed primary key kinds: expected {expected}, found {found} at index {index}")]
pub struct MixedKeyKinds {
    pub expected: KeyKind,
    pub found: KeyKind,
    pub index: usize,
}
