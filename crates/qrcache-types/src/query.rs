//! Query signatures and load contexts handed to the cache.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Caller-assigned key identifying a logical query within one session.
pub type QueryKey = i32;

/// Sort direction of a single sort property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One property of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub property: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A query as it was executed, compared structurally to detect repeats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySignature {
    /// Query text, a select over one entity table.
    pub query: String,
    /// Extra filter condition ANDed into the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortOrder>,
    /// Named parameters, bound as `:name`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
}

impl QuerySignature {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            condition: None,
            sort: Vec::new(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Everything needed to persist the result of the last query of a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadContext {
    /// Entity name as registered in the entity catalog.
    pub entity: String,
    pub query_key: QueryKey,
    /// Previous-query chain; the last element is the query whose ids get saved.
    #[serde(default)]
    pub previous_queries: Vec<QuerySignature>,
    /// Exclude soft-deleted rows when the entity supports it.
    #[serde(default = "default_soft_deletion")]
    pub soft_deletion: bool,
}

fn default_soft_deletion() -> bool {
    true
}

impl LoadContext {
    pub fn new(entity: impl Into<String>, query_key: QueryKey) -> Self {
        Self {
            entity: entity.into(),
            query_key,
            previous_queries: Vec::new(),
            soft_deletion: true,
        }
    }

    pub fn with_query(mut self, query: QuerySignature) -> Self {
        self.previous_queries.push(query);
        self
    }
}

/// Why a save did not touch storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveSkip {
    NoPreviousQueries,
    NotEntitySelect,
    AlreadySaved,
}

/// Result of saving previous query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved { rows: usize },
    Skipped { reason: SaveSkip },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_structural_equality() {
        let a = QuerySignature::new("select * from orders")
            .with_condition("amount > :min")
            .with_parameter("min", 10);
        let b = QuerySignature::new("select * from orders")
            .with_condition("amount > :min")
            .with_parameter("min", 10);
        assert_eq!(a, b);

        let c = b.clone().with_parameter("min", 11);
        assert_ne!(a, c);
    }

    #[test]
    fn test_load_context_defaults() {
        let ctx: LoadContext =
            serde_json::from_str(r#"{"entity":"orders","query_key":3}"#).unwrap();
        assert!(ctx.previous_queries.is_empty());
        assert!(ctx.soft_deletion);
    }

    #[test]
    fn test_save_outcome_json() {
        let json = serde_json::to_value(SaveOutcome::Skipped {
            reason: SaveSkip::AlreadySaved,
        })
        .unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "already_saved");
    }
}
