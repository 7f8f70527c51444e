//! Parsing and rewriting of single-table select queries.
//!
//! Queries are parsed with the SQLite dialect of `sqlparser`. Only a single
//! select over one table, without joins, grouping, limits, CTEs or set
//! operations, counts as a plain entity select:
//!
//! ```text
//! SELECT * | <alias> | <alias>.* FROM <table> [[AS] <alias>] [WHERE <cond>] [ORDER BY <spec>]
//! ```

use crate::catalog::{is_identifier, EntityMeta};
use crate::store::RESULT_TABLE;
use crate::{QueryCacheError, Result};
use once_cell::sync::Lazy;
use qrcache_types::{QueryKey, SortDirection, SortOrder};
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use sqlparser::ast::{
    BinaryOperator, Expr, GroupByExpr, Ident, Query, Select, SelectItem, SetExpr, Statement, TableFactor,
};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;
use std::collections::BTreeMap;
use uuid::Uuid;

static SORT_PROPERTY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap());

/// Named parameters reserved for the previous-results restriction.
const SESSION_PARAM: &str = ":__qr_session_id";
const QUERY_KEY_PARAM: &str = ":__qr_query_key";

/// Parse a standalone SQL expression, rejecting trailing input.
fn parse_expr(text: &str) -> Result<Expr> {
    let dialect = SQLiteDialect {};
    let mut parser = Parser::new(&dialect).try_with_sql(text)?;
    let expr = parser.parse_expr()?;
    if parser.peek_token().token != Token::EOF {
        return Err(QueryCacheError::InvalidQuery(format!(
            "unexpected input after expression: {text}"
        )));
    }
    Ok(expr)
}

/// A parsed select statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    query: Query,
    /// Unqualified name of the only table in FROM, if there is exactly one.
    table: Option<Ident>,
    alias: Option<Ident>,
}

impl SelectQuery {
    pub fn parse(text: &str) -> Result<Self> {
        let mut statements = Parser::parse_sql(&SQLiteDialect {}, text)?;
        if statements.len() != 1 {
            return Err(QueryCacheError::InvalidQuery(format!(
                "expected a single statement, found {}: {text}",
                statements.len()
            )));
        }
        let query = match statements.remove(0) {
            Statement::Query(query) => *query,
            _ => {
                return Err(QueryCacheError::InvalidQuery(format!(
                    "not a select query: {text}"
                )))
            }
        };

        let (table, alias) = match query.body.as_ref() {
            SetExpr::Select(select) => match select.from.as_slice() {
                [from] => match &from.relation {
                    TableFactor::Table { name, alias, .. } => (
                        name.0.last().cloned(),
                        alias.as_ref().map(|alias| alias.name.clone()),
                    ),
                    _ => (None, None),
                },
                _ => (None, None),
            },
            _ => (None, None),
        };

        Ok(Self { query, table, alias })
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_ref().map(|ident| ident.value.as_str())
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_ref().map(|ident| ident.value.as_str())
    }

    pub fn where_clause(&self) -> Option<String> {
        self.select()?.selection.as_ref().map(ToString::to_string)
    }

    pub fn order_by(&self) -> Option<String> {
        self.query.order_by.as_ref().map(|order_by| {
            order_by
                .exprs
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })
    }

    fn select(&self) -> Option<&Select> {
        match self.query.body.as_ref() {
            SetExpr::Select(select) => Some(select),
            _ => None,
        }
    }

    fn select_mut(&mut self) -> Option<&mut Select> {
        match self.query.body.as_mut() {
            SetExpr::Select(select) => Some(select),
            _ => None,
        }
    }

    /// One select over one table, with nothing that changes the row set's shape.
    fn is_plain(&self) -> bool {
        let query = &self.query;
        if query.with.is_some() || query.limit.is_some() || query.offset.is_some() || query.fetch.is_some() {
            return false;
        }
        let Some(select) = self.select() else {
            return false;
        };
        self.table.is_some()
            && select.from.len() == 1
            && select.from[0].joins.is_empty()
            && matches!(&select.group_by, GroupByExpr::Expressions(exprs, _) if exprs.is_empty())
            && select.having.is_none()
    }

    /// Whether the query selects whole rows of `table` and nothing else.
    pub fn is_entity_select(&self, table: &str) -> bool {
        if !self.is_plain() {
            return false;
        }
        let (Some(name), Some(select)) = (&self.table, self.select()) else {
            return false;
        };
        if !name.value.eq_ignore_ascii_case(table) {
            return false;
        }
        let qualifier = self.alias.as_ref().unwrap_or(name);
        match select.projection.as_slice() {
            [SelectItem::Wildcard(_)] => true,
            [SelectItem::UnnamedExpr(Expr::Identifier(ident))] => self
                .alias
                .as_ref()
                .is_some_and(|alias| alias.value.eq_ignore_ascii_case(&ident.value)),
            [SelectItem::QualifiedWildcard(prefix, _)] => matches!(
                prefix.0.as_slice(),
                [part] if part.value.eq_ignore_ascii_case(&qualifier.value)
            ),
            _ => false,
        }
    }

    /// Replace the projection with the primary key column.
    pub fn replace_with_select_id(&mut self, primary_key: &str) {
        let column = self.column(primary_key);
        if let Some(select) = self.select_mut() {
            select.projection = vec![SelectItem::UnnamedExpr(column)];
        }
    }

    pub fn remove_order_by(&mut self) {
        self.query.order_by = None;
    }

    /// Column reference qualified with the alias when the query has one.
    fn column(&self, column: &str) -> Expr {
        match &self.alias {
            Some(alias) => Expr::CompoundIdentifier(vec![alias.clone(), Ident::new(column)]),
            None => Expr::Identifier(Ident::new(column)),
        }
    }

    pub fn qualify(&self, column: &str) -> String {
        self.column(column).to_string()
    }

    pub fn to_sql(&self) -> String {
        self.query.to_string()
    }
}

fn to_sql_value(name: &str, value: &Value) -> Result<SqlValue> {
    let unsupported = |reason: &str| QueryCacheError::UnsupportedParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .ok_or_else(|| unsupported("number out of range")),
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(unsupported("only scalar values can be bound")),
    }
}

/// A rewritten query ready to run, with its named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    /// Parameter names include their `:` prefix.
    pub params: Vec<(String, SqlValue)>,
}

/// Applies conditions, sort and parameters to a parsed select.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    query: SelectQuery,
    conditions: Vec<Expr>,
    order_by: Vec<String>,
    params: Vec<(String, SqlValue)>,
}

impl QueryBuilder {
    pub fn new(query: SelectQuery) -> Self {
        Self {
            query,
            conditions: Vec::new(),
            order_by: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn condition(mut self, condition: Option<&str>) -> Result<Self> {
        if let Some(condition) = condition.map(str::trim).filter(|c| !c.is_empty()) {
            self.conditions.push(Expr::Nested(Box::new(parse_expr(condition)?)));
        }
        Ok(self)
    }

    /// Sort the results; replaces any ORDER BY of the query.
    pub fn sort(mut self, sort: &[SortOrder]) -> Result<Self> {
        for order in sort {
            if !SORT_PROPERTY_REGEX.is_match(&order.property) {
                return Err(QueryCacheError::InvalidQuery(format!(
                    "invalid sort property '{}'",
                    order.property
                )));
            }
            let column = if order.property.contains('.') {
                order.property.clone()
            } else {
                self.query.qualify(&order.property)
            };
            let direction = match order.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            self.order_by.push(format!("{column} {direction}"));
        }
        Ok(self)
    }

    pub fn parameters(mut self, parameters: &BTreeMap<String, Value>) -> Result<Self> {
        for (name, value) in parameters {
            let bare = name.trim_start_matches(':');
            if !is_identifier(bare) || bare.starts_with("__qr_") {
                return Err(QueryCacheError::UnsupportedParameter {
                    name: name.clone(),
                    reason: "invalid parameter name".to_string(),
                });
            }
            self.params.push((format!(":{bare}"), to_sql_value(name, value)?));
        }
        Ok(self)
    }

    /// Exclude rows whose soft-delete column is set.
    pub fn soft_deletion(mut self, column: Option<&str>) -> Self {
        if let Some(column) = column {
            self.conditions
                .push(Expr::IsNull(Box::new(self.query.column(column))));
        }
        self
    }

    /// Restrict to primary keys persisted for (session, query key).
    pub fn previous_results(mut self, session_id: Uuid, query_key: QueryKey, entity: &EntityMeta) -> Result<Self> {
        let restriction = parse_expr(&format!(
            "{} IN (SELECT {} FROM {RESULT_TABLE} WHERE SESSION_ID = {SESSION_PARAM} AND QUERY_KEY = {QUERY_KEY_PARAM})",
            self.query.qualify(&entity.primary_key),
            entity.key_kind.column(),
        ))?;
        self.conditions.push(restriction);
        self.params
            .push((SESSION_PARAM.to_string(), SqlValue::Text(session_id.to_string())));
        self.params
            .push((QUERY_KEY_PARAM.to_string(), SqlValue::Integer(i64::from(query_key))));
        Ok(self)
    }

    pub fn build(self) -> Result<BuiltQuery> {
        let mut query = self.query;
        if !self.conditions.is_empty() {
            let select = query.select_mut().ok_or_else(|| {
                QueryCacheError::InvalidQuery("conditions require a single select".to_string())
            })?;
            let existing = select.selection.take().map(|expr| Expr::Nested(Box::new(expr)));
            select.selection = existing
                .into_iter()
                .chain(self.conditions)
                .reduce(|left, right| Expr::BinaryOp {
                    left: Box::new(left),
                    op: BinaryOperator::And,
                    right: Box::new(right),
                });
        }

        let sql = if self.order_by.is_empty() {
            query.to_sql()
        } else {
            query.remove_order_by();
            format!("{} ORDER BY {}", query.to_sql(), self.order_by.join(", "))
        };
        Ok(BuiltQuery {
            sql,
            params: self.params,
        })
    }
}
