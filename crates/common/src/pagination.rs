//! Keyset (cursor) pagination
//!
//! A cursor is the standard-base64 encoding of
//! `{"values": {<column>: <last row value>, ...}, "order": ["<column>_<ASC|DESC>", ...]}`.
//! It is produced from the last row of a page and consumed by the next
//! request, which then only sees rows strictly after that row in the
//! cursor's ordering. The ordering travels inside the cursor and always
//! overrides whatever order the client sends alongside it.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{Postgres, QueryBuilder};

/// Default page size when `take` is omitted
const DEFAULT_TAKE: i64 = 5;

/// Maximum page size
const MAX_TAKE: i64 = 100;

/// Ordering applied when the client sends none
pub const DEFAULT_ORDER: &str = "id_DESC";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("Invalid cursor: {0}")]
    BadCursor(String),

    #[error("Invalid order '{0}': expected <column>_ASC or <column>_DESC")]
    BadOrder(String),
}

/// Sort direction. Parsing is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One `<column>_<ASC|DESC>` entry of an ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderTerm {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderTerm {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

impl FromStr for OrderTerm {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || PaginationError::BadOrder(s.to_string());

        // Split on the last separator so snake_case columns survive
        let (column, direction) = s.rsplit_once('_').ok_or_else(bad)?;
        if column.is_empty() {
            return Err(bad());
        }

        let direction = match direction {
            "ASC" => SortDirection::Asc,
            "DESC" => SortDirection::Desc,
            _ => return Err(bad()),
        };

        Ok(Self::new(column, direction))
    }
}

impl fmt::Display for OrderTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.column, self.direction.as_sql())
    }
}

impl TryFrom<String> for OrderTerm {
    type Error = PaginationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderTerm> for String {
    fn from(term: OrderTerm) -> Self {
        term.to_string()
    }
}

/// Decoded pagination cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub values: Map<String, Value>,
    pub order: Vec<OrderTerm>,
}

impl Cursor {
    /// Build a cursor from a row's sort-key values.
    ///
    /// The row is serialised with serde; every order column must be one of
    /// its (serialised) field names.
    pub fn from_row<T: Serialize>(row: &T, order: &[OrderTerm]) -> Result<Self, PaginationError> {
        let row = match serde_json::to_value(row) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(PaginationError::BadCursor(
                    "row does not serialise to an object".to_string(),
                ))
            }
            Err(e) => return Err(PaginationError::BadCursor(e.to_string())),
        };

        let mut values = Map::new();
        for term in order {
            let value = row
                .get(&term.column)
                .ok_or_else(|| PaginationError::BadOrder(term.to_string()))?;
            values.insert(term.column.clone(), value.clone());
        }

        Ok(Self {
            values,
            order: order.to_vec(),
        })
    }

    /// Serialise to the transport form
    pub fn encode(&self) -> String {
        let order: Vec<Value> = self
            .order
            .iter()
            .map(|t| Value::String(t.to_string()))
            .collect();
        let json = serde_json::json!({ "values": self.values, "order": order });
        STANDARD.encode(json.to_string())
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = STANDARD
            .decode(cursor.trim())
            .map_err(|e| PaginationError::BadCursor(e.to_string()))?;
        let text =
            String::from_utf8(bytes).map_err(|e| PaginationError::BadCursor(e.to_string()))?;
        let cursor: Cursor =
            serde_json::from_str(&text).map_err(|e| PaginationError::BadCursor(e.to_string()))?;

        if cursor.order.is_empty() {
            return Err(PaginationError::BadCursor("cursor has no order".to_string()));
        }

        Ok(cursor)
    }
}

/// Next-page cursor for a result set: built from its last row, `None` when empty.
pub fn next_cursor<T: Serialize>(
    rows: &[T],
    order: &[OrderTerm],
) -> Result<Option<String>, PaginationError> {
    match rows.last() {
        Some(last) => Ok(Some(Cursor::from_row(last, order)?.encode())),
        None => Ok(None),
    }
}

/// SQL type of a sortable column, used to bind cursor values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
    Timestamp,
}

/// A column clients may sort and page by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortColumn {
    /// Name used in order strings and cursors (the serialised field name)
    pub name: &'static str,
    /// Column expression in SQL
    pub sql: &'static str,
    pub kind: ColumnKind,
}

impl SortColumn {
    pub const fn new(name: &'static str, sql: &'static str, kind: ColumnKind) -> Self {
        Self { name, sql, kind }
    }
}

/// Typed cursor value, ready to bind
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl KeyValue {
    fn from_json(column: &SortColumn, value: &Value) -> Result<Self, PaginationError> {
        let mismatch = || {
            PaginationError::BadCursor(format!(
                "value for '{}' has the wrong type: {}",
                column.name, value
            ))
        };

        match column.kind {
            ColumnKind::Integer => value.as_i64().map(KeyValue::Integer).ok_or_else(mismatch),
            ColumnKind::Text => value
                .as_str()
                .map(|s| KeyValue::Text(s.to_string()))
                .ok_or_else(mismatch),
            ColumnKind::Timestamp => value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| KeyValue::Timestamp(dt.with_timezone(&Utc)))
                .ok_or_else(mismatch),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Integer(v) => write!(f, "{}", v),
            KeyValue::Text(v) => write!(f, "'{}'", v),
            KeyValue::Timestamp(v) => write!(f, "'{}'", v.to_rfc3339()),
        }
    }
}

/// Cursor pagination query parameters
///
/// `order` is a comma-separated list, e.g. `likeCount_DESC,id_DESC`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CursorPagination {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub take: Option<i64>,
}

impl CursorPagination {
    /// Page size, defaulting to 5, clamped to 1..=100
    pub fn take(&self) -> i64 {
        self.take.unwrap_or(DEFAULT_TAKE).clamp(1, MAX_TAKE)
    }

    /// Client-requested ordering, `id_DESC` when absent
    pub fn order_terms(&self) -> Result<Vec<OrderTerm>, PaginationError> {
        let raw = self.order.as_deref().unwrap_or(DEFAULT_ORDER);
        let terms: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        if terms.is_empty() {
            return DEFAULT_ORDER.parse().map(|t| vec![t]);
        }

        terms.into_iter().map(str::parse).collect()
    }
}

/// A validated keyset page request for one resource.
///
/// Built before any database access so that bad orders and cursors are
/// rejected up front.
#[derive(Debug, Clone)]
pub struct KeysetQuery {
    order: Vec<(OrderTerm, SortColumn)>,
    after: Option<Vec<KeyValue>>,
    take: i64,
}

impl KeysetQuery {
    pub fn prepare(
        columns: &[SortColumn],
        params: &CursorPagination,
    ) -> Result<Self, PaginationError> {
        let (order, cursor_values) = match params.cursor.as_deref().filter(|c| !c.is_empty()) {
            Some(raw) => {
                let cursor = Cursor::decode(raw)?;
                (cursor.order, Some(cursor.values))
            }
            None => (params.order_terms()?, None),
        };

        let order = order
            .into_iter()
            .map(|term| {
                let column = columns
                    .iter()
                    .find(|c| c.name == term.column)
                    .copied()
                    .ok_or_else(|| PaginationError::BadOrder(term.to_string()))?;
                Ok((term, column))
            })
            .collect::<Result<Vec<_>, PaginationError>>()?;

        let after = match cursor_values {
            Some(values) => Some(
                order
                    .iter()
                    .map(|(term, column)| {
                        let value = values.get(&term.column).ok_or_else(|| {
                            PaginationError::BadCursor(format!("missing value for '{}'", term.column))
                        })?;
                        KeyValue::from_json(column, value)
                    })
                    .collect::<Result<Vec<_>, PaginationError>>()?,
            ),
            None => None,
        };

        Ok(Self {
            order,
            after,
            take: params.take(),
        })
    }

    /// Ordering in effect (the cursor's, when one was supplied)
    pub fn order(&self) -> Vec<OrderTerm> {
        self.order.iter().map(|(term, _)| term.clone()).collect()
    }

    pub fn take(&self) -> i64 {
        self.take
    }

    /// Cursor bound values in order-column sequence
    pub fn after(&self) -> Option<&[KeyValue]> {
        self.after.as_deref()
    }

    /// The leading column's direction decides the tuple comparison.
    pub fn comparison(&self) -> &'static str {
        match self.order.first() {
            Some((term, _)) if term.direction == SortDirection::Desc => "<",
            _ => ">",
        }
    }

    /// Human-readable predicate for logs, e.g. `(like_count, id) > (5, 42)`
    pub fn describe(&self) -> Option<String> {
        let after = self.after.as_ref()?;
        let columns: Vec<&str> = self.order.iter().map(|(_, c)| c.sql).collect();
        let values: Vec<String> = after.iter().map(ToString::to_string).collect();
        Some(format!(
            "({}) {} ({})",
            columns.join(", "),
            self.comparison(),
            values.join(", ")
        ))
    }

    /// Push the tuple comparison, preceded by `keyword` (`WHERE` / `AND`).
    ///
    /// Returns `false` and pushes nothing when there is no cursor.
    pub fn push_predicate(
        &self,
        qb: &mut QueryBuilder<'_, Postgres>,
        keyword: &str,
        alias: &str,
    ) -> bool {
        let Some(after) = &self.after else {
            return false;
        };

        let columns: Vec<String> = self
            .order
            .iter()
            .map(|(_, c)| qualify(alias, c.sql))
            .collect();

        qb.push(format!(" {} (", keyword));
        qb.push(columns.join(", "));
        qb.push(format!(") {} (", self.comparison()));

        let mut values = qb.separated(", ");
        for value in after {
            match value {
                KeyValue::Integer(v) => values.push_bind(*v),
                KeyValue::Text(v) => values.push_bind(v.clone()),
                KeyValue::Timestamp(v) => values.push_bind(*v),
            };
        }
        values.push_unseparated(")");

        true
    }

    /// Push `ORDER BY` for every term, then `LIMIT`
    pub fn push_order_and_limit(&self, qb: &mut QueryBuilder<'_, Postgres>, alias: &str) {
        let terms: Vec<String> = self
            .order
            .iter()
            .map(|(term, c)| format!("{} {}", qualify(alias, c.sql), term.direction.as_sql()))
            .collect();

        qb.push(" ORDER BY ");
        qb.push(terms.join(", "));
        qb.push(" LIMIT ");
        qb.push_bind(self.take);
    }

    /// Cursor for the page after `rows`
    pub fn next_cursor<T: Serialize>(&self, rows: &[T]) -> Result<Option<String>, PaginationError> {
        next_cursor(rows, &self.order())
    }
}

fn qualify(alias: &str, column: &str) -> String {
    if alias.is_empty() {
        column.to_string()
    } else {
        format!("{}.{}", alias, column)
    }
}
