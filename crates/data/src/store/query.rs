//! Declarative select queries for the record store.
//!
//! A [`SelectQuery`] names a table, a column projection, equality/null
//! filters, an order-by clause, and an optional row limit: the full
//! outbound surface the aggregation layer needs. Anything richer belongs
//! to the backend.

use serde_json::Value as JsonValue;

/// Filter condition for record queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact match on a column.
    Eq(String, JsonValue),
    /// Column is NULL.
    IsNull(String),
    /// Column is not NULL.
    NotNull(String),
}

impl Filter {
    /// Equality filter from anything serializable to a JSON scalar.
    pub fn eq(column: &str, value: impl Into<JsonValue>) -> Self {
        Filter::Eq(column.to_string(), value.into())
    }

    /// NULL filter.
    pub fn is_null(column: &str) -> Self {
        Filter::IsNull(column.to_string())
    }

    /// NOT NULL filter.
    pub fn not_null(column: &str) -> Self {
        Filter::NotNull(column.to_string())
    }

    /// Column the filter applies to.
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _) | Filter::IsNull(c) | Filter::NotNull(c) => c,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Order-by clause.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// A complete select query.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: String,
    /// Columns to project; empty means all (`*`).
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<u32>,
}

impl SelectQuery {
    /// Start a query against `table`, selecting all columns.
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Project specific columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a filter condition.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the order-by clause (a single clause; the backend page is
    /// small enough that compound ordering happens in the pipeline).
    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            direction,
        });
        self
    }

    /// Cap the number of returned rows.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
