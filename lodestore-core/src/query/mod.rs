//! Query descriptions.
//!
//! A [`Query`] is the executable description handed down the cache-strategy
//! chain; a [`QueryDump`] is its introspectable snapshot, rendered into
//! diagnostic log lines. The two are split so strategies can log a query
//! without depending on how the terminal store executes it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Value;

/// Comparison operator in a property filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    /// Equal
    Eq,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
}

impl FilterOp {
    /// The operator's symbol, as rendered in query dumps.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// A single property filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Property the filter applies to.
    pub property: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Value compared against.
    pub value: Value,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

/// A single sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Property to sort by.
    pub property: String,
    /// Sort direction.
    pub direction: Direction,
}

/// A query over one entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    kind: String,
    filters: Vec<Filter>,
    orders: Vec<Order>,
    offset: usize,
    limit: Option<usize>,
}

impl Query {
    /// Start a query over a kind.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), filters: Vec::new(), orders: Vec::new(), offset: 0, limit: None }
    }

    /// Add a property filter.
    #[must_use]
    pub fn filter(mut self, property: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { property: property.into(), op, value: value.into() });
        self
    }

    /// Add a sort order.
    #[must_use]
    pub fn order_by(mut self, property: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(Order { property: property.into(), direction });
        self
    }

    /// Skip the first `offset` results.
    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Return at most `limit` results.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The queried kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The property filters.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// The sort orders.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// The result offset.
    #[must_use]
    pub const fn result_offset(&self) -> usize {
        self.offset
    }

    /// The result limit, if any.
    #[must_use]
    pub const fn result_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Snapshot the query into its loggable form.
    #[must_use]
    pub fn dump(&self) -> QueryDump {
        QueryDump { query: self.clone() }
    }
}

/// A loggable snapshot of a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDump {
    query: Query,
}

impl QueryDump {
    /// The snapshotted query.
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }
}

impl fmt::Display for QueryDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = &self.query;
        write!(f, "kind={}", q.kind)?;
        if !q.filters.is_empty() {
            write!(f, ", filter=[")?;
            for (i, filter) in q.filters.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} {} {}", filter.property, filter.op.symbol(), fmt_value(&filter.value))?;
            }
            write!(f, "]")?;
        }
        if !q.orders.is_empty() {
            write!(f, ", order=[")?;
            for (i, order) in q.orders.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                let dir = match order.direction {
                    Direction::Asc => "asc",
                    Direction::Desc => "desc",
                };
                write!(f, "{} {dir}", order.property)?;
            }
            write!(f, "]")?;
        }
        if q.offset > 0 {
            write!(f, ", offset={}", q.offset)?;
        }
        if let Some(limit) = q.limit {
            write!(f, ", limit={limit}")?;
        }
        Ok(())
    }
}

/// Compact value rendering for query dumps.
fn fmt_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Bytes(b) => format!("<{} bytes>", b.len()),
        Value::Key(k) => k.to_string(),
        Value::Array(values) => {
            let inner: Vec<String> = values.iter().map(fmt_value).collect();
            format!("[{}]", inner.join(", "))
        }
    }
}
