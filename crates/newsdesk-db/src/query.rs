//! Filter predicates, ordering, and select options.
//!
//! [`Q`] objects compose with `&`, `|`, and `!`:
//!
//! ```
//! use newsdesk_db::query::{Lookup, Q};
//! use newsdesk_db::value::Value;
//!
//! let pending = Q::eq("status", "pending");
//! let mine = Q::eq("user_id", "u-1");
//! let q = pending & mine;
//! assert!(matches!(q, Q::And(ref c) if c.len() == 2));
//! ```

use std::ops;

use crate::value::{Row, Value};

/// A single-column comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Equality (`field = value`).
    Exact(Value),
    /// Case-insensitive substring match.
    IContains(String),
    /// Membership test (`field IN (values...)`).
    In(Vec<Value>),
    /// NULL test: `true` for `IS NULL`, `false` for `IS NOT NULL`.
    IsNull(bool),
}

impl Lookup {
    /// Evaluates the lookup against a column value (`None` = column absent).
    pub fn matches(&self, value: Option<&Value>) -> bool {
        let value = value.unwrap_or(&Value::Null);
        match self {
            Self::Exact(expected) => value == expected,
            Self::IContains(needle) => {
                !matches!(value, Value::Null)
                    && value.sort_key().to_lowercase().contains(&needle.to_lowercase())
            }
            Self::In(options) => options.contains(value),
            Self::IsNull(is_null) => matches!(value, Value::Null) == *is_null,
        }
    }
}

/// A composable filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Q {
    /// A single field lookup.
    Filter {
        /// The column name.
        field: String,
        /// The comparison.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions. Empty AND is true.
    And(Vec<Q>),
    /// Logical OR of multiple conditions. Empty OR is false.
    Or(Vec<Q>),
    /// Logical negation of a condition.
    Not(Box<Q>),
}

impl Q {
    /// Creates a filter on one column.
    pub fn filter(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            field: field.into(),
            lookup,
        }
    }

    /// Shorthand for an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::filter(field, Lookup::Exact(value.into()))
    }

    /// Case-insensitive substring search of `term` across several columns,
    /// combined with OR. Used for the multilingual title/description search.
    ///
    /// ```
    /// use newsdesk_db::query::Q;
    /// use newsdesk_db::value::Row;
    ///
    /// let q = Q::search(&["title", "title_ar", "title_fr"], "budget");
    /// let row = Row::new().with("title", "x").with("title_fr", "Le BUDGET 2025");
    /// assert!(q.matches(&row));
    /// ```
    pub fn search(columns: &[&str], term: &str) -> Self {
        Self::Or(
            columns
                .iter()
                .map(|c| Self::filter(*c, Lookup::IContains(term.to_string())))
                .collect(),
        )
    }

    /// Evaluates the predicate against a row.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Filter { field, lookup } => lookup.matches(row.get(field)),
            Self::And(children) => children.iter().all(|q| q.matches(row)),
            Self::Or(children) => children.iter().any(|q| q.matches(row)),
            Self::Not(inner) => !inner.matches(row),
        }
    }
}

impl ops::BitAnd for Q {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Q {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Q {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

/// Sort key for a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to sort by.
    pub field: String,
    /// Sort descending when `true`.
    pub descending: bool,
}

impl OrderBy {
    /// Ascending order on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Descending order on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Options for a select: filter, ordering, and row limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Rows must match this predicate. `None` selects everything.
    pub filter: Option<Q>,
    /// Sort keys, most significant first.
    pub order: Vec<OrderBy>,
    /// Maximum number of rows returned.
    pub limit: Option<usize>,
}

impl Query {
    /// Selects every row, unordered.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds a filter, AND-ing it with any existing one.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing & q,
            None => q,
        });
        self
    }

    /// Appends a sort key.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    /// Newest first, the order every admin listing uses.
    #[must_use]
    pub fn newest_first(self) -> Self {
        self.order_by(OrderBy::desc("created_at"))
    }

    /// Limits the number of rows.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filters, sorts, and truncates `rows` locally.
    pub fn apply(&self, rows: impl IntoIterator<Item = Row>) -> Vec<Row> {
        let mut out: Vec<Row> = rows
            .into_iter()
            .filter(|row| self.filter.as_ref().map_or(true, |q| q.matches(row)))
            .collect();
        if !self.order.is_empty() {
            out.sort_by(|a, b| {
                for key in &self.order {
                    let left = a.get(&key.field).map(Value::sort_key).unwrap_or_default();
                    let right = b.get(&key.field).map(Value::sort_key).unwrap_or_default();
                    let ord = if key.descending {
                        right.cmp(&left)
                    } else {
                        left.cmp(&right)
                    };
                    if ord.is_ne() {
                        return ord;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, status: &str, created: &str) -> Row {
        Row::new()
            .with("id", id)
            .with("status", status)
            .with("created_at", created)
    }

    #[test]
    fn test_exact_and_in() {
        let r = row("1", "pending", "2025-01-01");
        assert!(Q::eq("status", "pending").matches(&r));
        assert!(!Q::eq("status", "approved").matches(&r));
        let q = Q::filter(
            "status",
            Lookup::In(vec![Value::from("approved"), Value::from("pending")]),
        );
        assert!(q.matches(&r));
    }

    #[test]
    fn test_icontains_ignores_null() {
        let r = Row::new().with("title", Value::Null);
        assert!(!Q::filter("title", Lookup::IContains(String::new())).matches(&r));
    }

    #[test]
    fn test_is_null_on_missing_column() {
        let r = Row::new();
        assert!(Q::filter("phone", Lookup::IsNull(true)).matches(&r));
        assert!(!Q::filter("phone", Lookup::IsNull(false)).matches(&r));
    }

    #[test]
    fn test_operators_flatten() {
        let q = Q::eq("a", 1) & Q::eq("b", 2) & Q::eq("c", 3);
        assert!(matches!(q, Q::And(ref c) if c.len() == 3));
        let q = Q::eq("a", 1) | Q::eq("b", 2) | Q::eq("c", 3);
        assert!(matches!(q, Q::Or(ref c) if c.len() == 3));
        let q = !!Q::eq("a", 1);
        assert_eq!(q, Q::eq("a", 1));
    }

    #[test]
    fn test_empty_or_matches_nothing() {
        assert!(!Q::Or(vec![]).matches(&Row::new()));
        assert!(Q::And(vec![]).matches(&Row::new()));
    }

    #[test]
    fn test_query_apply_order_and_limit() {
        let rows = vec![
            row("1", "pending", "2025-01-01"),
            row("2", "approved", "2025-03-01"),
            row("3", "pending", "2025-02-01"),
        ];
        let q = Query::all().filter(Q::eq("status", "pending")).newest_first();
        let ids: Vec<_> = q
            .apply(rows.clone())
            .iter()
            .map(|r| r.get_str("id").unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["3", "1"]);

        let limited = Query::all().order_by(OrderBy::asc("created_at")).limit(1).apply(rows);
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].get_str("id"), Some("1"));
    }
}
