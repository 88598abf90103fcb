//! Row-level query description shared by every [`RemoteStore`].
//!
//! A [`Query`] renders to PostgREST query parameters for the REST store and
//! is evaluated directly against JSON rows by the in-memory store, so both
//! implementations agree on filter and ordering semantics.
//!
//! [`RemoteStore`]: crate::RemoteStore

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Map, Value};

/// A single column predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
    NotNull(String),
}

/// A sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Columns, filters, ordering, and range for a table read or write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned columns (PostgREST `select=`).
    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn eq(self, column: &str, value: impl Serialize) -> Self {
        self.filter(Filter::Eq(column.to_string(), to_json(value)))
    }

    pub fn neq(self, column: &str, value: impl Serialize) -> Self {
        self.filter(Filter::Neq(column.to_string(), to_json(value)))
    }

    pub fn gt(self, column: &str, value: impl Serialize) -> Self {
        self.filter(Filter::Gt(column.to_string(), to_json(value)))
    }

    pub fn gte(self, column: &str, value: impl Serialize) -> Self {
        self.filter(Filter::Gte(column.to_string(), to_json(value)))
    }

    pub fn lt(self, column: &str, value: impl Serialize) -> Self {
        self.filter(Filter::Lt(column.to_string(), to_json(value)))
    }

    pub fn lte(self, column: &str, value: impl Serialize) -> Self {
        self.filter(Filter::Lte(column.to_string(), to_json(value)))
    }

    /// Match any of `values`. An empty set matches no rows.
    pub fn is_in<I, T>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        let values = values.into_iter().map(to_json).collect();
        self.filter(Filter::In(column.to_string(), values))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(Filter::IsNull(column.to_string()))
    }

    pub fn not_null(self, column: &str) -> Self {
        self.filter(Filter::NotNull(column.to_string()))
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending: true,
        });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending: false,
        });
        self
    }

    /// Skip `offset` rows and return at most `limit`.
    pub fn range(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as PostgREST query parameters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(columns) = &self.columns {
            params.push(("select".to_string(), columns.clone()));
        }
        for filter in &self.filters {
            params.push(filter.to_param());
        }
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Whether a row satisfies every filter.
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Sort rows by this query's ordering.
    pub fn sort(&self, rows: &mut [Map<String, Value>]) {
        if self.order.is_empty() {
            return;
        }
        rows.sort_by(|a, b| {
            for order in &self.order {
                let ord = compare_nullable(a.get(&order.column), b.get(&order.column));
                let ord = if order.ascending { ord } else { ord.reverse() };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    /// Apply offset and limit to an already filtered, sorted list.
    pub fn paginate<T>(&self, rows: Vec<T>) -> Vec<T> {
        let offset = self.offset.unwrap_or(0) as usize;
        let iter = rows.into_iter().skip(offset);
        match self.limit {
            Some(limit) => iter.take(limit as usize).collect(),
            None => iter.collect(),
        }
    }
}

impl Filter {
    fn to_param(&self) -> (String, String) {
        match self {
            Self::Eq(c, v) => (c.clone(), format!("eq.{}", value_param(v))),
            Self::Neq(c, v) => (c.clone(), format!("neq.{}", value_param(v))),
            Self::Gt(c, v) => (c.clone(), format!("gt.{}", value_param(v))),
            Self::Gte(c, v) => (c.clone(), format!("gte.{}", value_param(v))),
            Self::Lt(c, v) => (c.clone(), format!("lt.{}", value_param(v))),
            Self::Lte(c, v) => (c.clone(), format!("lte.{}", value_param(v))),
            Self::In(c, values) => {
                let list = values.iter().map(in_list_item).collect::<Vec<_>>().join(",");
                (c.clone(), format!("in.({list})"))
            }
            Self::IsNull(c) => (c.clone(), "is.null".to_string()),
            Self::NotNull(c) => (c.clone(), "not.is.null".to_string()),
        }
    }

    fn matches(&self, row: &Map<String, Value>) -> bool {
        let cell = |c: &str| row.get(c).filter(|v| !v.is_null());
        match self {
            Self::Eq(c, v) => cell(c).is_some_and(|x| compare(x, v) == Ordering::Equal),
            Self::Neq(c, v) => cell(c).is_some_and(|x| compare(x, v) != Ordering::Equal),
            Self::Gt(c, v) => cell(c).is_some_and(|x| compare(x, v) == Ordering::Greater),
            Self::Gte(c, v) => cell(c).is_some_and(|x| compare(x, v) != Ordering::Less),
            Self::Lt(c, v) => cell(c).is_some_and(|x| compare(x, v) == Ordering::Less),
            Self::Lte(c, v) => cell(c).is_some_and(|x| compare(x, v) != Ordering::Greater),
            Self::In(c, values) => {
                cell(c).is_some_and(|x| values.iter().any(|v| compare(x, v) == Ordering::Equal))
            }
            Self::IsNull(c) => cell(c).is_none(),
            Self::NotNull(c) => cell(c).is_some(),
        }
    }
}

/// Serialize a filter value. Values that cannot be represented as JSON
/// become `null`, which no equality filter matches.
fn to_json(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Plain-text rendering of a scalar for a query parameter.
pub fn value_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// `in.(...)` items need quoting when they contain list syntax.
fn in_list_item(value: &Value) -> String {
    let raw = value_param(value);
    if raw.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", raw.replace('"', "\\\""))
    } else {
        raw
    }
}

/// Order two non-null JSON scalars the way the database would.
///
/// Numbers compare numerically, RFC 3339 timestamps chronologically,
/// booleans with `false < true`; anything else by text.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => match (parse_time(x), parse_time(y)) {
            (Some(tx), Some(ty)) => tx.cmp(&ty),
            _ => x.cmp(y),
        },
        _ => value_param(a).cmp(&value_param(b)),
    }
}

/// Nulls sort after every value, as in PostgreSQL's default `NULLS LAST`
/// for ascending order.
fn compare_nullable(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => compare(x, y),
    }
}

fn parse_time(s: &str) -> Option<DateTime<FixedOffset>> {
    if s.len() < 20 {
        return None;
    }
    DateTime::parse_from_rfc3339(s).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn renders_postgrest_params() {
        let owner = Uuid::nil();
        let q = Query::new()
            .columns("*")
            .eq("user_id", owner)
            .eq("completed", true)
            .is_in("post_id", [3, 4])
            .order_desc("created_at")
            .range(10, 5);
        assert_eq!(
            q.to_params(),
            vec![
                ("select".into(), "*".into()),
                ("user_id".into(), format!("eq.{owner}")),
                ("completed".into(), "eq.true".into()),
                ("post_id".into(), "in.(3,4)".into()),
                ("order".into(), "created_at.desc".into()),
                ("offset".into(), "10".into()),
                ("limit".into(), "5".into()),
            ]
        );
    }

    #[test]
    fn in_list_quotes_reserved_characters() {
        let q = Query::new().is_in("code", ["a,b", "c"]);
        assert_eq!(q.to_params()[0].1, "in.(\"a,b\",c)");
    }

    #[test]
    fn evaluates_filters_against_rows() {
        let r = row(json!({"id": 7, "user_id": "u1", "completed": false, "deadline": null}));
        assert!(Query::new().eq("id", 7).matches(&r));
        assert!(Query::new().eq("user_id", "u1").eq("completed", false).matches(&r));
        assert!(!Query::new().eq("completed", true).matches(&r));
        assert!(Query::new().is_null("deadline").matches(&r));
        assert!(Query::new().is_null("missing").matches(&r));
        assert!(Query::new().gte("id", 7).lt("id", 8).matches(&r));
        assert!(!Query::new().is_in("id", Vec::<i64>::new()).matches(&r));
        assert!(Query::new().is_in("id", [1, 7]).matches(&r));
    }

    #[test]
    fn timestamps_compare_chronologically() {
        let a = json!("2025-01-10T09:00:00Z");
        let b = json!("2025-01-10T09:00:00.500Z");
        assert_eq!(compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn sort_desc_puts_nulls_first() {
        let mut rows = vec![
            row(json!({"id": 1, "due": "2025-01-01T00:00:00Z"})),
            row(json!({"id": 2, "due": null})),
            row(json!({"id": 3, "due": "2025-02-01T00:00:00Z"})),
        ];
        Query::new().order_asc("due").sort(&mut rows);
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 3, 2]);

        Query::new().order_desc("due").sort(&mut rows);
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn paginate_applies_offset_and_limit() {
        let q = Query::new().range(2, 2);
        assert_eq!(q.paginate(vec![1, 2, 3, 4, 5]), vec![3, 4]);
        assert_eq!(Query::new().paginate(vec![1, 2]), vec![1, 2]);
    }
}
