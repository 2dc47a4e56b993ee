use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Articles,
    Tags,
    TagArticles,
    Comments,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Articles,
        Collection::Tags,
        Collection::TagArticles,
        Collection::Comments,
        Collection::Users,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Articles => "articles",
            Collection::Tags => "tags",
            Collection::TagArticles => "tag_articles",
            Collection::Comments => "comments",
            Collection::Users => "users",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    /// Matches documents where the field is absent, too.
    Ne(String, Value),
    Ge(String, Value),
    In(String, Vec<Value>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Filter::Ne(field.to_string(), value.into())
    }

    pub fn ge(field: &str, value: impl Into<Value>) -> Self {
        Filter::Ge(field.to_string(), value.into())
    }

    pub fn is_in<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In(field.to_string(), values.into_iter().map(Into::into).collect())
    }

    /// Collapses a single-element composite into the element itself.
    pub fn any(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            return filters.remove(0);
        }
        Filter::Or(filters)
    }

    pub fn all(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            return filters.remove(0);
        }
        Filter::And(filters)
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::Eq(field, v) => field_of(doc, field).is_some_and(|x| same(x, v)),
            Filter::Ne(field, v) => !field_of(doc, field).is_some_and(|x| same(x, v)),
            Filter::Ge(field, v) => field_of(doc, field)
                .and_then(|x| compare_values(x, v))
                .is_some_and(|o| o != Ordering::Less),
            Filter::In(field, vs) => {
                field_of(doc, field).is_some_and(|x| vs.iter().any(|v| same(x, v)))
            }
            Filter::And(fs) => fs.iter().all(|f| f.matches(doc)),
            Filter::Or(fs) => fs.iter().any(|f| f.matches(doc)),
        }
    }
}

fn field_of<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    doc.get(field).filter(|v| !v.is_null())
}

fn same(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Some(Ordering::Equal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub sorts: Vec<Sort>,
    pub projection: Vec<String>,
    /// 1-based.
    pub page: usize,
    pub page_size: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Default::default()
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn asc(mut self, field: &str) -> Self {
        self.sorts.push(Sort {
            field: field.to_string(),
            direction: Direction::Ascending,
        });
        self
    }

    pub fn desc(mut self, field: &str) -> Self {
        self.sorts.push(Sort {
            field: field.to_string(),
            direction: Direction::Descending,
        });
        self
    }

    pub fn project(mut self, fields: &[&str]) -> Self {
        self.projection.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page.max(1);
        self.page_size = Some(page_size);
        self
    }

    pub fn offset(&self) -> usize {
        self.page_size
            .map(|size| (self.page.max(1) - 1).saturating_mul(size))
            .unwrap_or(0)
    }

    pub fn page_count(&self, record_count: usize) -> usize {
        match self.page_size {
            Some(size) => domain::pagination::page_count(record_count, size),
            None if record_count == 0 => 0,
            None => 1,
        }
    }

    /// Keeps only projected fields; an empty projection keeps the whole document.
    pub fn apply_projection(&self, doc: Value) -> Value {
        if self.projection.is_empty() {
            return doc;
        }
        let Value::Object(map) = doc else {
            return doc;
        };
        let projected = map
            .into_iter()
            .filter(|(k, _)| self.projection.iter().any(|p| p == k))
            .collect();
        Value::Object(projected)
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for sort in &self.sorts {
            let ord = order_key(a.get(&sort.field), b.get(&sort.field));
            let ord = match sort.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub results: Vec<Value>,
    pub page_count: usize,
    pub record_count: usize,
}

/// Comparable values only: numbers (bools count as 0/1) with numbers,
/// strings with strings. Strings compare lexicographically, which is what
/// fixed-width epoch-millis ids rely on.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn type_rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) | Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(_) => 3,
    }
}

// 与 SQLite 的排序规则保持一致：NULL < 数值 < 文本
fn order_key(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}
