//! Query filters and their canonical query-string form.
//!
//! A [`QueryFilter`] is an insertion-ordered mapping of parameter names to
//! optional, loosely typed values. [`serialize`] renders it as
//! `key=value&key=value` in insertion order, dropping absent and empty
//! values and joining list values with `,`.
//!
//! Values are not percent-encoded. Callers that pass reserved characters
//! (`&`, `=`, `#`, spaces) in free-text parameters such as `search` must
//! encode them first.

use std::fmt;

/// Parameter names that express a position in the page tree.
pub const TREE_PARAMS: [&str; 3] = ["child_of", "ancestor_of", "descendant_of"];

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Free text.
    Text(String),
    /// Whole number.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Ordered list, rendered comma-joined.
    List(Vec<String>),
}

impl QueryValue {
    /// Whether this value is dropped from the query string.
    pub fn is_empty(&self) -> bool {
        match self {
            QueryValue::Text(s) => s.is_empty(),
            QueryValue::List(items) => items.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Text(s) => f.write_str(s),
            QueryValue::Int(n) => write!(f, "{}", n),
            QueryValue::Float(n) => write!(f, "{}", n),
            QueryValue::Bool(b) => write!(f, "{}", b),
            QueryValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        // Ids and counts above i64::MAX do not occur in practice; keep the
        // digits rather than wrapping.
        match i64::try_from(value) {
            Ok(n) => QueryValue::Int(n),
            Err(_) => QueryValue::Text(value.to_string()),
        }
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(value: Vec<String>) -> Self {
        QueryValue::List(value)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(value: Vec<&str>) -> Self {
        QueryValue::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Insertion-ordered set of query parameters.
///
/// Setting a key that is already present replaces its value in place; the
/// key keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    entries: Vec<(String, Option<QueryValue>)>,
}

impl QueryFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, builder style.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    /// Mark a parameter as absent. It keeps its position but is not rendered.
    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.insert(key, None);
        self
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<QueryValue>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Overlay every entry of `other` onto this filter, `other` winning.
    pub fn merge(mut self, other: &QueryFilter) -> Self {
        for (key, value) in &other.entries {
            self.insert(key.clone(), value.clone());
        }
        self
    }

    /// Value of a parameter, if set.
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Whether a parameter would be rendered into the query string.
    pub fn is_present(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Iterate the rendered parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().filter_map(|(k, v)| match v {
            Some(v) if !v.is_empty() => Some((k.as_str(), v)),
            _ => None,
        })
    }

    /// Whether nothing would be rendered.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Whether any tree-relation parameter is present.
    pub fn has_tree_filter(&self) -> bool {
        TREE_PARAMS.iter().any(|key| self.is_present(key))
    }

    /// Render the canonical query string (without a leading `?`).
    pub fn to_query_string(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    // ─────────────────────────────────────────────────────────────────────
    // Known API parameters
    // ─────────────────────────────────────────────────────────────────────

    /// Restrict to a model, e.g. `blog.BlogPage`.
    pub fn content_type(self, model: impl Into<String>) -> Self {
        self.set("type", model.into())
    }

    /// Fields to include in each item. `*` selects all, `-name` removes one.
    pub fn fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(
            "fields",
            QueryValue::List(fields.into_iter().map(Into::into).collect()),
        )
    }

    /// Page size.
    pub fn limit(self, limit: u64) -> Self {
        self.set("limit", limit)
    }

    /// Pagination offset.
    pub fn offset(self, offset: u64) -> Self {
        self.set("offset", offset)
    }

    /// Ordering field, `-field` for descending or `random`.
    pub fn order(self, order: impl Into<String>) -> Self {
        self.set("order", order.into())
    }

    /// Full-text search terms.
    pub fn search(self, terms: impl Into<String>) -> Self {
        self.set("search", terms.into())
    }

    /// `and` or `or` for multi-term searches.
    pub fn search_operator(self, operator: impl Into<String>) -> Self {
        self.set("search_operator", operator.into())
    }

    /// Restrict to a locale code.
    pub fn locale(self, locale: impl Into<String>) -> Self {
        self.set("locale", locale.into())
    }

    /// Translations of the given page id.
    pub fn translation_of(self, id: u64) -> Self {
        self.set("translation_of", id)
    }

    /// Direct children of the given page id.
    pub fn child_of(self, id: u64) -> Self {
        self.set("child_of", id)
    }

    /// Ancestors of the given page id.
    pub fn ancestor_of(self, id: u64) -> Self {
        self.set("ancestor_of", id)
    }

    /// Descendants of the given page id.
    pub fn descendant_of(self, id: u64) -> Self {
        self.set("descendant_of", id)
    }

    /// Exact slug match.
    pub fn slug(self, slug: impl Into<String>) -> Self {
        self.set("slug", slug.into())
    }

    /// Restrict on the page's menu flag.
    pub fn show_in_menus(self, show: bool) -> Self {
        self.set("show_in_menus", show)
    }
}

impl<K, V> FromIterator<(K, V)> for QueryFilter
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut filter = QueryFilter::new();
        for (key, value) in iter {
            filter.insert(key, Some(value.into()));
        }
        filter
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Serialize an optional filter. An absent filter yields an empty string.
pub fn serialize(filter: Option<&QueryFilter>) -> String {
    filter.map(QueryFilter::to_query_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_and_empty_filters() {
        assert_eq!(serialize(None), "");
        assert_eq!(serialize(Some(&QueryFilter::new())), "");
    }

    #[test]
    fn test_scalars_and_lists_in_insertion_order() {
        let filter = QueryFilter::new().set("a", 1).set("b", vec!["x", "y"]);
        assert_eq!(serialize(Some(&filter)), "a=1&b=x,y");

        let filter = QueryFilter::new().set("b", vec!["x", "y"]).set("a", 1);
        assert_eq!(serialize(Some(&filter)), "b=x,y&a=1");
    }

    #[test]
    fn test_empty_and_absent_values_dropped() {
        let filter = QueryFilter::new()
            .set("a", "")
            .unset("b")
            .set("c", "v");
        assert_eq!(serialize(Some(&filter)), "c=v");
    }

    #[test]
    fn test_scalar_rendering() {
        let filter = QueryFilter::new()
            .set("flag", false)
            .set("ratio", 0.5)
            .set("whole", 2.0);
        assert_eq!(filter.to_query_string(), "flag=false&ratio=0.5&whole=2");
    }

    #[test]
    fn test_no_percent_encoding() {
        let filter = QueryFilter::new().search("hello world");
        assert_eq!(filter.to_query_string(), "search=hello world");
    }

    #[test]
    fn test_replace_keeps_position() {
        let filter = QueryFilter::new()
            .slug("home")
            .limit(5)
            .slug("about");
        assert_eq!(filter.to_query_string(), "slug=about&limit=5");
    }

    #[test]
    fn test_merge_overlays() {
        let base = QueryFilter::new().slug("home");
        let extra = QueryFilter::new().fields(["title", "body"]).slug("about");
        let merged = base.merge(&extra);
        assert_eq!(merged.to_query_string(), "slug=about&fields=title,body");
    }

    #[test]
    fn test_presence_checks() {
        let filter = QueryFilter::new().order("").offset(10).child_of(3);
        assert!(!filter.is_present("order"));
        assert!(filter.is_present("offset"));
        assert!(filter.has_tree_filter());
        assert!(!QueryFilter::new().locale("en").has_tree_filter());
    }

    #[test]
    fn test_from_iterator() {
        let filter: QueryFilter = vec![("type", "blog.BlogPage"), ("locale", "fr")]
            .into_iter()
            .collect();
        assert_eq!(filter.to_string(), "type=blog.BlogPage&locale=fr");
    }
}
