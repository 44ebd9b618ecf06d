//! Query stringification and `sysparm_*` request parameters.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::{
    criterion::Criterion,
    error::{Error, Result},
    query_builder::QueryBuilder,
};

pub const SYSPARM_QUERY: &str = "sysparm_query";
pub const SYSPARM_LIMIT: &str = "sysparm_limit";
pub const SYSPARM_OFFSET: &str = "sysparm_offset";
pub const SYSPARM_FIELDS: &str = "sysparm_fields";
pub const SYSPARM_SUPPRESS_PAGINATION_HEADER: &str = "sysparm_suppress_pagination_header";
pub const SYSPARM_DISPLAY_VALUE: &str = "sysparm_display_value";
pub const SYSPARM_EXCLUDE_REFERENCE_LINK: &str = "sysparm_exclude_reference_link";
pub const SYSPARM_VIEW: &str = "sysparm_view";

/// Anything that can become a `sysparm_query` value.
#[derive(Debug, Clone)]
pub enum QueryInput {
    Builder(QueryBuilder),
    Criterion(Criterion),
    /// Rendered as `k1=v1^k2=v2` in insertion order.
    Mapping(Vec<(String, String)>),
    /// Passed through unchanged.
    Raw(String),
}

impl QueryInput {
    pub fn stringify(&self) -> Result<String> {
        match self {
            QueryInput::Builder(builder) => builder.build(),
            QueryInput::Criterion(criterion) => Ok(criterion.to_string()),
            QueryInput::Mapping(pairs) => Ok(pairs
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("^")),
            QueryInput::Raw(query) => Ok(query.clone()),
        }
    }
}

impl Default for QueryInput {
    fn default() -> Self {
        QueryInput::Raw(String::new())
    }
}

impl From<QueryBuilder> for QueryInput {
    fn from(value: QueryBuilder) -> Self {
        QueryInput::Builder(value)
    }
}

impl From<Criterion> for QueryInput {
    fn from(value: Criterion) -> Self {
        QueryInput::Criterion(value)
    }
}

impl From<&str> for QueryInput {
    fn from(value: &str) -> Self {
        QueryInput::Raw(value.to_string())
    }
}

impl From<String> for QueryInput {
    fn from(value: String) -> Self {
        QueryInput::Raw(value)
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for QueryInput {
    fn from(pairs: Vec<(K, V)>) -> Self {
        QueryInput::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for QueryInput {
    fn from(pairs: [(K, V); N]) -> Self {
        QueryInput::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl TryFrom<serde_json::Value> for QueryInput {
    type Error = Error;

    /// Strings pass through, objects become mappings. Scalar object values are
    /// written without JSON quoting.
    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(raw) => Ok(QueryInput::Raw(raw)),
            serde_json::Value::Object(map) => Ok(QueryInput::Mapping(
                map.into_iter()
                    .map(|(k, v)| {
                        let v = match v {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        };
                        (k, v)
                    })
                    .collect(),
            )),
            _ => Err(Error::InvalidUsage(
                "query must be of type string, mapping, criterion or QueryBuilder".to_string(),
            )),
        }
    }
}

/// Appends `^ORDERBY<field>` (or `^ORDERBYDESC<field>` for a `-field`) per
/// key, in the order given.
///
/// ```
/// use snow_client::params::append_order_by;
///
/// let query = append_order_by("foo=bar", &["category", "-created_on"]);
/// assert_eq!(query, "foo=bar^ORDERBYcategory^ORDERBYDESCcreated_on");
/// ```
pub fn append_order_by<S: AsRef<str>>(query: &str, order_by: &[S]) -> String {
    let mut out = query.to_string();
    for key in order_by {
        match key.as_ref().strip_prefix('-') {
            Some(field) => {
                out.push_str("^ORDERBYDESC");
                out.push_str(field);
            }
            None => {
                out.push_str("^ORDERBY");
                out.push_str(key.as_ref());
            }
        }
    }
    out
}

/// Value of `sysparm_display_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayValue {
    #[default]
    False,
    True,
    All,
}

impl DisplayValue {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayValue::False => "false",
            DisplayValue::True => "true",
            DisplayValue::All => "all",
        }
    }
}

impl From<bool> for DisplayValue {
    fn from(value: bool) -> Self {
        if value {
            DisplayValue::True
        } else {
            DisplayValue::False
        }
    }
}

impl FromStr for DisplayValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "true" => Ok(DisplayValue::True),
            "false" => Ok(DisplayValue::False),
            "all" => Ok(DisplayValue::All),
            _ => Err(Error::InvalidUsage(format!(
                "display value can be true, false or 'all', got '{s}'"
            ))),
        }
    }
}

/// The `sysparm_*` parameters of one logical request.
///
/// Custom parameters are merged last and override built-in names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamsBuilder {
    query: String,
    limit: Option<u64>,
    offset: Option<u64>,
    fields: Vec<String>,
    display_value: DisplayValue,
    suppress_pagination_header: bool,
    exclude_reference_link: bool,
    view: Option<String>,
    custom: BTreeMap<String, String>,
}

impl ParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Stringifies and stores `sysparm_query`.
    pub fn set_query(&mut self, query: impl Into<QueryInput>) -> Result<&mut Self> {
        self.query = query.into().stringify()?;
        Ok(self)
    }

    /// Appends sort clauses to the stored query, see [`append_order_by`].
    pub fn set_order_by<S: AsRef<str>>(&mut self, order_by: &[S]) -> &mut Self {
        self.query = append_order_by(&self.query, order_by);
        self
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Sets `sysparm_limit`. An explicit limit also suppresses the pagination header.
    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self.suppress_pagination_header = true;
        self
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn set_offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Sets `sysparm_fields`. Names must be non-empty and free of commas.
    pub fn set_fields<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<&mut Self> {
        let mut names = Vec::with_capacity(fields.len());
        for field in fields {
            let field = field.as_ref();
            if field.is_empty() || field.contains(',') {
                return Err(Error::InvalidUsage(format!(
                    "fields must be a list of non-empty names without commas, got '{field}'"
                )));
            }
            names.push(field.to_string());
        }
        self.fields = names;
        Ok(self)
    }

    pub fn display_value(&self) -> DisplayValue {
        self.display_value
    }

    pub fn set_display_value(&mut self, value: impl Into<DisplayValue>) -> &mut Self {
        self.display_value = value.into();
        self
    }

    pub fn suppress_pagination_header(&self) -> bool {
        self.suppress_pagination_header
    }

    pub fn set_suppress_pagination_header(&mut self, suppress: bool) -> &mut Self {
        self.suppress_pagination_header = suppress;
        self
    }

    pub fn exclude_reference_link(&self) -> bool {
        self.exclude_reference_link
    }

    pub fn set_exclude_reference_link(&mut self, exclude: bool) -> &mut Self {
        self.exclude_reference_link = exclude;
        self
    }

    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub fn set_view(&mut self, view: impl Into<String>) -> &mut Self {
        self.view = Some(view.into());
        self
    }

    pub fn custom(&self) -> &BTreeMap<String, String> {
        &self.custom
    }

    /// Adds open-ended parameters. Later calls override earlier ones.
    pub fn add_custom<K, V, I>(&mut self, params: I) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in params {
            self.custom.insert(k.into(), v.into());
        }
        self
    }

    /// The wire parameters, custom entries merged last.
    pub fn as_pairs(&self) -> BTreeMap<String, String> {
        let mut pairs = BTreeMap::new();
        pairs.insert(SYSPARM_QUERY.to_string(), self.query.clone());
        if let Some(limit) = self.limit {
            pairs.insert(SYSPARM_LIMIT.to_string(), limit.to_string());
        }
        if let Some(offset) = self.offset {
            pairs.insert(SYSPARM_OFFSET.to_string(), offset.to_string());
        }
        if !self.fields.is_empty() {
            pairs.insert(SYSPARM_FIELDS.to_string(), self.fields.join(","));
        }
        pairs.insert(
            SYSPARM_DISPLAY_VALUE.to_string(),
            self.display_value.as_str().to_string(),
        );
        pairs.insert(
            SYSPARM_SUPPRESS_PAGINATION_HEADER.to_string(),
            self.suppress_pagination_header.to_string(),
        );
        pairs.insert(
            SYSPARM_EXCLUDE_REFERENCE_LINK.to_string(),
            self.exclude_reference_link.to_string(),
        );
        if let Some(view) = &self.view {
            pairs.insert(SYSPARM_VIEW.to_string(), view.clone());
        }

        for (k, v) in &self.custom {
            pairs.insert(k.clone(), v.clone());
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_keeps_insertion_order() {
        let query = QueryInput::from(vec![("b", "2"), ("a", "1")]);
        assert_eq!(query.stringify().unwrap(), "b=2^a=1");
    }

    #[test]
    fn json_arrays_are_not_queries() {
        let err = QueryInput::try_from(serde_json::json!([1, 2]));
        assert!(matches!(err, Err(Error::InvalidUsage(_))));
    }

    #[test]
    fn custom_overrides_builtin() {
        let mut params = ParamsBuilder::new();
        params.set_limit(5);
        params.add_custom([("sysparm_limit", "7")]);
        assert_eq!(params.as_pairs()[SYSPARM_LIMIT], "7");
        assert!(params.suppress_pagination_header());
    }
}
