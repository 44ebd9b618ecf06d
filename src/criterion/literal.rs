use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

use crate::error::{Error, Result};

/// Format used for date-time operands in encoded queries.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used for single-day operands (`ON` / `NOTON` clauses).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A typed operand on the right-hand side of a condition.
///
/// Date-times are stored already normalized to UTC: timezone-aware values are
/// converted on the way in, naive values are taken to be UTC.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    String(String),
    DateTime(NaiveDateTime),
    List(Vec<Literal>),

    /// Never accepted by an operator. Exists so callers holding loosely typed
    /// values (JSON, CLI input) get a `QueryTypeError` instead of a coercion.
    Boolean(bool),

    /// Never accepted by an operator, see [`Literal::Boolean`].
    Float(f64),
}

/// The type tag of a [`Literal`], used by operator acceptance tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Integer,
    String,
    DateTime,
    List,
    Boolean,
    Float,
}

impl LiteralKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LiteralKind::Integer => "integer",
            LiteralKind::String => "string",
            LiteralKind::DateTime => "datetime",
            LiteralKind::List => "list",
            LiteralKind::Boolean => "boolean",
            LiteralKind::Float => "float",
        }
    }
}

impl std::fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Literal {
    pub fn kind(&self) -> LiteralKind {
        match self {
            Literal::Integer(_) => LiteralKind::Integer,
            Literal::String(_) => LiteralKind::String,
            Literal::DateTime(_) => LiteralKind::DateTime,
            Literal::List(_) => LiteralKind::List,
            Literal::Boolean(_) => LiteralKind::Boolean,
            Literal::Float(_) => LiteralKind::Float,
        }
    }

    /// Renders the literal the way the stateful builder writes it: date-times
    /// as bare `YYYY-MM-DD HH:MM:SS`, lists comma-joined.
    pub fn render_plain(&self) -> String {
        match self {
            Literal::Integer(n) => n.to_string(),
            Literal::String(s) => s.clone(),
            Literal::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Literal::List(items) => join_list(items, Literal::render_plain),
            Literal::Boolean(b) => b.to_string(),
            Literal::Float(n) => n.to_string(),
        }
    }

    /// Renders the literal the way criterion trees write it: date-times wrapped
    /// in a `javascript:gs.dateGenerate(...)` call.
    pub fn render_criterion(&self) -> String {
        match self {
            Literal::DateTime(dt) => date_generate(&dt.format(DATETIME_FORMAT).to_string()),
            Literal::List(items) => join_list(items, Literal::render_criterion),
            other => other.render_plain(),
        }
    }
}

fn join_list(items: &[Literal], render: fn(&Literal) -> String) -> String {
    items.iter().map(render).collect::<Vec<_>>().join(",")
}

/// Wraps a date expression in the platform's server-side date generator.
pub fn date_generate(value: &str) -> String {
    format!("javascript:gs.dateGenerate(\"{value}\")")
}

/// Checks `value` against the kinds `operation` accepts.
pub(crate) fn expect_kind(
    operation: &'static str,
    value: Literal,
    accepted: &[LiteralKind],
) -> Result<Literal> {
    if accepted.contains(&value.kind()) {
        Ok(value)
    } else {
        Err(type_error(operation, accepted, value.kind()))
    }
}

/// Checks that `value` is a list whose items all share one accepted kind.
pub(crate) fn expect_homogeneous_list(
    operation: &'static str,
    value: Literal,
    item_kinds: &[LiteralKind],
) -> Result<Literal> {
    let Literal::List(items) = &value else {
        return Err(Error::QueryTypeError {
            operation,
            expected: format!("list of {}", describe(item_kinds)),
            actual: value.kind().as_str(),
        });
    };

    let first = items.first().map(Literal::kind);
    for item in items {
        let kind = item.kind();
        if !item_kinds.contains(&kind) || Some(kind) != first {
            return Err(Error::QueryTypeError {
                operation,
                expected: format!("homogeneous list of {}", describe(item_kinds)),
                actual: kind.as_str(),
            });
        }
    }

    Ok(value)
}

pub(crate) fn type_error(
    operation: &'static str,
    accepted: &[LiteralKind],
    actual: LiteralKind,
) -> Error {
    Error::QueryTypeError {
        operation,
        expected: describe(accepted),
        actual: actual.as_str(),
    }
}

fn describe(kinds: &[LiteralKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(" or ")
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Integer(i64::from(value))
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Literal::Integer(i64::from(value))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<&String> for Literal {
    fn from(value: &String) -> Self {
        Literal::String(value.clone())
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<NaiveDateTime> for Literal {
    fn from(value: NaiveDateTime) -> Self {
        Literal::DateTime(value)
    }
}

impl From<NaiveDate> for Literal {
    fn from(value: NaiveDate) -> Self {
        Literal::DateTime(value.and_time(chrono::NaiveTime::default()))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Literal {
    fn from(value: DateTime<Tz>) -> Self {
        Literal::DateTime(value.naive_utc())
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(values: Vec<T>) -> Self {
        Literal::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Literal> + Clone> From<&[T]> for Literal {
    fn from(values: &[T]) -> Self {
        Literal::List(values.iter().cloned().map(Into::into).collect())
    }
}

impl TryFrom<serde_json::Value> for Literal {
    type Error = Error;

    /// Converts loosely typed JSON input. Objects and nulls have no literal form.
    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(b) => Ok(Literal::Boolean(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Literal::Integer(i)),
                None => Ok(Literal::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Ok(Literal::String(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Literal::try_from)
                .collect::<Result<Vec<_>>>()
                .map(Literal::List),
            serde_json::Value::Null | serde_json::Value::Object(_) => Err(Error::InvalidUsage(
                "query values must be numbers, strings, booleans or arrays".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn aware_datetimes_are_normalized_to_utc() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let dt = offset.with_ymd_and_hms(2016, 2, 1, 3, 0, 0).unwrap();
        assert_eq!(Literal::from(dt).render_plain(), "2016-02-01 02:00:00");
    }

    #[test]
    fn lists_render_comma_joined() {
        assert_eq!(Literal::from(vec!["foo", "bar"]).render_plain(), "foo,bar");
        assert_eq!(Literal::from(vec![1, 2]).render_criterion(), "1,2");
    }

    #[test]
    fn mixed_lists_are_rejected_as_homogeneous() {
        let mixed = Literal::List(vec![Literal::from(1), Literal::from("a")]);
        let err = expect_homogeneous_list("is_in", mixed, &[LiteralKind::Integer, LiteralKind::String]);
        assert!(matches!(err, Err(Error::QueryTypeError { operation: "is_in", .. })));
    }
}
