//! Stateful, chained construction of encoded queries.
//!
//! [`QueryBuilder`] targets the same grammar as [`criterion`](crate::criterion)
//! but accumulates rendered tokens as it goes. Each call is checked against an
//! explicit [`BuilderState`]; out-of-order calls fail at the offending call.
//!
//! ```
//! use snow_client::QueryBuilder;
//!
//! # fn main() -> snow_client::Result<()> {
//! let query = QueryBuilder::new()
//!     .field("active")
//!     .equals("true")?
//!     .and()?
//!     .field("priority")
//!     .equals(vec!["1", "2"])?
//!     .build()?;
//!
//! assert_eq!(query, "active=true^priorityIN1,2");
//! # Ok(())
//! # }
//! ```

use crate::{
    criterion::{
        literal::{Literal, LiteralKind, expect_kind, type_error},
        operators::{Comparison, Connective, Order},
    },
    error::{Error, Result},
};

/// Where the builder is in the `field -> condition -> connective` cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BuilderState {
    /// Nothing has happened yet.
    #[default]
    Empty,
    /// A field is active and awaits its condition.
    FieldSet(String),
    /// A condition was applied to the active field; a connective or render may follow.
    Pending(String),
    /// A connective was applied; a new field is required.
    AwaitingField,
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    tokens: Vec<String>,
    state: BuilderState,
    last_connective: Option<Connective>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    /// The most recent connective applied, if any.
    pub fn last_connective(&self) -> Option<Connective> {
        self.last_connective
    }

    /// Sets the field to operate on. A condition already pending stays pending.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.state = match self.state {
            BuilderState::Pending(_) => BuilderState::Pending(name),
            _ => BuilderState::FieldSet(name),
        };
        self
    }

    fn active_field(&self) -> Result<String> {
        match &self.state {
            BuilderState::FieldSet(field) => Ok(field.clone()),
            BuilderState::Pending(_) => Err(Error::QueryMultipleExpressions),
            BuilderState::Empty | BuilderState::AwaitingField => {
                Err(Error::QueryMissingField("conditions require a field()"))
            }
        }
    }

    fn push_condition(mut self, field: String, token: String) -> Self {
        self.tokens.push(token);
        self.state = BuilderState::Pending(field);
        self
    }

    fn compare(
        self,
        operation: &'static str,
        op: Comparison,
        value: impl Into<Literal>,
    ) -> Result<Self> {
        let field = self.active_field()?;
        let value = expect_kind(operation, value.into(), op.accepts())?;
        let token = format!("{field}{}{}", op.token(), value.render_plain());
        Ok(self.push_condition(field, token))
    }

    /// `=` for a string, `IN` for a list.
    pub fn equals(self, value: impl Into<Literal>) -> Result<Self> {
        self.equality("equals", Comparison::Equal, Comparison::In, value)
    }

    /// `!=` for a string, `NOT IN` for a list.
    pub fn not_equals(self, value: impl Into<Literal>) -> Result<Self> {
        self.equality("not_equals", Comparison::NotEqual, Comparison::NotIn, value)
    }

    fn equality(
        self,
        operation: &'static str,
        scalar: Comparison,
        list: Comparison,
        value: impl Into<Literal>,
    ) -> Result<Self> {
        let field = self.active_field()?;
        let value = value.into();
        let op = match &value {
            Literal::String(_) => scalar,
            Literal::List(items) => {
                if let Some(bad) = items
                    .iter()
                    .find(|item| !list.accepts().contains(&item.kind()))
                {
                    return Err(type_error(operation, list.accepts(), bad.kind()));
                }
                list
            }
            other => {
                return Err(type_error(
                    operation,
                    &[LiteralKind::String, LiteralKind::List],
                    other.kind(),
                ));
            }
        };

        let token = format!("{field}{}{}", op.token(), value.render_plain());
        Ok(self.push_condition(field, token))
    }

    pub fn greater_than(self, value: impl Into<Literal>) -> Result<Self> {
        self.compare("greater_than", Comparison::GreaterThan, value)
    }

    pub fn greater_than_or_equal(self, value: impl Into<Literal>) -> Result<Self> {
        self.compare("greater_than_or_equal", Comparison::GreaterEqual, value)
    }

    pub fn less_than(self, value: impl Into<Literal>) -> Result<Self> {
        self.compare("less_than", Comparison::LessThan, value)
    }

    pub fn less_than_or_equal(self, value: impl Into<Literal>) -> Result<Self> {
        self.compare("less_than_or_equal", Comparison::LessEqual, value)
    }

    pub fn starts_with(self, value: impl Into<Literal>) -> Result<Self> {
        self.compare("starts_with", Comparison::StartsWith, value)
    }

    pub fn ends_with(self, value: impl Into<Literal>) -> Result<Self> {
        self.compare("ends_with", Comparison::EndsWith, value)
    }

    pub fn contains(self, value: impl Into<Literal>) -> Result<Self> {
        self.compare("contains", Comparison::Like, value)
    }

    pub fn not_contains(self, value: impl Into<Literal>) -> Result<Self> {
        self.compare("not_contains", Comparison::NotLike, value)
    }

    pub fn is_empty(self) -> Result<Self> {
        self.suffix("ISEMPTY")
    }

    pub fn is_not_empty(self) -> Result<Self> {
        self.suffix("ISNOTEMPTY")
    }

    fn suffix(self, keyword: &str) -> Result<Self> {
        let field = self.active_field()?;
        let token = format!("{field}{keyword}");
        Ok(self.push_condition(field, token))
    }

    /// Integer bounds render as `start@end`; date-time bounds as two
    /// `javascript:gs.dateGenerate(...)` calls joined by `@`.
    pub fn between(self, start: impl Into<Literal>, end: impl Into<Literal>) -> Result<Self> {
        let field = self.active_field()?;
        let bounds = match (start.into(), end.into()) {
            (start @ Literal::Integer(_), end @ Literal::Integer(_))
            | (start @ Literal::DateTime(_), end @ Literal::DateTime(_)) => {
                format!("{}@{}", start.render_criterion(), end.render_criterion())
            }
            (start, end) => {
                let actual = if matches!(start, Literal::Integer(_) | Literal::DateTime(_)) {
                    end.kind()
                } else {
                    start.kind()
                };
                return Err(type_error(
                    "between",
                    &[LiteralKind::Integer, LiteralKind::DateTime],
                    actual,
                ));
            }
        };

        let token = format!("{field}BETWEEN{bounds}");
        Ok(self.push_condition(field, token))
    }

    pub fn order_ascending(self) -> Result<Self> {
        self.order(Order::Asc)
    }

    pub fn order_descending(self) -> Result<Self> {
        self.order(Order::Desc)
    }

    fn order(self, order: Order) -> Result<Self> {
        let field = self.active_field()?;
        let token = format!("{}{field}", order.prefix());
        Ok(self.push_condition(field, token))
    }

    /// Appends `^`.
    pub fn and(self) -> Result<Self> {
        self.connective(Connective::And)
    }

    /// Appends `^OR`.
    pub fn or(self) -> Result<Self> {
        self.connective(Connective::Or)
    }

    /// Appends `^NQ`.
    pub fn nq(self) -> Result<Self> {
        self.connective(Connective::NewQuery)
    }

    fn connective(mut self, connective: Connective) -> Result<Self> {
        if !matches!(self.state, BuilderState::Pending(_)) {
            return Err(Error::QueryExpressionError(
                "logical operators must be preceded by an expression",
            ));
        }

        self.tokens.push(connective.token().to_string());
        self.state = BuilderState::AwaitingField;
        self.last_connective = Some(connective);
        Ok(self)
    }

    /// Renders the accumulated tokens. Only valid right after a condition.
    pub fn build(&self) -> Result<String> {
        if self.tokens.is_empty() {
            return Err(Error::QueryEmpty);
        }

        match self.state {
            BuilderState::Pending(_) => Ok(self.tokens.concat()),
            BuilderState::FieldSet(_) => {
                Err(Error::QueryExpressionError("field() expects an expression"))
            }
            BuilderState::Empty | BuilderState::AwaitingField => {
                Err(Error::QueryMissingField("logical operator expects a field()"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_does_not_clear_pending_condition() {
        let qb = QueryBuilder::new().field("a").equals("1").unwrap().field("b");
        assert_eq!(qb.state(), &BuilderState::Pending("b".to_string()));
        assert!(matches!(qb.equals("2"), Err(Error::QueryMultipleExpressions)));
    }

    #[test]
    fn connective_is_recorded() {
        let qb = QueryBuilder::new().field("a").is_empty().unwrap().or().unwrap();
        assert_eq!(qb.last_connective(), Some(Connective::Or));
        assert_eq!(qb.state(), &BuilderState::AwaitingField);
    }
}
