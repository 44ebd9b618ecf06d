use crate::{
    criterion::{
        dates::{OnOperand, OnValue},
        expressions::Criterion,
        literal::{Literal, LiteralKind, expect_homogeneous_list, expect_kind, type_error},
        operators::{Comparison, Order},
    },
    error::Result,
};

/// A named record attribute. The origin of every criterion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Field { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn compare(
        &self,
        operation: &'static str,
        op: Comparison,
        value: impl Into<Literal>,
    ) -> Result<Criterion> {
        let value = if op.is_list_op() {
            expect_homogeneous_list(operation, value.into(), op.accepts())?
        } else {
            expect_kind(operation, value.into(), op.accepts())?
        };

        Ok(Criterion::Compare {
            field: self.name.clone(),
            op,
            value,
        })
    }

    pub fn eq(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("eq", Comparison::Equal, value)
    }

    pub fn ne(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("ne", Comparison::NotEqual, value)
    }

    pub fn gt(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("gt", Comparison::GreaterThan, value)
    }

    pub fn gte(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("gte", Comparison::GreaterEqual, value)
    }

    pub fn lt(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("lt", Comparison::LessThan, value)
    }

    pub fn lte(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("lte", Comparison::LessEqual, value)
    }

    pub fn starts_with(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("starts_with", Comparison::StartsWith, value)
    }

    pub fn ends_with(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("ends_with", Comparison::EndsWith, value)
    }

    /// Alias of [`Field::like`].
    pub fn contains(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("contains", Comparison::Like, value)
    }

    /// Alias of [`Field::not_like`].
    pub fn not_contains(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("not_contains", Comparison::NotLike, value)
    }

    pub fn like(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("like", Comparison::Like, value)
    }

    pub fn not_like(&self, value: impl Into<Literal>) -> Result<Criterion> {
        self.compare("not_like", Comparison::NotLike, value)
    }

    /// `IN` over a homogeneous list of integers or strings.
    pub fn is_in(&self, values: impl Into<Literal>) -> Result<Criterion> {
        self.compare("is_in", Comparison::In, values)
    }

    /// `NOT IN` over a homogeneous list of integers or strings.
    pub fn not_in(&self, values: impl Into<Literal>) -> Result<Criterion> {
        self.compare("not_in", Comparison::NotIn, values)
    }

    pub fn is_empty(&self) -> Criterion {
        Criterion::IsEmpty(self.name.clone())
    }

    pub fn is_not_empty(&self) -> Criterion {
        Criterion::IsNotEmpty(self.name.clone())
    }

    pub fn is_anything(&self) -> Criterion {
        Criterion::IsAnything(self.name.clone())
    }

    pub fn is_empty_string(&self) -> Criterion {
        Criterion::IsEmptyString(self.name.clone())
    }

    /// Matches when this field holds the same value as `other`.
    pub fn is_same(&self, other: &Field) -> Criterion {
        Criterion::Compare {
            field: self.name.clone(),
            op: Comparison::SameAs,
            value: Literal::String(other.name.clone()),
        }
    }

    /// Matches when this field differs from `other`.
    pub fn is_different(&self, other: &Field) -> Criterion {
        Criterion::Compare {
            field: self.name.clone(),
            op: Comparison::NotSameAs,
            value: Literal::String(other.name.clone()),
        }
    }

    /// Both bounds must be integers, or both date-times.
    pub fn between(
        &self,
        start: impl Into<Literal>,
        end: impl Into<Literal>,
    ) -> Result<Criterion> {
        const ACCEPTED: &[LiteralKind] = &[LiteralKind::Integer, LiteralKind::DateTime];

        let start = expect_kind("between", start.into(), ACCEPTED)?;
        let end = expect_kind("between", end.into(), ACCEPTED)?;
        if start.kind() != end.kind() {
            return Err(type_error("between", &[start.kind()], end.kind()));
        }

        Ok(Criterion::Between {
            field: self.name.clone(),
            start,
            end,
        })
    }

    pub fn on(&self, value: impl Into<OnOperand>) -> Result<Criterion> {
        self.on_clause("on", value.into(), false)
    }

    pub fn not_on(&self, value: impl Into<OnOperand>) -> Result<Criterion> {
        self.on_clause("not_on", value.into(), true)
    }

    fn on_clause(
        &self,
        operation: &'static str,
        operand: OnOperand,
        negated: bool,
    ) -> Result<Criterion> {
        let value = match operand {
            OnOperand::Window(window) => OnValue::Window(window),
            OnOperand::Literal(Literal::DateTime(dt)) => OnValue::Day(dt.date()),
            OnOperand::Literal(other) => {
                return Err(type_error(operation, &[LiteralKind::DateTime], other.kind()));
            }
        };

        Ok(Criterion::On {
            field: self.name.clone(),
            value,
            negated,
        })
    }

    pub fn order(&self, order: Order) -> Criterion {
        Criterion::OrderBy {
            field: self.name.clone(),
            order,
        }
    }
}

/// Hands out [`Field`]s for one table.
///
/// ```
/// use snow_client::criterion::Table;
///
/// let incident = Table::new("incident");
/// let crit = incident.field("number").eq("INC0001").unwrap();
/// assert_eq!(crit.to_string(), "number=INC0001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: impl Into<String>) -> Field {
        Field::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn is_same_uses_the_other_field_name() {
        let crit = Field::new("assigned_to").is_same(&Field::new("opened_by"));
        assert_eq!(crit.to_string(), "assigned_toSAMEASopened_by");
        let crit = Field::new("assigned_to").is_different(&Field::new("opened_by"));
        assert_eq!(crit.to_string(), "assigned_toNSAMEASopened_by");
    }

    #[test]
    fn type_errors_name_the_operation() {
        match Field::new("a").starts_with(1) {
            Err(Error::QueryTypeError { operation, actual, .. }) => {
                assert_eq!(operation, "starts_with");
                assert_eq!(actual, "integer");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn between_rejects_mixed_bounds() {
        let day = chrono::NaiveDate::from_ymd_opt(2016, 2, 1).unwrap();
        assert!(Field::new("a").between(1, day).is_err());
        assert!(Field::new("a").between("1", "2").is_err());
    }
}
