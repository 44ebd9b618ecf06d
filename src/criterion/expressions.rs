use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor};

use crate::criterion::{
    dates::OnValue,
    literal::Literal,
    operators::{Comparison, Connective, Order},
};

/// An immutable node in a criterion tree.
///
/// Nodes are produced by [`Field`](crate::criterion::Field) methods and
/// combined with [`Criterion::and`], [`Criterion::or`] and [`Criterion::nq`]
/// (or `&`, `|` and `^`). Rendering through [`Display`](fmt::Display) is pure:
/// the same tree always yields the same encoded query.
///
/// # Example
///
/// ```
/// use snow_client::criterion::Field;
///
/// let crit = Field::new("a").eq("1").unwrap() | Field::new("b").eq("2").unwrap();
/// assert_eq!(crit.to_string(), "a=1^ORb=2");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// `<field><operator><value>`
    Compare {
        field: String,
        op: Comparison,
        value: Literal,
    },

    /// `<field>ISEMPTY`
    IsEmpty(String),

    /// `<field>ISNOTEMPTY`
    IsNotEmpty(String),

    /// `<field>ANYTHING`
    IsAnything(String),

    /// `<field>EMPTYSTRING`
    IsEmptyString(String),

    /// `<field>BETWEEN<start>@<end>`, both bounds share one kind.
    Between {
        field: String,
        start: Literal,
        end: Literal,
    },

    /// `<field>ON<value>` or `<field>NOTON<value>`
    On {
        field: String,
        value: OnValue,
        negated: bool,
    },

    /// `ORDERBY<field>` or `ORDERBYDESC<field>`
    OrderBy { field: String, order: Order },

    /// Two sub-trees joined by a connective, rendered with no whitespace.
    Logical {
        connective: Connective,
        left: Box<Criterion>,
        right: Box<Criterion>,
    },
}

impl Criterion {
    fn join(self, connective: Connective, other: Criterion) -> Criterion {
        Criterion::Logical {
            connective,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// `self^other`
    pub fn and(self, other: Criterion) -> Criterion {
        self.join(Connective::And, other)
    }

    /// `self^ORother`
    pub fn or(self, other: Criterion) -> Criterion {
        self.join(Connective::Or, other)
    }

    /// `self^NQother`
    pub fn nq(self, other: Criterion) -> Criterion {
        self.join(Connective::NewQuery, other)
    }

    /// Folds `terms` with OR. Returns `None` when `terms` is empty.
    pub fn any<I>(terms: I) -> Option<Criterion>
    where
        I: IntoIterator<Item = Criterion>,
    {
        terms.into_iter().reduce(Criterion::or)
    }

    /// Folds `terms` with AND. Returns `None` when `terms` is empty.
    pub fn all<I>(terms: I) -> Option<Criterion>
    where
        I: IntoIterator<Item = Criterion>,
    {
        terms.into_iter().reduce(Criterion::and)
    }

    /// The encoded query for this tree. Same as `to_string()`.
    pub fn get_query(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Compare { field, op, value } => {
                write!(f, "{field}{}{}", op.token(), value.render_criterion())
            }
            Criterion::IsEmpty(field) => write!(f, "{field}ISEMPTY"),
            Criterion::IsNotEmpty(field) => write!(f, "{field}ISNOTEMPTY"),
            Criterion::IsAnything(field) => write!(f, "{field}ANYTHING"),
            Criterion::IsEmptyString(field) => write!(f, "{field}EMPTYSTRING"),
            Criterion::Between { field, start, end } => write!(
                f,
                "{field}BETWEEN{}@{}",
                start.render_criterion(),
                end.render_criterion()
            ),
            Criterion::On {
                field,
                value,
                negated,
            } => {
                let keyword = if *negated { "NOTON" } else { "ON" };
                write!(f, "{field}{keyword}{}", value.render())
            }
            Criterion::OrderBy { field, order } => write!(f, "{}{field}", order.prefix()),
            Criterion::Logical {
                connective,
                left,
                right,
            } => write!(f, "{left}{}{right}", connective.token()),
        }
    }
}

impl BitAnd for Criterion {
    type Output = Criterion;

    fn bitand(self, rhs: Criterion) -> Criterion {
        self.and(rhs)
    }
}

impl BitOr for Criterion {
    type Output = Criterion;

    fn bitor(self, rhs: Criterion) -> Criterion {
        self.or(rhs)
    }
}

/// `^` stands in for the new-query connective.
impl BitXor for Criterion {
    type Output = Criterion;

    fn bitxor(self, rhs: Criterion) -> Criterion {
        self.nq(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(field: &str, value: &str) -> Criterion {
        Criterion::Compare {
            field: field.to_string(),
            op: Comparison::Equal,
            value: Literal::from(value),
        }
    }

    #[test]
    fn connectives_render_without_spaces() {
        assert_eq!((eq("a", "1") & eq("b", "2")).to_string(), "a=1^b=2");
        assert_eq!((eq("a", "1") | eq("b", "2")).to_string(), "a=1^ORb=2");
        assert_eq!((eq("a", "1") ^ eq("b", "2")).to_string(), "a=1^NQb=2");
    }

    #[test]
    fn nested_trees_render_left_to_right() {
        let crit = eq("a", "1").and(eq("b", "2")).or(eq("c", "3"));
        assert_eq!(crit.get_query(), "a=1^b=2^ORc=3");
    }

    #[test]
    fn any_and_all_absorb_identity() {
        assert_eq!(Criterion::any(Vec::new()), None);
        let single = Criterion::all(vec![eq("a", "1")]).unwrap();
        assert_eq!(single.to_string(), "a=1");
        let many = Criterion::any(vec![eq("a", "1"), eq("b", "2"), eq("c", "3")]).unwrap();
        assert_eq!(many.to_string(), "a=1^ORb=2^ORc=3");
    }
}
