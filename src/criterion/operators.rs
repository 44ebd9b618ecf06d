use std::str::FromStr;

use crate::{
    criterion::literal::LiteralKind,
    error::{Error, Result},
};

/// Comparison operators that sit between a field and its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessEqual,
    /// `STARTSWITH`
    StartsWith,
    /// `ENDSWITH`
    EndsWith,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `SAMEAS`, operand is another field
    SameAs,
    /// `NSAMEAS`, operand is another field
    NotSameAs,
}

impl Comparison {
    /// The exact wire token for this operator.
    pub fn token(self) -> &'static str {
        match self {
            Comparison::Equal => "=",
            Comparison::NotEqual => "!=",
            Comparison::GreaterThan => ">",
            Comparison::GreaterEqual => ">=",
            Comparison::LessThan => "<",
            Comparison::LessEqual => "<=",
            Comparison::StartsWith => "STARTSWITH",
            Comparison::EndsWith => "ENDSWITH",
            Comparison::Like => "LIKE",
            Comparison::NotLike => "NOT LIKE",
            Comparison::In => "IN",
            Comparison::NotIn => "NOT IN",
            Comparison::SameAs => "SAMEAS",
            Comparison::NotSameAs => "NSAMEAS",
        }
    }

    /// Operand kinds this operator accepts. For `IN`/`NOT IN` these are the
    /// kinds of the list items.
    pub fn accepts(self) -> &'static [LiteralKind] {
        use LiteralKind::*;
        match self {
            Comparison::Equal | Comparison::NotEqual => &[Integer, String],
            Comparison::GreaterThan
            | Comparison::GreaterEqual
            | Comparison::LessThan
            | Comparison::LessEqual => &[Integer, DateTime],
            Comparison::StartsWith
            | Comparison::EndsWith
            | Comparison::Like
            | Comparison::NotLike
            | Comparison::SameAs
            | Comparison::NotSameAs => &[String],
            Comparison::In | Comparison::NotIn => &[Integer, String],
        }
    }

    /// Returns `true` for operators whose operand is a list.
    pub fn is_list_op(self) -> bool {
        matches!(self, Comparison::In | Comparison::NotIn)
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Logical connectives joining two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    /// `^`
    And,
    /// `^OR`
    Or,
    /// `^NQ`, starts a new query whose results are unioned with the previous one
    NewQuery,
}

impl Connective {
    pub fn token(self) -> &'static str {
        match self {
            Connective::And => "^",
            Connective::Or => "^OR",
            Connective::NewQuery => "^NQ",
        }
    }
}

impl std::fmt::Display for Connective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Sort direction for `ORDERBY` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    /// The clause prefix placed before the field name.
    pub fn prefix(self) -> &'static str {
        match self {
            Order::Asc => "ORDERBY",
            Order::Desc => "ORDERBYDESC",
        }
    }
}

impl FromStr for Order {
    type Err = Error;

    /// Case-insensitive `asc` / `desc`.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            _ => Err(Error::QueryTypeError {
                operation: "order",
                expected: "'asc' or 'desc'".to_string(),
                actual: "string",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_tokens() {
        assert_eq!(Comparison::NotLike.token(), "NOT LIKE");
        assert_eq!(Comparison::NotIn.to_string(), "NOT IN");
        assert_eq!(Comparison::GreaterEqual.token(), ">=");
    }

    #[test]
    fn acceptance_tables() {
        assert!(Comparison::Equal.accepts().contains(&LiteralKind::String));
        assert!(!Comparison::Equal.accepts().contains(&LiteralKind::DateTime));
        assert!(Comparison::LessThan.accepts().contains(&LiteralKind::DateTime));
        assert!(!Comparison::LessThan.accepts().contains(&LiteralKind::String));
        assert!(Comparison::In.is_list_op());
    }

    #[test]
    fn order_from_str() {
        assert_eq!("DESC".parse::<Order>().unwrap(), Order::Desc);
        assert_eq!("asc".parse::<Order>().unwrap(), Order::Asc);
        assert!("sideways".parse::<Order>().is_err());
    }
}
