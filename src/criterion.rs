//! # Criterion trees
//!
//! Immutable expressions that render to the platform's encoded query string.
//!
//! - **[literal]** - typed operands and their renderings
//! - **[operators]** - comparison tokens, connectives and sort order
//! - **[dates]** - relative date windows for `ON` / `NOTON`
//! - **[field]** - [`Field`] and [`Table`], where criteria start
//! - **[expressions]** - the [`Criterion`] tree and its renderer
//!
//! ## Example
//!
//! ```
//! use snow_client::criterion::{DateTimeOn, Field};
//!
//! # fn main() -> snow_client::Result<()> {
//! let crit = Field::new("priority").lte(2)?
//!     & Field::new("opened_at").on(DateTimeOn::Today)?
//!     & Field::new("short_description").contains("outage")?;
//!
//! assert_eq!(
//!     crit.to_string(),
//!     "priority<=2^opened_atONToday@javascript:gs.beginningOfToday()\
//!      @javascript:gs.endOfToday()^short_descriptionLIKEoutage"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Operand types are checked per operator. A mismatch yields
//! [`Error::QueryTypeError`](crate::Error::QueryTypeError) naming the method
//! that rejected it; nothing is coerced.

pub mod dates;
pub mod expressions;
pub mod field;
pub mod literal;
pub mod operators;

pub use dates::{DateTimeOn, OnOperand, OnValue};
pub use expressions::Criterion;
pub use field::{Field, Table};
pub use literal::{Literal, LiteralKind};
pub use operators::{Comparison, Connective, Order};
