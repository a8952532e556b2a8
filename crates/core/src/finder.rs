//! Query descriptors
//!
//! A [`Finder<T>`] accumulates the filter for one record type:
//! - conditions: a left-to-right sequence of [`Clause`]s, either a
//!   [`Combinator`] or a `(field, operator, value)` [`Condition`]
//! - sorting: ordered `field → descending` pairs
//! - paging: optional `(count, offset)` window
//!
//! After [`Storage::find`](crate::Storage::find) the finder also holds the
//! matching records, so it doubles as the result collection.
//!
//! Field names are kept unprefixed; [`Finder::filters`] re-applies the
//! prefix on demand.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use crate::value::Value;

/// How a condition's matches combine with what came before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Combinator {
    /// Set intersection
    #[default]
    And,
    /// Set union
    Or,
}

/// Comparison applied to index keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`: key equals the value, or any element of an array value
    Eq,
    /// `!=`: key differs from the value, or from every element of an array value
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `<>`: key within the inclusive `[lo, hi]` bracket
    Range,
}

impl Operator {
    /// Symbol used in query strings
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Range => "<>",
        }
    }

    /// Check that `value` has the shape this operator needs
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the operand does not fit.
    pub fn validate(&self, value: &Value) -> Result<()> {
        match self {
            Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le => {
                if !value.is_numeric() {
                    return Err(Error::InvalidArgument(format!(
                        "operator {} needs a number, {} given",
                        self,
                        value.type_name()
                    )));
                }
            }
            Operator::Eq | Operator::Ne => match value {
                Value::Array(items) if items.iter().all(Value::is_storable) => {}
                v if v.is_storable() => {}
                v => {
                    return Err(Error::InvalidArgument(format!(
                        "operator {} needs a scalar, null or a list of scalars, {} given",
                        self,
                        v.type_name()
                    )))
                }
            },
            Operator::Range => match value {
                Value::Array(items) if items.len() == 2 && items.iter().all(Value::is_scalar) => {}
                v => {
                    return Err(Error::InvalidArgument(format!(
                        "operator {} needs a [low, high] pair, {} given",
                        self,
                        v.type_name()
                    )))
                }
            },
        }
        Ok(())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "=" | "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            "<>" => Ok(Operator::Range),
            other => Err(Error::InvalidArgument(format!(
                "'{}' is not a valid operator",
                other
            ))),
        }
    }
}

/// `(field, operator, value)` triple
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Field name
    pub field: String,
    /// Comparison
    pub op: Operator,
    /// Operand
    pub value: Value,
}

/// One slot of the condition sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Applies to the next condition
    Combinator(Combinator),
    /// Index lookup
    Condition(Condition),
}

/// Result window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    /// Maximum number of records
    pub count: usize,
    /// Records to skip
    pub offset: usize,
}

/// The filter part of a finder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    /// Conditions and combinators, left to right
    pub conditions: Vec<Clause>,
    /// `(field, descending)` in priority order
    pub sorting: Vec<(String, bool)>,
    /// Optional window
    pub paging: Option<Paging>,
}

impl Filters {
    /// Only the conditions, skipping combinators
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter().filter_map(|c| match c {
            Clause::Condition(cond) => Some(cond),
            Clause::Combinator(_) => None,
        })
    }
}

/// Query descriptor and result collection for records of type `T`
pub struct Finder<T: RecordType> {
    filters: Filters,
    results: Vec<Record<T>>,
}

impl<T: RecordType> Finder<T> {
    /// Empty finder (matches nothing until a condition is added)
    pub fn new() -> Self {
        Self {
            filters: Filters::default(),
            results: Vec::new(),
        }
    }

    /// Start a new query: reset the descriptor, then add one condition
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `field` is not declared for `T`
    /// or `value` does not fit `op`.
    pub fn filter(&mut self, field: &str, op: Operator, value: impl Into<Value>) -> Result<&mut Self> {
        let condition = Self::condition(field, op, value.into())?;
        self.reset();
        self.filters.conditions.push(Clause::Condition(condition));
        Ok(self)
    }

    /// Append a condition whose matches intersect with the previous ones
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `field` is not declared for `T`
    /// or `value` does not fit `op`.
    pub fn and(&mut self, field: &str, op: Operator, value: impl Into<Value>) -> Result<&mut Self> {
        self.push_condition(Combinator::And, field, op, value.into())
    }

    /// Append a condition whose matches are added to the previous ones
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `field` is not declared for `T`
    /// or `value` does not fit `op`.
    pub fn or(&mut self, field: &str, op: Operator, value: impl Into<Value>) -> Result<&mut Self> {
        self.push_condition(Combinator::Or, field, op, value.into())
    }

    /// Sort by `field`; later calls for the same field only change direction
    pub fn sort(&mut self, field: &str, descending: bool) -> &mut Self {
        let field = T::schema().strip_prefix(field).to_string();
        match self.filters.sorting.iter_mut().find(|(f, _)| *f == field) {
            Some((_, desc)) => *desc = descending,
            None => self.filters.sorting.push((field, descending)),
        }
        self
    }

    /// Restrict results to `count` records starting at `offset`
    pub fn page(&mut self, count: usize, offset: usize) -> &mut Self {
        self.filters.paging = Some(Paging { count, offset });
        self
    }

    /// Clear conditions, sorting and paging
    pub fn reset(&mut self) -> &mut Self {
        self.filters = Filters::default();
        self
    }

    /// Copy of the descriptor with field names prefixed or not
    pub fn filters(&self, with_prefix: bool) -> Filters {
        let schema = T::schema();
        let rename = |f: &str| {
            if with_prefix {
                schema.with_prefix(f)
            } else {
                f.to_string()
            }
        };

        Filters {
            conditions: self
                .filters
                .conditions
                .iter()
                .map(|clause| match clause {
                    Clause::Condition(c) => Clause::Condition(Condition {
                        field: rename(&c.field),
                        ..c.clone()
                    }),
                    other => other.clone(),
                })
                .collect(),
            sorting: self
                .filters
                .sorting
                .iter()
                .map(|(f, desc)| (rename(f), *desc))
                .collect(),
            paging: self.filters.paging,
        }
    }

    /// Table name of `T`
    pub fn record_name(&self) -> &'static str {
        T::schema().name()
    }

    /// Primary-key field name of `T`
    pub fn primary_key_name(&self) -> &'static str {
        T::schema().primary_key()
    }

    /// Field-name prefix of `T`
    pub fn field_prefix(&self) -> Option<&'static str> {
        T::schema().field_prefix()
    }

    // ------------------------------------------------------------------
    // Result collection
    // ------------------------------------------------------------------

    /// Append a record to the results
    pub fn push(&mut self, record: Record<T>) {
        self.results.push(record);
    }

    /// Drop all results
    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if there are no results
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results in order
    pub fn records(&self) -> &[Record<T>] {
        &self.results
    }

    /// Iterate results in order
    pub fn iter(&self) -> std::slice::Iter<'_, Record<T>> {
        self.results.iter()
    }

    /// Reverse the order of the results
    pub fn reverse(&mut self) {
        self.results.reverse();
    }

    /// Take the results, leaving the finder empty
    pub fn into_records(self) -> Vec<Record<T>> {
        self.results
    }

    fn push_condition(
        &mut self,
        combinator: Combinator,
        field: &str,
        op: Operator,
        value: Value,
    ) -> Result<&mut Self> {
        let condition = Self::condition(field, op, value)?;
        if !self.filters.conditions.is_empty() {
            self.filters.conditions.push(Clause::Combinator(combinator));
        }
        self.filters.conditions.push(Clause::Condition(condition));
        Ok(self)
    }

    fn condition(field: &str, op: Operator, value: Value) -> Result<Condition> {
        let schema = T::schema();
        if !schema.accepts(field) {
            return Err(Error::InvalidArgument(format!(
                "{} has no field '{}'",
                schema.name(),
                field
            )));
        }
        op.validate(&value)?;
        Ok(Condition {
            field: schema.strip_prefix(field).to_string(),
            op,
            value,
        })
    }
}

impl<T: RecordType> Default for Finder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RecordType> fmt::Debug for Finder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finder")
            .field("table", &T::schema().name())
            .field("filters", &self.filters)
            .field("results", &self.results.len())
            .finish()
    }
}

impl<'a, T: RecordType> IntoIterator for &'a Finder<T> {
    type Item = &'a Record<T>;
    type IntoIter = std::slice::Iter<'a, Record<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
