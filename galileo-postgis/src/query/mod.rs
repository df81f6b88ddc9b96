//! Generic query builder.
//!
//! [`QueryBuilder`] accumulates the parts of a `select` statement: the table, the column list and
//! an ordered list of where clauses. It does not know how to render itself; a [`Grammar`] turns it
//! into SQL text with [`QueryBuilder::to_sql`].
//!
//! Spatial operations are added on top of it by the [`SpatialQueryExt`] trait.

use crate::error::PostgisError;
use crate::grammar::{CompiledQuery, Grammar};
use crate::value::{Expression, Value};

pub mod spatial;

pub use spatial::{
    DistanceComparison, SpatialKind, SpatialPredicate, SpatialProjection, SpatialQueryExt,
};

/// How a where clause is combined with the clause before it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Conjunction {
    /// Both clauses must hold.
    #[default]
    And,
    /// Any of the clauses must hold.
    Or,
}

impl Conjunction {
    /// SQL keyword of the conjunction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Conjunction::And => "and",
            Conjunction::Or => "or",
        }
    }
}

/// Comparison operator of a where clause.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `=`
    Eq,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `<>`, only in plain comparisons. Distance comparisons reject it.
    Ne,
}

impl Operator {
    /// SQL symbol of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Eq => "=",
            Operator::Ge => ">=",
            Operator::Gt => ">",
            Operator::Ne => "<>",
        }
    }
}

/// Sort direction of an `order by` entry.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// SQL keyword of the direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Entry of the select list.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Column reference, quoted by the grammar. May be qualified (`table.column`) or `table.*`.
    Name(String),
    /// Raw SQL expression.
    Raw(Expression),
    /// Computed distance column.
    Distance(SpatialProjection),
}

impl From<&str> for Column {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for Column {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl From<Expression> for Column {
    fn from(value: Expression) -> Self {
        Self::Raw(value)
    }
}

/// Condition of a where clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `<column> <operator> <value>`, the value is bound as a parameter.
    Basic {
        /// Column reference.
        column: String,
        /// Comparison operator.
        operator: Operator,
        /// Compared value.
        value: Value,
    },
    /// `<column> is [not] null`.
    Null {
        /// Column reference.
        column: String,
        /// Renders `is not null` if set.
        negate: bool,
    },
    /// Raw SQL condition.
    Raw(Expression),
    /// Spatial predicate.
    Spatial(SpatialPredicate),
}

/// Where clause: a condition and the way it joins the preceding clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    /// Condition to check.
    pub condition: Condition,
    /// Conjunction with the previous clause. Ignored for the first clause.
    pub conjunction: Conjunction,
}

/// Generic `select` statement builder.
///
/// ```
/// use galileo_postgis::grammar::PostgresGrammar;
/// use galileo_postgis::query::{Operator, QueryBuilder};
///
/// let query = QueryBuilder::table("places")
///     .select(["id", "name"])
///     .where_basic("kind", Operator::Eq, "cafe")
///     .limit(10);
///
/// let compiled = query.to_sql(&PostgresGrammar::default())?;
/// assert_eq!(
///     compiled.sql,
///     r#"select "id", "name" from "places" where "kind" = $1 limit 10"#
/// );
/// # Ok::<(), galileo_postgis::error::PostgisError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    table: Option<String>,
    columns: Option<Vec<Column>>,
    explicit_columns: bool,
    wheres: Vec<Where>,
    orders: Vec<(String, Direction)>,
    limit: Option<u64>,
}

impl QueryBuilder {
    /// Creates an empty query without a table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query selecting from the given table.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Default::default()
        }
    }

    /// Replaces the column list.
    pub fn select<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self.explicit_columns = true;
        self
    }

    /// Appends a column to the column list.
    ///
    /// If no column list was set before, the new list contains only the given column, so the
    /// query stops selecting `*`.
    pub fn add_select(mut self, column: impl Into<Column>) -> Self {
        self.push_column(column.into());
        self.explicit_columns = true;
        self
    }

    /// Appends a raw SQL expression to the column list.
    pub fn select_raw(self, sql: impl Into<String>) -> Self {
        self.add_select(Expression::new(sql))
    }

    /// Adds a `<column> <operator> <value>` clause joined with `and`.
    pub fn where_basic(
        mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.push_where(
            Condition::Basic {
                column: column.into(),
                operator,
                value: value.into(),
            },
            Conjunction::And,
        );
        self
    }

    /// Adds a `<column> <operator> <value>` clause joined with `or`.
    pub fn or_where_basic(
        mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.push_where(
            Condition::Basic {
                column: column.into(),
                operator,
                value: value.into(),
            },
            Conjunction::Or,
        );
        self
    }

    /// Adds a `<column> is null` clause.
    pub fn where_null(mut self, column: impl Into<String>) -> Self {
        self.push_where(
            Condition::Null {
                column: column.into(),
                negate: false,
            },
            Conjunction::And,
        );
        self
    }

    /// Adds a `<column> is not null` clause.
    pub fn where_not_null(mut self, column: impl Into<String>) -> Self {
        self.push_where(
            Condition::Null {
                column: column.into(),
                negate: true,
            },
            Conjunction::And,
        );
        self
    }

    /// Adds a raw SQL condition.
    pub fn where_raw(mut self, sql: impl Into<String>, conjunction: Conjunction) -> Self {
        self.push_where(Condition::Raw(Expression::new(sql)), conjunction);
        self
    }

    /// Adds an `order by` entry.
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.orders.push((column.into(), direction));
        self
    }

    /// Limits the number of returned rows.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Table the query selects from.
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Column list. `None` means the query selects `*`.
    pub fn columns(&self) -> Option<&[Column]> {
        self.columns.as_deref()
    }

    /// Returns true if the column list was set by the caller rather than expanded implicitly.
    pub fn has_explicit_columns(&self) -> bool {
        self.explicit_columns
    }

    /// Where clauses in insertion order.
    pub fn wheres(&self) -> &[Where] {
        &self.wheres
    }

    /// `order by` entries in insertion order.
    pub fn orders(&self) -> &[(String, Direction)] {
        &self.orders
    }

    /// Row limit.
    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Appends a where clause.
    pub fn push_where(&mut self, condition: Condition, conjunction: Conjunction) {
        self.wheres.push(Where {
            condition,
            conjunction,
        });
    }

    /// Appends a column without marking the column list as explicitly set.
    pub fn push_column(&mut self, column: Column) {
        self.columns.get_or_insert_with(Vec::new).push(column);
    }

    /// Sets the column list to `<table>.*` if no column list is set yet.
    ///
    /// Computed columns appended after this call are selected together with all the columns of
    /// the table instead of replacing them.
    pub fn select_all_if_unset(&mut self) {
        if self.columns.is_some() {
            return;
        }

        if let Some(table) = &self.table {
            self.columns = Some(vec![Column::Name(format!("{table}.*"))]);
        }
    }

    /// Renders the query with the given grammar.
    pub fn to_sql(&self, grammar: &dyn Grammar) -> Result<CompiledQuery, PostgisError> {
        grammar.compile_select(self)
    }
}
