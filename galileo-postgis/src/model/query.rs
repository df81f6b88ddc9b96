use std::marker::PhantomData;

use super::HasSpatialAttributes;
use crate::codec::AS_GEOJSON;
use crate::connection::Connection;
use crate::error::PostgisError;
use crate::grammar::{CompiledQuery, Grammar};
use crate::query::{Column, Conjunction, Direction, Operator, QueryBuilder, SpatialQueryExt};
use crate::value::{Expression, Value};

/// Query returning records of the type `M`.
///
/// Unless the column list is set explicitly, the query selects all the columns of the table plus
/// an `ST_AsGeoJSON(<attribute>) as <attribute>` column for every spatial attribute of `M`, so
/// the loaded rows contain GeoJSON text that is decoded into geometries.
pub struct ModelQuery<M> {
    query: QueryBuilder,
    model: PhantomData<fn() -> M>,
}

impl<M: HasSpatialAttributes> Default for ModelQuery<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: HasSpatialAttributes> ModelQuery<M> {
    /// Creates a query for all records of the type.
    pub fn new() -> Self {
        Self {
            query: QueryBuilder::table(M::TABLE),
            model: PhantomData,
        }
    }

    /// Applies the given function to the underlying query.
    pub fn map_query(mut self, f: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        self.query = f(self.query);
        self
    }

    /// See [`QueryBuilder::select`].
    pub fn select<I, C>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.map_query(|query| query.select(columns))
    }

    /// See [`QueryBuilder::where_basic`].
    pub fn where_basic(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.map_query(|query| query.where_basic(column, operator, value))
    }

    /// See [`QueryBuilder::or_where_basic`].
    pub fn or_where_basic(
        self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.map_query(|query| query.or_where_basic(column, operator, value))
    }

    /// See [`QueryBuilder::where_null`].
    pub fn where_null(self, column: impl Into<String>) -> Self {
        self.map_query(|query| query.where_null(column))
    }

    /// See [`QueryBuilder::where_not_null`].
    pub fn where_not_null(self, column: impl Into<String>) -> Self {
        self.map_query(|query| query.where_not_null(column))
    }

    /// See [`QueryBuilder::where_raw`].
    pub fn where_raw(self, sql: impl Into<String>, conjunction: Conjunction) -> Self {
        self.map_query(|query| query.where_raw(sql, conjunction))
    }

    /// See [`QueryBuilder::order_by`].
    pub fn order_by(self, column: impl Into<String>, direction: Direction) -> Self {
        self.map_query(|query| query.order_by(column, direction))
    }

    /// See [`QueryBuilder::limit`].
    pub fn limit(self, limit: u64) -> Self {
        self.map_query(|query| query.limit(limit))
    }

    /// Underlying query, without spatial attribute columns.
    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    /// Underlying query with the spatial attribute columns added.
    pub fn prepared_query(&self, grammar: &dyn Grammar) -> QueryBuilder {
        let mut query = self.query.clone();
        if M::SPATIAL_ATTRIBUTES.is_empty() || query.has_explicit_columns() {
            return query;
        }

        query.select_all_if_unset();
        for attribute in M::SPATIAL_ATTRIBUTES {
            let column = grammar.wrap(&format!("{}.{attribute}", M::TABLE));
            let alias = grammar.wrap_segment(attribute);
            log::trace!("Selecting spatial attribute {attribute} of {} as GeoJSON", M::TABLE);
            query.push_column(Column::Raw(Expression::new(format!(
                "{AS_GEOJSON}({column}) as {alias}"
            ))));
        }

        query
    }

    /// Renders the query with the given grammar.
    pub fn to_sql(&self, grammar: &dyn Grammar) -> Result<CompiledQuery, PostgisError> {
        self.prepared_query(grammar).to_sql(grammar)
    }

    /// Loads all matching records, decoding their spatial attributes.
    pub fn get(&self, connection: &Connection) -> Result<Vec<M>, PostgisError> {
        let statement = self.to_sql(connection.grammar())?;
        connection
            .select(&statement)?
            .into_iter()
            .map(|row| {
                let mut model = M::from_attributes(row);
                model.decode_spatial_attributes()?;
                Ok::<_, PostgisError>(model)
            })
            .collect()
    }

    /// Loads the first matching record.
    pub fn first(self, connection: &Connection) -> Result<Option<M>, PostgisError> {
        Ok(self.limit(1).get(connection)?.into_iter().next())
    }

    /// Loads the record with the given key.
    pub fn find(
        connection: &Connection,
        key: impl Into<Value>,
    ) -> Result<Option<M>, PostgisError> {
        Self::new()
            .where_basic(M::KEY, Operator::Eq, key)
            .first(connection)
    }
}

impl<M: HasSpatialAttributes> SpatialQueryExt for ModelQuery<M> {
    fn base_query(&mut self) -> &mut QueryBuilder {
        &mut self.query
    }
}
