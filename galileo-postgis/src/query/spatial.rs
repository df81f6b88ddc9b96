//! Spatial where clauses and computed distance columns.

use geojson::Geometry;

use super::{Column, Condition, Conjunction, Operator, QueryBuilder};

/// Kind of a spatial where clause.
///
/// Negated kinds check that the relation of their positive kind does not hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SpatialKind {
    /// Planar distance comparison.
    Distance,
    /// Spheroid distance comparison.
    DistanceSphere,
    /// Geometries are spatially equal.
    Equals,
    /// Negated [`SpatialKind::Equals`]
    NotEquals,
    /// Column geometry contains the given one.
    Contains,
    /// Negated [`SpatialKind::Contains`]
    NotContains,
    /// Geometries share at least one point.
    Intersects,
    /// Negated [`SpatialKind::Intersects`]
    NotIntersects,
    /// Geometries share boundary points but their interiors do not intersect.
    Touches,
    /// Negated [`SpatialKind::Touches`]
    NotTouches,
    /// Geometries share some but not all interior points.
    Overlaps,
    /// Negated [`SpatialKind::Overlaps`]
    NotOverlaps,
}

impl SpatialKind {
    /// Returns true for the distance comparison kinds.
    pub fn is_distance(&self) -> bool {
        matches!(self, Self::Distance | Self::DistanceSphere)
    }

    /// Kind without negation.
    pub fn positive(&self) -> Self {
        match self {
            Self::NotEquals => Self::Equals,
            Self::NotContains => Self::Contains,
            Self::NotIntersects => Self::Intersects,
            Self::NotTouches => Self::Touches,
            Self::NotOverlaps => Self::Overlaps,
            other => *other,
        }
    }
}

/// Threshold of a distance comparison.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DistanceComparison {
    /// Comparison operator. [`Operator::Ne`] is not supported in distance comparisons.
    pub operator: Operator,
    /// Distance threshold.
    pub value: f64,
}

/// Spatial where clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialPredicate {
    /// Check to perform.
    pub kind: SpatialKind,
    /// Column reference. May be qualified with a table name.
    pub column: String,
    /// Geometry the column is compared with.
    pub geometry: Geometry,
    /// Threshold, set only for distance kinds.
    pub comparison: Option<DistanceComparison>,
}

impl SpatialPredicate {
    /// Creates a distance comparison of the [`SpatialKind::Distance`] or
    /// [`SpatialKind::DistanceSphere`] kind.
    pub fn distance(
        column: impl Into<String>,
        geometry: Geometry,
        operator: Operator,
        value: f64,
        sphere: bool,
    ) -> Self {
        Self {
            kind: if sphere {
                SpatialKind::DistanceSphere
            } else {
                SpatialKind::Distance
            },
            column: column.into(),
            geometry,
            comparison: Some(DistanceComparison { operator, value }),
        }
    }

    /// Creates a topological check of the given kind.
    pub fn topology(kind: SpatialKind, column: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            kind,
            column: column.into(),
            geometry,
            comparison: None,
        }
    }
}

/// Computed column with the distance between a column geometry and a given geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialProjection {
    /// Column reference.
    pub column: String,
    /// Geometry to measure the distance to.
    pub geometry: Geometry,
    /// Name of the computed column. Defaults to `<column>_distance` or
    /// `<column>_distance_sphere`.
    pub alias: Option<String>,
    /// Use the spheroid distance instead of the planar one.
    pub sphere: bool,
}

/// Spatial operations of a query builder.
///
/// Every method appends one entry to the underlying [`QueryBuilder`] and returns the builder, so
/// calls can be chained:
///
/// ```
/// use galileo_postgis::grammar::{PostgresGrammar, SpatialGrammar};
/// use galileo_postgis::query::{Operator, QueryBuilder, SpatialQueryExt};
/// use geojson::{Geometry, Value};
///
/// let point = Geometry::new(Value::Point(vec![30.5, 50.4]));
/// let query = QueryBuilder::table("places")
///     .with_distance_sphere("location", point.clone(), Some("dist"))
///     .where_distance_sphere("location", point, Operator::Lt, 1000.0);
///
/// let compiled = query.to_sql(&SpatialGrammar::new(PostgresGrammar::default()))?;
/// assert!(compiled.sql.contains("as dist"));
/// # Ok::<(), galileo_postgis::error::PostgisError>(())
/// ```
pub trait SpatialQueryExt: Sized {
    /// Query the spatial entries are added to.
    fn base_query(&mut self) -> &mut QueryBuilder;

    /// Adds a spatial where clause.
    fn where_spatial(mut self, predicate: SpatialPredicate, conjunction: Conjunction) -> Self {
        self.base_query()
            .push_where(Condition::Spatial(predicate), conjunction);
        self
    }

    /// Adds a distance column.
    ///
    /// If the query has no column list yet, it is first set to all the columns of the table, so
    /// the distance is selected in addition to them.
    fn select_distance(
        mut self,
        column: impl Into<String>,
        geometry: Geometry,
        alias: Option<&str>,
        sphere: bool,
    ) -> Self {
        let query = self.base_query();
        query.select_all_if_unset();
        query.push_column(Column::Distance(SpatialProjection {
            column: column.into(),
            geometry,
            alias: alias.map(str::to_string),
            sphere,
        }));
        self
    }

    /// Adds a planar distance column.
    fn with_distance(
        self,
        column: impl Into<String>,
        geometry: Geometry,
        alias: Option<&str>,
    ) -> Self {
        self.select_distance(column, geometry, alias, false)
    }

    /// Adds a spheroid distance column.
    fn with_distance_sphere(
        self,
        column: impl Into<String>,
        geometry: Geometry,
        alias: Option<&str>,
    ) -> Self {
        self.select_distance(column, geometry, alias, true)
    }

    /// Adds a distance comparison.
    fn filter_distance(
        self,
        column: impl Into<String>,
        geometry: Geometry,
        operator: Operator,
        value: f64,
        conjunction: Conjunction,
        sphere: bool,
    ) -> Self {
        self.where_spatial(
            SpatialPredicate::distance(column, geometry, operator, value, sphere),
            conjunction,
        )
    }

    /// Adds a planar distance comparison joined with `and`.
    fn where_distance(
        self,
        column: impl Into<String>,
        geometry: Geometry,
        operator: Operator,
        value: f64,
    ) -> Self {
        self.filter_distance(column, geometry, operator, value, Conjunction::And, false)
    }

    /// Adds a planar distance comparison joined with `or`.
    fn or_where_distance(
        self,
        column: impl Into<String>,
        geometry: Geometry,
        operator: Operator,
        value: f64,
    ) -> Self {
        self.filter_distance(column, geometry, operator, value, Conjunction::Or, false)
    }

    /// Adds a spheroid distance comparison joined with `and`.
    fn where_distance_sphere(
        self,
        column: impl Into<String>,
        geometry: Geometry,
        operator: Operator,
        value: f64,
    ) -> Self {
        self.filter_distance(column, geometry, operator, value, Conjunction::And, true)
    }

    /// Adds a spheroid distance comparison joined with `or`.
    fn or_where_distance_sphere(
        self,
        column: impl Into<String>,
        geometry: Geometry,
        operator: Operator,
        value: f64,
    ) -> Self {
        self.filter_distance(column, geometry, operator, value, Conjunction::Or, true)
    }

    /// Adds a topological check.
    fn filter_topology(
        self,
        kind: SpatialKind,
        column: impl Into<String>,
        geometry: Geometry,
        conjunction: Conjunction,
    ) -> Self {
        self.where_spatial(SpatialPredicate::topology(kind, column, geometry), conjunction)
    }

    /// `ST_Equals(column, geometry)`, joined with `and`.
    fn where_equals(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::Equals, column, geometry, Conjunction::And)
    }

    /// `not ST_Equals(column, geometry)`, joined with `and`.
    fn where_not_equals(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::NotEquals, column, geometry, Conjunction::And)
    }

    /// `ST_Equals(column, geometry)`, joined with `or`.
    fn or_where_equals(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::Equals, column, geometry, Conjunction::Or)
    }

    /// `not ST_Equals(column, geometry)`, joined with `or`.
    fn or_where_not_equals(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::NotEquals, column, geometry, Conjunction::Or)
    }

    /// `ST_Contains(column, geometry)`, joined with `and`.
    fn where_contains(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::Contains, column, geometry, Conjunction::And)
    }

    /// `not ST_Contains(column, geometry)`, joined with `and`.
    fn where_not_contains(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::NotContains, column, geometry, Conjunction::And)
    }

    /// `ST_Contains(column, geometry)`, joined with `or`.
    fn or_where_contains(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::Contains, column, geometry, Conjunction::Or)
    }

    /// `not ST_Contains(column, geometry)`, joined with `or`.
    fn or_where_not_contains(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::NotContains, column, geometry, Conjunction::Or)
    }

    /// `ST_Intersects(column, geometry)`, joined with `and`.
    fn where_intersects(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::Intersects, column, geometry, Conjunction::And)
    }

    /// `not ST_Intersects(column, geometry)`, joined with `and`.
    fn where_not_intersects(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::NotIntersects, column, geometry, Conjunction::And)
    }

    /// `ST_Intersects(column, geometry)`, joined with `or`.
    fn or_where_intersects(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::Intersects, column, geometry, Conjunction::Or)
    }

    /// `not ST_Intersects(column, geometry)`, joined with `or`.
    fn or_where_not_intersects(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::NotIntersects, column, geometry, Conjunction::Or)
    }

    /// `ST_Touches(column, geometry)`, joined with `and`.
    fn where_touches(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::Touches, column, geometry, Conjunction::And)
    }

    /// `not ST_Touches(column, geometry)`, joined with `and`.
    fn where_not_touches(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::NotTouches, column, geometry, Conjunction::And)
    }

    /// `ST_Touches(column, geometry)`, joined with `or`.
    fn or_where_touches(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::Touches, column, geometry, Conjunction::Or)
    }

    /// `not ST_Touches(column, geometry)`, joined with `or`.
    fn or_where_not_touches(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::NotTouches, column, geometry, Conjunction::Or)
    }

    /// `ST_Overlaps(column, geometry)`, joined with `and`.
    fn where_overlaps(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::Overlaps, column, geometry, Conjunction::And)
    }

    /// `not ST_Overlaps(column, geometry)`, joined with `and`.
    fn where_not_overlaps(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::NotOverlaps, column, geometry, Conjunction::And)
    }

    /// `ST_Overlaps(column, geometry)`, joined with `or`.
    fn or_where_overlaps(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::Overlaps, column, geometry, Conjunction::Or)
    }

    /// `not ST_Overlaps(column, geometry)`, joined with `or`.
    fn or_where_not_overlaps(self, column: impl Into<String>, geometry: Geometry) -> Self {
        self.filter_topology(SpatialKind::NotOverlaps, column, geometry, Conjunction::Or)
    }
}

impl SpatialQueryExt for QueryBuilder {
    fn base_query(&mut self) -> &mut QueryBuilder {
        self
    }
}
