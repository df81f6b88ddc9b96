use geojson::Geometry;

use super::Grammar;
use crate::codec;
use crate::error::PostgisError;
use crate::query::{DistanceComparison, Operator, SpatialKind, SpatialPredicate, SpatialProjection};
use crate::value::Value;

/// Grammar that renders PostGIS spatial clauses on top of a backend grammar.
///
/// Identifier quoting, table prefixes and parameter placeholders are delegated to the wrapped
/// grammar; statements are laid out by the default [`Grammar`] compilation.
///
/// Geometries are embedded as `ST_GeomFromGeoJSON('<geojson>')` calls with escaped content.
/// Column references of relation checks are quoted by the backend grammar. Columns and aliases
/// of distance expressions are embedded as given and must be trusted identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpatialGrammar<G = super::PostgresGrammar> {
    base: G,
}

impl<G: Grammar> SpatialGrammar<G> {
    /// Wraps the backend grammar.
    pub fn new(base: G) -> Self {
        Self { base }
    }

    /// Backend grammar.
    pub fn base(&self) -> &G {
        &self.base
    }

    /// `ST_GeomFromGeoJSON('<geojson>')`
    pub fn geometry(&self, geometry: &Geometry) -> Result<String, PostgisError> {
        Ok(codec::encode_for_storage(geometry)?.to_string())
    }

    /// `ST_Distance(<column>, <geometry>, false)`
    pub fn render_distance(&self, column: &str, geometry: &Geometry) -> Result<String, PostgisError> {
        self.st_distance(column, geometry, false)
    }

    /// `ST_Distance(<column>, <geometry>, true)`
    pub fn render_distance_sphere(
        &self,
        column: &str,
        geometry: &Geometry,
    ) -> Result<String, PostgisError> {
        self.st_distance(column, geometry, true)
    }

    fn st_distance(
        &self,
        column: &str,
        geometry: &Geometry,
        use_spheroid: bool,
    ) -> Result<String, PostgisError> {
        Ok(format!(
            "ST_Distance({column}, {}, {use_spheroid})",
            self.geometry(geometry)?
        ))
    }

    /// `<function>(<quoted column>, <geometry>)`
    ///
    /// Negated kinds render their positive kind prefixed with `not `. Distance kinds are not
    /// topological checks and are rejected.
    pub fn render_topology(
        &self,
        kind: SpatialKind,
        column: &str,
        geometry: &Geometry,
    ) -> Result<String, PostgisError> {
        let function = match kind {
            SpatialKind::Equals => "ST_Equals",
            SpatialKind::Contains => "ST_Contains",
            SpatialKind::Intersects => "ST_Intersects",
            SpatialKind::Touches => "ST_Touches",
            SpatialKind::Overlaps => "ST_Overlaps",
            SpatialKind::NotEquals
            | SpatialKind::NotContains
            | SpatialKind::NotIntersects
            | SpatialKind::NotTouches
            | SpatialKind::NotOverlaps => {
                let positive = self.render_topology(kind.positive(), column, geometry)?;
                return Ok(format!("not {positive}"));
            }
            SpatialKind::Distance | SpatialKind::DistanceSphere => {
                return Err(PostgisError::UnsupportedPredicate(
                    "distance kinds in topological checks",
                ))
            }
        };

        Ok(format!(
            "{function}({}, {})",
            self.base.wrap(column),
            self.geometry(geometry)?
        ))
    }

    /// `<distance> as <alias>`
    ///
    /// Without an alias the column is named `<column>_distance` or `<column>_distance_sphere`.
    pub fn render_with_distance(
        &self,
        projection: &SpatialProjection,
    ) -> Result<String, PostgisError> {
        let SpatialProjection {
            column,
            geometry,
            alias,
            sphere,
        } = projection;

        let alias = match alias {
            Some(alias) if !alias.is_empty() => alias.clone(),
            _ if *sphere => format!("{column}_distance_sphere"),
            _ => format!("{column}_distance"),
        };

        Ok(format!(
            "{} as {alias}",
            self.st_distance(column, geometry, *sphere)?
        ))
    }

    /// `<distance> <operator> <placeholder>`, the threshold is pushed into the bindings.
    ///
    /// [`Operator::Ne`] is rejected.
    pub fn render_where_distance(
        &self,
        column: &str,
        geometry: &Geometry,
        sphere: bool,
        comparison: DistanceComparison,
        bindings: &mut Vec<Value>,
    ) -> Result<String, PostgisError> {
        let DistanceComparison { operator, value } = comparison;
        if operator == Operator::Ne {
            return Err(PostgisError::UnsupportedPredicate(
                "`<>` in distance comparisons",
            ));
        }

        let distance = self.st_distance(column, geometry, sphere)?;
        let placeholder = self.parameterize(&Value::Float(value), bindings)?;
        Ok(format!("{distance} {} {placeholder}", operator.as_str()))
    }

    /// Renders any spatial predicate.
    pub fn render_predicate(
        &self,
        predicate: &SpatialPredicate,
        bindings: &mut Vec<Value>,
    ) -> Result<String, PostgisError> {
        let SpatialPredicate {
            kind,
            column,
            geometry,
            comparison,
        } = predicate;

        match (kind, comparison) {
            (SpatialKind::Distance, Some(comparison)) => {
                self.render_where_distance(column, geometry, false, *comparison, bindings)
            }
            (SpatialKind::DistanceSphere, Some(comparison)) => {
                self.render_where_distance(column, geometry, true, *comparison, bindings)
            }
            (kind, None) if kind.is_distance() => Err(PostgisError::UnsupportedPredicate(
                "distance predicates without a threshold",
            )),
            (kind, _) => self.render_topology(*kind, column, geometry),
        }
    }
}

impl<G: Grammar> Grammar for SpatialGrammar<G> {
    fn table_prefix(&self) -> &str {
        self.base.table_prefix()
    }

    fn parameter(&self, index: usize) -> String {
        self.base.parameter(index)
    }

    fn wrap_segment(&self, segment: &str) -> String {
        self.base.wrap_segment(segment)
    }

    fn wrap(&self, value: &str) -> String {
        self.base.wrap(value)
    }

    fn wrap_table(&self, table: &str) -> String {
        self.base.wrap_table(table)
    }

    fn compile_spatial_predicate(
        &self,
        predicate: &SpatialPredicate,
        bindings: &mut Vec<Value>,
    ) -> Result<String, PostgisError> {
        self.render_predicate(predicate, bindings)
    }

    fn compile_spatial_projection(
        &self,
        projection: &SpatialProjection,
    ) -> Result<String, PostgisError> {
        self.render_with_distance(projection)
    }
}
