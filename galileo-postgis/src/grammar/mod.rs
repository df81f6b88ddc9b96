//! SQL grammars.
//!
//! A [`Grammar`] knows how a backend quotes identifiers and numbers its parameters, and compiles
//! queries and write statements into SQL text. The default methods of the trait implement the
//! dialect-independent part of the compilation, so a backend grammar only provides the
//! placeholders and, if needed, its own quoting.
//!
//! Spatial clauses are rendered by [`SpatialGrammar`], which wraps a backend grammar and adds
//! PostGIS function calls to it. Plain backend grammars refuse to render spatial clauses.

use crate::codec;
use crate::error::PostgisError;
use crate::query::{Column, Condition, QueryBuilder, SpatialPredicate, SpatialProjection, Where};
use crate::value::Value;

mod postgres;
mod spatial;
mod sqlite;

pub use postgres::PostgresGrammar;
pub use spatial::SpatialGrammar;
pub use sqlite::SqliteGrammar;

/// SQL text together with the values bound to its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    /// Statement text.
    pub sql: String,
    /// Parameter values in placeholder order.
    pub bindings: Vec<Value>,
}

/// SQL dialect.
pub trait Grammar {
    /// Prefix added to every table name.
    fn table_prefix(&self) -> &str;

    /// Placeholder of the parameter with the given 1-based index.
    fn parameter(&self, index: usize) -> String;

    /// Quotes a single identifier segment. `*` is left as is.
    fn wrap_segment(&self, segment: &str) -> String {
        if segment == "*" {
            return segment.to_string();
        }

        format!("\"{}\"", segment.replace('"', "\"\""))
    }

    /// Quotes a possibly qualified and aliased column reference.
    ///
    /// `places.name as title` becomes `"places"."name" as "title"`. The table segment of a
    /// qualified reference gets the table prefix.
    fn wrap(&self, value: &str) -> String {
        if let Some((column, alias)) = split_alias(value) {
            return format!("{} as {}", self.wrap(column), self.wrap_segment(alias));
        }

        match value.rsplit_once('.') {
            Some((table, column)) => {
                format!("{}.{}", self.wrap_table(table), self.wrap_segment(column))
            }
            None => self.wrap_segment(value),
        }
    }

    /// Quotes a table name, adding the table prefix.
    fn wrap_table(&self, table: &str) -> String {
        let prefixed = format!("{}{table}", self.table_prefix());
        prefixed
            .split('.')
            .map(|segment| self.wrap_segment(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Pushes the value into the bindings and returns its placeholder.
    ///
    /// Raw expressions are rendered inline, geometries are rendered as constructor expressions.
    fn parameterize(&self, value: &Value, bindings: &mut Vec<Value>) -> Result<String, PostgisError> {
        match value {
            Value::Expression(expression) => Ok(expression.to_string()),
            Value::Geometry(geometry) => Ok(codec::encode_for_storage(geometry)?.to_string()),
            other => {
                bindings.push(other.clone());
                Ok(self.parameter(bindings.len()))
            }
        }
    }

    /// Renders a spatial where clause.
    fn compile_spatial_predicate(
        &self,
        _predicate: &SpatialPredicate,
        _bindings: &mut Vec<Value>,
    ) -> Result<String, PostgisError> {
        Err(PostgisError::UnsupportedPredicate("spatial predicates"))
    }

    /// Renders a computed spatial column.
    fn compile_spatial_projection(
        &self,
        _projection: &SpatialProjection,
    ) -> Result<String, PostgisError> {
        Err(PostgisError::UnsupportedPredicate("spatial projections"))
    }

    /// Renders an entry of the select list.
    fn compile_column(&self, column: &Column) -> Result<String, PostgisError> {
        match column {
            Column::Name(name) => Ok(self.wrap(name)),
            Column::Raw(expression) => Ok(expression.to_string()),
            Column::Distance(projection) => self.compile_spatial_projection(projection),
        }
    }

    /// Renders where clauses joined by their conjunctions, without the `where` keyword.
    fn compile_wheres(
        &self,
        wheres: &[Where],
        bindings: &mut Vec<Value>,
    ) -> Result<String, PostgisError> {
        let mut sql = String::new();
        for (index, clause) in wheres.iter().enumerate() {
            let condition = match &clause.condition {
                Condition::Basic {
                    column,
                    operator,
                    value,
                } => format!(
                    "{} {} {}",
                    self.wrap(column),
                    operator.as_str(),
                    self.parameterize(value, bindings)?
                ),
                Condition::Null { column, negate } => {
                    let not = if *negate { " not" } else { "" };
                    format!("{} is{not} null", self.wrap(column))
                }
                Condition::Raw(expression) => expression.to_string(),
                Condition::Spatial(predicate) => {
                    self.compile_spatial_predicate(predicate, bindings)?
                }
            };

            if index > 0 {
                sql.push(' ');
                sql.push_str(clause.conjunction.as_str());
                sql.push(' ');
            }
            sql.push_str(&condition);
        }

        Ok(sql)
    }

    /// Compiles a `select` statement.
    fn compile_select(&self, query: &QueryBuilder) -> Result<CompiledQuery, PostgisError> {
        let mut bindings = vec![];

        let columns = match query.columns() {
            Some(columns) if !columns.is_empty() => columns
                .iter()
                .map(|column| self.compile_column(column))
                .collect::<Result<Vec<_>, _>>()?
                .join(", "),
            _ => "*".to_string(),
        };

        let mut sql = format!("select {columns}");
        if let Some(table) = query.table_name() {
            sql.push_str(" from ");
            sql.push_str(&self.wrap_table(table));
        }

        if !query.wheres().is_empty() {
            sql.push_str(" where ");
            sql.push_str(&self.compile_wheres(query.wheres(), &mut bindings)?);
        }

        if !query.orders().is_empty() {
            let orders = query
                .orders()
                .iter()
                .map(|(column, direction)| format!("{} {}", self.wrap(column), direction.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" order by ");
            sql.push_str(&orders);
        }

        if let Some(limit) = query.limit_value() {
            sql.push_str(&format!(" limit {limit}"));
        }

        Ok(CompiledQuery { sql, bindings })
    }

    /// Compiles an `insert` statement. If `returning` is given, the statement returns that
    /// column of the inserted row.
    fn compile_insert(
        &self,
        table: &str,
        values: &[(&str, &Value)],
        returning: Option<&str>,
    ) -> Result<CompiledQuery, PostgisError> {
        let mut bindings = vec![];
        let mut sql = if values.is_empty() {
            format!("insert into {} default values", self.wrap_table(table))
        } else {
            let columns = values
                .iter()
                .map(|(column, _)| self.wrap(column))
                .collect::<Vec<_>>()
                .join(", ");
            let parameters = values
                .iter()
                .map(|(_, value)| self.parameterize(value, &mut bindings))
                .collect::<Result<Vec<_>, _>>()?
                .join(", ");
            format!(
                "insert into {} ({columns}) values ({parameters})",
                self.wrap_table(table)
            )
        };

        if let Some(column) = returning {
            sql.push_str(" returning ");
            sql.push_str(&self.wrap(column));
        }

        Ok(CompiledQuery { sql, bindings })
    }

    /// Compiles an `update` statement for the row with the given key.
    fn compile_update(
        &self,
        table: &str,
        values: &[(&str, &Value)],
        key: (&str, &Value),
    ) -> Result<CompiledQuery, PostgisError> {
        let mut bindings = vec![];
        let assignments = values
            .iter()
            .map(|(column, value)| {
                Ok(format!(
                    "{} = {}",
                    self.wrap(column),
                    self.parameterize(value, &mut bindings)?
                ))
            })
            .collect::<Result<Vec<_>, PostgisError>>()?
            .join(", ");

        let (key_column, key_value) = key;
        let key_parameter = self.parameterize(key_value, &mut bindings)?;
        let sql = format!(
            "update {} set {assignments} where {} = {key_parameter}",
            self.wrap_table(table),
            self.wrap(key_column),
        );

        Ok(CompiledQuery { sql, bindings })
    }
}

fn split_alias(value: &str) -> Option<(&str, &str)> {
    let lower = value.to_ascii_lowercase();
    let index = lower.find(" as ")?;
    Some((value[..index].trim(), value[index + 4..].trim()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use insta::assert_snapshot;

    use super::*;
    use crate::codec::tests::point;
    use crate::query::{Conjunction, SpatialQueryExt};
    use crate::value::Expression;

    #[test]
    fn wraps_identifiers() {
        let grammar = PostgresGrammar::default();
        assert_eq!(grammar.wrap("name"), r#""name""#);
        assert_eq!(grammar.wrap("places.name"), r#""places"."name""#);
        assert_eq!(grammar.wrap("places.*"), r#""places".*"#);
        assert_eq!(grammar.wrap("name AS title"), r#""name" as "title""#);
        assert_eq!(grammar.wrap(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn table_prefix_is_applied_to_tables() {
        let grammar = PostgresGrammar::with_table_prefix("app_");
        assert_eq!(grammar.wrap_table("places"), r#""app_places""#);
        assert_eq!(grammar.wrap("places.*"), r#""app_places".*"#);
        assert_eq!(grammar.wrap("name"), r#""name""#);
    }

    #[test]
    fn compiles_insert() {
        let grammar = PostgresGrammar::default();
        let name = Value::from("cafe");
        let location = Value::Expression(Expression::new("ST_GeomFromGeoJSON('{}')"));
        let compiled = grammar
            .compile_insert(
                "places",
                &[("name", &name), ("location", &location), ("area", &Value::Null)],
                Some("id"),
            )
            .expect("compiled");

        assert_snapshot!(compiled.sql, @r#"insert into "places" ("name", "location", "area") values ($1, ST_GeomFromGeoJSON('{}'), $2) returning "id""#);
        assert_eq!(compiled.bindings, vec![name, Value::Null]);
    }

    #[test]
    fn compiles_insert_without_values() {
        let compiled = PostgresGrammar::default()
            .compile_insert("places", &[], None)
            .expect("compiled");
        assert_snapshot!(compiled.sql, @r#"insert into "places" default values"#);
    }

    #[test]
    fn compiles_update() {
        let grammar = SqliteGrammar::default();
        let name = Value::from("cafe");
        let compiled = grammar
            .compile_update("places", &[("name", &name)], ("id", &Value::from(7)))
            .expect("compiled");

        assert_snapshot!(compiled.sql, @r#"update "places" set "name" = ? where "id" = ?"#);
        assert_eq!(compiled.bindings, vec![name, Value::from(7)]);
    }

    #[test]
    fn geometry_values_are_rendered_as_constructors() {
        let grammar = PostgresGrammar::default();
        let mut bindings = vec![];
        let sql = grammar
            .parameterize(&Value::Geometry(point()), &mut bindings)
            .expect("rendered");

        assert!(sql.starts_with("ST_GeomFromGeoJSON('"));
        assert!(bindings.is_empty());
    }

    #[test]
    fn generic_grammar_rejects_spatial_clauses() {
        let query = QueryBuilder::table("places").filter_topology(
            crate::query::SpatialKind::Intersects,
            "location",
            point(),
            Conjunction::And,
        );

        assert_matches!(
            query.to_sql(&SqliteGrammar::default()),
            Err(PostgisError::UnsupportedPredicate(_))
        );
        assert_matches!(
            query.to_sql(&PostgresGrammar::default()),
            Err(PostgisError::UnsupportedPredicate(_))
        );
    }

    #[test]
    fn generic_grammar_rejects_distance_columns() {
        let query = QueryBuilder::table("places").with_distance("location", point(), None);
        assert_matches!(
            query.to_sql(&PostgresGrammar::default()),
            Err(PostgisError::UnsupportedPredicate("spatial projections"))
        );
    }
}
