use super::Grammar;

/// PostgreSQL dialect: double-quoted identifiers and `$n` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostgresGrammar {
    table_prefix: String,
}

impl PostgresGrammar {
    /// Creates a grammar that prefixes all table names with the given string.
    pub fn with_table_prefix(prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: prefix.into(),
        }
    }
}

impl Grammar for PostgresGrammar {
    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn parameter(&self, index: usize) -> String {
        format!("${index}")
    }
}
