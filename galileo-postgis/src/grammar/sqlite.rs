use super::Grammar;

/// SQLite dialect: double-quoted identifiers and positional `?` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqliteGrammar {
    table_prefix: String,
}

impl SqliteGrammar {
    /// Creates a grammar that prefixes all table names with the given string.
    pub fn with_table_prefix(prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: prefix.into(),
        }
    }
}

impl Grammar for SqliteGrammar {
    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn parameter(&self, _index: usize) -> String {
        "?".to_string()
    }
}
