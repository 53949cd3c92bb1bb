//! Declared tables and their DDL
//!
//! Tables are created in declaration order and dropped in reverse, so a table
//! should be declared after anything it references.

/// One table: its name and an idempotent `CREATE TABLE IF NOT EXISTS` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub ddl: String,
}

impl Table {
    /// `DROP TABLE IF EXISTS` with the name quoted as an identifier
    pub fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS \"{}\"", self.name.replace('"', "\"\""))
    }
}

/// Ordered set of tables managed by `create_all` / `drop_all`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: Vec<Table>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// The application's own tables. No entities are modelled yet, so this
    /// is empty and `create_all` only verifies connectivity.
    pub fn declared() -> Self {
        Self::new()
    }

    /// Append a table
    pub fn table(mut self, name: impl Into<String>, ddl: impl Into<String>) -> Self {
        self.tables.push(Table {
            name: name.into(),
            ddl: ddl.into(),
        });
        self
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_schema_is_empty() {
        assert!(Schema::declared().is_empty());
    }

    #[test]
    fn tables_keep_declaration_order() {
        let schema = Schema::new()
            .table("routes", "CREATE TABLE IF NOT EXISTS routes (id INTEGER PRIMARY KEY)")
            .table("trips", "CREATE TABLE IF NOT EXISTS trips (id INTEGER PRIMARY KEY)");
        let names: Vec<_> = schema.tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["routes", "trips"]);
    }

    #[test]
    fn drop_statement_quotes_identifier() {
        let table = Table {
            name: "odd\"name".to_string(),
            ddl: String::new(),
        };
        assert_eq!(table.drop_statement(), "DROP TABLE IF EXISTS \"odd\"\"name\"");
    }
}
