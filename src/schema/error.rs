/// Reasons a leveling run produces no mapping
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    #[error("Table listed more than once: {table}")]
    DuplicateTable { table: String },

    #[error("Relation {child} -> {parent} references unknown table: {missing}")]
    UnknownTableReference {
        child: String,
        parent: String,
        missing: String,
    },

    /// Unresolved tables, sorted by name
    #[error("cannot determine load order: cycle involves tables {}", .tables.join(", "))]
    CyclicDependency { tables: Vec<String> },
}
