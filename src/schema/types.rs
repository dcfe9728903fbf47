use serde::{Deserialize, Serialize};

/// Foreign key dependency between two tables: `child` references `parent`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relation {
    pub child: String,
    pub parent: String,
}

impl Relation {
    pub fn new(child: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            child: child.into(),
            parent: parent.into(),
        }
    }

    /// A self-referencing foreign key (e.g. `employees.manager_id -> employees`)
    pub fn is_self(&self) -> bool {
        self.child == self.parent
    }
}

/// Foreign key row as reported by a metadata query
///
/// Only `table_name` and `parent_table_name` matter for leveling; the
/// descriptive columns are kept so relation lists can be passed through
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub table_name: String,
    pub parent_table_name: String,
    pub column_child: Option<String>,
    pub column_parent: Option<String>,
    pub constraint_name: Option<String>,
    pub on_update: Option<String>,
    pub on_delete: Option<String>,
}

impl RelationRecord {
    pub fn new(table_name: impl Into<String>, parent_table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            parent_table_name: parent_table_name.into(),
            ..Default::default()
        }
    }

    /// Strip the descriptive fields
    pub fn relation(&self) -> Relation {
        Relation::new(&self.table_name, &self.parent_table_name)
    }
}

/// Column row as reported by a columns query; only the type is inspected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub table_name: String,
    pub column_name: Option<String>,
    pub data_type: String,
}

impl ColumnRecord {
    pub fn new(table_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: None,
            data_type: data_type.into(),
        }
    }
}

/// Key constraint or unique index row as reported by a constraints query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    pub table_name: String,
    pub constraint_name: Option<String>,
    /// `PRIMARY KEY`, `UNIQUE`, `UNIQUE INDEX`, `CHECK`, ... (`None` when the
    /// source only lists key constraints)
    pub constraint_type: Option<String>,
}

impl ConstraintRecord {
    pub fn new(table_name: impl Into<String>, constraint_type: Option<&str>) -> Self {
        Self {
            table_name: table_name.into(),
            constraint_name: None,
            constraint_type: constraint_type.map(str::to_string),
        }
    }
}

/// Tables and foreign keys of one schema, as handed to the leveler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    pub tables: Vec<String>,
    pub relations: Vec<RelationRecord>,
}

impl SchemaSnapshot {
    pub fn new(tables: Vec<String>, relations: Vec<RelationRecord>) -> Self {
        Self { tables, relations }
    }

    /// Bare child/parent pairs, in input order
    pub fn relations(&self) -> Vec<Relation> {
        self.relations.iter().map(RelationRecord::relation).collect()
    }
}
