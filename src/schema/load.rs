use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::dependencies::BASE_LEVEL;
use super::levels::LevelAssignment;
use super::types::{ColumnRecord, ConstraintRecord};

/// How a table is refreshed on an incremental load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// Upsert rows changed since the last run, found through a date column
    UpsertByDate,
    /// Upsert every row; nothing references a parent
    UpsertAll,
    /// Upsert every row, after the parents it references are loaded
    UpsertByForeignKey,
    /// No usable key: empty the target and insert everything
    TruncateInsert,
}

impl LoadStrategy {
    /// Pick the strategy for a table at `level`
    ///
    /// A date column only helps when rows can be matched on a key; without
    /// a key the table is always reloaded in full.
    pub fn classify(level: u32, traits: TableTraits) -> Self {
        match (traits.has_datetime, traits.has_unique_key) {
            (true, true) => LoadStrategy::UpsertByDate,
            (false, true) if level <= BASE_LEVEL => LoadStrategy::UpsertAll,
            (false, true) => LoadStrategy::UpsertByForeignKey,
            (_, false) => LoadStrategy::TruncateInsert,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LoadStrategy::UpsertByDate => "upsert by date",
            LoadStrategy::UpsertAll => "upsert all rows",
            LoadStrategy::UpsertByForeignKey => "upsert all rows by foreign key",
            LoadStrategy::TruncateInsert => "truncate insert",
        }
    }
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Facts about a table's columns and keys that decide its load strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableTraits {
    pub has_datetime: bool,
    pub has_unique_key: bool,
}

/// Whether a declared column type holds dates or timestamps
///
/// Matches `DATE`, `DATETIME`, `DATETIME2`, `SMALLDATETIME`, `TIMESTAMP`,
/// `TIMESTAMP(6) WITH TIME ZONE`, `timestamptz` and friends.
pub fn is_datetime_type(data_type: &str) -> bool {
    let upper = data_type.trim().to_uppercase();
    upper.contains("DATE") || upper.contains("TIMESTAMP")
}

/// Whether a constraint row identifies rows uniquely
///
/// Rows without a type come from lists that only carry key constraints.
pub fn is_unique_constraint(constraint_type: Option<&str>) -> bool {
    match constraint_type.map(|t| t.trim().to_uppercase()) {
        None => true,
        Some(t) => matches!(
            t.as_str(),
            "P" | "U" | "PRIMARY KEY" | "UNIQUE" | "UNIQUE INDEX" | "UNIQUE KEY"
        ),
    }
}

/// Per-table traits collected from column and constraint metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMetadata {
    traits: HashMap<String, TableTraits>,
}

impl TableMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(columns: &[ColumnRecord], constraints: &[ConstraintRecord]) -> Self {
        let mut metadata = Self::new();
        for column in columns.iter().filter(|c| is_datetime_type(&c.data_type)) {
            metadata.entry(&column.table_name).has_datetime = true;
        }
        for constraint in constraints
            .iter()
            .filter(|c| is_unique_constraint(c.constraint_type.as_deref()))
        {
            metadata.entry(&constraint.table_name).has_unique_key = true;
        }
        metadata
    }

    fn entry(&mut self, table: &str) -> &mut TableTraits {
        self.traits.entry(table.to_string()).or_default()
    }

    /// Traits of `table`; unknown tables have neither a date column nor a key
    pub fn get(&self, table: &str) -> TableTraits {
        self.traits.get(table).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }
}

/// One row of a load plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadPlanRow {
    pub table: String,
    pub level: u32,
    pub has_datetime: bool,
    pub has_unique_key: bool,
    pub strategy: LoadStrategy,
}

/// Classify every leveled table, ordered by (level, table name)
pub fn plan_loads(assignment: &LevelAssignment, metadata: &TableMetadata) -> Vec<LoadPlanRow> {
    assignment
        .ordered()
        .into_iter()
        .map(|row| {
            let traits = metadata.get(&row.table);
            LoadPlanRow {
                strategy: LoadStrategy::classify(row.level, traits),
                has_datetime: traits.has_datetime,
                has_unique_key: traits.has_unique_key,
                table: row.table,
                level: row.level,
            }
        })
        .collect()
}
