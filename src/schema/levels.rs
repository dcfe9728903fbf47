use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One row of a level list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLevel {
    pub table: String,
    pub level: u32,
}

impl TableLevel {
    pub fn new(table: impl Into<String>, level: u32) -> Self {
        Self {
            table: table.into(),
            level,
        }
    }
}

/// Table -> level mapping produced by the leveler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelAssignment {
    levels: HashMap<String, u32>,
}

impl LevelAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a level; returns the previous level if the table was already present
    pub fn insert(&mut self, table: impl Into<String>, level: u32) -> Option<u32> {
        self.levels.insert(table.into(), level)
    }

    pub fn get(&self, table: &str) -> Option<u32> {
        self.levels.get(table).copied()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.levels.contains_key(table)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn max_level(&self) -> Option<u32> {
        self.levels.values().copied().max()
    }

    /// Rows sorted by (level, table name)
    pub fn ordered(&self) -> Vec<TableLevel> {
        let mut rows: Vec<TableLevel> = self
            .levels
            .iter()
            .map(|(table, level)| TableLevel::new(table.as_str(), *level))
            .collect();
        rows.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.table.cmp(&b.table)));
        rows
    }

    /// Tables at exactly `level`, sorted by name
    pub fn tables_at(&self, level: u32) -> Vec<&str> {
        let mut tables: Vec<&str> = self
            .levels
            .iter()
            .filter(|(_, l)| **l == level)
            .map(|(t, _)| t.as_str())
            .collect();
        tables.sort_unstable();
        tables
    }

    /// Tables grouped level by level, lowest level first
    pub fn batches(&self) -> Vec<(u32, Vec<&str>)> {
        let mut grouped: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
        for (table, level) in &self.levels {
            grouped.entry(*level).or_default().push(table.as_str());
        }
        grouped
            .into_iter()
            .map(|(level, mut tables)| {
                tables.sort_unstable();
                (level, tables)
            })
            .collect()
    }
}

impl FromIterator<TableLevel> for LevelAssignment {
    fn from_iter<I: IntoIterator<Item = TableLevel>>(iter: I) -> Self {
        let mut assignment = Self::new();
        for row in iter {
            assignment.insert(row.table, row.level);
        }
        assignment
    }
}

/// How a level is written in a level list
///
/// The leveler only deals in integers; the `LV n` convention exists purely
/// for compatibility with existing ETL folders keyed on that text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelFormat {
    #[default]
    Bare,
    Prefixed,
}

const LEVEL_PREFIX: &str = "LV";

impl LevelFormat {
    pub fn render(&self, level: u32) -> String {
        match self {
            LevelFormat::Bare => level.to_string(),
            LevelFormat::Prefixed => format!("{} {}", LEVEL_PREFIX, level),
        }
    }

    /// Parse a level written in either convention
    pub fn parse(value: &str) -> Option<u32> {
        let value = value.trim();
        let digits = match value.strip_prefix(LEVEL_PREFIX) {
            Some(rest) => rest.trim_start(),
            None => value,
        };
        digits.parse::<u32>().ok().filter(|level| *level > 0)
    }
}

impl fmt::Display for LevelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelFormat::Bare => write!(f, "bare"),
            LevelFormat::Prefixed => write!(f, "prefixed"),
        }
    }
}
