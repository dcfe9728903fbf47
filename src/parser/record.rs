use std::collections::HashSet;
use std::io::BufRead;

use super::delimited::DelimitedTable;
use super::ParseError;
use crate::schema::{
    ColumnRecord, ConstraintRecord, LevelAssignment, LevelFormat, RelationRecord, TableLevel,
};

const TABLE_COLUMN: &[&str] = &["table_name", "table name"];
const PARENT_COLUMN: &[&str] = &["parent_table_name", "references"];
const LEVEL_COLUMN: &[&str] = &["level"];
const TYPE_COLUMN: &[&str] = &["data_type", "data type"];

/// Read a table list; only the table name column is used
pub fn read_table_list<R: BufRead>(reader: R, delimiter: char) -> Result<Vec<String>, ParseError> {
    let table = DelimitedTable::read(reader, delimiter)?;
    let name_idx = table.require(TABLE_COLUMN)?;

    table
        .rows()
        .iter()
        .map(|row| row.get(name_idx, TABLE_COLUMN[0]).map(str::to_string))
        .collect()
}

/// Read a relation list, keeping the descriptive columns when present
pub fn read_relation_list<R: BufRead>(
    reader: R,
    delimiter: char,
) -> Result<Vec<RelationRecord>, ParseError> {
    let table = DelimitedTable::read(reader, delimiter)?;
    let child_idx = table.require(TABLE_COLUMN)?;
    let parent_idx = table.require(PARENT_COLUMN)?;

    let column_child = table.column(&["column_child"]);
    let column_parent = table.column(&["column_parent"]);
    let constraint_name = table.column(&["constraint_name"]);
    let on_update = table.column(&["on_update"]);
    let on_delete = table.column(&["on_delete"]);

    let mut records = Vec::with_capacity(table.rows().len());
    for row in table.rows() {
        records.push(RelationRecord {
            table_name: row.get(child_idx, TABLE_COLUMN[0])?.to_string(),
            parent_table_name: row.get(parent_idx, PARENT_COLUMN[0])?.to_string(),
            column_child: row.optional(column_child),
            column_parent: row.optional(column_parent),
            constraint_name: row.optional(constraint_name),
            on_update: row.optional(on_update),
            on_delete: row.optional(on_delete),
        });
    }

    Ok(records)
}

/// Read a level list written by this tool (either level convention)
pub fn read_level_list<R: BufRead>(
    reader: R,
    delimiter: char,
) -> Result<LevelAssignment, ParseError> {
    let table = DelimitedTable::read(reader, delimiter)?;
    let name_idx = table.require(TABLE_COLUMN)?;
    let level_idx = table.require(LEVEL_COLUMN)?;

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(table.rows().len());
    for row in table.rows() {
        let name = row.get(name_idx, TABLE_COLUMN[1])?;
        if !seen.insert(name) {
            return Err(ParseError::DuplicateTable {
                line: row.line,
                table: name.to_string(),
            });
        }
        let raw = row.get(level_idx, LEVEL_COLUMN[0])?;
        let level = LevelFormat::parse(raw).ok_or_else(|| ParseError::InvalidLevel {
            line: row.line,
            value: raw.to_string(),
        })?;
        rows.push(TableLevel::new(name, level));
    }

    Ok(rows.into_iter().collect())
}

/// Read a column list; only the table name and declared type are required
pub fn read_column_list<R: BufRead>(
    reader: R,
    delimiter: char,
) -> Result<Vec<ColumnRecord>, ParseError> {
    let table = DelimitedTable::read(reader, delimiter)?;
    let table_idx = table.require(TABLE_COLUMN)?;
    let type_idx = table.require(TYPE_COLUMN)?;
    let column_idx = table.column(&["column_name"]);

    let mut records = Vec::with_capacity(table.rows().len());
    for row in table.rows() {
        records.push(ColumnRecord {
            table_name: row.get(table_idx, TABLE_COLUMN[0])?.to_string(),
            column_name: row.optional(column_idx),
            data_type: row.get(type_idx, TYPE_COLUMN[0])?.to_string(),
        });
    }

    Ok(records)
}

/// Read a constraint list
///
/// Without a `constraint_type` column every row is taken as a key.
pub fn read_constraint_list<R: BufRead>(
    reader: R,
    delimiter: char,
) -> Result<Vec<ConstraintRecord>, ParseError> {
    let table = DelimitedTable::read(reader, delimiter)?;
    let table_idx = table.require(TABLE_COLUMN)?;
    let name_idx = table.column(&["constraint_name"]);
    let type_idx = table.column(&["constraint_type"]);

    let mut records = Vec::with_capacity(table.rows().len());
    for row in table.rows() {
        records.push(ConstraintRecord {
            table_name: row.get(table_idx, TABLE_COLUMN[0])?.to_string(),
            constraint_name: row.optional(name_idx),
            constraint_type: row.optional(type_idx),
        });
    }

    Ok(records)
}
