use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::parser::{
    read_column_list, read_constraint_list, read_level_list, read_relation_list, read_table_list,
};
use crate::product::sqlite;
use crate::schema::{LevelAssignment, SchemaSnapshot, TableMetadata};

/// Load the tables and relations to level from either a SQLite database or
/// a pair of delimited files
pub fn resolve_snapshot(
    sqlite_db: Option<&Path>,
    tables: Option<&Path>,
    relations: Option<&Path>,
    delimiter: char,
) -> Result<SchemaSnapshot> {
    match (sqlite_db, tables) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --sqlite and --tables at the same time");
        }
        (Some(db), None) => {
            if relations.is_some() {
                bail!("--relations cannot be combined with --sqlite");
            }
            tracing::info!(path = %db.display(), "Reading schema from SQLite database");
            sqlite::read_snapshot(db)
        }
        (None, Some(tables_path)) => {
            let table_list = read_table_list(open(tables_path)?, delimiter)
                .with_context(|| format!("Failed to parse table list: {:?}", tables_path))?;

            let relation_list = match relations {
                Some(path) => read_relation_list(open(path)?, delimiter)
                    .with_context(|| format!("Failed to parse relation list: {:?}", path))?,
                None => {
                    tracing::warn!("No relation list given, every table will be level 1");
                    Vec::new()
                }
            };

            tracing::info!(
                tables = table_list.len(),
                relations = relation_list.len(),
                "Read schema from delimited files"
            );
            Ok(SchemaSnapshot::new(table_list, relation_list))
        }
        (None, None) => {
            bail!("Provide either --sqlite <DB> or --tables <FILE>");
        }
    }
}

/// Load column types and key constraints for the load plan
///
/// A SQLite database carries its own metadata; otherwise the column and
/// constraint lists are read. A missing list leaves that trait unset for
/// every table.
pub fn resolve_metadata(
    sqlite_db: Option<&Path>,
    columns: Option<&Path>,
    constraints: Option<&Path>,
    delimiter: char,
) -> Result<TableMetadata> {
    if let Some(db) = sqlite_db {
        if columns.is_some() || constraints.is_some() {
            bail!("--columns and --constraints cannot be combined with --sqlite");
        }
        return sqlite::read_metadata(db);
    }

    let column_list = match columns {
        Some(path) => read_column_list(open(path)?, delimiter)
            .with_context(|| format!("Failed to parse column list: {:?}", path))?,
        None => {
            tracing::warn!("No column list given, no table has a date column");
            Vec::new()
        }
    };

    let constraint_list = match constraints {
        Some(path) => read_constraint_list(open(path)?, delimiter)
            .with_context(|| format!("Failed to parse constraint list: {:?}", path))?,
        None => {
            tracing::warn!("No constraint list given, every table loads with truncate insert");
            Vec::new()
        }
    };

    Ok(TableMetadata::from_records(&column_list, &constraint_list))
}

/// Read a level list previously written by `level`
pub fn load_level_list(path: &Path, delimiter: char) -> Result<LevelAssignment> {
    let levels = read_level_list(open(path)?, delimiter)
        .with_context(|| format!("Failed to parse level list: {:?}", path))?;
    tracing::debug!(path = %path.display(), tables = levels.len(), "Loaded level list");
    Ok(levels)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    Ok(BufReader::new(file))
}
