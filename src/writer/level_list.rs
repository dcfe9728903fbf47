use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::parser::DEFAULT_DELIMITER;
use crate::schema::{LevelAssignment, LevelFormat, LoadPlanRow};

/// Header columns of a level list
pub const LEVEL_LIST_HEADER: [&str; 2] = ["table name", "LEVEL"];

/// Header columns of a load plan
pub const LOAD_PLAN_HEADER: [&str; 5] = [
    "table name",
    "LEVEL",
    "datetime_exists",
    "unique_identifier_exists",
    "load type",
];

/// Write `table name|LEVEL` rows ordered by (level, table name)
pub fn write_level_list<W: Write>(
    mut out: W,
    assignment: &LevelAssignment,
    format: LevelFormat,
) -> std::io::Result<()> {
    let delimiter = DEFAULT_DELIMITER.to_string();
    writeln!(out, "{}", LEVEL_LIST_HEADER.join(delimiter.as_str()))?;

    for row in assignment.ordered() {
        writeln!(
            out,
            "{}{}{}",
            quote_field(&row.table),
            delimiter,
            format.render(row.level)
        )?;
    }

    out.flush()
}

/// Write rows as a pretty JSON array
///
/// Used for level lists (`{"table", "level"}`) and load plans.
pub fn write_json<W: Write, T: Serialize>(mut out: W, rows: &[T]) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, rows).context("Failed to serialize rows")?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Write a load plan: the level list plus the traits and strategy of each table
pub fn write_load_plan<W: Write>(
    mut out: W,
    rows: &[LoadPlanRow],
    format: LevelFormat,
) -> std::io::Result<()> {
    let delimiter = DEFAULT_DELIMITER.to_string();
    writeln!(out, "{}", LOAD_PLAN_HEADER.join(delimiter.as_str()))?;

    for row in rows {
        let fields = [
            quote_field(&row.table),
            format.render(row.level),
            flag(row.has_datetime).to_string(),
            flag(row.has_unique_key).to_string(),
            row.strategy.to_string(),
        ];
        writeln!(out, "{}", fields.join(delimiter.as_str()))?;
    }

    out.flush()
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Write a level list file, replacing any existing one
pub fn save_level_list(path: &Path, assignment: &LevelAssignment, format: LevelFormat) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create level list: {:?}", path))?;
    write_level_list(BufWriter::new(file), assignment, format)
        .with_context(|| format!("Failed to write level list: {:?}", path))?;

    tracing::info!(path = %path.display(), tables = assignment.len(), "Level list written");
    Ok(())
}

/// Quote a table name only when it would otherwise split the row
fn quote_field(value: &str) -> String {
    if value.contains(DEFAULT_DELIMITER) || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
