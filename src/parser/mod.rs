//! Readers for the pipe-delimited files exchanged with the ETL tooling
//!
//! - table lists (`table_name`)
//! - relation lists (`table_name|parent_table_name|...`)
//! - level lists (`table name|LEVEL`)
//! - column lists (`table_name|column_name|data_type`)
//! - constraint lists (`table_name|constraint_name|constraint_type`)

pub mod delimited;
pub mod record;

pub use delimited::{split_line, DelimitedTable, Row, DEFAULT_DELIMITER};
pub use record::{
    read_column_list, read_constraint_list, read_level_list, read_relation_list, read_table_list,
};

/// Errors while reading a delimited file
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File has no header line")]
    MissingHeader,

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Line {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: empty value in column {column}")]
    EmptyValue { line: usize, column: String },

    #[error("Line {line}: invalid level: {value:?}")]
    InvalidLevel { line: usize, value: String },

    #[error("Line {line}: table {table} is listed more than once")]
    DuplicateTable { line: usize, table: String },
}
