use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use super::{sql_identifier, sql_literal, Product, ProductAdapter};
use crate::credentials::Credential;
use crate::schema::{
    ColumnRecord, ConstraintRecord, RelationRecord, SchemaSnapshot, TableMetadata,
};

/// Schema name of the primary SQLite database
pub const MAIN_SCHEMA: &str = "main";

/// SQLite: `database` is the file path, the schema an attached database name
pub struct SqliteAdapter;

impl ProductAdapter for SqliteAdapter {
    fn product(&self) -> Product {
        Product::Sqlite
    }

    fn connection_url(&self, credential: &Credential) -> String {
        format!("sqlite://{}", credential.database)
    }

    fn tables_query(&self, schema: &str) -> String {
        format!(
            "SELECT name AS table_name
FROM {schema}.sqlite_master
WHERE type = 'table'
    AND name NOT LIKE 'sqlite_%'
ORDER BY name",
            schema = sql_identifier(schema)
        )
    }

    // REFERENCES keeps the spelling of the DDL; table names are case-insensitive,
    // so the parent is mapped back to its stored name when it exists
    fn relations_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    m.name AS table_name,
    COALESCE(p.name, fk.\"table\") AS parent_table_name,
    fk.\"from\" AS column_child,
    fk.\"to\" AS column_parent,
    NULL AS constraint_name,
    fk.on_update,
    fk.on_delete
FROM {schema}.sqlite_master AS m
JOIN pragma_foreign_key_list(m.name, {literal}) AS fk
LEFT JOIN {schema}.sqlite_master AS p
    ON p.type = 'table'
    AND p.name = fk.\"table\" COLLATE NOCASE
WHERE m.type = 'table'
    AND m.name NOT LIKE 'sqlite_%'
ORDER BY m.name, fk.id, fk.seq",
            schema = sql_identifier(schema),
            literal = sql_literal(schema)
        )
    }

    fn columns_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    m.name AS table_name,
    c.name AS column_name,
    c.cid + 1 AS ordinal_position,
    c.type AS data_type,
    CASE WHEN c.\"notnull\" = 1 THEN 'NOT NULL' ELSE 'NULL' END AS is_nullable
FROM {schema}.sqlite_master AS m
JOIN pragma_table_info(m.name, {literal}) AS c
WHERE m.type = 'table'
    AND m.name NOT LIKE 'sqlite_%'
ORDER BY m.name, c.cid",
            schema = sql_identifier(schema),
            literal = sql_literal(schema)
        )
    }

    // INTEGER PRIMARY KEY aliases the rowid and has no index, so it is taken
    // from the table info instead
    fn constraints_query(&self, schema: &str) -> String {
        format!(
            "SELECT table_name, constraint_name, constraint_type
FROM (
    SELECT
        m.name AS table_name,
        il.name AS constraint_name,
        CASE il.origin
            WHEN 'pk' THEN 'PRIMARY KEY'
            WHEN 'u' THEN 'UNIQUE'
            ELSE 'UNIQUE INDEX'
        END AS constraint_type
    FROM {schema}.sqlite_master AS m
    JOIN pragma_index_list(m.name, {literal}) AS il
    WHERE m.type = 'table'
        AND m.name NOT LIKE 'sqlite_%'
        AND il.\"unique\" = 1
    UNION ALL
    SELECT
        m.name AS table_name,
        NULL AS constraint_name,
        'PRIMARY KEY' AS constraint_type
    FROM {schema}.sqlite_master AS m
    JOIN pragma_table_info(m.name, {literal}) AS c
    WHERE m.type = 'table'
        AND m.name NOT LIKE 'sqlite_%'
        AND c.pk = 1
        AND NOT EXISTS (
            SELECT 1
            FROM pragma_index_list(m.name, {literal}) AS pk
            WHERE pk.origin = 'pk'
        )
)
ORDER BY table_name, constraint_name",
            schema = sql_identifier(schema),
            literal = sql_literal(schema)
        )
    }
}

/// Read the table list and foreign keys of a SQLite database file
pub fn read_snapshot(db_path: &Path) -> Result<SchemaSnapshot> {
    let conn = open_read_only(db_path)?;

    let tables = read_tables(&conn, MAIN_SCHEMA)?;
    let relations = read_relations(&conn, MAIN_SCHEMA)?;

    tracing::info!(
        path = %db_path.display(),
        tables = tables.len(),
        relations = relations.len(),
        "Read schema metadata"
    );

    Ok(SchemaSnapshot::new(tables, relations))
}

/// Read the column types and key constraints of a SQLite database file
pub fn read_metadata(db_path: &Path) -> Result<TableMetadata> {
    let conn = open_read_only(db_path)?;

    let columns = read_columns(&conn, MAIN_SCHEMA)?;
    let constraints = read_constraints(&conn, MAIN_SCHEMA)?;

    tracing::info!(
        path = %db_path.display(),
        columns = columns.len(),
        constraints = constraints.len(),
        "Read column metadata"
    );

    Ok(TableMetadata::from_records(&columns, &constraints))
}

fn open_read_only(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        bail!("SQLite database not found: {:?}", db_path);
    }

    Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open database: {:?}", db_path))
}

fn read_tables(conn: &Connection, schema: &str) -> Result<Vec<String>> {
    let sql = SqliteAdapter.tables_query(schema);
    let mut stmt = conn.prepare(&sql).context("Failed to prepare table query")?;

    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read table list")?;

    Ok(tables)
}

fn read_relations(conn: &Connection, schema: &str) -> Result<Vec<RelationRecord>> {
    let sql = SqliteAdapter.relations_query(schema);
    let mut stmt = conn
        .prepare(&sql)
        .context("Failed to prepare relation query")?;

    let relations = stmt
        .query_map([], |row| {
            Ok(RelationRecord {
                table_name: row.get(0)?,
                parent_table_name: row.get(1)?,
                column_child: row.get(2)?,
                column_parent: row.get(3)?,
                constraint_name: row.get(4)?,
                on_update: row.get(5)?,
                on_delete: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read foreign keys")?;

    Ok(relations)
}

// Declared types may be empty (`CREATE TABLE t (x)`)
fn read_columns(conn: &Connection, schema: &str) -> Result<Vec<ColumnRecord>> {
    let sql = SqliteAdapter.columns_query(schema);
    let mut stmt = conn.prepare(&sql).context("Failed to prepare column query")?;

    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnRecord {
                table_name: row.get(0)?,
                column_name: row.get(1)?,
                data_type: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read columns")?;

    Ok(columns)
}

fn read_constraints(conn: &Connection, schema: &str) -> Result<Vec<ConstraintRecord>> {
    let sql = SqliteAdapter.constraints_query(schema);
    let mut stmt = conn
        .prepare(&sql)
        .context("Failed to prepare constraint query")?;

    let constraints = stmt
        .query_map([], |row| {
            Ok(ConstraintRecord {
                table_name: row.get(0)?,
                constraint_name: row.get(1)?,
                constraint_type: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read key constraints")?;

    Ok(constraints)
}
