use super::{server_url, sql_literal, Product, ProductAdapter};
use crate::credentials::Credential;

/// Oracle: the schema is the owning user; `database` is the service name
pub struct OracleAdapter;

impl ProductAdapter for OracleAdapter {
    fn product(&self) -> Product {
        Product::Oracle
    }

    fn connection_url(&self, credential: &Credential) -> String {
        server_url(
            "oracle",
            credential,
            &format!("?service_name={}", credential.database),
        )
    }

    fn tables_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    a.table_name,
    b.comments AS table_comment
FROM all_tables a
LEFT JOIN all_tab_comments b
    ON a.owner = b.owner
    AND a.table_name = b.table_name
WHERE a.owner = {schema}
ORDER BY a.table_name",
            schema = sql_literal(schema)
        )
    }

    // Oracle has no ON UPDATE action, so that column is always NULL
    fn relations_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    a.table_name,
    c.table_name AS parent_table_name,
    b.column_name AS column_child,
    d.column_name AS column_parent,
    a.constraint_name,
    NULL AS on_update,
    a.delete_rule AS on_delete
FROM all_constraints a
JOIN all_cons_columns b
    ON a.owner = b.owner
    AND a.table_name = b.table_name
    AND a.constraint_name = b.constraint_name
JOIN all_constraints c
    ON a.r_owner = c.owner
    AND a.r_constraint_name = c.constraint_name
JOIN all_cons_columns d
    ON c.owner = d.owner
    AND c.table_name = d.table_name
    AND c.constraint_name = d.constraint_name
    AND b.position = d.position
WHERE a.constraint_type = 'R'
    AND c.constraint_type IN ('P', 'U')
    AND a.owner = {schema}
    AND c.owner = {schema}
ORDER BY a.table_name, a.constraint_name, b.position",
            schema = sql_literal(schema)
        )
    }

    fn columns_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    table_name,
    column_name,
    column_id AS ordinal_position,
    data_type,
    CASE WHEN nullable = 'Y' THEN 'NULL' ELSE 'NOT NULL' END AS is_nullable
FROM all_tab_columns
WHERE owner = {schema}
ORDER BY table_name, column_id",
            schema = sql_literal(schema)
        )
    }

    fn constraints_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    a.table_name,
    a.constraint_name,
    CASE a.constraint_type
        WHEN 'P' THEN 'PRIMARY KEY'
        WHEN 'U' THEN 'UNIQUE'
        WHEN 'C' THEN 'CHECK'
    END AS constraint_type,
    b.column_name,
    a.search_condition AS check_clause
FROM all_constraints a
LEFT JOIN all_cons_columns b
    ON a.owner = b.owner
    AND a.table_name = b.table_name
    AND a.constraint_name = b.constraint_name
WHERE a.owner = {schema}
    AND a.constraint_type IN ('P', 'U', 'C')
    AND a.generated = 'USER NAME'
ORDER BY a.table_name, a.constraint_name, b.position",
            schema = sql_literal(schema)
        )
    }
}
