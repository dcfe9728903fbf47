use super::{server_url, sql_literal, Product, ProductAdapter};
use crate::credentials::Credential;

pub struct PostgresAdapter;

impl ProductAdapter for PostgresAdapter {
    fn product(&self) -> Product {
        Product::PostgreSql
    }

    fn connection_url(&self, credential: &Credential) -> String {
        server_url("postgresql", credential, &credential.database)
    }

    fn tables_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    c.relname AS table_name,
    obj_description(c.oid, 'pg_class') AS table_comment
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
WHERE n.nspname = {schema}
    AND c.relkind IN ('r', 'p')
ORDER BY c.relname",
            schema = sql_literal(schema)
        )
    }

    // confupdtype/confdeltype are single-letter action codes (a, r, c, n, d).
    // Parents outside the schema are left out.
    fn relations_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    child.relname AS table_name,
    parent.relname AS parent_table_name,
    child_col.attname AS column_child,
    parent_col.attname AS column_parent,
    con.conname AS constraint_name,
    con.confupdtype AS on_update,
    con.confdeltype AS on_delete
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_namespace ns ON con.connamespace = ns.oid
JOIN pg_catalog.pg_class child ON con.conrelid = child.oid
JOIN pg_catalog.pg_class parent ON con.confrelid = parent.oid
CROSS JOIN LATERAL unnest(con.conkey, con.confkey) AS k(child_attnum, parent_attnum)
JOIN pg_catalog.pg_attribute child_col
    ON child_col.attrelid = con.conrelid
    AND child_col.attnum = k.child_attnum
JOIN pg_catalog.pg_attribute parent_col
    ON parent_col.attrelid = con.confrelid
    AND parent_col.attnum = k.parent_attnum
WHERE con.contype = 'f'
    AND ns.nspname = {schema}
    AND parent.relnamespace = ns.oid
ORDER BY child.relname, con.conname",
            schema = sql_literal(schema)
        )
    }

    fn columns_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    table_name,
    column_name,
    ordinal_position,
    data_type,
    CASE WHEN is_nullable = 'YES' THEN 'NULL' ELSE 'NOT NULL' END AS is_nullable
FROM information_schema.columns
WHERE table_schema = {schema}
ORDER BY table_name, ordinal_position",
            schema = sql_literal(schema)
        )
    }

    fn constraints_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    cl.relname AS table_name,
    con.conname AS constraint_name,
    CASE con.contype
        WHEN 'p' THEN 'PRIMARY KEY'
        WHEN 'u' THEN 'UNIQUE'
        WHEN 'c' THEN 'CHECK'
    END AS constraint_type,
    pg_get_constraintdef(con.oid) AS definition
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class cl ON con.conrelid = cl.oid
JOIN pg_catalog.pg_namespace ns ON con.connamespace = ns.oid
WHERE con.contype IN ('p', 'u', 'c')
    AND ns.nspname = {schema}
ORDER BY cl.relname, con.conname",
            schema = sql_literal(schema)
        )
    }
}
