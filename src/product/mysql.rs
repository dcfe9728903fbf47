use super::{server_url, sql_literal, Product, ProductAdapter};
use crate::credentials::Credential;

/// MySQL and MariaDB share `INFORMATION_SCHEMA`; only the URL differs
pub struct MySqlAdapter {
    product: Product,
}

pub static MYSQL: MySqlAdapter = MySqlAdapter {
    product: Product::MySql,
};

pub static MARIADB: MySqlAdapter = MySqlAdapter {
    product: Product::MariaDb,
};

impl ProductAdapter for MySqlAdapter {
    fn product(&self) -> Product {
        self.product
    }

    fn connection_url(&self, credential: &Credential) -> String {
        match self.product {
            Product::MariaDb => server_url("mariadb", credential, &credential.database),
            _ => server_url(
                "mysql",
                credential,
                &format!("{}?charset=utf8mb4", credential.database),
            ),
        }
    }

    fn tables_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    TABLE_NAME AS table_name,
    TABLE_COMMENT AS table_comment
FROM INFORMATION_SCHEMA.TABLES
WHERE TABLE_SCHEMA = {schema}
    AND TABLE_TYPE = 'BASE TABLE'
ORDER BY TABLE_NAME",
            schema = sql_literal(schema)
        )
    }

    // Keys into other schemas are left out; their parents are not in the table list
    fn relations_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    kcu.TABLE_NAME AS table_name,
    kcu.REFERENCED_TABLE_NAME AS parent_table_name,
    kcu.COLUMN_NAME AS column_child,
    kcu.REFERENCED_COLUMN_NAME AS column_parent,
    kcu.CONSTRAINT_NAME AS constraint_name,
    rc.UPDATE_RULE AS on_update,
    rc.DELETE_RULE AS on_delete
FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE AS kcu
JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS AS rc
    ON kcu.CONSTRAINT_SCHEMA = rc.CONSTRAINT_SCHEMA
    AND kcu.TABLE_NAME = rc.TABLE_NAME
    AND kcu.CONSTRAINT_NAME = rc.CONSTRAINT_NAME
WHERE kcu.TABLE_SCHEMA = {schema}
    AND kcu.REFERENCED_TABLE_SCHEMA = {schema}
    AND kcu.REFERENCED_TABLE_NAME IS NOT NULL
ORDER BY kcu.TABLE_NAME, kcu.CONSTRAINT_NAME, kcu.ORDINAL_POSITION",
            schema = sql_literal(schema)
        )
    }

    fn columns_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    TABLE_NAME AS table_name,
    COLUMN_NAME AS column_name,
    ORDINAL_POSITION AS ordinal_position,
    COLUMN_TYPE AS data_type,
    CASE WHEN IS_NULLABLE = 'YES' THEN 'NULL' ELSE 'NOT NULL' END AS is_nullable
FROM INFORMATION_SCHEMA.COLUMNS
WHERE TABLE_SCHEMA = {schema}
ORDER BY TABLE_NAME, ORDINAL_POSITION",
            schema = sql_literal(schema)
        )
    }

    fn constraints_query(&self, schema: &str) -> String {
        format!(
            "SELECT
    tc.TABLE_NAME AS table_name,
    tc.CONSTRAINT_NAME AS constraint_name,
    tc.CONSTRAINT_TYPE AS constraint_type,
    kcu.COLUMN_NAME AS column_name
FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS AS tc
LEFT JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE AS kcu
    ON tc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
    AND tc.TABLE_NAME = kcu.TABLE_NAME
    AND tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
WHERE tc.TABLE_SCHEMA = {schema}
    AND tc.CONSTRAINT_TYPE IN ('PRIMARY KEY', 'UNIQUE', 'CHECK')
ORDER BY tc.TABLE_NAME, tc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION",
            schema = sql_literal(schema)
        )
    }
}
