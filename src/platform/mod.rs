//! SQL dialect details the seeder and the migration engine depend on.

use itertools::Itertools;
use std::fmt::Debug;

pub trait DatabasePlatform: Debug + Send + Sync {
    fn get_name(&self) -> &'static str;

    /// Gets the character used for identifier quoting.
    fn get_identifier_quote_character(&self) -> char {
        '"'
    }

    /// Quotes a single identifier (no dot chain separation).
    fn quote_single_identifier(&self, str: &str) -> String {
        let c = self.get_identifier_quote_character();
        format!("{}{}{}", c, str.replace(c, &c.to_string().repeat(2)), c)
    }

    /// Quotes a string so that it can be safely used as a table or column name,
    /// even if it is a reserved word of the platform.
    fn quote_identifier(&self, identifier: &str) -> String {
        identifier
            .split('.')
            .map(|w| self.quote_single_identifier(w))
            .join(".")
    }

    /// Generates a truncate table statement for an already quoted table name.
    /// Auto-increment identities are reset and the statement must fail when the table
    /// is referenced by a foreign key, where the platform supports it.
    fn get_truncate_table_sql(&self, quoted_table_name: &str) -> String;

    /// Positional placeholder for the 1-indexed parameter `position`.
    fn placeholder(&self, position: usize) -> String;

    /// Parameterized INSERT into an already quoted table name.
    fn get_insert_sql(&self, quoted_table_name: &str, columns: &[&str]) -> String {
        if columns.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", quoted_table_name);
        }

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted_table_name,
            columns
                .iter()
                .map(|c| self.quote_single_identifier(c))
                .join(", "),
            (1..=columns.len()).map(|i| self.placeholder(i)).join(", "),
        )
    }
}

#[derive(Debug, Default)]
pub struct PostgreSQLPlatform;

impl DatabasePlatform for PostgreSQLPlatform {
    fn get_name(&self) -> &'static str {
        "postgresql"
    }

    fn get_truncate_table_sql(&self, quoted_table_name: &str) -> String {
        format!(
            "TRUNCATE TABLE {} RESTART IDENTITY RESTRICT",
            quoted_table_name
        )
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }
}

#[derive(Debug, Default)]
pub struct SqlitePlatform;

impl DatabasePlatform for SqlitePlatform {
    fn get_name(&self) -> &'static str {
        "sqlite"
    }

    fn get_truncate_table_sql(&self, quoted_table_name: &str) -> String {
        format!("DELETE FROM {}", quoted_table_name)
    }

    fn placeholder(&self, position: usize) -> String {
        format!("?{}", position)
    }
}

#[cfg(test)]
mod tests {
    use super::{DatabasePlatform, PostgreSQLPlatform, SqlitePlatform};

    #[test]
    fn quotes_identifiers() {
        let platform = PostgreSQLPlatform;
        assert_eq!(platform.quote_identifier("table_a"), r#""table_a""#);
        assert_eq!(platform.quote_identifier("public.table_a"), r#""public"."table_a""#);
        assert_eq!(platform.quote_single_identifier(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn generates_truncate_table_sql() {
        assert_eq!(
            PostgreSQLPlatform.get_truncate_table_sql(r#""table_a""#),
            r#"TRUNCATE TABLE "table_a" RESTART IDENTITY RESTRICT"#
        );
        assert_eq!(
            SqlitePlatform.get_truncate_table_sql(r#""table_a""#),
            r#"DELETE FROM "table_a""#
        );
    }

    #[test]
    fn generates_parameterized_insert_sql() {
        assert_eq!(
            PostgreSQLPlatform.get_insert_sql(r#""table_b""#, &["id", "col1", "col2"]),
            r#"INSERT INTO "table_b" ("id", "col1", "col2") VALUES ($1, $2, $3)"#
        );
        assert_eq!(
            SqlitePlatform.get_insert_sql(r#""table_b""#, &["id"]),
            r#"INSERT INTO "table_b" ("id") VALUES (?1)"#
        );
        assert_eq!(
            PostgreSQLPlatform.get_insert_sql(r#""table_b""#, &[]),
            r#"INSERT INTO "table_b" DEFAULT VALUES"#
        );
    }
}
