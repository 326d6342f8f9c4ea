//! SQL DDL renderer
//!
//! Emits `CREATE TABLE` statements for every table and `ALTER TABLE ... ADD
//! FOREIGN KEY` statements for relationships with a single owning side.
//! The output is documentation; it is not validated against any database.

use crate::config::DialectConfig;
use crate::schema::{Column, RelationKind, Schema};

/// Render a schema as SQL DDL in the given dialect
pub fn to_ddl(schema: &Schema, dialect: DialectConfig) -> String {
    let mut sql = String::new();

    if dialect == DialectConfig::Postgres {
        for enum_type in schema.enums() {
            let values: Vec<String> = enum_type.values().iter().map(|v| quote_literal(v)).collect();
            sql.push_str(&format!(
                "CREATE TYPE {} AS ENUM ({});\n\n",
                quote_ident(enum_type.name(), dialect),
                values.join(", ")
            ));
        }
    }

    for table in schema.tables() {
        let mut lines = Vec::new();

        let mut columns: Vec<&Column> = table.columns().collect();
        columns.sort_by(|a, b| (!a.primary_key, &a.name).cmp(&(!b.primary_key, &b.name)));

        for column in &columns {
            lines.push(format!("  {}", column_definition(schema, column, dialect)));
        }

        let keys: Vec<String> = columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| quote_ident(&c.name, dialect))
            .collect();
        if !keys.is_empty() {
            lines.push(format!("  PRIMARY KEY ({})", keys.join(", ")));
        }

        sql.push_str(&format!("CREATE TABLE {} (\n", quote_ident(table.name(), dialect)));
        sql.push_str(&lines.join(",\n"));
        sql.push_str("\n);\n\n");
    }

    for r in schema.refs() {
        let (from_table, from_column, to_table, to_column) = match r.kind {
            RelationKind::ManyToOne | RelationKind::OneToOne => {
                (&r.child_table, &r.child_column, &r.parent_table, &r.parent_column)
            }
            RelationKind::OneToMany => {
                (&r.parent_table, &r.parent_column, &r.child_table, &r.child_column)
            }
            RelationKind::ManyToMany => continue,
        };
        sql.push_str(&format!(
            "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {} ({});\n",
            quote_ident(from_table, dialect),
            quote_ident(from_column, dialect),
            quote_ident(to_table, dialect),
            quote_ident(to_column, dialect)
        ));
    }

    sql
}

fn column_definition(schema: &Schema, column: &Column, dialect: DialectConfig) -> String {
    let mut def = format!(
        "{} {}",
        quote_ident(&column.name, dialect),
        sql_type(schema, &column.data_type, dialect)
    );

    if !column.nullable || column.primary_key {
        def.push_str(" NOT NULL");
    }
    if column.auto_increment {
        match dialect {
            DialectConfig::Mysql => def.push_str(" AUTO_INCREMENT"),
            DialectConfig::Postgres | DialectConfig::Ansi => {
                def.push_str(" GENERATED BY DEFAULT AS IDENTITY")
            }
        }
    }
    if column.unique && !column.primary_key {
        def.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        def.push_str(&format!(" DEFAULT {}", default));
    }

    def
}

/// Map a schema type token to a column type
///
/// Enum-typed columns become the enum type in Postgres and `varchar(255)`
/// elsewhere; other tokens pass through upper-cased.
fn sql_type(schema: &Schema, token: &str, dialect: DialectConfig) -> String {
    if let Some(enum_type) = schema.enum_type(token) {
        return match dialect {
            DialectConfig::Postgres => quote_ident(enum_type.name(), dialect),
            DialectConfig::Mysql => {
                let values: Vec<String> = enum_type.values().iter().map(|v| quote_literal(v)).collect();
                format!("ENUM({})", values.join(", "))
            }
            DialectConfig::Ansi => "VARCHAR(255)".to_string(),
        };
    }

    match (token.to_ascii_lowercase().as_str(), dialect) {
        ("varchar", _) => "VARCHAR(255)".to_string(),
        ("datetime", DialectConfig::Postgres | DialectConfig::Ansi) => "TIMESTAMP".to_string(),
        ("uuid", DialectConfig::Mysql) => "CHAR(36)".to_string(),
        ("uuid", DialectConfig::Ansi) => "CHAR(36)".to_string(),
        ("blob", DialectConfig::Postgres) => "BYTEA".to_string(),
        ("double", DialectConfig::Postgres | DialectConfig::Ansi) => "DOUBLE PRECISION".to_string(),
        _ => token.to_ascii_uppercase(),
    }
}

fn quote_ident(name: &str, dialect: DialectConfig) -> String {
    let quote = match dialect {
        DialectConfig::Mysql => '`',
        DialectConfig::Postgres | DialectConfig::Ansi => '"',
    };

    // `schema.table` names are quoted per part
    name.split('.')
        .map(|part| format!("{quote}{part}{quote}"))
        .collect::<Vec<_>>()
        .join(".")
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
