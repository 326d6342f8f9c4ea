//! DBML renderer
//!
//! Output order: enums (by name), tables (by name, primary-key columns first,
//! then alphabetical), then one `Ref:` line per relationship.

use crate::schema::{Column, Schema};

/// Render a schema as DBML
pub fn to_dbml(schema: &Schema) -> String {
    let mut out = String::new();

    for enum_type in schema.enums() {
        out.push_str(&format!("Enum {} {{\n", enum_type.name()));
        for value in enum_type.values() {
            out.push_str(&format!("  {}\n", enum_value(value)));
        }
        if let Some(note) = non_empty(&enum_type.note) {
            out.push_str(&format!("  Note: '{}'\n", escape(note)));
        }
        out.push_str("}\n\n");
    }

    for table in schema.tables() {
        out.push_str(&format!("Table {} {{\n", table.name()));

        let mut columns: Vec<&Column> = table.columns().collect();
        columns.sort_by(|a, b| (!a.primary_key, &a.name).cmp(&(!b.primary_key, &b.name)));

        for column in columns {
            out.push_str(&format!("  {} {}{}\n", column.name, column.data_type, column_settings(column)));
        }
        if let Some(note) = non_empty(&table.note) {
            out.push_str(&format!("  Note: '{}'\n", escape(note)));
        }
        out.push_str("}\n\n");
    }

    for r in schema.refs() {
        out.push_str(&format!(
            "Ref: {}.{} {} {}.{}\n",
            r.child_table,
            r.child_column,
            r.kind.symbol(),
            r.parent_table,
            r.parent_column
        ));
    }

    out
}

/// Bracketed column settings, or an empty string when there are none
fn column_settings(column: &Column) -> String {
    let mut settings = Vec::new();

    if column.primary_key {
        settings.push("pk".to_string());
    }
    if column.auto_increment {
        settings.push("increment".to_string());
    }
    if column.unique {
        settings.push("unique".to_string());
    }
    if !column.nullable {
        settings.push("not null".to_string());
    }
    if let Some(default) = &column.default {
        settings.push(format!("default: {}", default));
    }
    if let Some(note) = non_empty(&column.note) {
        settings.push(format!("note: '{}'", escape(note)));
    }

    if settings.is_empty() {
        String::new()
    } else {
        format!(" [{}]", settings.join(", "))
    }
}

fn enum_value(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

fn non_empty(note: &Option<String>) -> Option<&str> {
    note.as_deref().filter(|n| !n.trim().is_empty())
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}
