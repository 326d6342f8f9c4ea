//! Markdown summary renderer

use crate::schema::{Column, Schema};

/// Render a human-readable Markdown summary of a schema
pub fn to_summary_markdown(schema: &Schema) -> String {
    let mut md = String::new();

    md.push_str("# ERD Summary\n\n");
    md.push_str(&format!("- Tables: {}\n", schema.table_count()));
    md.push_str(&format!("- Enums: {}\n", schema.enum_count()));
    md.push_str(&format!("- Relationships(Refs): {}\n", schema.ref_count()));
    md.push('\n');

    md.push_str("## Tables\n\n");
    for table in schema.tables() {
        md.push_str(&format!("### {}\n", table.name()));
        if let Some(note) = table.note.as_deref().filter(|n| !n.trim().is_empty()) {
            md.push_str(&format!("\n{}\n\n", note));
        }

        let mut columns: Vec<&Column> = table.columns().collect();
        columns.sort_by(|a, b| (!a.primary_key, &a.name).cmp(&(!b.primary_key, &b.name)));
        for column in columns {
            let flags = column_flags(column);
            if flags.is_empty() {
                md.push_str(&format!("- `{}`: {}\n", column.name, column.data_type));
            } else {
                md.push_str(&format!("- `{}`: {} ({})\n", column.name, column.data_type, flags.join(", ")));
            }
        }
        md.push('\n');
    }

    if schema.enum_count() > 0 {
        md.push_str("## Enums\n\n");
        for enum_type in schema.enums() {
            md.push_str(&format!("- `{}`: {}\n", enum_type.name(), enum_type.values().join(", ")));
        }
        md.push('\n');
    }

    md.push_str("## Relationships\n\n");
    for r in schema.refs() {
        md.push_str(&format!("- {}\n", r));
    }

    md
}

fn column_flags(column: &Column) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if column.primary_key {
        flags.push("PK");
    }
    if column.auto_increment {
        flags.push("AI");
    }
    if column.unique {
        flags.push("UNIQUE");
    }
    if !column.nullable {
        flags.push("NOT NULL");
    }
    flags
}
