//! Structural repair pass
//!
//! Run once after extraction. Guarantees that every relationship endpoint
//! names an existing table and that every table has a primary key, without
//! deleting or altering existing columns.

use crate::schema::{Column, Schema, SYNTHETIC_KEY};

/// What the normalizer changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Tables created because a relationship referenced them
    pub created_tables: Vec<String>,

    /// Tables that received a synthetic `id` primary key
    pub injected_keys: Vec<String>,

    /// Tables left without a primary key because a non-key `id` column exists
    pub keyless_tables: Vec<String>,
}

impl NormalizeReport {
    /// True when the schema already satisfied every invariant
    pub fn is_clean(&self) -> bool {
        self.created_tables.is_empty() && self.injected_keys.is_empty() && self.keyless_tables.is_empty()
    }
}

/// Restore referential existence and primary-key presence
pub fn normalize(schema: &mut Schema) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    let missing: Vec<String> = schema
        .refs()
        .iter()
        .flat_map(|r| [r.child_table.as_str(), r.parent_table.as_str()])
        .filter(|name| !schema.has_table(name))
        .map(str::to_string)
        .collect();

    for name in missing {
        if schema.has_table(&name) {
            continue;
        }
        schema.ensure_table(&name).upsert_column(Column::synthetic_key());
        tracing::debug!(table = %name, "created placeholder table for relationship");
        report.created_tables.push(name);
    }

    for table in schema.tables_mut() {
        if table.has_primary_key() {
            continue;
        }
        if table.has_column(SYNTHETIC_KEY) {
            tracing::warn!(table = %table.name(), "table has a non-key `id` column; leaving it without a primary key");
            report.keyless_tables.push(table.name().to_string());
            continue;
        }
        table.upsert_column(Column::synthetic_key());
        report.injected_keys.push(table.name().to_string());
    }

    report
}
