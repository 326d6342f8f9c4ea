//! Order-independent fragment merging
//!
//! Every field is combined with a commutative, associative rule so the merged
//! schema does not depend on the order in which batches finished:
//!
//! - `primary_key`, `unique`, `auto_increment`: OR
//! - `nullable`: AND
//! - `type`: most specific token (see [`more_specific`])
//! - notes and defaults: lexicographically smallest non-empty value
//! - enum values and refs: set union, emitted sorted

use erdscribe_core::{Column, Fragment, Ref};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
struct TableAcc {
    note: Option<String>,
    columns: BTreeMap<String, Column>,
}

#[derive(Default)]
struct EnumAcc {
    note: Option<String>,
    values: BTreeSet<String>,
}

/// Fold fragments into one canonical fragment
pub fn merge_fragments<I>(fragments: I) -> Fragment
where
    I: IntoIterator<Item = Fragment>,
{
    let mut tables: BTreeMap<String, TableAcc> = BTreeMap::new();
    let mut enums: BTreeMap<String, EnumAcc> = BTreeMap::new();
    let mut refs: BTreeSet<Ref> = BTreeSet::new();

    for fragment in fragments {
        for e in fragment.enums() {
            let acc = enums.entry(e.name().to_string()).or_default();
            merge_text(&mut acc.note, e.note.as_deref());
            acc.values.extend(e.values().iter().cloned());
        }

        for t in fragment.tables() {
            let acc = tables.entry(t.name().to_string()).or_default();
            merge_text(&mut acc.note, t.note.as_deref());

            for column in t.columns() {
                match acc.columns.get_mut(&column.name) {
                    Some(existing) => merge_column(existing, column),
                    None => {
                        let mut first = column.clone();
                        first.note = None;
                        first.default = None;
                        merge_text(&mut first.note, column.note.as_deref());
                        merge_text(&mut first.default, column.default.as_deref());
                        acc.columns.insert(column.name.clone(), first);
                    }
                }
            }
        }

        refs.extend(fragment.refs().iter().cloned());
    }

    let mut merged = Fragment::new();

    for (name, acc) in enums {
        let enum_type = merged.ensure_enum(&name);
        enum_type.note = acc.note;
        for value in acc.values {
            enum_type.add_value(value);
        }
    }

    for (name, acc) in tables {
        let table = merged.ensure_table(&name);
        table.note = acc.note;
        for column in acc.columns.into_values() {
            table.upsert_column(column);
        }
    }

    for r in refs {
        merged.add_ref(r);
    }

    merged
}

fn merge_column(into: &mut Column, other: &Column) {
    into.primary_key |= other.primary_key;
    into.unique |= other.unique;
    into.auto_increment |= other.auto_increment;
    into.nullable &= other.nullable;

    if more_specific(&other.data_type, &into.data_type) {
        into.data_type = other.data_type.clone();
    }

    merge_text(&mut into.note, other.note.as_deref());
    merge_text(&mut into.default, other.default.as_deref());
}

/// Keep the lexicographically smallest non-empty value
fn merge_text(into: &mut Option<String>, other: Option<&str>) {
    let Some(other) = other.filter(|s| !s.trim().is_empty()) else {
        return;
    };
    match into {
        Some(current) if current.as_str() <= other => {}
        _ => *into = Some(other.to_string()),
    }
}

fn is_generic(token: &str) -> bool {
    token.eq_ignore_ascii_case("varchar") || token.eq_ignore_ascii_case("text")
}

/// Whether type token `a` should replace `b`
///
/// Specific tokens beat the generic `varchar`/`text` placeholders, so a
/// parameterized `varchar(N)` beats a bare `varchar`. Remaining ties go to the
/// lexicographically smaller token.
pub fn more_specific(a: &str, b: &str) -> bool {
    match (is_generic(a), is_generic(b)) {
        (false, true) => true,
        (true, false) => false,
        _ => a < b,
    }
}
