//! Annotation-driven schema extraction
//!
//! Two passes over the parsed inputs: the first indexes entities, enums,
//! embeddables and mapped superclasses by simple name; the second walks every
//! entity and mutates the target [`Schema`] in place.

use crate::annotation::{Marker, Markers};
use crate::syntax::{parse_compilation_unit, CompilationUnit, FieldDecl, TypeDecl, TypeKind};
use crate::types::{camel_to_snake, column_type, target_type_name, FALLBACK_TYPE};
use erdscribe_core::schema::{KEY_TYPE, SYNTHETIC_KEY};
use erdscribe_core::{Column, Ref, Schema, SourceFile};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Counters for one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Units parsed successfully
    pub units_parsed: usize,

    /// Units skipped because they failed to parse
    pub units_skipped: usize,

    /// Entity declarations applied to the schema
    pub entities: usize,
}

/// Static extractor for JPA-annotated Java sources
#[derive(Debug, Clone, Default)]
pub struct JpaExtractor;

impl JpaExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract into a fresh schema
    pub fn extract(&self, files: &[SourceFile]) -> Schema {
        let mut schema = Schema::new();
        self.populate(files, &mut schema);
        schema
    }

    /// Add every entity found in `files` to `schema`
    ///
    /// A file that fails to parse is logged and contributes nothing.
    pub fn populate(&self, files: &[SourceFile], schema: &mut Schema) -> ExtractStats {
        let mut stats = ExtractStats::default();
        let mut units: Vec<CompilationUnit> = Vec::with_capacity(files.len());

        for file in files {
            match parse_compilation_unit(&file.text) {
                Ok(unit) => {
                    debug!(path = %file.display_path(), types = unit.types.len(), "Parsed source unit");
                    stats.units_parsed += 1;
                    units.push(unit);
                }
                Err(e) => {
                    warn!(path = %file.display_path(), error = %e, "Skipping unparseable source unit");
                    stats.units_skipped += 1;
                }
            }
        }

        let decls: Vec<&TypeDecl> = units.iter().flat_map(|u| u.all_types()).collect();
        let index = DeclIndex::build(&decls);

        for decl in &decls {
            let markers = Markers::from_annotations(&decl.annotations);
            if decl.kind != TypeKind::Class || !(markers.is_entity() || markers.has_table()) {
                continue;
            }

            let table = resolve_table_name(decl, &markers);
            debug!(entity = %decl.name, table = %table, "Extracting entity");
            schema.ensure_table(&table);

            for field in index.persistent_fields(decl) {
                apply_field(&table, field, &index, schema);
            }
            stats.entities += 1;
        }

        info!(
            parsed = stats.units_parsed,
            skipped = stats.units_skipped,
            entities = stats.entities,
            "Static extraction complete"
        );

        stats
    }
}

/// Declarations of one run keyed by simple name; the first declaration wins
struct DeclIndex<'a> {
    entity_tables: HashMap<&'a str, String>,
    enums: HashMap<&'a str, &'a TypeDecl>,
    embeddables: HashMap<&'a str, &'a TypeDecl>,
    superclasses: HashMap<&'a str, &'a TypeDecl>,
}

impl<'a> DeclIndex<'a> {
    fn build(decls: &[&'a TypeDecl]) -> Self {
        let mut index = Self {
            entity_tables: HashMap::new(),
            enums: HashMap::new(),
            embeddables: HashMap::new(),
            superclasses: HashMap::new(),
        };

        for decl in decls {
            let name = decl.name.as_str();
            if decl.kind == TypeKind::Enum {
                index.enums.entry(name).or_insert(*decl);
                continue;
            }

            let markers = Markers::from_annotations(&decl.annotations);
            if markers.is_entity() || markers.has_table() {
                index
                    .entity_tables
                    .entry(name)
                    .or_insert_with(|| resolve_table_name(decl, &markers));
            }
            if markers.is_embeddable() {
                index.embeddables.entry(name).or_insert(*decl);
            }
            if markers.is_mapped_superclass() {
                index.superclasses.entry(name).or_insert(*decl);
            }
        }

        index
    }

    /// Table a relationship to `type_name` points at
    fn table_for(&self, type_name: &str) -> String {
        self.entity_tables
            .get(type_name)
            .cloned()
            .unwrap_or_else(|| camel_to_snake(type_name))
    }

    /// Fields of `decl` preceded by those inherited from mapped superclasses
    fn persistent_fields(&self, decl: &'a TypeDecl) -> Vec<&'a FieldDecl> {
        let mut chain: Vec<&'a TypeDecl> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(decl.name.as_str());

        let mut parent = decl.extends.as_ref();
        while let Some(ty) = parent {
            if !seen.insert(ty.name.as_str()) {
                break;
            }
            match self.superclasses.get(ty.name.as_str()) {
                Some(&superclass) => {
                    chain.push(superclass);
                    parent = superclass.extends.as_ref();
                }
                None => break,
            }
        }

        chain.reverse();
        chain.push(decl);
        chain.into_iter().flat_map(|d| d.fields.iter()).collect()
    }
}

/// `@Table(name)` > `@Entity(name)` > class name, optionally schema-qualified
fn resolve_table_name(decl: &TypeDecl, markers: &Markers) -> String {
    let table = markers.table();
    let base = match table {
        Some((Some(name), _)) => name.to_string(),
        _ => camel_to_snake(markers.entity_name().unwrap_or(&decl.name)),
    };

    match table.and_then(|(_, schema)| schema) {
        Some(schema) => format!("{}.{}", schema, base),
        None => base,
    }
}

/// Static, `transient` and `@Transient` fields are not mapped
fn is_persistent(field: &FieldDecl, markers: &Markers) -> bool {
    !(field.has_modifier("static") || field.has_modifier("transient") || markers.is_transient())
}

fn apply_field(table: &str, field: &FieldDecl, index: &DeclIndex<'_>, schema: &mut Schema) {
    let markers = Markers::from_annotations(&field.annotations);
    if !is_persistent(field, &markers) {
        return;
    }

    for name in &field.names {
        if markers.is_to_one() {
            let fk = markers
                .join_column_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}_id", camel_to_snake(name)));
            schema
                .ensure_table(table)
                .insert_column_if_absent(Column::new(fk.as_str(), KEY_TYPE));

            let parent = index.table_for(target_type_name(&field.ty));
            schema.add_ref(Ref::many_to_one(table, fk, parent, SYNTHETIC_KEY));
            continue;
        }

        if markers.is_many_to_many() {
            match markers.join_table() {
                Some((join_table, join_column, inverse_column)) => {
                    let jt = schema.ensure_table(join_table);
                    jt.insert_column_if_absent(Column::new(join_column, KEY_TYPE).with_nullable(false));
                    jt.insert_column_if_absent(Column::new(inverse_column, KEY_TYPE).with_nullable(false));

                    let target = index.table_for(target_type_name(&field.ty));
                    schema.add_ref(Ref::many_to_one(join_table, join_column, table, SYNTHETIC_KEY));
                    schema.add_ref(Ref::many_to_one(join_table, inverse_column, target, SYNTHETIC_KEY));
                }
                None => debug!(table, field = %name, "Skipping many-to-many without join table"),
            }
            continue;
        }

        // the foreign key lives on the other side
        if markers.is_one_to_many() {
            continue;
        }

        if let Some(embeddable) = index.embeddables.get(field.ty.name.as_str()) {
            let key = markers.is_embedded_id();
            for inner in &embeddable.fields {
                let inner_markers = Markers::from_annotations(&inner.annotations);
                if !is_persistent(inner, &inner_markers) {
                    continue;
                }
                for inner_name in &inner.names {
                    let mut column = scalar_column(inner_name, inner, &inner_markers, index, schema);
                    if key {
                        column.primary_key = true;
                        column.nullable = false;
                    }
                    schema.ensure_table(table).upsert_column(column);
                }
            }
            continue;
        }

        // an embedded value object is never a column of its own
        if markers.is_embedded() {
            debug!(table, field = %name, ty = %field.ty, "Skipping embedded field of unknown type");
            continue;
        }

        let mut column = scalar_column(name, field, &markers, index, schema);
        if markers.is_embedded_id() {
            column.primary_key = true;
            column.nullable = false;
        }
        schema.ensure_table(table).upsert_column(column);
    }
}

/// Column for a plain persistent field
fn scalar_column(
    name: &str,
    field: &FieldDecl,
    markers: &Markers,
    index: &DeclIndex<'_>,
    schema: &mut Schema,
) -> Column {
    let data_type = if markers.is_enumerated() {
        match index.enums.get(field.ty.name.as_str()) {
            Some(decl) => {
                let enum_name = camel_to_snake(&decl.name);
                let enum_type = schema.ensure_enum(&enum_name);
                for constant in &decl.enum_constants {
                    enum_type.add_value(constant.as_str());
                }
                enum_name
            }
            None => FALLBACK_TYPE.to_string(),
        }
    } else {
        column_type(&field.ty).to_string()
    };

    let mut column = Column::new(camel_to_snake(name), data_type);

    if let Some(Marker::Column {
        name,
        nullable,
        unique,
        length,
    }) = markers.column()
    {
        if let Some(name) = name {
            column.name = name.clone();
        }
        if let Some(nullable) = nullable {
            column.nullable = *nullable;
        }
        if let Some(unique) = unique {
            column.unique = *unique;
        }
        if let Some(length) = length {
            if column.data_type.starts_with("varchar") {
                column.data_type = format!("varchar({})", length);
            }
        }
    }

    if markers.is_id() {
        column.primary_key = true;
        column.nullable = false;
    }
    if markers.is_generated() {
        column.auto_increment = true;
    }

    column
}
