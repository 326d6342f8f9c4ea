//! Relational schema model
//!
//! Every extraction front-end populates the same [`Schema`]. Tables and enums
//! are only ever created through [`Schema::ensure_table`] and
//! [`Schema::ensure_enum`], so "create vs. fetch" is a single keyed operation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Column name used for synthetic primary keys
pub const SYNTHETIC_KEY: &str = "id";

/// Type token used for synthetic primary keys and inferred foreign keys
pub const KEY_TYPE: &str = "bigint";

/// Relationship kind between a child column and the parent column it references
///
/// Serialized as the DBML relationship symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// `<` - one parent row, many child rows
    #[serde(rename = "<")]
    OneToMany,

    /// `>` - many child rows reference one parent row
    #[serde(rename = ">")]
    ManyToOne,

    /// `-` - one-to-one
    #[serde(rename = "-")]
    OneToOne,

    /// `<>` - many-to-many
    #[serde(rename = "<>")]
    ManyToMany,
}

impl RelationKind {
    /// DBML relationship symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::OneToMany => "<",
            Self::ManyToOne => ">",
            Self::OneToOne => "-",
            Self::ManyToMany => "<>",
        }
    }

    /// Parse a DBML relationship symbol
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Self::OneToMany),
            ">" => Some(Self::ManyToOne),
            "-" => Some(Self::OneToOne),
            "<>" => Some(Self::ManyToMany),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A column in a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unique within its table)
    pub name: String,

    /// Dialect-agnostic type token, e.g. `varchar(255)` or `bigint`
    #[serde(rename = "type")]
    pub data_type: String,

    /// Part of the primary key
    #[serde(default)]
    pub primary_key: bool,

    /// Accepts NULL
    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// Has a unique constraint
    #[serde(default)]
    pub unique: bool,

    /// Value generated by the database
    #[serde(default)]
    pub auto_increment: bool,

    /// Default value literal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    /// Create a nullable column with no constraints
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            primary_key: false,
            nullable: true,
            unique: false,
            auto_increment: false,
            default: None,
            note: None,
        }
    }

    /// The `id bigint` primary key injected by normalization
    pub fn synthetic_key() -> Self {
        Self::new(SYNTHETIC_KEY, KEY_TYPE)
            .with_primary_key(true)
            .with_nullable(false)
    }

    /// Set primary key flag
    pub fn with_primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set unique flag
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Set auto increment flag
    pub fn with_auto_increment(mut self, auto_increment: bool) -> Self {
        self.auto_increment = auto_increment;
        self
    }

    /// Set default literal
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A table and its columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    name: String,

    columns: BTreeMap<String, Column>,

    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Table {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: BTreeMap::new(),
            note: None,
        }
    }

    /// Table name, possibly `schema.table`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns ordered by name
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Find a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Find a column by name for modification
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    /// Whether a column with this name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Insert a column, replacing any column with the same name
    ///
    /// Returns the replaced column, if any.
    pub fn upsert_column(&mut self, column: Column) -> Option<Column> {
        self.columns.insert(column.name.clone(), column)
    }

    /// Insert a column only if no column with that name exists yet
    ///
    /// Returns true when the column was inserted.
    pub fn insert_column_if_absent(&mut self, column: Column) -> bool {
        if self.columns.contains_key(&column.name) {
            return false;
        }
        self.columns.insert(column.name.clone(), column);
        true
    }

    /// Whether at least one column is part of the primary key
    pub fn has_primary_key(&self) -> bool {
        self.columns.values().any(|c| c.primary_key)
    }

    /// Primary key columns ordered by name
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.columns.values().filter(|c| c.primary_key).collect()
    }

    /// Column names ordered by name
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|k| k.as_str()).collect()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// A directed foreign-key relationship
///
/// Tables and columns are referenced by name; the named tables may not exist
/// until normalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ref {
    /// Table holding the foreign key
    pub child_table: String,

    /// Foreign key column
    pub child_column: String,

    /// Relationship kind
    pub kind: RelationKind,

    /// Referenced table
    pub parent_table: String,

    /// Referenced column
    pub parent_column: String,
}

impl Ref {
    /// Create a new relationship
    pub fn new(
        child_table: impl Into<String>,
        child_column: impl Into<String>,
        kind: RelationKind,
        parent_table: impl Into<String>,
        parent_column: impl Into<String>,
    ) -> Self {
        Self {
            child_table: child_table.into(),
            child_column: child_column.into(),
            kind,
            parent_table: parent_table.into(),
            parent_column: parent_column.into(),
        }
    }

    /// Many-to-one relationship from `child` to `parent`
    pub fn many_to_one(
        child_table: impl Into<String>,
        child_column: impl Into<String>,
        parent_table: impl Into<String>,
        parent_column: impl Into<String>,
    ) -> Self {
        Self::new(child_table, child_column, RelationKind::ManyToOne, parent_table, parent_column)
    }
}

impl std::fmt::Display for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} {} {}.{}",
            self.child_table, self.child_column, self.kind, self.parent_table, self.parent_column
        )
    }
}

/// A named enumeration with an ordered set of values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    name: String,

    values: Vec<String>,

    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EnumType {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            note: None,
        }
    }

    /// Enum name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values in insertion order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Append a value unless already present
    pub fn add_value(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.values.contains(&value) {
            return false;
        }
        self.values.push(value);
        true
    }
}

/// Aggregate root of an extraction run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SchemaRepr")]
pub struct Schema {
    tables: BTreeMap<String, Table>,

    enums: BTreeMap<String, EnumType>,

    refs: Vec<Ref>,

    /// Membership index over `refs`
    #[serde(skip)]
    ref_index: BTreeSet<Ref>,
}

/// Serialized shape of [`Schema`]; duplicate refs collapse on the way in
#[derive(Deserialize)]
struct SchemaRepr {
    #[serde(default)]
    tables: BTreeMap<String, Table>,

    #[serde(default)]
    enums: BTreeMap<String, EnumType>,

    #[serde(default)]
    refs: Vec<Ref>,
}

impl From<SchemaRepr> for Schema {
    fn from(repr: SchemaRepr) -> Self {
        let mut schema = Self {
            tables: repr.tables,
            enums: repr.enums,
            ..Self::default()
        };
        for r in repr.refs {
            schema.add_ref(r);
        }
        schema
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.tables == other.tables && self.enums == other.enums && self.refs == other.refs
    }
}

impl Eq for Schema {}

/// Partial schema produced by one extraction batch
pub type Fragment = Schema;

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a table, creating an empty one if it does not exist
    pub fn ensure_table(&mut self, name: &str) -> &mut Table {
        self.tables
            .entry(name.to_string())
            .or_insert_with(|| Table::new(name))
    }

    /// Fetch an enum, creating an empty one if it does not exist
    pub fn ensure_enum(&mut self, name: &str) -> &mut EnumType {
        self.enums
            .entry(name.to_string())
            .or_insert_with(|| EnumType::new(name))
    }

    /// Append a relationship, ignoring an exact duplicate
    ///
    /// Returns true when the relationship was appended.
    pub fn add_ref(&mut self, r: Ref) -> bool {
        if !self.ref_index.insert(r.clone()) {
            return false;
        }
        self.refs.push(r);
        true
    }

    /// Find a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Whether a table with this name exists
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Tables ordered by name
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Tables ordered by name, for in-place repair
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.values_mut()
    }

    /// Find an enum by name
    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        self.enums.get(name)
    }

    /// Enums ordered by name
    pub fn enums(&self) -> impl Iterator<Item = &EnumType> {
        self.enums.values()
    }

    /// Relationships in insertion order
    pub fn refs(&self) -> &[Ref] {
        &self.refs
    }

    /// Number of tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Number of enums
    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }

    /// Number of relationships
    pub fn ref_count(&self) -> usize {
        self.refs.len()
    }

    /// True when nothing has been extracted
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.enums.is_empty() && self.refs.is_empty()
    }

    /// Serialize to a pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
