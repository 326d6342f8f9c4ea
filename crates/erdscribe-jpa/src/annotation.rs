//! Persistence markers recognized on types and fields

use crate::syntax::Annotation;

/// A persistence annotation the extractor understands
///
/// Annotations outside this set are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Entity { name: Option<String> },
    Table { name: Option<String>, schema: Option<String> },
    Embeddable,
    MappedSuperclass,
    Id,
    EmbeddedId,
    Embedded,
    GeneratedValue,
    Column {
        name: Option<String>,
        nullable: Option<bool>,
        unique: Option<bool>,
        length: Option<u32>,
    },
    Enumerated,
    ManyToOne,
    OneToOne,
    OneToMany,
    ManyToMany,
    JoinColumn { name: Option<String> },
    JoinTable {
        name: Option<String>,
        join_column: Option<String>,
        inverse_join_column: Option<String>,
    },
    Transient,
}

impl Marker {
    /// Interpret an annotation, if it is a recognized persistence marker
    pub fn from_annotation(annotation: &Annotation) -> Option<Self> {
        let text = |key: &str| annotation.text(key).filter(|s| !s.is_empty());

        let marker = match annotation.name.as_str() {
            "Entity" => Self::Entity {
                name: text("name").or_else(|| text("value")),
            },
            "Table" => Self::Table {
                name: text("name"),
                schema: text("schema"),
            },
            "Embeddable" => Self::Embeddable,
            "MappedSuperclass" => Self::MappedSuperclass,
            "Id" => Self::Id,
            "EmbeddedId" => Self::EmbeddedId,
            "Embedded" => Self::Embedded,
            "GeneratedValue" => Self::GeneratedValue,
            "Column" => Self::Column {
                name: text("name"),
                // anything but a literal `false` keeps the column nullable
                nullable: annotation.text("nullable").map(|s| s != "false"),
                unique: annotation.text("unique").map(|s| s == "true"),
                // non-literal lengths (constants) are ignored
                length: text("length").and_then(|s| s.parse().ok()),
            },
            "Enumerated" => Self::Enumerated,
            "ManyToOne" => Self::ManyToOne,
            "OneToOne" => Self::OneToOne,
            "OneToMany" => Self::OneToMany,
            "ManyToMany" => Self::ManyToMany,
            "JoinColumn" => Self::JoinColumn { name: text("name") },
            // first column of a composite join
            "JoinColumns" => Self::JoinColumn {
                name: annotation.nested("value").and_then(|a| a.text("name")),
            },
            "JoinTable" => Self::JoinTable {
                name: text("name"),
                join_column: annotation.nested("joinColumns").and_then(|a| a.text("name")),
                inverse_join_column: annotation
                    .nested("inverseJoinColumns")
                    .and_then(|a| a.text("name")),
            },
            "Transient" => Self::Transient,
            _ => return None,
        };

        Some(marker)
    }
}

/// Recognized markers of one declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markers(Vec<Marker>);

impl Markers {
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        Self(annotations.iter().filter_map(Marker::from_annotation).collect())
    }

    fn has(&self, marker: &Marker) -> bool {
        self.0.contains(marker)
    }

    pub fn is_entity(&self) -> bool {
        self.0.iter().any(|m| matches!(m, Marker::Entity { .. }))
    }

    pub fn is_embeddable(&self) -> bool {
        self.has(&Marker::Embeddable)
    }

    pub fn is_mapped_superclass(&self) -> bool {
        self.has(&Marker::MappedSuperclass)
    }

    pub fn is_id(&self) -> bool {
        self.has(&Marker::Id)
    }

    pub fn is_embedded_id(&self) -> bool {
        self.has(&Marker::EmbeddedId)
    }

    pub fn is_embedded(&self) -> bool {
        self.has(&Marker::Embedded)
    }

    pub fn is_generated(&self) -> bool {
        self.has(&Marker::GeneratedValue)
    }

    pub fn is_enumerated(&self) -> bool {
        self.has(&Marker::Enumerated)
    }

    pub fn is_transient(&self) -> bool {
        self.has(&Marker::Transient)
    }

    /// `@ManyToOne` or `@OneToOne`
    pub fn is_to_one(&self) -> bool {
        self.has(&Marker::ManyToOne) || self.has(&Marker::OneToOne)
    }

    pub fn is_one_to_many(&self) -> bool {
        self.has(&Marker::OneToMany)
    }

    pub fn is_many_to_many(&self) -> bool {
        self.has(&Marker::ManyToMany)
    }

    pub fn entity_name(&self) -> Option<&str> {
        self.0.iter().find_map(|m| match m {
            Marker::Entity { name } => name.as_deref(),
            _ => None,
        })
    }

    /// `(name, schema)` of a `@Table` marker
    pub fn table(&self) -> Option<(Option<&str>, Option<&str>)> {
        self.0.iter().find_map(|m| match m {
            Marker::Table { name, schema } => Some((name.as_deref(), schema.as_deref())),
            _ => None,
        })
    }

    pub fn has_table(&self) -> bool {
        self.table().is_some()
    }

    /// The `@Column` marker, if present
    pub fn column(&self) -> Option<&Marker> {
        self.0.iter().find(|m| matches!(m, Marker::Column { .. }))
    }

    pub fn join_column_name(&self) -> Option<&str> {
        self.0.iter().find_map(|m| match m {
            Marker::JoinColumn { name } => name.as_deref(),
            _ => None,
        })
    }

    /// Join table name and both join columns, only when all three are given
    pub fn join_table(&self) -> Option<(&str, &str, &str)> {
        self.0.iter().find_map(|m| match m {
            Marker::JoinTable {
                name: Some(name),
                join_column: Some(join),
                inverse_join_column: Some(inverse),
            } => Some((name.as_str(), join.as_str(), inverse.as_str())),
            _ => None,
        })
    }
}
