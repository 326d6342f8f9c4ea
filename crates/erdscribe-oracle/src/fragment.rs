//! Wire format of oracle replies
//!
//! The oracle answers with a JSON object of tables, refs and enums. Parsing is
//! strict: unknown fields, missing required fields, unknown relation symbols,
//! empty names and duplicate names are all rejected.

use crate::adapter::OracleError;
use erdscribe_core::{Column, Fragment, Ref, RelationKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireFragment {
    #[serde(default)]
    pub tables: Vec<WireTable>,
    #[serde(default)]
    pub refs: Vec<WireRef>,
    #[serde(default)]
    pub enums: Vec<WireEnum>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireTable {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<WireColumn>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub pk: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub increment: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireRef {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    #[serde(default)]
    pub rel: WireRel,
}

/// Relation symbol on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireRel {
    #[default]
    #[serde(rename = ">")]
    ManyToOne,
    #[serde(rename = "<")]
    OneToMany,
    #[serde(rename = "-")]
    OneToOne,
    #[serde(rename = "<>")]
    ManyToMany,
}

impl From<WireRel> for RelationKind {
    fn from(rel: WireRel) -> Self {
        match rel {
            WireRel::ManyToOne => RelationKind::ManyToOne,
            WireRel::OneToMany => RelationKind::OneToMany,
            WireRel::OneToOne => RelationKind::OneToOne,
            WireRel::ManyToMany => RelationKind::ManyToMany,
        }
    }
}

impl From<RelationKind> for WireRel {
    fn from(kind: RelationKind) -> Self {
        match kind {
            RelationKind::ManyToOne => WireRel::ManyToOne,
            RelationKind::OneToMany => WireRel::OneToMany,
            RelationKind::OneToOne => WireRel::OneToOne,
            RelationKind::ManyToMany => WireRel::ManyToMany,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireEnum {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Parse and validate an oracle reply
pub fn parse_fragment(json: &str) -> Result<Fragment, OracleError> {
    let wire: WireFragment =
        serde_json::from_str(json).map_err(|e| OracleError::MalformedFragment(e.to_string()))?;
    wire.into_fragment()
}

/// Wire shape of an existing schema, as sent back for refinement
impl From<&Fragment> for WireFragment {
    fn from(schema: &Fragment) -> Self {
        let tables = schema
            .tables()
            .map(|t| WireTable {
                name: t.name().to_string(),
                columns: t
                    .columns()
                    .map(|c| WireColumn {
                        name: c.name.clone(),
                        data_type: c.data_type.clone(),
                        pk: c.primary_key,
                        nullable: c.nullable,
                        unique: c.unique,
                        increment: c.auto_increment,
                        default: c.default.clone(),
                        note: c.note.clone(),
                    })
                    .collect(),
                note: t.note.clone(),
            })
            .collect();

        let refs = schema
            .refs()
            .iter()
            .map(|r| WireRef {
                from_table: r.child_table.clone(),
                from_column: r.child_column.clone(),
                to_table: r.parent_table.clone(),
                to_column: r.parent_column.clone(),
                rel: r.kind.into(),
            })
            .collect();

        let enums = schema
            .enums()
            .map(|e| WireEnum {
                name: e.name().to_string(),
                values: e.values().to_vec(),
                note: e.note.clone(),
            })
            .collect();

        Self { tables, refs, enums }
    }
}

impl WireFragment {
    /// Check names, then build the fragment
    pub fn into_fragment(self) -> Result<Fragment, OracleError> {
        self.validate()?;

        let mut fragment = Fragment::new();

        for e in self.enums {
            let enum_type = fragment.ensure_enum(&e.name);
            enum_type.note = e.note.filter(|n| !n.is_empty());
            for value in e.values {
                enum_type.add_value(value);
            }
        }

        for t in self.tables {
            let table = fragment.ensure_table(&t.name);
            table.note = t.note.filter(|n| !n.is_empty());
            for c in t.columns {
                let mut column = Column::new(c.name, c.data_type)
                    .with_primary_key(c.pk)
                    .with_nullable(c.nullable)
                    .with_unique(c.unique)
                    .with_auto_increment(c.increment);
                column.default = c.default;
                column.note = c.note.filter(|n| !n.is_empty());
                table.upsert_column(column);
            }
        }

        for r in self.refs {
            fragment.add_ref(Ref::new(
                r.from_table,
                r.from_column,
                r.rel.into(),
                r.to_table,
                r.to_column,
            ));
        }

        Ok(fragment)
    }

    fn validate(&self) -> Result<(), OracleError> {
        let malformed = |msg: String| Err(OracleError::MalformedFragment(msg));

        let mut tables = HashSet::new();
        for t in &self.tables {
            if t.name.trim().is_empty() {
                return malformed("table with empty name".to_string());
            }
            if !tables.insert(t.name.as_str()) {
                return malformed(format!("duplicate table '{}'", t.name));
            }

            let mut columns = HashSet::new();
            for c in &t.columns {
                if c.name.trim().is_empty() {
                    return malformed(format!("column with empty name in table '{}'", t.name));
                }
                if c.data_type.trim().is_empty() {
                    return malformed(format!("column '{}.{}' has an empty type", t.name, c.name));
                }
                if !columns.insert(c.name.as_str()) {
                    return malformed(format!("duplicate column '{}.{}'", t.name, c.name));
                }
            }
        }

        let mut enums = HashSet::new();
        for e in &self.enums {
            if e.name.trim().is_empty() {
                return malformed("enum with empty name".to_string());
            }
            if !enums.insert(e.name.as_str()) {
                return malformed(format!("duplicate enum '{}'", e.name));
            }
        }

        for r in &self.refs {
            let parts = [&r.from_table, &r.from_column, &r.to_table, &r.to_column];
            if parts.iter().any(|p| p.trim().is_empty()) {
                return malformed("relationship with an empty endpoint".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn schema_is_sent_back_in_reply_shape() {
        let schema = parse_fragment(
            r#"{
                "tables": [{"name": "orders", "columns": [{"name": "id", "type": "bigint", "pk": true, "nullable": false}]}],
                "refs": [{"from_table": "orders", "from_column": "user_id", "to_table": "users", "to_column": "id", "rel": "-"}],
                "enums": [{"name": "status", "values": ["OPEN", "PAID"]}]
            }"#,
        )
        .unwrap();

        let wire = WireFragment::from(&schema);
        assert_eq!(wire.refs[0].rel, WireRel::OneToOne);
        assert_eq!(wire.tables[0].columns[0].data_type, "bigint");

        let json = serde_json::to_string(&wire).unwrap();
        assert!(json.contains("\"type\":\"bigint\""));
        assert_eq!(parse_fragment(&json).unwrap(), schema);
    }

    #[test]
    fn parses_full_reply() {
        let fragment = parse_fragment(
            r#"{
                "tables": [{
                    "name": "users",
                    "columns": [
                        {"name": "id", "type": "bigint", "pk": true, "nullable": false, "increment": true},
                        {"name": "email", "type": "varchar(255)", "unique": true, "default": null, "note": "login"}
                    ],
                    "note": null
                }],
                "refs": [
                    {"from_table": "posts", "from_column": "user_id", "to_table": "users", "to_column": "id", "rel": ">"},
                    {"from_table": "users", "from_column": "id", "to_table": "groups", "to_column": "id", "rel": "<>"}
                ],
                "enums": [{"name": "role", "values": ["ADMIN", "USER", "ADMIN"]}]
            }"#,
        )
        .unwrap();

        let users = fragment.table("users").unwrap();
        let id = users.column("id").unwrap();
        assert!(id.primary_key && !id.nullable && id.auto_increment);
        let email = users.column("email").unwrap();
        assert!(email.nullable && email.unique);
        assert_eq!(email.note.as_deref(), Some("login"));

        assert_eq!(fragment.refs()[0].kind, RelationKind::ManyToOne);
        assert_eq!(fragment.refs()[1].kind, RelationKind::ManyToMany);
        assert_eq!(fragment.enum_type("role").unwrap().values(), &["ADMIN", "USER"]);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let fragment = parse_fragment("{}").unwrap();
        assert!(fragment.is_empty());

        let fragment = parse_fragment(
            r#"{"refs": [{"from_table": "a", "from_column": "b_id", "to_table": "b", "to_column": "id"}]}"#,
        )
        .unwrap();
        assert_eq!(fragment.refs()[0].kind, RelationKind::ManyToOne);
    }

    #[test]
    fn rejects_malformed_replies() {
        let cases = [
            ("not json", "expected value"),
            (r#"{"tables": [], "views": []}"#, "unknown field `views`"),
            (r#"{"tables": [{"columns": []}]}"#, "missing field `name`"),
            (r#"{"tables": [{"name": "t", "columns": [{"name": "c"}]}]}"#, "missing field `type`"),
            (
                r#"{"refs": [{"from_table": "a", "from_column": "b", "to_table": "c", "to_column": "d", "rel": "=>"}]}"#,
                "unknown variant",
            ),
            (r#"{"tables": [{"name": " "}]}"#, "empty name"),
            (r#"{"tables": [{"name": "t"}, {"name": "t"}]}"#, "duplicate table 't'"),
            (
                r#"{"tables": [{"name": "t", "columns": [{"name": "c", "type": "int"}, {"name": "c", "type": "int"}]}]}"#,
                "duplicate column 't.c'",
            ),
            (r#"{"enums": [{"name": "e"}, {"name": "e"}]}"#, "duplicate enum 'e'"),
        ];

        for (json, expected) in cases {
            match parse_fragment(json) {
                Err(OracleError::MalformedFragment(msg)) => {
                    assert!(msg.contains(expected), "{json}: {msg}")
                }
                other => panic!("{json}: expected malformed fragment, got {other:?}"),
            }
        }
    }
}
