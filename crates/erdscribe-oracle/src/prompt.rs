//! Instruction payload and batch rendering

use crate::adapter::OracleError;
use crate::fragment::WireFragment;
use erdscribe_core::{Fragment, SourceFile};

/// System message sent with every batch
pub const SYSTEM_PROMPT: &str = "\
You are a senior backend engineer and data modeler.
You extract relational database schema from Java JPA entity source code.
Focus only on DB schema: tables, columns, primary keys, foreign keys, join tables, and enums.
Return ONLY valid JSON (no markdown, no explanation).

EmbeddedId rule:
If an entity uses @EmbeddedId, DO NOT create a single column for the embedded field (e.g., \"id\").
Instead, find the corresponding @Embeddable class and EXPAND its fields into individual table columns.
Mark all expanded columns as pk=true and nullable=false.
";

const USER_INSTRUCTIONS: &str = r#"Analyze the following Java source files and extract database schema.

Rules:
- Tables: classes annotated with @Entity are tables.
- Table name: use @Table(name, schema) if present, else snake_case of @Entity(name) or class name.
- Columns:
  - @Id => pk=true and nullable=false
  - @GeneratedValue => increment=true
  - @Column(name, nullable, unique, length) => map accordingly, length for varchar(length)
  - @Enumerated(EnumType.STRING) => store as enum type if enum definition is available; otherwise varchar.
- Relationships:
  - @ManyToOne / @OneToOne with @JoinColumn(name) => create FK column and Ref.
  - @ManyToMany with @JoinTable => create join table with two FK columns and two Refs.
- Enums:
  - If a field uses an enum (e.g., Role), and the enum definition is provided, create an enum in output.
  - Prefer enum output when @Enumerated(EnumType.STRING) is used.
- EmbeddedId handling:
  - @EmbeddedId indicates a composite primary key.
  - Expand the @Embeddable key class fields into columns.
  - Each expanded column must have pk=true and nullable=false.
  - Do not output the embedded object itself as a column.

Output JSON schema:
{
  "tables": [
    {
      "name": "...",
      "columns": [
        {
          "name": "...",
          "type": "...",
          "pk": false,
          "nullable": true,
          "unique": false,
          "increment": false,
          "default": null,
          "note": null
        }
      ],
      "note": null
    }
  ],
  "refs": [
    {
      "from_table": "...",
      "from_column": "...",
      "to_table": "...",
      "to_column": "...",
      "rel": ">"
    }
  ],
  "enums": [
    {
      "name": "...",
      "values": ["..."],
      "note": null
    }
  ]
}

FILES:
"#;

/// System message for a refinement pass over an extracted schema
pub const REFINE_SYSTEM_PROMPT: &str = "\
You are a senior data modeler.
Refine the extracted relational schema for correctness.
Only adjust when there is strong evidence. Keep table and column names stable.
Return ONLY valid JSON in the same shape as the input (no markdown, no explanation).
";

/// User message asking for a refined copy of `schema`
///
/// The schema is sent in the reply wire format so the answer parses with
/// [`parse_fragment`](crate::parse_fragment).
pub fn refine_prompt(schema: &Fragment, hints: &str) -> Result<String, OracleError> {
    let payload = serde_json::to_string(&WireFragment::from(schema))
        .map_err(|e| OracleError::MalformedFragment(e.to_string()))?;

    Ok(format!(
        "Here is a schema extracted from source code. \
         Return a refined schema in the same JSON format.\n\nHINTS:\n{}\n\nSCHEMA:\n{}\n",
        hints, payload
    ))
}

/// Render files as `<file path="...">` blocks separated by a blank line
pub fn render_batch(files: &[SourceFile]) -> String {
    files
        .iter()
        .map(|f| format!("<file path=\"{}\">\n{}\n</file>", f.display_path(), f.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// User message for one rendered batch
pub fn user_prompt(batch_text: &str) -> String {
    format!("{}{}\n", USER_INSTRUCTIONS, batch_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_file_blocks() {
        let files = vec![
            SourceFile::new("src/model/User.java", "class User {}"),
            SourceFile::new("src/model/Role.java", "enum Role { ADMIN }"),
        ];
        assert_eq!(
            render_batch(&files),
            "<file path=\"src/model/User.java\">\nclass User {}\n</file>\n\n\
             <file path=\"src/model/Role.java\">\nenum Role { ADMIN }\n</file>"
        );
    }

    #[test]
    fn user_prompt_ends_with_batch() {
        let prompt = user_prompt("<file path=\"A.java\">\nx\n</file>");
        assert!(prompt.starts_with("Analyze the following Java source files"));
        assert!(prompt.contains("\"rel\": \">\""));
        assert!(prompt.ends_with("FILES:\n<file path=\"A.java\">\nx\n</file>\n"));
    }

    #[test]
    fn refine_prompt_carries_hints_and_schema() {
        let mut schema = Fragment::new();
        schema.ensure_table("users");

        let prompt = refine_prompt(&schema, "user ids are UUIDs").unwrap();
        assert!(prompt.starts_with("Here is a schema extracted from source code."));
        assert!(prompt.contains("HINTS:\nuser ids are UUIDs\n"));
        assert!(prompt.ends_with("SCHEMA:\n{\"tables\":[{\"name\":\"users\",\"columns\":[],\"note\":null}],\"refs\":[],\"enums\":[]}\n"));
    }
}
