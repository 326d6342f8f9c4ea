//! Oracle reply fixtures
//!
//! JSON replies in the shape an extraction oracle returns for a batch of
//! entity sources.

/// Reply for a batch holding `User.java` and `Role.java`
pub const USERS_REPLY: &str = r#"{
  "tables": [
    {
      "name": "users",
      "columns": [
        {"name": "id", "type": "bigint", "pk": true, "nullable": false, "increment": true},
        {"name": "email", "type": "varchar", "nullable": true, "unique": true},
        {"name": "role", "type": "role"}
      ],
      "note": "Application accounts"
    }
  ],
  "refs": [
    {"from_table": "user_roles", "from_column": "user_id", "to_table": "users", "to_column": "id", "rel": ">"}
  ],
  "enums": [
    {"name": "role", "values": ["USER", "ADMIN"], "note": null}
  ]
}"#;

/// Reply for a batch holding `Order.java`
pub const ORDERS_REPLY: &str = r#"{
  "tables": [
    {
      "name": "orders",
      "columns": [
        {"name": "id", "type": "bigint", "pk": true, "nullable": false},
        {"name": "user_id", "type": "bigint"},
        {"name": "total", "type": "decimal", "default": "0"}
      ]
    },
    {
      "name": "users",
      "columns": [
        {"name": "email", "type": "varchar(320)", "nullable": false}
      ]
    }
  ],
  "refs": [
    {"from_table": "orders", "from_column": "user_id", "to_table": "users", "to_column": "id"}
  ],
  "enums": []
}"#;

/// Reply wrapped in a markdown fence, which is not valid structured output
pub const FENCED_REPLY: &str = "```json\n{\"tables\": []}\n```";
