//! Integration tests for extraction oracles
//!
//! The live Azure OpenAI test needs credentials and is marked `#[ignore]`:
//!
//! ```bash
//! AZURE_OPENAI_ENDPOINT=https://my-resource.openai.azure.com \
//! AZURE_OPENAI_API_KEY=... \
//! AZURE_OPENAI_DEPLOYMENT=gpt-4.1 \
//! cargo test -p erdscribe-oracle --test integration_tests -- --ignored
//! ```

mod fixtures;

use erdscribe_core::{OracleConfig, SourceFile};
use erdscribe_oracle::{
    parse_fragment, render_batch, AzureOpenAiOracle, ExtractionOracle, MockOracle, OracleError,
};

fn has_azure_credentials() -> bool {
    ["AZURE_OPENAI_ENDPOINT", "AZURE_OPENAI_API_KEY", "AZURE_OPENAI_DEPLOYMENT"]
        .iter()
        .all(|key| std::env::var(key).is_ok_and(|v| !v.is_empty()))
}

#[test]
fn fixture_replies_parse() {
    let users = parse_fragment(fixtures::USERS_REPLY).unwrap();
    assert_eq!(users.table("users").unwrap().note.as_deref(), Some("Application accounts"));
    assert_eq!(users.enum_type("role").unwrap().values(), &["USER", "ADMIN"]);

    let orders = parse_fragment(fixtures::ORDERS_REPLY).unwrap();
    assert_eq!(orders.table_count(), 2);
    assert_eq!(orders.refs()[0].to_string(), "orders.user_id > users.id");
    assert_eq!(
        orders.table("orders").unwrap().column("total").unwrap().default.as_deref(),
        Some("0")
    );
}

#[test]
fn fenced_reply_is_malformed() {
    assert!(matches!(
        parse_fragment(fixtures::FENCED_REPLY),
        Err(OracleError::MalformedFragment(_))
    ));
}

#[tokio::test]
async fn mock_answers_rendered_batches() {
    let oracle = MockOracle::builder()
        .with_reply("model/User.java", parse_fragment(fixtures::USERS_REPLY).unwrap())
        .with_reply("model/Order.java", parse_fragment(fixtures::ORDERS_REPLY).unwrap())
        .build();

    let batch = render_batch(&[
        SourceFile::new("src/main/java/model/User.java", "@Entity class User {}"),
        SourceFile::new("src/main/java/model/Role.java", "enum Role { USER, ADMIN }"),
    ]);
    let fragment = oracle.extract(&batch).await.unwrap();

    assert_eq!(fragment.table_count(), 1);
    assert!(fragment.has_table("users"));
    assert_eq!(fragment.enum_count(), 1);
}

#[test]
fn azure_requires_configuration() {
    let err = AzureOpenAiOracle::from_config(&OracleConfig::default()).unwrap_err();
    assert!(matches!(err, OracleError::Configuration(_)));
    assert!(err.to_string().contains("AZURE_OPENAI_ENDPOINT"));
}

#[tokio::test]
#[ignore]
async fn azure_extracts_live_batch() {
    if !has_azure_credentials() {
        eprintln!("Skipping: Azure OpenAI credentials not set");
        return;
    }

    let config = OracleConfig {
        endpoint: std::env::var("AZURE_OPENAI_ENDPOINT").ok(),
        api_key: std::env::var("AZURE_OPENAI_API_KEY").ok(),
        deployment: std::env::var("AZURE_OPENAI_DEPLOYMENT").ok(),
        ..OracleConfig::default()
    };
    let oracle = AzureOpenAiOracle::from_config(&config).unwrap();

    let batch = render_batch(&[SourceFile::new(
        "User.java",
        "@Entity @Table(name = \"users\") class User { @Id @GeneratedValue Long id; String email; }",
    )]);
    let fragment = oracle.extract(&batch).await.unwrap();

    assert!(fragment.has_table("users"));
}
