//! Integration tests for static JPA extraction

use erdscribe_core::{normalize, to_dbml, Ref, SourceFile};
use erdscribe_jpa::JpaExtractor;
use std::path::Path;

fn load_fixtures(dir: &str) -> Vec<SourceFile> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(dir);
    let mut paths: Vec<_> = std::fs::read_dir(&root)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "java"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let text = std::fs::read_to_string(&path).unwrap();
            let relative = path.strip_prefix(&root).unwrap().to_path_buf();
            SourceFile::new(relative, text)
        })
        .collect()
}

#[test]
fn extracts_library_model() {
    let files = load_fixtures("library");
    assert_eq!(files.len(), 5);

    let mut schema = erdscribe_core::Schema::new();
    let stats = JpaExtractor::new().populate(&files, &mut schema);

    assert_eq!(stats.units_parsed, 4);
    assert_eq!(stats.units_skipped, 1);
    assert_eq!(stats.entities, 2);

    let authors = schema.table("authors").unwrap();
    assert_eq!(authors.column_names(), vec!["born_on", "created_at", "full_name", "id"]);
    let full_name = authors.column("full_name").unwrap();
    assert_eq!(full_name.data_type, "varchar(120)");
    assert!(!full_name.nullable);

    let book = schema.table("book").unwrap();
    assert_eq!(
        book.column_names(),
        vec!["author_id", "created_at", "genre", "id", "isbn", "price", "title"]
    );
    assert_eq!(book.column("genre").unwrap().data_type, "genre");
    assert_eq!(book.column("isbn").unwrap().data_type, "varchar(13)");
    assert!(book.column("isbn").unwrap().unique);
    assert!(book.column("id").unwrap().auto_increment);

    assert_eq!(
        schema.refs(),
        &[
            Ref::many_to_one("book", "author_id", "authors", "id"),
            Ref::many_to_one("book_tags", "book_id", "book", "id"),
            Ref::many_to_one("book_tags", "tag_id", "tag", "id"),
        ]
    );

    let genre = schema.enum_type("genre").unwrap();
    assert_eq!(genre.values(), &["FICTION", "NON_FICTION", "POETRY"]);
}

#[test]
fn normalized_library_model_renders() {
    let files = load_fixtures("library");
    let mut schema = JpaExtractor::new().extract(&files);
    let report = normalize(&mut schema);

    assert_eq!(report.created_tables, vec!["tag".to_string()]);
    assert_eq!(report.injected_keys, vec!["book_tags".to_string()]);
    assert!(schema.tables().all(|t| t.has_primary_key()));

    let dbml = to_dbml(&schema);
    assert!(dbml.contains("Enum genre {\n  FICTION\n  NON_FICTION\n  POETRY\n}"));
    assert!(dbml.contains("Table tag {\n  id bigint [pk, not null]\n}"));
    assert!(dbml.contains("Ref: book.author_id > authors.id"));
    assert!(!dbml.contains("draft"));
}

#[test]
fn expression_heavy_entity_keeps_its_columns() {
    let files = load_fixtures("catalog");
    assert_eq!(files.len(), 2);

    let mut schema = erdscribe_core::Schema::new();
    let stats = JpaExtractor::new().populate(&files, &mut schema);

    assert_eq!(stats.units_parsed, 2);
    assert_eq!(stats.units_skipped, 0);
    assert_eq!(stats.entities, 1);
    assert_eq!(schema.table_count(), 1);

    let products = schema.table("products").unwrap();
    assert_eq!(
        products.column_names(),
        vec!["active", "attributes", "description", "id", "price", "sku", "slug", "stock_level", "vendor_id"]
    );
    assert_eq!(products.column("sku").unwrap().data_type, "varchar(40)");
    assert_eq!(products.column("price").unwrap().data_type, "decimal");
    assert_eq!(products.column("active").unwrap().data_type, "boolean");
    assert_eq!(products.column("stock_level").unwrap().data_type, "int");
    assert_eq!(products.column("attributes").unwrap().data_type, "varchar");
    assert!(products.column("id").unwrap().auto_increment);

    assert_eq!(
        schema.refs(),
        &[Ref::many_to_one("products", "vendor_id", "vendor", "id")]
    );
}
