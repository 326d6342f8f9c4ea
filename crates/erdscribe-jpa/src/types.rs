//! Naming and type-token mapping for Java declarations

use crate::syntax::TypeRef;
use once_cell::sync::Lazy;
use regex::Regex;

static WORD_START: Lazy<Regex> =
    Lazy::new(|| Regex::new("(.)([A-Z][a-z]+)").expect("static pattern"));
static LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new("([a-z0-9])([A-Z])").expect("static pattern"));

/// Generic element types that point at their first type argument
pub const COLLECTION_TYPES: &[&str] = &["List", "Set", "Collection", "Iterable", "SortedSet"];

/// Type token for unmapped Java types
pub const FALLBACK_TYPE: &str = "varchar";

/// `OrderLine` -> `order_line`, `HTTPRequest` -> `http_request`
pub fn camel_to_snake(name: &str) -> String {
    let first = WORD_START.replace_all(name, "${1}_${2}");
    LOWER_UPPER.replace_all(&first, "${1}_${2}").to_lowercase()
}

/// Map a declared Java type to a column type token
pub fn column_type(ty: &TypeRef) -> &'static str {
    if ty.array_dims > 0 {
        return match (ty.name.as_str(), ty.array_dims) {
            ("byte" | "Byte", 1) => "blob",
            _ => FALLBACK_TYPE,
        };
    }

    match ty.name.as_str() {
        "String" => "varchar",
        "int" | "Integer" => "int",
        "long" | "Long" => "bigint",
        "short" | "Short" => "smallint",
        "boolean" | "Boolean" => "boolean",
        "double" | "Double" => "double",
        "float" | "Float" => "float",
        "LocalDate" => "date",
        "LocalTime" => "time",
        "LocalDateTime" | "Instant" | "OffsetDateTime" | "ZonedDateTime" => "timestamp",
        "Date" => "datetime",
        "BigDecimal" => "decimal",
        "UUID" => "uuid",
        _ => FALLBACK_TYPE,
    }
}

/// Simple name of the entity a relationship field points at
///
/// Collections resolve to their first type argument.
pub fn target_type_name(ty: &TypeRef) -> &str {
    if COLLECTION_TYPES.contains(&ty.name.as_str()) {
        if let Some(arg) = ty.arguments.first() {
            return &arg.name;
        }
    }
    &ty.name
}
