//! Declaration-level Java parser
//!
//! Source text is parsed with the tree-sitter Java grammar, then the concrete
//! syntax tree is folded into a [`CompilationUnit`] holding type declarations,
//! their annotations and their field declarations. Method bodies and
//! initializer expressions are never visited.

use std::fmt;
use tree_sitter::{Node, Parser};

/// Error raised when a file cannot be parsed into declarations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error at {line}:{column}: {message}")]
pub struct SyntaxError {
    /// 1-based line
    pub line: usize,

    /// 1-based column
    pub column: usize,

    /// What went wrong
    pub message: String,
}

/// Parsed source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationUnit {
    /// Declared package, if any
    pub package: Option<String>,

    /// Top-level type declarations
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    /// All type declarations, nested ones included, in source order
    pub fn all_types(&self) -> Vec<&TypeDecl> {
        fn walk<'a>(decl: &'a TypeDecl, out: &mut Vec<&'a TypeDecl>) {
            out.push(decl);
            for nested in &decl.nested {
                walk(nested, out);
            }
        }

        let mut out = Vec::new();
        for decl in &self.types {
            walk(decl, &mut out);
        }
        out
    }
}

/// Kind of type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

/// A class, interface, enum, record or annotation type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub modifiers: Vec<String>,
    /// First `extends` type
    pub extends: Option<TypeRef>,
    pub fields: Vec<FieldDecl>,
    /// Enum constants in declaration order
    pub enum_constants: Vec<String>,
    pub nested: Vec<TypeDecl>,
}

impl TypeDecl {
    fn new(kind: TypeKind, name: String, annotations: Vec<Annotation>, modifiers: Vec<String>) -> Self {
        Self {
            kind,
            name,
            annotations,
            modifiers,
            extends: None,
            fields: Vec::new(),
            enum_constants: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Find an annotation by simple name
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }
}

/// A field declaration, possibly declaring several variables
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub annotations: Vec<Annotation>,
    pub modifiers: Vec<String>,
    pub ty: TypeRef,
    /// Declared variable names
    pub names: Vec<String>,
}

impl FieldDecl {
    /// Whether a modifier such as `static` is present
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

/// A type reference such as `List<Book>` or `byte[]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Simple name (last segment of a qualified name)
    pub name: String,
    pub arguments: Vec<TypeRef>,
    pub array_dims: usize,
}

impl TypeRef {
    /// A plain named type without arguments
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            array_dims: 0,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.arguments.is_empty() {
            let args: Vec<String> = self.arguments.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        for _ in 0..self.array_dims {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

/// An annotation with its element-value pairs
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Simple name, e.g. `Table` for `@jakarta.persistence.Table`
    pub name: String,
    /// Element-value pairs; a single unnamed value is stored as `value`
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    /// Raw element value by key
    pub fn get(&self, key: &str) -> Option<&ElementValue> {
        self.elements.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Element value rendered as text (string literal contents, number, name)
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(ElementValue::as_text)
    }

    /// Nested annotation value, or the first annotation of an array value
    pub fn nested(&self, key: &str) -> Option<&Annotation> {
        self.get(key).and_then(ElementValue::first_annotation)
    }
}

/// Annotation element value
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    String(String),
    Number(String),
    Bool(bool),
    /// Qualified name such as `EnumType.STRING` or `Role.class`
    Name(String),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
    /// Any other expression, kept as joined token text
    Expr(String),
}

impl ElementValue {
    /// Text form of scalar values
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::String(s) | Self::Number(s) | Self::Name(s) => Some(s.clone()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Array(values) => values.first().and_then(Self::as_text),
            Self::Annotation(_) | Self::Expr(_) => None,
        }
    }

    fn first_annotation(&self) -> Option<&Annotation> {
        match self {
            Self::Annotation(a) => Some(a),
            Self::Array(values) => values.iter().find_map(Self::first_annotation),
            _ => None,
        }
    }
}

/// Parse Java source text into declarations
///
/// Any syntax error in the file rejects the whole unit; the error carries the
/// position of the first erroneous or missing node.
pub fn parse_compilation_unit(source: &str) -> Result<CompilationUnit, SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| SyntaxError {
            line: 0,
            column: 0,
            message: format!("Java grammar unavailable: {}", e),
        })?;

    let tree = parser.parse(source, None).ok_or_else(|| SyntaxError {
        line: 1,
        column: 1,
        message: "parser produced no tree".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(error_at(root, source));
    }

    Ok(Reader { source }.compilation_unit(root))
}

fn error_at(root: Node<'_>, source: &str) -> SyntaxError {
    let node = first_error(root).unwrap_or(root);
    let position = node.start_position();

    let message = if node.is_missing() {
        format!("missing '{}'", node.kind())
    } else {
        let snippet: String = source
            .get(node.byte_range())
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(40)
            .collect();
        format!("unexpected '{}'", snippet.trim())
    };

    SyntaxError {
        line: position.row + 1,
        column: position.column + 1,
        message,
    }
}

/// First error or missing node in source order
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    children(node).into_iter().find_map(first_error)
}

fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children without comments
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).filter(|n| !n.is_extra()).collect()
}

const NUMBER_LITERALS: &[&str] = &[
    "decimal_integer_literal",
    "hex_integer_literal",
    "octal_integer_literal",
    "binary_integer_literal",
    "decimal_floating_point_literal",
    "hex_floating_point_literal",
];

/// Folds syntax nodes of one source text into the declaration model
struct Reader<'s> {
    source: &'s str,
}

impl<'s> Reader<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    fn compilation_unit(&self, root: Node<'_>) -> CompilationUnit {
        let mut unit = CompilationUnit::default();

        for child in named_children(root) {
            if child.kind() == "package_declaration" {
                unit.package = named_children(child)
                    .into_iter()
                    .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
                    .map(|n| compact(self.text(n)));
            } else if let Some(decl) = self.type_declaration(child) {
                unit.types.push(decl);
            }
        }

        unit
    }

    fn type_declaration(&self, node: Node<'_>) -> Option<TypeDecl> {
        let kind = match node.kind() {
            "class_declaration" => TypeKind::Class,
            "interface_declaration" => TypeKind::Interface,
            "enum_declaration" => TypeKind::Enum,
            "record_declaration" => TypeKind::Record,
            "annotation_type_declaration" => TypeKind::Annotation,
            _ => return None,
        };

        let name = self.text(node.child_by_field_name("name")?).to_string();
        let (annotations, modifiers) = self.modifiers(node);
        let mut decl = TypeDecl::new(kind, name, annotations, modifiers);

        if let Some(superclass) = node.child_by_field_name("superclass") {
            decl.extends = named_children(superclass).into_iter().next().map(|t| self.type_ref(t));
        }

        match (kind, node.child_by_field_name("body")) {
            (TypeKind::Annotation, _) | (_, None) => {}
            (TypeKind::Enum, Some(body)) => self.enum_body(body, &mut decl),
            (_, Some(body)) => self.members(body, &mut decl),
        }

        Some(decl)
    }

    fn modifiers(&self, node: Node<'_>) -> (Vec<Annotation>, Vec<String>) {
        let mut annotations = Vec::new();
        let mut modifiers = Vec::new();

        let Some(list) = named_children(node).into_iter().find(|n| n.kind() == "modifiers") else {
            return (annotations, modifiers);
        };

        for child in children(list) {
            match child.kind() {
                "marker_annotation" | "annotation" => annotations.push(self.annotation(child)),
                _ if child.is_extra() => {}
                _ => modifiers.push(self.text(child).to_string()),
            }
        }

        (annotations, modifiers)
    }

    fn enum_body(&self, body: Node<'_>, decl: &mut TypeDecl) {
        for child in named_children(body) {
            match child.kind() {
                "enum_constant" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        decl.enum_constants.push(self.text(name).to_string());
                    }
                }
                "enum_body_declarations" => self.members(child, decl),
                _ => {}
            }
        }
    }

    /// Fields and nested types of a class-like body
    fn members(&self, body: Node<'_>, decl: &mut TypeDecl) {
        for child in named_children(body) {
            match child.kind() {
                "field_declaration" | "constant_declaration" => {
                    if let Some(field) = self.field(child) {
                        decl.fields.push(field);
                    }
                }
                _ => {
                    if let Some(nested) = self.type_declaration(child) {
                        decl.nested.push(nested);
                    }
                }
            }
        }
    }

    fn field(&self, node: Node<'_>) -> Option<FieldDecl> {
        let (annotations, modifiers) = self.modifiers(node);
        let mut ty = self.type_ref(node.child_by_field_name("type")?);

        let mut cursor = node.walk();
        let declarators: Vec<Node<'_>> = node.children_by_field_name("declarator", &mut cursor).collect();

        let names = declarators
            .iter()
            .filter_map(|d| d.child_by_field_name("name"))
            .map(|n| self.text(n).to_string())
            .collect();

        // `int counts[]` puts the dimensions on the declarator
        if let Some(dims) = declarators.first().and_then(|d| d.child_by_field_name("dimensions")) {
            ty.array_dims += self.text(dims).matches('[').count();
        }

        Some(FieldDecl {
            annotations,
            modifiers,
            ty,
            names,
        })
    }

    fn type_ref(&self, node: Node<'_>) -> TypeRef {
        match node.kind() {
            "generic_type" => {
                let parts = named_children(node);
                let mut ty = parts
                    .iter()
                    .find(|n| n.kind() != "type_arguments")
                    .map(|base| self.type_ref(*base))
                    .unwrap_or_else(|| TypeRef::simple(simple_name(self.text(node))));
                if let Some(arguments) = parts.iter().find(|n| n.kind() == "type_arguments") {
                    ty.arguments = named_children(*arguments)
                        .into_iter()
                        .map(|a| self.type_argument(a))
                        .collect();
                }
                ty
            }
            "array_type" => {
                let mut ty = node
                    .child_by_field_name("element")
                    .map(|e| self.type_ref(e))
                    .unwrap_or_else(|| TypeRef::simple(simple_name(self.text(node))));
                if let Some(dims) = node.child_by_field_name("dimensions") {
                    ty.array_dims += self.text(dims).matches('[').count();
                }
                ty
            }
            "annotated_type" => match named_children(node).into_iter().filter(|n| !is_annotation(*n)).last() {
                Some(inner) => self.type_ref(inner),
                None => TypeRef::simple(simple_name(self.text(node))),
            },
            _ => TypeRef::simple(simple_name(self.text(node))),
        }
    }

    /// `?` alone, or the bound of `? extends T` / `? super T`
    fn type_argument(&self, node: Node<'_>) -> TypeRef {
        if node.kind() != "wildcard" {
            return self.type_ref(node);
        }
        named_children(node)
            .into_iter()
            .filter(|n| n.kind() != "super" && !is_annotation(*n))
            .last()
            .map(|bound| self.type_ref(bound))
            .unwrap_or_else(|| TypeRef::simple("?"))
    }

    fn annotation(&self, node: Node<'_>) -> Annotation {
        let name = node
            .child_by_field_name("name")
            .map(|n| simple_name(self.text(n)))
            .unwrap_or_default();
        let mut elements = Vec::new();

        if let Some(arguments) = node.child_by_field_name("arguments") {
            let values = named_children(arguments);
            if values.iter().any(|v| v.kind() == "element_value_pair") {
                for pair in values.into_iter().filter(|v| v.kind() == "element_value_pair") {
                    if let (Some(key), Some(value)) =
                        (pair.child_by_field_name("key"), pair.child_by_field_name("value"))
                    {
                        elements.push((self.text(key).to_string(), self.element_value(value)));
                    }
                }
            } else if let Some(value) = values.into_iter().next() {
                elements.push(("value".to_string(), self.element_value(value)));
            }
        }

        Annotation { name, elements }
    }

    fn element_value(&self, node: Node<'_>) -> ElementValue {
        let text = self.text(node);
        match node.kind() {
            "marker_annotation" | "annotation" => ElementValue::Annotation(self.annotation(node)),
            "element_value_array_initializer" => ElementValue::Array(
                named_children(node)
                    .into_iter()
                    .map(|v| self.element_value(v))
                    .collect(),
            ),
            "string_literal" => ElementValue::String(string_literal(text)),
            "character_literal" => ElementValue::String(unescape(
                text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')).unwrap_or(text),
            )),
            "true" => ElementValue::Bool(true),
            "false" => ElementValue::Bool(false),
            kind if NUMBER_LITERALS.contains(&kind) => ElementValue::Number(text.to_string()),
            "identifier" | "field_access" | "scoped_identifier" | "class_literal" => {
                ElementValue::Name(compact(text))
            }
            "unary_expression"
                if text.trim_start().starts_with('-')
                    && node
                        .child_by_field_name("operand")
                        .is_some_and(|o| NUMBER_LITERALS.contains(&o.kind())) =>
            {
                ElementValue::Number(compact(text))
            }
            _ => ElementValue::Expr(text.trim().to_string()),
        }
    }
}

fn is_annotation(node: Node<'_>) -> bool {
    matches!(node.kind(), "marker_annotation" | "annotation")
}

fn compact(text: &str) -> String {
    text.split_whitespace().collect()
}

/// Last segment of a possibly qualified name
fn simple_name(text: &str) -> String {
    let name = compact(text);
    match name.rsplit_once('.') {
        Some((_, last)) => last.to_string(),
        None => name,
    }
}

/// Contents of a string literal or text block
fn string_literal(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix("\"\"\"").and_then(|r| r.strip_suffix("\"\"\"")) {
        return unescape(&text_block(inner));
    }
    unescape(raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')).unwrap_or(raw))
}

/// Drop the opening line break and the common indentation
fn text_block(inner: &str) -> String {
    let content = inner.split_once('\n').map_or(inner, |(_, rest)| rest);
    let indent = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    content
        .lines()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('s') => out.push(' '),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = r#"
        package com.example.domain;

        import jakarta.persistence.*;
        import java.util.*;

        /** A user account. */
        @Entity
        @Table(name = "users", schema = "auth")
        public class User extends BaseEntity implements Serializable {
            private static final long serialVersionUID = 1L;

            @Id
            @GeneratedValue(strategy = GenerationType.IDENTITY)
            private Long id;

            @Column(name = "email_address", nullable = false, unique = true, length = 320)
            private String email;

            private String firstName, lastName;

            @ManyToMany
            @JoinTable(name = "user_roles",
                joinColumns = @JoinColumn(name = "user_id"),
                inverseJoinColumns = { @JoinColumn(name = "role_id") })
            private Set<Role> roles = new HashSet<>();

            private Map<String, List<Integer>> scores = new HashMap<String, List<Integer>>();

            public User() {}

            public User(String email) {
                this.email = email;
                if (email.length() > 3) { log("}"); }
            }

            public <T> T convert(Class<T> type) throws IllegalStateException {
                return type.cast(this);
            }

            public enum Status { ACTIVE, LOCKED("locked") { }, DELETED; Status() {} Status(String s) {} }
        }
    "#;

    #[test]
    fn parses_package_and_type() {
        let unit = parse_compilation_unit(USER).unwrap();
        assert_eq!(unit.package.as_deref(), Some("com.example.domain"));
        assert_eq!(unit.types.len(), 1);

        let user = &unit.types[0];
        assert_eq!(user.kind, TypeKind::Class);
        assert_eq!(user.name, "User");
        assert_eq!(user.extends.as_ref().unwrap().name, "BaseEntity");
        assert!(user.annotation("Entity").is_some());

        let table = user.annotation("Table").unwrap();
        assert_eq!(table.text("name").as_deref(), Some("users"));
        assert_eq!(table.text("schema").as_deref(), Some("auth"));
    }

    #[test]
    fn parses_fields_and_skips_members() {
        let unit = parse_compilation_unit(USER).unwrap();
        let user = &unit.types[0];

        let names: Vec<&str> = user
            .fields
            .iter()
            .flat_map(|f| f.names.iter().map(|n| n.as_str()))
            .collect();
        assert_eq!(
            names,
            vec!["serialVersionUID", "id", "email", "firstName", "lastName", "roles", "scores"]
        );

        assert!(user.fields[0].has_modifier("static"));

        let id = &user.fields[1];
        assert_eq!(id.ty.name, "Long");
        assert_eq!(
            id.annotations
                .iter()
                .find(|a| a.name == "GeneratedValue")
                .unwrap()
                .text("strategy")
                .as_deref(),
            Some("GenerationType.IDENTITY")
        );

        let email = &user.fields[2];
        let column = &email.annotations[0];
        assert_eq!(column.get("nullable"), Some(&ElementValue::Bool(false)));
        assert_eq!(column.text("length").as_deref(), Some("320"));

        let roles = &user.fields[4];
        assert_eq!(roles.ty.to_string(), "Set<Role>");
        let join_table = roles.annotations.iter().find(|a| a.name == "JoinTable").unwrap();
        assert_eq!(join_table.nested("joinColumns").unwrap().text("name").as_deref(), Some("user_id"));
        assert_eq!(
            join_table.nested("inverseJoinColumns").unwrap().text("name").as_deref(),
            Some("role_id")
        );

        assert_eq!(user.fields[5].ty.to_string(), "Map<String, List<Integer>>");
    }

    #[test]
    fn parses_nested_enum_constants() {
        let unit = parse_compilation_unit(USER).unwrap();
        let status = &unit.types[0].nested[0];
        assert_eq!(status.kind, TypeKind::Enum);
        assert_eq!(status.enum_constants, vec!["ACTIVE", "LOCKED", "DELETED"]);
        assert_eq!(unit.all_types().len(), 2);
    }

    #[test]
    fn parses_top_level_enum_and_annotation_type() {
        let src = r#"
            public enum Role { ADMIN, USER, }
            @Retention(RetentionPolicy.RUNTIME)
            @interface Audited { String value() default ""; }
            record Point(int x, int y) { Point { } static int zero() { return 0; } }
        "#;
        let unit = parse_compilation_unit(src).unwrap();
        assert_eq!(unit.types.len(), 3);
        assert_eq!(unit.types[0].enum_constants, vec!["ADMIN", "USER"]);
        assert_eq!(unit.types[1].kind, TypeKind::Annotation);
        assert_eq!(unit.types[2].kind, TypeKind::Record);
    }

    #[test]
    fn arrays_and_single_value_annotations() {
        let src = r#"
            @Entity("legacy")
            class Blob {
                @Lob byte[] payload;
                @Enumerated(EnumType.STRING) Kind kind;
                int[] counts = {1, 2, 3};
            }
        "#;
        let unit = parse_compilation_unit(src).unwrap();
        let blob = &unit.types[0];
        assert_eq!(blob.annotation("Entity").unwrap().text("value").as_deref(), Some("legacy"));
        assert_eq!(blob.fields[0].ty.name, "byte");
        assert_eq!(blob.fields[0].ty.array_dims, 1);
        assert_eq!(
            blob.fields[1].annotations[0].get("value"),
            Some(&ElementValue::Name("EnumType.STRING".to_string()))
        );
        assert_eq!(blob.fields[2].names, vec!["counts"]);
    }

    #[test]
    fn comments_and_strings_do_not_confuse_braces() {
        let src = r#"
            // class Fake {
            /* } */
            class Real {
                String s = "}{;";
                char c = '}';
                String block = """
                    { not code }
                    """;
            }
        "#;
        let unit = parse_compilation_unit(src).unwrap();
        assert_eq!(unit.types.len(), 1);
        assert_eq!(unit.types[0].fields.len(), 3);
    }

    #[test]
    fn reports_position_of_errors() {
        let err = parse_compilation_unit("class Broken {\n  private String name\n}").unwrap_err();
        assert!((2..=3).contains(&err.line), "line {}", err.line);
        assert!(err.column >= 1);
        assert!(!err.message.is_empty());

        assert!(parse_compilation_unit("class Open { String s = \"unterminated; }").is_err());
        assert!(parse_compilation_unit("@Entity class Half {").is_err());
    }

    #[test]
    fn operators_in_initializers_do_not_end_the_body() {
        let src = r#"
            @Entity
            class Account {
                @Id Long id;
                static final int MAX = 10;
                static final boolean SMALL = MAX < 3;
                static final boolean RANGE = MAX < 3 && Limits.MIN > 1;
                static final int MASK = 1 << 4 >> 1 >>> 2;
                static final boolean GENERIC = Collections.<String>emptyList().size() < MAX;
                String name;
            }
        "#;
        let unit = parse_compilation_unit(src).unwrap();
        let names: Vec<&str> = unit.types[0]
            .fields
            .iter()
            .flat_map(|f| f.names.iter().map(|n| n.as_str()))
            .collect();
        assert_eq!(names, vec!["id", "MAX", "SMALL", "RANGE", "MASK", "GENERIC", "name"]);
    }

    #[test]
    fn lambdas_and_anonymous_classes_in_initializers() {
        let src = r#"
            class Order {
                static final Comparator<Order> BY_ID = (a, b) -> Long.compare(a.id, b.id);
                private final Runnable hook = new Runnable() {
                    @Override public void run() { int depth = 1; if (depth > 0) { depth--; } }
                };
                private transient Function<String, Integer> length = s -> { return s.length(); };
                Long id;
            }
        "#;
        let unit = parse_compilation_unit(src).unwrap();
        let order = &unit.types[0];
        assert_eq!(order.fields.len(), 4);
        assert_eq!(order.fields[0].ty.to_string(), "Comparator<Order>");
        assert!(order.fields[2].has_modifier("transient"));
        assert_eq!(order.fields[3].names, vec!["id"]);
        assert!(order.nested.is_empty());
    }

    #[test]
    fn wildcard_arguments_keep_their_bound() {
        let src = "class Index { Map<String, List<? extends Foo>> byKey; Set<?> any; List<? super Bar> sink; }";
        let unit = parse_compilation_unit(src).unwrap();
        let index = &unit.types[0];
        assert_eq!(index.fields[0].ty.to_string(), "Map<String, List<Foo>>");
        assert_eq!(index.fields[1].ty.to_string(), "Set<?>");
        assert_eq!(index.fields[2].ty.to_string(), "List<Bar>");
    }

    #[test]
    fn annotation_arrays_and_text_blocks() {
        let src = r#"
            @Entity
            @Table(name = "product", uniqueConstraints = {
                @UniqueConstraint(columnNames = {"sku", "vendor_id"}),
                @UniqueConstraint(columnNames = "slug")
            })
            class Product {
                @Column(columnDefinition = """
                    TEXT NOT NULL
                    """)
                String description;
                @Column(name = "qualified\tname") String qualified;
                @Column(precision = -1) java.math.BigDecimal price;
            }
        "#;
        let unit = parse_compilation_unit(src).unwrap();
        let product = &unit.types[0];
        let table = product.annotation("Table").unwrap();
        assert_eq!(table.text("name").as_deref(), Some("product"));
        match table.get("uniqueConstraints") {
            Some(ElementValue::Array(values)) => assert_eq!(values.len(), 2),
            other => panic!("expected array, got {:?}", other),
        }
        assert_eq!(table.nested("uniqueConstraints").unwrap().name, "UniqueConstraint");

        let definition = product.fields[0].annotations[0].text("columnDefinition").unwrap();
        assert_eq!(definition.trim_end(), "TEXT NOT NULL");
        assert_eq!(
            product.fields[1].annotations[0].text("name").as_deref(),
            Some("qualified\tname")
        );
        assert_eq!(
            product.fields[2].annotations[0].get("precision"),
            Some(&ElementValue::Number("-1".to_string()))
        );
        assert_eq!(product.fields[2].ty.name, "BigDecimal");
    }

    #[test]
    fn c_style_array_declarators() {
        let unit = parse_compilation_unit("class Grid { int cells[][]; byte[] raw; }").unwrap();
        assert_eq!(unit.types[0].fields[0].ty.array_dims, 2);
        assert_eq!(unit.types[0].fields[1].ty.to_string(), "byte[]");
    }
}
