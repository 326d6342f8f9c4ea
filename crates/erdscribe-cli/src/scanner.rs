//! Candidate file discovery
//!
//! Finds the Java sources worth extracting from: entity classes, plus the
//! enum, embeddable and mapped-superclass definitions those entities refer to.

use anyhow::Result;
use erdscribe_core::{ScanConfig, SourceFile};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

static ENTITY_FILE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^.*Entity\.java$").expect("static pattern"));
static ENTITY_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\s*Entity\b").expect("static pattern"));
static TABLE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\s*Table\b").expect("static pattern"));
static EMBEDDABLE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\s*Embeddable\b").expect("static pattern"));
static MAPPED_SUPERCLASS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\s*MappedSuperclass\b").expect("static pattern"));

/// Type of a field annotated `@Enumerated`
static ENUMERATED_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@\s*Enumerated\b[^;{}]*?\b([A-Z]\w*)\s+\w+\s*[;=]").expect("static pattern")
});

/// Type of a field annotated `@EmbeddedId` or `@Embedded`
static EMBEDDED_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@\s*Embedded(?:Id)?\b[^;{}]*?\b([A-Z]\w*)\s+\w+\s*[;=]").expect("static pattern")
});

static EXTENDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bextends\s+([A-Z]\w*)").expect("static pattern"));
static ENUM_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\benum\s+([A-Z]\w*)").expect("static pattern"));
static CLASS_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:class|record)\s+([A-Z]\w*)").expect("static pattern"));

/// Discovered candidates, each list sorted and free of duplicates
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub entities: Vec<PathBuf>,
    pub enums: Vec<PathBuf>,
    pub embeddables: Vec<PathBuf>,
    pub superclasses: Vec<PathBuf>,
}

impl ScanResult {
    /// Every candidate, sorted and deduplicated
    pub fn all(&self) -> Vec<PathBuf> {
        let set: BTreeSet<&PathBuf> = self
            .entities
            .iter()
            .chain(&self.enums)
            .chain(&self.embeddables)
            .chain(&self.superclasses)
            .collect();
        set.into_iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Java sources of one repository, keyed by absolute path
pub struct Scanner {
    root: PathBuf,
    config: ScanConfig,
    sources: BTreeMap<PathBuf, String>,
}

impl Scanner {
    /// Read every `.java` file under `root`
    ///
    /// Preferred directories are walked first. Hidden directories are skipped.
    pub fn open(root: &Path, config: &ScanConfig) -> Result<Self> {
        if !root.is_dir() {
            anyhow::bail!("Repository path {} is not a directory", root.display());
        }

        let mut sources = BTreeMap::new();
        let preferred = config.prefer_dirs.iter().map(|d| root.join(d)).filter(|p| p.is_dir());

        for dir in preferred.chain(std::iter::once(root.to_path_buf())) {
            for entry in WalkDir::new(&dir)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "java") {
                    continue;
                }
                if sources.contains_key(path) {
                    continue;
                }
                if let Some(text) = read_source(path) {
                    sources.insert(path.to_path_buf(), text);
                }
            }
        }

        tracing::debug!(root = %root.display(), files = sources.len(), "Indexed Java sources");

        Ok(Self {
            root: root.to_path_buf(),
            config: config.clone(),
            sources,
        })
    }

    /// Number of Java files read
    pub fn file_count(&self) -> usize {
        self.sources.len()
    }

    pub fn scan(&self) -> ScanResult {
        let entities: Vec<PathBuf> = self
            .sources
            .iter()
            .filter(|(path, text)| self.is_entity_candidate(path, text))
            .map(|(path, _)| path.clone())
            .collect();

        let entity_texts = || entities.iter().filter_map(|p| self.sources.get(p)).map(String::as_str);

        let enum_names = captures(&ENUMERATED_FIELD, entity_texts());
        let enums = self.definitions(&ENUM_DECL, &enum_names, None);

        let embedded_names = captures(&EMBEDDED_FIELD, entity_texts());
        let embeddables = self.definitions(&CLASS_DECL, &embedded_names, Some(&*EMBEDDABLE_MARKER));

        let superclasses = self.superclass_chain(&entities);

        ScanResult {
            entities,
            enums,
            embeddables,
            superclasses,
        }
    }

    /// Load `paths` as repository-relative source files
    pub fn load(&self, paths: &[PathBuf]) -> Vec<SourceFile> {
        paths
            .iter()
            .filter_map(|path| {
                let text = self.sources.get(path)?;
                let relative = path.strip_prefix(&self.root).unwrap_or(path);
                Some(SourceFile::new(relative, text.as_str()))
            })
            .collect()
    }

    fn is_entity_candidate(&self, path: &Path, text: &str) -> bool {
        if ENTITY_MARKER.is_match(text) {
            return true;
        }
        let by_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| ENTITY_FILE_NAME.is_match(n));
        by_name || (self.config.include_table_only && TABLE_MARKER.is_match(text))
    }

    /// Files declaring one of `names`, optionally also carrying `marker`
    fn definitions(&self, decl: &Regex, names: &BTreeSet<String>, marker: Option<&Regex>) -> Vec<PathBuf> {
        if names.is_empty() {
            return Vec::new();
        }
        self.sources
            .iter()
            .filter(|(_, text)| marker.map_or(true, |m| m.is_match(text)))
            .filter(|(_, text)| decl.captures_iter(text).any(|c| names.contains(&c[1])))
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Mapped superclasses reachable through `extends` from the entities
    fn superclass_chain(&self, entities: &[PathBuf]) -> Vec<PathBuf> {
        let mut found = BTreeSet::new();
        let mut frontier: Vec<&PathBuf> = entities.iter().collect();

        while !frontier.is_empty() {
            let names = captures(&EXTENDS, frontier.iter().filter_map(|p| self.sources.get(*p)).map(String::as_str));
            frontier = self
                .definitions(&CLASS_DECL, &names, Some(&*MAPPED_SUPERCLASS_MARKER))
                .into_iter()
                .filter(|p| found.insert(p.clone()))
                .filter_map(|p| self.sources.get_key_value(&p).map(|(k, _)| k))
                .collect();
        }

        found.into_iter().collect()
    }
}

fn captures<'a>(pattern: &Regex, texts: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    texts
        .flat_map(|text| pattern.captures_iter(text).map(|c| c[1].to_string()))
        .collect()
}

/// File contents with invalid UTF-8 replaced, or `None` when unreadable
fn read_source(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable source file");
            None
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn relative(root: &Path, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "src/main/java/shop/domain/Order.java",
            "@Entity public class Order extends Auditable {\n  @Enumerated(EnumType.STRING)\n  @Column(length = 20)\n  private Status status;\n  @EmbeddedId private OrderKey key;\n}",
        );
        write(root, "src/main/java/shop/legacy/CustomerEntity.java", "public class CustomerEntity {}");
        write(root, "src/main/java/shop/legacy/Invoice.java", "@Table(name = \"invoices\") public class Invoice {}");
        write(root, "src/main/java/shop/domain/Status.java", "public enum Status { NEW, PAID }");
        write(root, "src/main/java/shop/domain/Unused.java", "public enum Unused { A }");
        write(root, "src/main/java/shop/domain/OrderKey.java", "@Embeddable public class OrderKey { Long a; Long b; }");
        write(root, "src/main/java/shop/base/Auditable.java", "@MappedSuperclass public abstract class Auditable extends Base {}");
        write(root, "src/main/java/shop/base/Base.java", "@MappedSuperclass public abstract class Base { @Id Long id; }");
        write(root, "src/main/java/shop/web/OrderController.java", "public class OrderController {}");
        write(root, ".git/Hidden.java", "@Entity class Hidden {}");
        write(root, "README.md", "@Entity");
        dir
    }

    #[test]
    fn test_finds_entities_and_their_definitions() {
        let dir = repo();
        let root = dir.path();
        let scanner = Scanner::open(root, &ScanConfig::default()).unwrap();
        let result = scanner.scan();

        assert_eq!(
            relative(root, &result.entities),
            vec![
                "src/main/java/shop/domain/Order.java",
                "src/main/java/shop/legacy/CustomerEntity.java",
            ]
        );
        assert_eq!(relative(root, &result.enums), vec!["src/main/java/shop/domain/Status.java"]);
        assert_eq!(relative(root, &result.embeddables), vec!["src/main/java/shop/domain/OrderKey.java"]);
        assert_eq!(
            relative(root, &result.superclasses),
            vec!["src/main/java/shop/base/Auditable.java", "src/main/java/shop/base/Base.java"]
        );
        assert_eq!(result.all().len(), 6);
    }

    #[test]
    fn test_table_only_is_opt_in() {
        let dir = repo();
        let config = ScanConfig {
            include_table_only: true,
            ..ScanConfig::default()
        };
        let result = Scanner::open(dir.path(), &config).unwrap().scan();
        assert!(relative(dir.path(), &result.entities).contains(&"src/main/java/shop/legacy/Invoice.java".to_string()));
    }

    #[test]
    fn test_load_uses_relative_paths() {
        let dir = repo();
        let scanner = Scanner::open(dir.path(), &ScanConfig::default()).unwrap();
        let result = scanner.scan();
        let files = scanner.load(&result.all());

        assert_eq!(files.len(), 6);
        assert!(files.iter().all(|f| f.path().is_relative()));
        assert_eq!(files[0].display_path(), "src/main/java/shop/base/Auditable.java");
        assert!(files[0].text.contains("@MappedSuperclass"));
    }

    #[test]
    fn test_preferred_dirs_do_not_duplicate() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "model/User.java", "@Entity class User {}");
        let scanner = Scanner::open(dir.path(), &ScanConfig::default()).unwrap();
        assert_eq!(scanner.file_count(), 1);
        assert_eq!(scanner.scan().entities.len(), 1);
    }

    #[test]
    fn test_unreadable_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_source(&dir.path().join("Gone.java")), None);

        let latin1 = dir.path().join("Latin1.java");
        fs::write(&latin1, b"@Entity class Caf\xe9 {}").unwrap();
        let text = read_source(&latin1).unwrap();
        assert!(text.starts_with("@Entity class Caf"));
        assert!(text.contains('\u{fffd}'));
    }

    #[test]
    fn test_missing_repository() {
        let dir = TempDir::new().unwrap();
        assert!(Scanner::open(&dir.path().join("nope"), &ScanConfig::default()).is_err());
    }
}
