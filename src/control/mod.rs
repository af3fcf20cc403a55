//! Control tree access
//!
//! The kio generator is configured through a hierarchy of sysfs attribute
//! files rooted at `/sys/kernel/kio`. Global settings live directly under the
//! root (`<root>/num_threads`) and per-thread settings under a directory named
//! after the thread index (`<root>/3/block_size`).
//!
//! # Architecture
//!
//! The `ConfigStore` trait is the seam between the orchestrator and the
//! backing store. Two implementations exist:
//!
//! - **SysfsStore**: real attribute files, writes dispatched through a
//!   `NodeWriter` chosen once from the caller's privilege level
//! - **MemoryStore**: an in-memory tree for tests and dry runs
//!
//! Neither implementation caches. The generator mutates the tree on its own
//! (thread directories appear when `num_threads` is written), so every read
//! goes back to the store.

pub mod memory;
pub mod writer;

use crate::error::KioError;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use writer::{NodeWriter, Privilege};

pub use memory::MemoryStore;

/// Default mount point of the kio control tree
pub const DEFAULT_CONTROL_ROOT: &str = "/sys/kernel/kio";

/// Default location of the module version string
pub const DEFAULT_VERSION_PATH: &str = "/sys/module/kio/version";

/// Address of one node in the control tree, relative to the root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath {
    components: Vec<String>,
}

impl NodePath {
    /// Build a path from one or more components
    ///
    /// Each component is stringified with `Display`, so thread indices can be
    /// passed as integers.
    pub fn new<I, T>(components: I) -> Result<Self, KioError>
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        let components: Vec<String> = components.into_iter().map(|c| c.to_string()).collect();
        if components.is_empty() {
            return Err(KioError::EmptyPath);
        }
        Ok(Self { components })
    }

    /// Path of a global key (`<root>/<key>`)
    pub fn global(key: &str) -> Self {
        Self {
            components: vec![key.to_string()],
        }
    }

    /// Path of a per-thread key (`<root>/<tid>/<key>`)
    pub fn thread(tid: u32, key: &str) -> Self {
        Self {
            components: vec![tid.to_string(), key.to_string()],
        }
    }

    /// Resolve against a filesystem root
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for component in &self.components {
            path.push(component);
        }
        path
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

/// Value held by a control node
///
/// Reads coerce to `Int` when the first line parses as a decimal integer and
/// fall back to the raw text otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl Value {
    /// Coerce one line of node text
    pub fn coerce(line: &str) -> Self {
        let trimmed = line.trim_end();
        match trimmed.trim_start().parse::<i64>() {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Text(v.to_string()),
        }
    }
}

/// Path-addressed access to the control tree
pub trait ConfigStore {
    /// Read a node; `Ok(None)` when the node does not exist
    fn read(&self, path: &NodePath) -> Result<Option<Value>, KioError>;

    /// Write a node, rendering the value as plain decimal/text
    fn write(&self, path: &NodePath, value: &Value) -> Result<(), KioError>;

    /// Single-line version string of the loaded generator
    fn read_version(&self) -> Result<String, KioError>;
}

/// Control tree backed by sysfs attribute files
pub struct SysfsStore {
    root: PathBuf,
    version_path: PathBuf,
    writer: Box<dyn NodeWriter>,
}

impl SysfsStore {
    pub fn new(root: impl Into<PathBuf>, version_path: impl Into<PathBuf>, writer: Box<dyn NodeWriter>) -> Self {
        Self {
            root: root.into(),
            version_path: version_path.into(),
            writer,
        }
    }

    /// Store at the given paths, with the writer picked from the effective uid
    pub fn detect(root: impl Into<PathBuf>, version_path: impl Into<PathBuf>) -> Self {
        let privilege = Privilege::detect();
        let writer = privilege.writer();
        log::debug!(
            "Control tree writes will use {:?} privilege (helper: {})",
            privilege,
            writer.helper().unwrap_or("none")
        );
        Self::new(root, version_path, writer)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ConfigStore for SysfsStore {
    fn read(&self, path: &NodePath) -> Result<Option<Value>, KioError> {
        let full = path.resolve(&self.root);
        if !full.exists() {
            log::trace!("read {} -> absent", path);
            return Ok(None);
        }
        let line = read_first_line(&full)?;
        let value = Value::coerce(&line);
        log::trace!("read {} -> {:?}", path, value);
        Ok(Some(value))
    }

    fn write(&self, path: &NodePath, value: &Value) -> Result<(), KioError> {
        let full = path.resolve(&self.root);
        log::debug!("write {} = {}", path, value);
        self.writer.write_node(&full, &value.to_string())
    }

    fn read_version(&self) -> Result<String, KioError> {
        Ok(read_first_line(&self.version_path)?.trim_end().to_string())
    }
}

fn read_first_line(path: &Path) -> Result<String, KioError> {
    let file = File::open(path).map_err(|source| KioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(|source| KioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::writer::DirectWriter;
    use std::fs;

    fn temp_store() -> (tempfile::TempDir, SysfsStore) {
        let dir = tempfile::tempdir().unwrap();
        let version = dir.path().join("version");
        fs::write(&version, "1.2.3-g0ff1ce\n").unwrap();
        let store = SysfsStore::new(dir.path().join("kio"), version, Box::new(DirectWriter));
        fs::create_dir_all(store.root().join("0")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_node_path_rendering() {
        assert_eq!(NodePath::global("num_threads").to_string(), "num_threads");
        assert_eq!(NodePath::thread(3, "block_size").to_string(), "3/block_size");
        assert_eq!(
            NodePath::new([1, 2]).unwrap().resolve(Path::new("/sys/kernel/kio")),
            PathBuf::from("/sys/kernel/kio/1/2")
        );
    }

    #[test]
    fn test_node_path_requires_components() {
        let empty: [&str; 0] = [];
        assert!(matches!(NodePath::new(empty), Err(KioError::EmptyPath)));
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(Value::coerce("42\n"), Value::Int(42));
        assert_eq!(Value::coerce("-7"), Value::Int(-7));
        assert_eq!(Value::coerce("4096 "), Value::Int(4096));
        assert_eq!(Value::coerce("v0.3-dirty\n"), Value::Text("v0.3-dirty".to_string()));
        assert_eq!(Value::coerce(""), Value::Text(String::new()));
        assert_eq!(Value::from(u64::MAX).to_string(), "18446744073709551615");
    }

    #[test]
    fn test_read_absent_node() {
        let (_dir, store) = temp_store();
        assert_eq!(store.read(&NodePath::global("num_threads")).unwrap(), None);
        assert_eq!(store.read(&NodePath::thread(5, "block_size")).unwrap(), None);
    }

    #[test]
    fn test_read_first_line_only() {
        let (_dir, store) = temp_store();
        fs::write(store.root().join("num_threads"), "4\nignored\n").unwrap();
        assert_eq!(
            store.read(&NodePath::global("num_threads")).unwrap(),
            Some(Value::Int(4))
        );
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, store) = temp_store();
        let path = NodePath::thread(0, "offset_high");
        store.write(&path, &Value::Int(4_294_967_295)).unwrap();
        assert_eq!(
            fs::read_to_string(store.root().join("0/offset_high")).unwrap(),
            "4294967295"
        );
        assert_eq!(store.read(&path).unwrap(), Some(Value::Int(4_294_967_295)));
    }

    #[test]
    fn test_write_missing_directory_fails() {
        let (_dir, store) = temp_store();
        let err = store
            .write(&NodePath::thread(9, "block_size"), &Value::Int(4096))
            .unwrap_err();
        assert!(matches!(err, KioError::Io { .. }));
    }

    #[test]
    fn test_read_version() {
        let (_dir, store) = temp_store();
        assert_eq!(store.read_version().unwrap(), "1.2.3-g0ff1ce");
    }
}
