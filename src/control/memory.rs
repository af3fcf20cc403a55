//! In-memory control tree
//!
//! Mirrors the behaviour of the sysfs tree closely enough to drive the whole
//! orchestrator without a loaded module: nodes hold text, reads coerce the
//! first line, and a hook can be attached to a node to simulate the generator
//! reacting to a write (the run trigger, typically).

use super::{ConfigStore, NodePath, Value};
use crate::error::KioError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

type WriteHook = Box<dyn FnMut(&Value) + Send>;

/// In-memory implementation of [`ConfigStore`]
///
/// Clones share the same tree, so a test can keep a handle for inspection
/// after moving the store into a session.
#[derive(Clone)]
pub struct MemoryStore {
    nodes: Arc<Mutex<BTreeMap<NodePath, String>>>,
    version: Arc<Mutex<Option<String>>>,
    writes: Arc<Mutex<Vec<(NodePath, String)>>>,
    hooks: Arc<Mutex<BTreeMap<NodePath, WriteHook>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(Mutex::new(BTreeMap::new())),
            version: Arc::new(Mutex::new(None)),
            writes: Arc::new(Mutex::new(Vec::new())),
            hooks: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Set the version string reported by `read_version`
    pub fn set_version(&self, version: &str) {
        *self.version.lock().unwrap() = Some(version.to_string());
    }

    /// Seed a node without recording a write
    pub fn insert(&self, path: NodePath, text: &str) {
        self.nodes.lock().unwrap().insert(path, text.to_string());
    }

    /// Raw text currently held by a node
    pub fn get_raw(&self, path: &NodePath) -> Option<String> {
        self.nodes.lock().unwrap().get(path).cloned()
    }

    /// Run `hook` after every write to `path`
    pub fn on_write<F>(&self, path: NodePath, hook: F)
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.hooks.lock().unwrap().insert(path, Box::new(hook));
    }

    /// Every write performed so far, in order
    pub fn writes(&self) -> Vec<(NodePath, String)> {
        self.writes.lock().unwrap().clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for MemoryStore {
    fn read(&self, path: &NodePath) -> Result<Option<Value>, KioError> {
        let nodes = self.nodes.lock().unwrap();
        Ok(nodes
            .get(path)
            .map(|text| Value::coerce(text.lines().next().unwrap_or(""))))
    }

    fn write(&self, path: &NodePath, value: &Value) -> Result<(), KioError> {
        let text = value.to_string();
        self.nodes.lock().unwrap().insert(path.clone(), text.clone());
        self.writes.lock().unwrap().push((path.clone(), text));

        // Hook runs unlocked so it may write back into the store
        let hook = self.hooks.lock().unwrap().remove(path);
        if let Some(mut hook) = hook {
            hook(value);
            self.hooks.lock().unwrap().insert(path.clone(), hook);
        }
        Ok(())
    }

    fn read_version(&self) -> Result<String, KioError> {
        self.version
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| KioError::MissingNode {
                path: PathBuf::from("version"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        let path = NodePath::thread(1, "write_burst");
        assert_eq!(store.read(&path).unwrap(), None);

        store.write(&path, &Value::Int(8)).unwrap();
        assert_eq!(store.read(&path).unwrap(), Some(Value::Int(8)));
        assert_eq!(store.writes(), vec![(path, "8".to_string())]);
    }

    #[test]
    fn test_memory_store_coerces_first_line() {
        let store = MemoryStore::new();
        store.insert(NodePath::global("num_threads"), "2\nextra");
        store.insert(NodePath::global("label"), "abc\n");
        assert_eq!(
            store.read(&NodePath::global("num_threads")).unwrap(),
            Some(Value::Int(2))
        );
        assert_eq!(
            store.read(&NodePath::global("label")).unwrap(),
            Some(Value::Text("abc".to_string()))
        );
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_memory_store_hook_fires_on_write() {
        let store = MemoryStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.on_write(NodePath::global("run_workload"), move |v| {
            sink.lock().unwrap().push(v.clone());
        });

        store.write(&NodePath::global("run_workload"), &Value::Int(1)).unwrap();
        store.write(&NodePath::global("num_threads"), &Value::Int(1)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Value::Int(1)]);
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.write(&NodePath::global("runtime_seconds"), &Value::Int(5)).unwrap();
        assert_eq!(handle.get_raw(&NodePath::global("runtime_seconds")).as_deref(), Some("5"));
        assert!(handle.read_version().is_err());
        handle.set_version("0.1");
        assert_eq!(store.read_version().unwrap(), "0.1");
    }
}
