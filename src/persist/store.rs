//! Storage backends for [`EditorState`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, Result};

use super::EditorState;

/// Where editor state is loaded from and saved to.
pub trait EditorStore {
    /// `Ok(None)` when nothing has been saved for `document_id` yet.
    fn load(&self, document_id: &str) -> Result<Option<EditorState>>;

    fn save(&mut self, document_id: &str, state: &EditorState) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    states: HashMap<String, EditorState>,
    saves: usize,
    failures_left: usize,
}

/// In-process store. Clones share the same storage, so a test can keep a
/// handle while the editor owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with one state.
    pub fn with_state(document_id: impl Into<String>, state: EditorState) -> Self {
        let store = Self::new();
        store
            .inner
            .borrow_mut()
            .states
            .insert(document_id.into(), state);
        store
    }

    pub fn get(&self, document_id: &str) -> Option<EditorState> {
        self.inner.borrow().states.get(document_id).cloned()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.inner.borrow().saves
    }

    /// Make the next `count` saves fail.
    pub fn fail_next_saves(&self, count: usize) {
        self.inner.borrow_mut().failures_left = count;
    }
}

impl EditorStore for MemoryStore {
    fn load(&self, document_id: &str) -> Result<Option<EditorState>> {
        Ok(self.get(document_id))
    }

    fn save(&mut self, document_id: &str, state: &EditorState) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.failures_left > 0 {
            inner.failures_left -= 1;
            return Err(Error::Persistence("store unavailable".into()));
        }
        inner.states.insert(document_id.to_string(), state.clone());
        inner.saves += 1;
        Ok(())
    }
}

/// One pretty-printed JSON file per document in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `document_id`. Characters outside `[A-Za-z0-9_-]` are
    /// replaced so that an id can never escape the directory.
    pub fn path_for(&self, document_id: &str) -> PathBuf {
        let name: String = document_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl EditorStore for FileStore {
    fn load(&self, document_id: &str) -> Result<Option<EditorState>> {
        let path = self.path_for(document_id);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        let state = serde_json::from_str(&data)
            .map_err(|e| Error::Persistence(format!("{}: {e}", path.display())))?;
        Ok(Some(state))
    }

    fn save(&mut self, document_id: &str, state: &EditorState) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(document_id);
        let tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&tmp, state)?;
        tmp.persist(&path).map_err(|e| Error::Io(e.error))?;
        debug!(path = %path.display(), "state written");
        Ok(())
    }
}
