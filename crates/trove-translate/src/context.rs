//! Per-operation state threaded through a save or a load.
//!
//! A context is created at the start of one top-level call, passed by `&mut`
//! into every translator of the recursive descent, and dropped when the call
//! returns. Contexts are never shared between calls.

use std::fmt;

use trove_types::{Key, Path, Record, Value};

use crate::config::TranslateConfig;
use crate::error::{TranslateError, TranslateResult};

type SaveTask = Box<dyn FnOnce(&mut Record) -> TranslateResult<()> + Send>;
type KeyListener = Box<dyn FnOnce(&Key) + Send>;
type LoadTask<'r> = Box<dyn FnOnce() -> TranslateResult<()> + 'r>;

fn check_depth(config: &TranslateConfig, path: &Path) -> TranslateResult<()> {
    if path.depth() > config.max_depth {
        return Err(TranslateError::DepthExceeded {
            path: path.clone(),
            limit: config.max_depth,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

/// State for one save.
pub struct SaveContext {
    config: TranslateConfig,
    deferred: Vec<SaveTask>,
    listeners: Vec<KeyListener>,
}

impl SaveContext {
    pub fn new(config: TranslateConfig) -> Self {
        Self {
            config,
            deferred: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &TranslateConfig {
        &self.config
    }

    /// Guard against runaway nesting before descending into `path`.
    pub fn enter(&self, path: &Path) -> TranslateResult<()> {
        check_depth(&self.config, path)
    }

    /// Queue work that needs the fully assembled record.
    ///
    /// Tasks run in registration order once every field has been translated
    /// and before the key is produced.
    pub fn defer(
        &mut self,
        task: impl FnOnce(&mut Record) -> TranslateResult<()> + Send + 'static,
    ) {
        self.deferred.push(Box::new(task));
    }

    /// Register a callback for when the persistence layer has produced the
    /// final key of the record being saved.
    pub fn when_key_known(&mut self, listener: impl FnOnce(&Key) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Run and drain the deferred tasks against `record`.
    pub fn run_deferred(&mut self, record: &mut Record) -> TranslateResult<()> {
        for task in std::mem::take(&mut self.deferred) {
            task(record)?;
        }
        Ok(())
    }

    pub fn pending_tasks(&self) -> usize {
        self.deferred.len()
    }

    /// Finish the save, keeping only the key listeners.
    pub fn into_listeners(self) -> KeyListeners {
        KeyListeners(self.listeners)
    }
}

impl fmt::Debug for SaveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveContext")
            .field("config", &self.config)
            .field("deferred", &self.deferred.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Callbacks waiting for the key of a saved record.
#[derive(Default)]
pub struct KeyListeners(Vec<KeyListener>);

impl KeyListeners {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Invoke every listener with the completed key.
    pub fn fire(self, key: &Key) {
        for listener in self.0 {
            listener(key);
        }
    }
}

impl fmt::Debug for KeyListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyListeners").field(&self.0.len()).finish()
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Counts of recycling decisions made during one load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecycleStats {
    /// Container loads that were handed an existing value.
    pub recycled: usize,
    /// Container loads that had to build a new value.
    pub allocated: usize,
    /// Recycled containers whose content was already up to date.
    pub unchanged: usize,
}

/// State for one load.
pub struct LoadContext<'r> {
    config: TranslateConfig,
    record: Option<&'r Record>,
    stats: RecycleStats,
    deferred: Vec<LoadTask<'r>>,
}

impl<'r> LoadContext<'r> {
    /// A context not tied to any record, for loading standalone values.
    pub fn new(config: TranslateConfig) -> Self {
        Self {
            config,
            record: None,
            stats: RecycleStats::default(),
            deferred: Vec::new(),
        }
    }

    /// A context for loading `record`.
    pub fn for_record(config: TranslateConfig, record: &'r Record) -> Self {
        Self {
            record: Some(record),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &TranslateConfig {
        &self.config
    }

    /// The raw record being loaded.
    pub fn record(&self) -> Option<&'r Record> {
        self.record
    }

    /// A top-level property of the raw record, for translators that depend
    /// on sibling fields.
    pub fn sibling(&self, name: &str) -> Option<&'r Value> {
        self.record.and_then(|record| record.get(name))
    }

    /// Guard against runaway nesting before descending into `path`.
    pub fn enter(&self, path: &Path) -> TranslateResult<()> {
        check_depth(&self.config, path)
    }

    pub fn stats(&self) -> RecycleStats {
        self.stats
    }

    pub(crate) fn note_recycled(&mut self) {
        self.stats.recycled += 1;
    }

    pub(crate) fn note_allocated(&mut self) {
        self.stats.allocated += 1;
    }

    pub(crate) fn note_unchanged(&mut self) {
        self.stats.unchanged += 1;
    }

    /// Queue work to run after every field of the record has been assigned.
    pub fn defer(&mut self, task: impl FnOnce() -> TranslateResult<()> + 'r) {
        self.deferred.push(Box::new(task));
    }

    /// Run and drain the deferred tasks in registration order.
    pub fn run_deferred(&mut self) -> TranslateResult<()> {
        for task in std::mem::take(&mut self.deferred) {
            task()?;
        }
        Ok(())
    }

    pub fn pending_tasks(&self) -> usize {
        self.deferred.len()
    }
}

impl fmt::Debug for LoadContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadContext")
            .field("config", &self.config)
            .field("record", &self.record.map(|r| &r.key))
            .field("stats", &self.stats)
            .field("deferred", &self.deferred.len())
            .finish()
    }
}
