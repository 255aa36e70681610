use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::debug;

/// Where a hooks document is read from and written to.
///
/// The engine only sees raw JSON values through this trait; validation and
/// typing happen above it. `load` returns `None` when nothing has been
/// stored yet, which callers treat as an empty configuration.
pub trait ConfigStore {
    fn load(&self) -> Result<Option<Value>>;
    fn save(&mut self, doc: &Value) -> Result<()>;
    /// Human-readable location, used in reports.
    fn location(&self) -> String;
}

/// Stores the document as a pretty-printed JSON file.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so a crash mid-write never leaves a truncated settings file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            debug!("No hooks file at {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let doc = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in {}", self.path.display()))?;
        Ok(Some(doc))
    }

    fn save(&mut self, doc: &Value) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let mut serialized =
            serde_json::to_string_pretty(doc).context("Failed to serialize hooks document")?;
        serialized.push('\n');

        let mut temp = NamedTempFile::new_in(&dir).context("Failed to create temporary file")?;
        temp.write_all(serialized.as_bytes())
            .context("Failed to write temporary file")?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!("Wrote hooks document to {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps the document in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: Option<Value>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: Value) -> Self {
        Self {
            doc: Some(doc),
            saves: 0,
        }
    }

    pub fn document(&self) -> Option<&Value> {
        self.doc.as_ref()
    }

    /// Number of times `save` was called.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<Option<Value>> {
        Ok(self.doc.clone())
    }

    fn save(&mut self, doc: &Value) -> Result<()> {
        self.doc = Some(doc.clone());
        self.saves += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
