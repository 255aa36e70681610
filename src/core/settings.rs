use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory, relative to the project root, holding host and tool settings.
pub const SETTINGS_DIR: &str = ".claude";
/// File name of the tool's own settings inside [`SETTINGS_DIR`].
pub const SETTINGS_FILE_NAME: &str = "rule2hook.toml";

/// Tool settings, read from `<project>/.claude/rule2hook.toml`.
///
/// Every field has a default so a partial or missing file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hooks document, relative to the project root.
    pub settings_file: PathBuf,
    /// Notes files scanned for rules, relative to the project root.
    pub notes_files: Vec<PathBuf>,
    /// Also scan the user-level notes file in the home directory.
    pub include_user_notes: bool,
    /// Default merge policy for `convert`.
    pub merge: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            settings_file: Path::new(SETTINGS_DIR).join("settings.json"),
            notes_files: vec![PathBuf::from("CLAUDE.md"), PathBuf::from("CLAUDE.local.md")],
            include_user_notes: true,
            merge: true,
        }
    }
}

impl Settings {
    /// Absolute path of the hooks document for a project.
    pub fn hooks_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.settings_file)
    }

    /// Notes files to scan, project files first, then the user-level one.
    pub fn notes_paths(&self, project_root: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .notes_files
            .iter()
            .map(|file| project_root.join(file))
            .collect();

        if self.include_user_notes
            && let Some(home) = dirs::home_dir()
        {
            paths.push(home.join(SETTINGS_DIR).join("CLAUDE.md"));
        }
        paths
    }
}

/// Access to the tool settings.
pub trait SettingsProvider {
    fn load_settings(&self) -> Result<Settings>;
    fn save_settings(&self, settings: &Settings) -> Result<()>;
    fn settings_path(&self) -> &Path;
}

/// File-backed settings for one project.
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    pub fn new(project_root: &Path) -> Self {
        Self {
            settings_path: project_root.join(SETTINGS_DIR).join(SETTINGS_FILE_NAME),
        }
    }

    /// Writes the default settings file unless one already exists.
    ///
    /// # Returns
    /// `true` when a new file was written, `false` when one was already present.
    pub fn initialize(&self) -> Result<bool> {
        if self.settings_path.exists() {
            return Ok(false);
        }
        self.save_settings(&Settings::default())?;
        Ok(true)
    }
}

impl SettingsProvider for SettingsManager {
    fn load_settings(&self) -> Result<Settings> {
        if !self.settings_path.exists() {
            debug!("No settings at {}, using defaults", self.settings_path.display());
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read {}", self.settings_path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.settings_path.display()))?;
        Ok(settings)
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }
        let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&self.settings_path, content).context("Failed to write settings file")?;
        Ok(())
    }

    fn settings_path(&self) -> &Path {
        &self.settings_path
    }
}
