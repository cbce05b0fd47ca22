//! Light/dark presentation preference.
//!
//! The preference is persisted under the fixed key [`THEME_KEY`] with the
//! values `"dark"` / `"light"`. When nothing is stored yet, the terminal's own
//! light/dark signal decides. The palette that a mode maps to lives in the UI
//! crate; this module only owns the boolean and its persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Key of the persisted theme preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    /// Glyph of the toggle control: dark mode offers the sun, light mode the moon.
    pub fn icon(self) -> &'static str {
        match self {
            ThemeMode::Dark => "☀",
            ThemeMode::Light => "☾",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("failed to access preferences at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse preferences at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Persistent string key-value storage for client preferences.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Preferences kept as a flat TOML table in one file.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(PreferenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        toml::from_str(&raw).map_err(|source| PreferenceError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.read_table()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let io_err = |source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        };
        // A corrupt file is overwritten rather than blocking the write.
        let mut table = self.read_table().unwrap_or_default();
        table.insert(key.to_owned(), value.to_owned());
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let raw = toml::to_string(&table)?;
        std::fs::write(&self.path, raw).map_err(io_err)
    }
}

/// In-process store, used when no preferences file is available.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: BTreeMap<String, String>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Reads the terminal's light/dark signal from `COLORFGBG` (`"fg;bg"`).
///
/// Background colour indices 7 and 15 are light; any other index is dark.
/// Returns `None` when the variable is absent or unparseable.
pub fn system_prefers_dark() -> Option<bool> {
    colorfgbg_prefers_dark(&std::env::var("COLORFGBG").ok()?)
}

fn colorfgbg_prefers_dark(value: &str) -> Option<bool> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(!matches!(bg, 7 | 15))
}

/// The theme toggle: current mode plus the store it persists to.
pub struct ThemeToggle {
    mode: ThemeMode,
    store: Box<dyn PreferenceStore>,
}

impl ThemeToggle {
    /// Initialises from the stored preference, falling back to the system
    /// signal, then to dark.
    pub fn load(store: Box<dyn PreferenceStore>, system_dark: Option<bool>) -> Self {
        let stored = match store.get(THEME_KEY) {
            Ok(value) => value.as_deref().and_then(ThemeMode::parse),
            Err(e) => {
                warn!("ignoring unreadable theme preference: {e}");
                None
            }
        };
        let mode = stored.unwrap_or(match system_dark {
            Some(false) => ThemeMode::Light,
            Some(true) | None => ThemeMode::Dark,
        });
        Self { mode, store }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    pub fn is_dark(&self) -> bool {
        self.mode == ThemeMode::Dark
    }

    pub fn icon(&self) -> &'static str {
        self.mode.icon()
    }

    /// Applies `mode` and persists it. Applying the current mode again
    /// changes nothing.
    pub fn apply(&mut self, mode: ThemeMode) -> Result<(), PreferenceError> {
        self.mode = mode;
        self.store.set(THEME_KEY, mode.as_str())
    }

    /// Flips the mode and persists the new preference.
    ///
    /// The displayed mode flips even if persisting fails.
    pub fn toggle(&mut self) -> Result<ThemeMode, PreferenceError> {
        let next = self.mode.toggled();
        self.apply(next)?;
        Ok(next)
    }
}
