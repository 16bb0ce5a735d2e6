use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_screen_w() -> u32 {
    1280
}

fn default_screen_h() -> u32 {
    720
}

fn default_fps() -> u32 {
    60
}

/// Startup settings read from `settings.json`. Missing keys fall back
/// individually, a missing or malformed file falls back wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_screen_w")]
    pub screen_w: u32,
    #[serde(default = "default_screen_h")]
    pub screen_h: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_w: default_screen_w(),
            screen_h: default_screen_h(),
            fps: default_fps(),
        }
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(paths: &DataPaths) -> Self {
        Self {
            path: paths.settings(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Settings>(&bytes) {
                Ok(settings) => return settings,
                Err(err) => {
                    tracing::warn!("malformed settings file {:?}: {err}", self.path);
                }
            }
        }
        Settings::default()
    }
}

/// Resolves every on-disk location the game reads or writes.
///
/// A local `data/` directory takes priority (the layout the game ships
/// with); otherwise the platform data dir is used.
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn default_root() -> Self {
        let local = PathBuf::from("data");
        if local.is_dir() {
            return Self::new(local);
        }
        let root = ProjectDirs::from("", "", "angler")
            .map(|pd| pd.data_local_dir().to_path_buf())
            .unwrap_or(local);
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> PathBuf {
        self.root.join("config").join("settings.json")
    }

    pub fn entities(&self, day: bool) -> PathBuf {
        let file = if day {
            "entities_day.json"
        } else {
            "entities_night.json"
        };
        self.root.join("config").join(file)
    }

    pub fn stats(&self) -> PathBuf {
        self.root.join("stats").join("stats.json")
    }

    pub fn export_csv(&self) -> PathBuf {
        self.root.join("stats").join("export_stats.csv")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join("angler.log")
    }
}
