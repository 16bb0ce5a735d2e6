use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// An ASCII-art sprite loaded from disk, one block of text per key.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub lines: Vec<String>,
    pub width: u16,
    pub height: u16,
}

impl Sprite {
    fn from_text(text: &str) -> Self {
        let lines: Vec<String> = text
            .lines()
            .map(|l| l.trim_end().to_string())
            .collect();
        let width = lines
            .iter()
            .map(|l| unicode_width::UnicodeWidthStr::width(l.as_str()))
            .max()
            .unwrap_or(0) as u16;
        let height = lines.len() as u16;
        Self {
            lines,
            width,
            height,
        }
    }
}

/// Lazy, memoizing lookup of sprites, sound cues and music tracks.
///
/// Misses are cached too: a key that failed to load once stays absent for
/// the whole run and callers render/play nothing for it.
#[derive(Debug)]
pub struct AssetCache {
    assets_dir: PathBuf,
    images: HashMap<String, Option<Sprite>>,
    sounds: HashMap<String, Option<PathBuf>>,
}

impl AssetCache {
    pub fn new<P: AsRef<Path>>(assets_dir: P) -> Self {
        Self {
            assets_dir: assets_dir.as_ref().to_path_buf(),
            images: HashMap::new(),
            sounds: HashMap::new(),
        }
    }

    /// Look up an ASCII sprite by key, loading `image/<key>.txt` on first use.
    pub fn get_image(&mut self, key: &str) -> Option<&Sprite> {
        if key.is_empty() {
            return None;
        }
        if !self.images.contains_key(key) {
            let path = self.assets_dir.join("image").join(format!("{key}.txt"));
            let sprite = match fs::read_to_string(&path) {
                Ok(text) => Some(Sprite::from_text(&text)),
                Err(err) => {
                    tracing::debug!("missing image asset '{key}' ({path:?}): {err}");
                    None
                }
            };
            self.images.insert(key.to_string(), sprite);
        }
        self.images.get(key).and_then(|s| s.as_ref())
    }

    /// Look up a sound cue by key. Returns the cue file path if present.
    pub fn get_sound(&mut self, key: &str) -> Option<&Path> {
        if key.is_empty() {
            return None;
        }
        if !self.sounds.contains_key(key) {
            let path = self.assets_dir.join("sound").join(format!("{key}.txt"));
            let cue = if path.is_file() {
                Some(path)
            } else {
                tracing::debug!("missing sound asset '{key}'");
                None
            };
            self.sounds.insert(key.to_string(), cue);
        }
        self.sounds.get(key).and_then(|p| p.as_deref())
    }

    /// Filenames under the music directory, empty if it does not exist.
    pub fn list_music(&self) -> Vec<String> {
        let dir = self.assets_dir.join("music");
        let mut tracks: Vec<String> = match fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .collect(),
            Err(_) => Vec::new(),
        };
        tracks.sort();
        tracks
    }
}
