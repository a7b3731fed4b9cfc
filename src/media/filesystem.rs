use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use dashmap::DashMap;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::media::{
    MediaItem, MediaResolver, MediaType,
    capture::{age_in_days, capture_datetime},
};

/// Cached probe outcome for one file at one modification time.
#[derive(Debug, Clone, Copy)]
struct Probe {
    modified: Option<SystemTime>,
    age_days: Option<u32>,
}

/// Resolver scanning a directory tree on disk.
///
/// Probing (EXIF, ffprobe) is expensive, so each outcome is remembered until
/// the file's modification time changes.
#[derive(Debug)]
pub struct FsMediaResolver {
    root: PathBuf,
    birth: OffsetDateTime,
    probes: DashMap<PathBuf, Probe>,
}

impl FsMediaResolver {
    /// Create a resolver for `root`, computing ages relative to `birth`.
    pub fn new(root: impl Into<PathBuf>, birth: OffsetDateTime) -> Self {
        Self {
            root: root.into(),
            birth,
            probes: DashMap::new(),
        }
    }

    /// Media root being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collect_files(&self) -> Vec<PathBuf> {
        if let Err(err) = fs::create_dir_all(&self.root) {
            warn!(root = %self.root.display(), error = %err, "cannot create media root");
        }

        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(dir = %dir.display(), error = %err, "skipping unreadable directory");
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                match entry.file_type() {
                    Ok(kind) if kind.is_dir() => pending.push(path),
                    Ok(kind) if kind.is_file() => files.push(path),
                    _ => {}
                }
            }
        }
        files.sort();
        files
    }

    fn age_for(&self, path: &Path, media_type: MediaType) -> Option<u32> {
        let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok();
        if let Some(probe) = self.probes.get(path) {
            if probe.modified == modified {
                return probe.age_days;
            }
        }

        let age_days =
            capture_datetime(path, media_type).map(|captured| age_in_days(captured, self.birth));
        if age_days.is_none() {
            debug!(path = %path.display(), "capture time unknown; excluding media");
        }
        self.probes.insert(path.to_path_buf(), Probe { modified, age_days });
        age_days
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect();
        Some(parts?.join("/"))
    }
}

impl MediaResolver for FsMediaResolver {
    fn eligible(&self) -> Vec<MediaItem> {
        self.collect_files()
            .into_iter()
            .filter_map(|path| {
                let media_type = MediaType::from_path(&path)?;
                let relative = self.relative(&path)?;
                let age_days = self.age_for(&path, media_type)?;
                Some(MediaItem::new(relative, media_type, age_days))
            })
            .collect()
    }

    fn is_available(&self) -> bool {
        fs::read_dir(&self.root).is_ok()
    }
}
