//! Media catalog: which files can be played and how old the subject was in each.

mod capture;
mod catalog;
mod filesystem;

use std::{fmt, path::Path};

use serde::Serialize;
use utoipa::ToSchema;

pub use self::capture::{age_in_days, parse_filename_datetime};
pub use self::catalog::{CATALOG_MAX_AGE, MediaCatalog};
pub use self::filesystem::FsMediaResolver;

/// File extensions recognised as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
/// File extensions recognised as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm"];

/// Kind of media played in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Photo.
    Image,
    /// Video clip.
    Video,
}

impl MediaType {
    /// Classify a path by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaType::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaType::Video)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Image => f.write_str("image"),
            MediaType::Video => f.write_str("video"),
        }
    }
}

/// A playable item whose capture age is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaItem {
    /// Path relative to the media root, `/`-separated.
    pub path: String,
    /// Whether the item is a photo or a video.
    pub media_type: MediaType,
    /// Age of the subject, in days, when the item was captured.
    pub age_days: u32,
}

impl MediaItem {
    /// Convenience constructor.
    pub fn new(path: impl Into<String>, media_type: MediaType, age_days: u32) -> Self {
        Self {
            path: path.into(),
            media_type,
            age_days,
        }
    }
}

/// Source of eligible media for the game.
///
/// Implementations exclude anything whose age cannot be determined; failures
/// while probing a file never surface to the caller.
pub trait MediaResolver: Send + Sync {
    /// Every item with a recognised type and a resolvable age.
    fn eligible(&self) -> Vec<MediaItem>;

    /// Whether the media root can currently be read.
    fn is_available(&self) -> bool {
        true
    }
}

/// Public URL of a media item, versioned per game and round.
///
/// The `v` token changes every round, so media bytes can be cached as immutable.
pub fn versioned_url(path: &str, session_id: &str, round: u32) -> String {
    let encoded: Vec<String> = path.split('/').map(encode_segment).collect();
    format!("/media/{}?v={session_id}-{round}", encoded.join("/"))
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(char::from(byte))
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

/// Resolver over a fixed list, used for demos and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticMediaResolver {
    items: Vec<MediaItem>,
}

impl StaticMediaResolver {
    /// Wrap the given items.
    pub fn new(items: Vec<MediaItem>) -> Self {
        Self { items }
    }
}

impl MediaResolver for StaticMediaResolver {
    fn eligible(&self) -> Vec<MediaItem> {
        self.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_extensions_case_insensitively() {
        assert_eq!(
            MediaType::from_path(Path::new("a/IMG_1.JPG")),
            Some(MediaType::Image)
        );
        assert_eq!(
            MediaType::from_path(Path::new("clip.Mov")),
            Some(MediaType::Video)
        );
        assert_eq!(MediaType::from_path(Path::new("notes.txt")), None);
        assert_eq!(MediaType::from_path(Path::new("README")), None);
    }

    #[test]
    fn versioned_url_encodes_segments() {
        assert_eq!(
            versioned_url("2024/first smile.jpg", "abc", 3),
            "/media/2024/first%20smile.jpg?v=abc-3"
        );
        assert_eq!(
            versioned_url("bébé#1.png", "s", 1),
            "/media/b%C3%A9b%C3%A9%231.png?v=s-1"
        );
    }

    #[test]
    fn media_type_displays_lowercase() {
        assert_eq!(MediaType::Image.to_string(), "image");
        assert_eq!(MediaType::Video.to_string(), "video");
    }
}
