//! Shared data models used across modules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad media classification derived from the upload's mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a mime type. Anything that is neither image nor video is
    /// rejected at upload time.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(MediaKind::Image)
        } else if mime.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn is_video(self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

/// One media entry on a post: the storage keys of the original upload and,
/// for successfully processed images, its thumbnail and medium derivatives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    pub original_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_key: Option<String>,
    pub media_type: MediaKind,
}

impl MediaDescriptor {
    /// All storage keys this descriptor references, for cascade deletes.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.original_key.as_str())
            .chain(self.thumbnail_key.as_deref())
            .chain(self.medium_key.as_deref())
    }

    /// Whether `key` is any of this descriptor's storage keys.
    pub fn references(&self, key: &str) -> bool {
        self.keys().any(|k| k == key)
    }
}

/// A post row from the database, with the media JSONB column decoded.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub user_id: String,
    #[sqlx(json)]
    pub media: Vec<MediaDescriptor>,
    pub caption: String,
    pub description: String,
    #[serde(rename = "isArchived")]
    pub archived: bool,
    pub favorited_by: Vec<String>,
    pub template: String,
    pub font_family: Option<String>,
    pub heading_color: Option<String>,
    pub text_color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user row from the database.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub firebase_uid: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_classification() {
        assert_eq!(MediaKind::from_mime("image/jpeg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("image/png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("video/mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_mime("application/pdf"), None);
        assert_eq!(MediaKind::from_mime("text/plain"), None);
    }

    #[test]
    fn descriptor_key_iteration() {
        let desc = MediaDescriptor {
            original_key: "orig-1-a.jpg".into(),
            thumbnail_key: Some("thumb-1-a.jpg".into()),
            medium_key: Some("med-1-a.jpg".into()),
            media_type: MediaKind::Image,
        };
        let keys: Vec<&str> = desc.keys().collect();
        assert_eq!(keys, vec!["orig-1-a.jpg", "thumb-1-a.jpg", "med-1-a.jpg"]);
        assert!(desc.references("med-1-a.jpg"));
        assert!(!desc.references("med-1-b.jpg"));

        let video = MediaDescriptor {
            original_key: "vid-1-b.mp4".into(),
            thumbnail_key: None,
            medium_key: None,
            media_type: MediaKind::Video,
        };
        assert_eq!(video.keys().count(), 1);
    }
}
