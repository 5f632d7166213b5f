//! Media ingestion: derivative generation and storage-key layout.
//!
//! Images produce three renditions per upload: a square thumbnail, a
//! size-capped medium rendition, and a normalized full-size re-encode.
//! Videos are stored as uploaded. Derivative failure never fails the
//! upload; the original bytes are kept under a `failed-` key instead.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, ImageReader};
use std::io::Cursor;

use crate::constants::{
    FULL_QUALITY, MEDIUM_MAX_EDGE, MEDIUM_QUALITY, THUMBNAIL_QUALITY, THUMBNAIL_SIZE,
};
use crate::models::{MediaDescriptor, MediaKind};
use crate::storage::ObjectStore;

pub type MediaError = Box<dyn std::error::Error + Send + Sync>;

/// The three renditions produced from a decodable image upload.
pub struct ImageDerivatives {
    /// Full-size JPEG re-encode, stored under the `orig-` key.
    pub full: Vec<u8>,
    /// Present only when the source exceeds MEDIUM_MAX_EDGE on its longest
    /// edge; never upscaled.
    pub medium: Option<Vec<u8>>,
    /// Square cover crop at THUMBNAIL_SIZE.
    pub thumbnail: Vec<u8>,
}

fn encode_jpeg(img: &image::DynamicImage, quality: u8) -> Result<Vec<u8>, MediaError> {
    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    img.write_with_encoder(encoder)?;
    Ok(out.into_inner())
}

/// Decode an uploaded image and produce all renditions. Pure with respect to
/// storage; callers decide what to do with the bytes.
pub fn build_derivatives(data: &[u8]) -> Result<ImageDerivatives, MediaError> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;

    let thumbnail = img.resize_to_fill(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3);
    let thumbnail = encode_jpeg(&thumbnail, THUMBNAIL_QUALITY)?;

    let medium = if img.width().max(img.height()) > MEDIUM_MAX_EDGE {
        let resized = img.resize(MEDIUM_MAX_EDGE, MEDIUM_MAX_EDGE, FilterType::Lanczos3);
        Some(encode_jpeg(&resized, MEDIUM_QUALITY)?)
    } else {
        None
    };

    let full = encode_jpeg(&img, FULL_QUALITY)?;

    Ok(ImageDerivatives {
        full,
        medium,
        thumbnail,
    })
}

/// Flatten an uploaded filename into a storage-safe suffix. Path separators
/// and anything outside [A-Za-z0-9._-] become underscores.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Build a storage key: role prefix, millisecond timestamp, random nonce,
/// sanitized name. The nonce keeps keys unique when concurrent uploads share
/// a name and a millisecond; the prefix makes the role of every object
/// legible in the bucket listing.
pub fn media_key(prefix: &str, original_name: &str) -> String {
    format!(
        "{}{}-{:08x}-{}",
        prefix,
        chrono::Utc::now().timestamp_millis(),
        rand::random::<u32>(),
        sanitize_filename(original_name)
    )
}

/// Ingest one uploaded file: generate derivatives, upload every rendition,
/// and return the descriptor to persist on the post. Storage failures are
/// returned; derivative failures degrade to storing the original under a
/// `failed-` key so the upload still succeeds.
pub async fn process_upload(
    store: &ObjectStore,
    original_name: &str,
    kind: MediaKind,
    data: &[u8],
) -> Result<MediaDescriptor, MediaError> {
    if kind.is_video() {
        let key = media_key("vid-", original_name);
        store.upload(&key, data).await?;
        return Ok(MediaDescriptor {
            original_key: key,
            thumbnail_key: None,
            medium_key: None,
            media_type: MediaKind::Video,
        });
    }

    match build_derivatives(data) {
        Ok(derivatives) => {
            let original_key = media_key("orig-", original_name);
            let thumbnail_key = media_key("thumb-", original_name);
            store.upload(&original_key, &derivatives.full).await?;
            store.upload(&thumbnail_key, &derivatives.thumbnail).await?;

            let medium_key = match &derivatives.medium {
                Some(medium) => {
                    let key = media_key("med-", original_name);
                    store.upload(&key, medium).await?;
                    Some(key)
                }
                None => None,
            };

            Ok(MediaDescriptor {
                original_key,
                thumbnail_key: Some(thumbnail_key),
                medium_key,
                media_type: MediaKind::Image,
            })
        }
        Err(e) => {
            eprintln!(
                "[media] Derivative generation failed for {}, storing original only: {}",
                original_name, e
            );
            let key = media_key("failed-", original_name);
            store.upload(&key, data).await?;
            Ok(MediaDescriptor {
                original_key: key,
                thumbnail_key: None,
                medium_key: None,
                media_type: MediaKind::Image,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn decode(data: &[u8]) -> DynamicImage {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
    }

    #[test]
    fn large_image_produces_all_renditions() {
        let derivatives = build_derivatives(&png_bytes(2000, 1400)).unwrap();

        let thumb = decode(&derivatives.thumbnail);
        assert_eq!(thumb.dimensions(), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));

        let medium = decode(derivatives.medium.as_ref().unwrap());
        assert_eq!(medium.width().max(medium.height()), MEDIUM_MAX_EDGE);
        // aspect ratio preserved, not cropped
        assert_eq!(medium.dimensions(), (1200, 840));

        let full = decode(&derivatives.full);
        assert_eq!(full.dimensions(), (2000, 1400));
    }

    #[test]
    fn small_image_skips_medium() {
        let derivatives = build_derivatives(&png_bytes(800, 600)).unwrap();
        assert!(derivatives.medium.is_none());
        let thumb = decode(&derivatives.thumbnail);
        assert_eq!(thumb.dimensions(), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
    }

    #[test]
    fn corrupt_bytes_fail_decoding() {
        assert!(build_derivatives(b"definitely not an image").is_err());
        assert!(build_derivatives(&[]).is_err());
    }

    #[test]
    fn filename_sanitization() {
        assert_eq!(sanitize_filename("holiday photo.jpg"), "holiday_photo.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("img_01-final.PNG"), "img_01-final.PNG");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[test]
    fn key_layout() {
        let key = media_key("thumb-", "beach day.jpg");
        assert!(key.starts_with("thumb-"));
        assert!(key.ends_with("-beach_day.jpg"));
        assert!(!key.contains('/'));
    }

    #[test]
    fn keys_are_unique_for_identical_uploads() {
        let keys: std::collections::HashSet<String> =
            (0..100).map(|_| media_key("orig-", "same.jpg")).collect();
        assert_eq!(keys.len(), 100);
    }

    async fn temp_store() -> (ObjectStore, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("memo_media_test_{}", rand::random::<u64>()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        (ObjectStore::new(None, Some(dir.clone()), "test"), dir)
    }

    #[tokio::test]
    async fn corrupt_image_upload_degrades_to_failed_key() {
        let (store, dir) = temp_store().await;

        let descriptor = process_upload(&store, "broken.jpg", MediaKind::Image, b"not an image")
            .await
            .unwrap();

        assert!(descriptor.original_key.starts_with("failed-"));
        assert!(descriptor.thumbnail_key.is_none());
        assert!(descriptor.medium_key.is_none());
        assert_eq!(descriptor.media_type, MediaKind::Image);
        // the original bytes are still stored and servable
        let stored = tokio::fs::read(dir.join(&descriptor.original_key))
            .await
            .unwrap();
        assert_eq!(stored, b"not an image");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn unstaging_a_batch_removes_every_object() {
        let (store, dir) = temp_store().await;

        let a = process_upload(&store, "a.png", MediaKind::Image, &png_bytes(800, 600))
            .await
            .unwrap();
        let b = process_upload(&store, "b.png", MediaKind::Image, &png_bytes(2000, 1400))
            .await
            .unwrap();

        let keys: Vec<String> = a.keys().chain(b.keys()).map(String::from).collect();
        assert_eq!(keys.len(), 5);
        for key in &keys {
            assert!(dir.join(key).exists(), "missing staged object {}", key);
        }

        assert_eq!(store.delete_many(&keys).await, 0);
        for key in &keys {
            assert!(!dir.join(key).exists(), "object {} survived cleanup", key);
        }

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
