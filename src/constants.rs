//! Application constants

/// Bucket name for post media storage
pub const BUCKET_NAME: &str = "memocapsule_media";

/// Maximum size per uploaded media file (50 MB)
pub const MAX_MEDIA_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Body limit for the multipart upload endpoint. Uploads carry several files
/// per request, so allow headroom above the per-file cap.
pub const MAX_UPLOAD_BODY_SIZE: usize = 200 * 1024 * 1024;

/// Signed URL expiry for authenticated media access (15 minutes)
pub const SIGNED_URL_EXPIRY_SECS: u32 = 15 * 60;

/// Signed URL expiry for public share-page media (1 hour). Share links are
/// unauthenticated, so the URL has to outlive a casual viewing session.
pub const SHARE_URL_EXPIRY_SECS: u32 = 60 * 60;

/// Thumbnail derivative: square cover-crop edge
pub const THUMBNAIL_SIZE: u32 = 400;

/// Medium derivative: longest-edge bound, never upscaled
pub const MEDIUM_MAX_EDGE: u32 = 1200;

/// JPEG quality per derivative
pub const THUMBNAIL_QUALITY: u8 = 75;
pub const MEDIUM_QUALITY: u8 = 80;
pub const FULL_QUALITY: u8 = 85;
