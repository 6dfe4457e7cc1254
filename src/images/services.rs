use anyhow::Context;
use bytes::Bytes;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::storage::StorageClient;

const PROFILE_DIR: &str = "profile-pictures";

pub struct UploadItem<'a> {
    pub body: Bytes,
    pub content_type: &'a str,
}

/// Where a stored image lives: `key` for storage calls, `url` for the record.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Only .jpeg, .jpg and .png files are allowed")]
    UnsupportedType,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Validates the upload's type and writes it under a fresh, collision-resistant name.
pub async fn store_profile_image(
    storage: &dyn StorageClient,
    image: UploadItem<'_>,
) -> Result<StoredImage, ImageError> {
    let ext = ext_from_mime(image.content_type).ok_or(ImageError::UnsupportedType)?;

    let key = format!("{}/{}", PROFILE_DIR, unique_file_name(ext));
    storage
        .put_object(&key, image.body, image.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    let url = storage.public_url(&key);
    Ok(StoredImage { key, url })
}

fn unique_file_name(ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("{}-{}.{}", millis, Uuid::new_v4().simple(), ext)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}
