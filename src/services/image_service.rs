use async_trait::async_trait;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("GCS upload error: {0}")]
    Gcs(String),

    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),

    #[error("Empty upload")]
    Empty,
}

/// Where check-in photos go.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Stores the image and returns its public URL.
    async fn upload(
        &self,
        place_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

pub fn file_extension(content_type: &str) -> Result<&'static str, StorageError> {
    match content_type {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/gif" => Ok("gif"),
        "image/webp" => Ok("webp"),
        _ => Err(StorageError::InvalidImageFormat(format!(
            "Unsupported file type: {}",
            content_type
        ))),
    }
}

/// Object path segment for a place name: ASCII alphanumerics kept, everything
/// else collapsed to `-`. Hangul names become `place`.
pub fn object_folder(place_name: &str) -> String {
    let slug: String = place_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "place".to_string()
    } else {
        slug
    }
}

pub struct GcsPhotoStore {
    client: Client,
    bucket_name: String,
}

impl GcsPhotoStore {
    pub async fn new(bucket_name: String) -> Result<Self, StorageError> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| StorageError::Gcs(format!("Failed to create GCS client: {}", e)))?;

        Ok(Self {
            client: Client::new(config),
            bucket_name,
        })
    }
}

#[async_trait]
impl PhotoStore for GcsPhotoStore {
    async fn upload(
        &self,
        place_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        let extension = file_extension(content_type)?;
        let object_name = format!(
            "checkins/{}/{}-{}.{}",
            object_folder(place_name),
            chrono::Utc::now().timestamp(),
            Uuid::new_v4(),
            extension
        );

        let mut media = Media::new(object_name.clone());
        media.content_type = content_type.to_string().into();
        let upload_type = UploadType::Simple(media);
        let upload_request = UploadObjectRequest {
            bucket: self.bucket_name.clone(),
            ..Default::default()
        };

        self.client
            .upload_object(&upload_request, bytes, &upload_type)
            .await
            .map_err(|e| StorageError::Gcs(format!("Failed to upload to GCS: {}", e)))?;

        Ok(format!(
            "https://storage.googleapis.com/{}/{}",
            self.bucket_name, object_name
        ))
    }
}
