//! `POST /api/upload` (multipart image upload).

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::instrument;

use crate::client::{ApiClient, BackendSession};
use crate::types::Upload;
use crate::{ApiError, Result};

/// Largest image accepted for upload (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// An image received from a form, ready to forward to the backend.
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    /// Validate an uploaded file. Returns `Ok(None)` for an empty file
    /// field, which browsers send when no file was picked.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message for non-images and oversized files.
    pub fn from_form_field(
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> std::result::Result<Option<Self>, String> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let content_type = content_type.unwrap_or("application/octet-stream");
        if !content_type.starts_with("image/") {
            return Err("Only image files can be uploaded.".to_string());
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err("Images must be 5 MB or smaller.".to_string());
        }
        Ok(Some(Self {
            file_name: file_name.unwrap_or("upload").to_string(),
            content_type: content_type.to_string(),
            bytes,
        }))
    }
}

impl ApiClient {
    /// Upload an image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the backend call fails.
    #[instrument(skip(self, session, image), fields(file_name = %image.file_name, len = image.bytes.len()))]
    pub async fn upload_image(
        &self,
        session: &BackendSession,
        image: ImageUpload,
    ) -> Result<Upload> {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|e| ApiError::Decode(format!("invalid content type: {e}")))?;
        let form = Form::new().part("image", part);

        let builder = self
            .builder(Method::POST, "/api/upload", Some(session))?
            .multipart(form);
        let response = self.execute(builder).await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_field_is_no_upload() {
        assert!(
            ImageUpload::from_form_field(Some("a.png"), Some("image/png"), Vec::new())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_rejects_non_images() {
        assert!(ImageUpload::from_form_field(Some("a.txt"), Some("text/plain"), vec![1]).is_err());
    }

    #[test]
    fn test_rejects_large_files() {
        let bytes = vec![0; MAX_UPLOAD_BYTES + 1];
        assert!(ImageUpload::from_form_field(Some("a.png"), Some("image/png"), bytes).is_err());
    }

    #[test]
    fn test_accepts_image() {
        let upload = ImageUpload::from_form_field(None, Some("image/jpeg"), vec![1, 2, 3])
            .unwrap()
            .unwrap();
        assert_eq!(upload.file_name, "upload");
        assert_eq!(upload.bytes.len(), 3);
    }
}
