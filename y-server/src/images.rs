use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;
use thiserror::Error;

use crate::db::repositories::NewImage;

/// Browsers send an empty part of this type when no file was chosen
const NO_FILE_MIMETYPE: &str = "application/octet-stream";

/// Types accepted as post attachments
pub const POST_IMAGE_MIMETYPES: &[&str] = &["image/jpeg", "image/png"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid request recieved.")]
    Malformed(String),

    #[error("Maximum image file size is {}.", describe_limit(*max_bytes))]
    TooLarge { max_bytes: usize },

    #[error("File must be .jpg or .png!")]
    UnsupportedType(String),

    #[error("Only one image may be uploaded at a time.")]
    TooMany,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// A `multipart/form-data` body split into text fields and file parts
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl MultipartForm {
    /// Drain a multipart body. Parts with a file name are files; empty
    /// "no file chosen" parts are dropped.
    pub async fn read(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::Malformed(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or(NO_FILE_MIMETYPE)
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| UploadError::Malformed(e.to_string()))?;
                    if data.is_empty() || content_type == NO_FILE_MIMETYPE {
                        continue;
                    }
                    form.files.entry(name).or_default().push(UploadedFile {
                        file_name,
                        content_type,
                        data,
                    });
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| UploadError::Malformed(e.to_string()))?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The single file uploaded under `name`, if any
    pub fn single_file(&self, name: &str) -> Result<Option<&UploadedFile>, UploadError> {
        match self.files.get(name).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([file]) => Ok(Some(file)),
            Some(_) => Err(UploadError::TooMany),
        }
    }

    #[cfg(test)]
    pub fn from_parts(fields: &[(&str, &str)], files: Vec<(&str, UploadedFile)>) -> Self {
        let mut form = MultipartForm::default();
        for (name, value) in fields {
            form.fields.insert(name.to_string(), value.to_string());
        }
        for (name, file) in files {
            form.files.entry(name.to_string()).or_default().push(file);
        }
        form
    }
}

/// Size limit as shown to users: whole KB rounded up, or bytes below 1 KB
fn describe_limit(max_bytes: usize) -> String {
    if max_bytes < 1000 {
        format!("{} bytes", max_bytes)
    } else {
        format!("{} KB", max_bytes.div_ceil(1000))
    }
}

/// Check an uploaded image against the size limit and, when given, the
/// accepted types, and turn it into a row ready to store
pub fn validate_image(
    file: &UploadedFile,
    max_bytes: usize,
    allowed_types: Option<&[&str]>,
) -> Result<NewImage, UploadError> {
    let type_ok = match allowed_types {
        Some(allowed) => allowed.contains(&file.content_type.as_str()),
        None => file.content_type.starts_with("image/"),
    };
    if !type_ok {
        return Err(UploadError::UnsupportedType(file.content_type.clone()));
    }
    if file.data.len() >= max_bytes {
        return Err(UploadError::TooLarge { max_bytes });
    }

    Ok(NewImage {
        data: file.data.to_vec(),
        name: sanitize_filename(&file.file_name),
        mimetype: file.content_type.clone(),
    })
}

/// Reduce a client-supplied file name to a safe basename
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
