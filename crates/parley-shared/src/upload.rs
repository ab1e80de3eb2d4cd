//! Attachment validation and encoding.

use base64::{engine::general_purpose, Engine as _};

use crate::constants::{ALLOWED_MIME_TYPES, MAX_UPLOAD_SIZE};
use crate::error::ValidationError;
use crate::types::FileInfo;

/// A file picked by the user, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Encode the contents as a `data:` URL and describe the file.
    pub fn to_file_info(&self) -> FileInfo {
        let encoded = general_purpose::STANDARD.encode(&self.bytes);
        FileInfo {
            filename: self.name.clone(),
            originalname: self.name.clone(),
            size: self.size(),
            mimetype: self.mime_type.clone(),
            url: format!("data:{};base64,{}", self.mime_type, encoded),
        }
    }
}

/// Size and type limits applied to attachments before sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_size: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size: MAX_UPLOAD_SIZE,
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl UploadPolicy {
    /// Size is checked before type.
    pub fn validate(&self, attachment: &Attachment) -> Result<(), ValidationError> {
        let size = attachment.size();
        if size > self.max_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_size,
            });
        }

        if !self
            .allowed_mime_types
            .iter()
            .any(|m| m == &attachment.mime_type)
        {
            return Err(ValidationError::FileTypeNotAllowed(
                attachment.mime_type.clone(),
            ));
        }

        Ok(())
    }
}

/// Human-readable size: base 1024, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
