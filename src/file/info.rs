use super::extension;
use crate::{document::models::DocumentType, error::DocuploadError};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Resolves a MIME type from a file name.
pub type MimeLookup = fn(&str) -> Option<String>;

/// Infers document types and MIME types from file name extensions. Content is
/// never inspected.
#[derive(Debug, Clone)]
pub struct FileTypeInfo {
    mime_lookup: MimeLookup,
}

impl FileTypeInfo {
    pub fn new(mime_lookup: MimeLookup) -> Self {
        Self { mime_lookup }
    }

    pub fn document_type(&self, file_name: &str) -> Result<DocumentType, DocuploadError> {
        require_name(file_name)?;

        let ext = extension(file_name).to_ascii_lowercase();
        Ok(match ext.as_str() {
            "txt" => DocumentType::Text,
            "jpg" | "png" => DocumentType::Image,
            "pdf" => DocumentType::Pdf,
            _ => DocumentType::Unknown,
        })
    }

    pub fn mime_type(&self, file_name: &str) -> Result<String, DocuploadError> {
        require_name(file_name)?;
        Ok((self.mime_lookup)(file_name).unwrap_or_else(|| OCTET_STREAM.to_string()))
    }
}

impl Default for FileTypeInfo {
    fn default() -> Self {
        Self::new(guess_mime)
    }
}

/// Default lookup backed by the `mime_guess` extension table.
pub fn guess_mime(file_name: &str) -> Option<String> {
    mime_guess::from_path(file_name)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

fn require_name(file_name: &str) -> Result<(), DocuploadError> {
    if file_name.trim().is_empty() {
        return Err(DocuploadError::InvalidArgument(
            "Filename is required".to_string(),
        ));
    }
    Ok(())
}
