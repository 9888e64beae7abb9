use super::extension;
use crate::config::UploadConfig;
use std::collections::HashSet;

/// Upload policy check. Rules run in a fixed order and the first failing one
/// decides the message.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_size: usize,
    /// Lowercase, without leading dots
    extensions: HashSet<String>,
}

impl FileValidator {
    pub fn new<S: AsRef<str>>(max_size: usize, extensions: &[S]) -> Self {
        Self {
            max_size,
            extensions: extensions
                .iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn validate(&self, file_name: &str, content: &[u8]) -> Result<(), String> {
        if content.is_empty() {
            return Err("File has no content".to_string());
        }

        if file_name.trim().is_empty() {
            return Err("File name is required".to_string());
        }

        if content.len() > self.max_size {
            return Err(format!("File is larger than {} bytes", self.max_size));
        }

        let ext = extension(file_name);
        if !self.extensions.contains(&ext.to_lowercase()) {
            return Err(format!("File extension '{ext}' is not supported"));
        }

        Ok(())
    }

    pub fn is_valid(&self, file_name: &str, content: &[u8]) -> (bool, Option<String>) {
        match self.validate(file_name, content) {
            Ok(()) => (true, None),
            Err(message) => (false, Some(message)),
        }
    }
}

impl From<&UploadConfig> for FileValidator {
    fn from(config: &UploadConfig) -> Self {
        Self::new(config.max_size, &config.extensions)
    }
}
