use std::path::Path;

pub mod info;
pub mod validate;

pub use info::FileTypeInfo;
pub use validate::FileValidator;

/// Extension of `file_name` without the leading dot, or an empty string.
fn extension(file_name: &str) -> &str {
    Path::new(file_name.trim())
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
}
