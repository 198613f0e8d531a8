//! Uploaded image storage
//!
//! Images land in the configured upload directory under a random file
//! name and are served back at `/uploads/{name}` by the static file
//! layer. Only the extension survives from the client's file name.

use std::path::{Path, PathBuf};

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Writes `bytes` under a fresh uuid file name and returns the public
    /// relative URL.
    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> std::io::Result<String> {
        let file_name = format!("{}.{}", Uuid::new_v4(), extension_of(original_name));
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&file_name), bytes).await?;
        Ok(format!("/uploads/{file_name}"))
    }
}

fn extension_of(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_preserved_and_lowercased() {
        assert_eq!(extension_of(Some("cover.PNG")), "png");
        assert_eq!(extension_of(Some("photo.jpeg")), "jpeg");
    }

    #[test]
    fn test_suspicious_extensions_fall_back() {
        assert_eq!(extension_of(Some("noext")), "bin");
        assert_eq!(extension_of(Some("weird..")), "bin");
        assert_eq!(extension_of(Some("long.extension-with-dashes")), "bin");
        assert_eq!(extension_of(None), "bin");
    }
}
