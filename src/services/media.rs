//! Image storage for wine records.
//!
//! Uploaded files land under the configured media root at a content-derived
//! path: `wines/<slug-of-title>-<random suffix>.<ext>`. Only the relative
//! path is stored on the wine record.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::ApiError;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Lowercased, hyphen-separated form of a wine title for use in filenames
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "wine".to_string()
    } else {
        slug
    }
}

fn extension_of(file_name: &str) -> Result<String, ApiError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| ApiError::field_error("image", "file name has no extension"))?;

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ApiError::field_error(
            "image",
            format!("unsupported image type '.{}'", ext),
        ));
    }
    Ok(ext)
}

/// Relative media path for a new image of the given wine.
/// A random suffix keeps repeated uploads from clobbering each other.
pub fn image_path(title: &str, file_name: &str) -> Result<String, ApiError> {
    let ext = extension_of(file_name)?;
    let suffix = Uuid::new_v4().simple().to_string();
    Ok(format!("wines/{}-{}.{}", slugify(title), &suffix[..8], ext))
}

/// Write image bytes under the media root, creating directories as needed
pub async fn store(media_root: &Path, relative: &str, bytes: &[u8]) -> Result<PathBuf, ApiError> {
    let target = media_root.join(relative);

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            tracing::error!("Failed to create media directory {:?}: {}", parent, e);
            ApiError::internal_server_error("Failed to store uploaded image")
        })?;
    }

    tokio::fs::write(&target, bytes).await.map_err(|e| {
        tracing::error!("Failed to write image {:?}: {}", target, e);
        ApiError::internal_server_error("Failed to store uploaded image")
    })?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_lowercased_and_hyphenated() {
        assert_eq!(slugify("Laurent-Perrier Brut"), "laurent-perrier-brut");
        assert_eq!(slugify("  Château   Margaux  "), "ch-teau-margaux");
        assert_eq!(slugify("2020!?"), "2020");
        assert_eq!(slugify("???"), "wine");
    }

    #[test]
    fn image_paths_are_slugged_and_unique() {
        let a = image_path("Test Wine", "photo.JPG").unwrap();
        let b = image_path("Test Wine", "photo.JPG").unwrap();

        assert!(a.starts_with("wines/test-wine-"));
        assert!(a.ends_with(".jpg"));
        assert_ne!(a, b);
    }

    #[test]
    fn disallowed_extensions_rejected() {
        assert!(image_path("Test Wine", "malware.exe").is_err());
        assert!(image_path("Test Wine", "noextension").is_err());
    }
}
