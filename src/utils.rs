//! Utility functions for file naming and path handling

use crate::config::FileCollisionAction;
use crate::error::{Error, ExportError, Result};
use rand::Rng;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Alphanumeric alphabet used for generated identifiers
const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Get a unique path for a file, handling collisions according to the specified action
///
/// # Arguments
///
/// * `path` - The desired file path
/// * `action` - How to handle file collisions
///
/// # Returns
///
/// Returns the final path to use. For Rename action, this may have a suffix added.
/// For Skip action, returns an error if the file already exists.
/// For Overwrite action, returns the original path unchanged.
///
/// # Examples
///
/// ```
/// use effect_gen::utils::get_unique_path;
/// use effect_gen::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/mugshot_a1b2c3d4.png");
/// let unique = get_unique_path(path, FileCollisionAction::Rename).unwrap();
/// // If the file exists, returns /tmp/mugshot_a1b2c3d4 (1).png, and so on
/// ```
pub fn get_unique_path(path: &Path, action: FileCollisionAction) -> Result<PathBuf> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(ExportError::FileCollision {
                    path: path.to_path_buf(),
                }
                .into());
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("cannot extract file stem from {}", path.display()),
                ))
            })?;
            let extension = path.extension().and_then(|e| e.to_str());
            let parent = path.parent().unwrap_or_else(|| Path::new("."));

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_name = match extension {
                    Some(ext) => format!("{} ({}).{}", stem, i, ext),
                    None => format!("{} ({})", stem, i),
                };
                let new_path = parent.join(new_name);
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(ExportError::FileCollision {
                path: path.to_path_buf(),
            }
            .into())
        }
    }
}

/// Generate a random alphanumeric identifier of `len` characters
///
/// Used for stored upload names and exported file names.
#[must_use]
pub fn generate_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Pick a file extension for exported media
///
/// Video content types and `.mp4`/`.webm` URLs map to `mp4`; PNG and WebP are
/// recognized from either the content type or the URL; everything else is
/// saved as `jpg`.
///
/// # Examples
///
/// ```
/// use effect_gen::utils::infer_extension;
///
/// assert_eq!(infer_extension(Some("video/mp4"), "https://x/out"), "mp4");
/// assert_eq!(infer_extension(None, "https://x/out.png?sig=1"), "png");
/// assert_eq!(infer_extension(Some("image/jpeg"), "https://x/out"), "jpg");
/// ```
#[must_use]
pub fn infer_extension(content_type: Option<&str>, url: &str) -> &'static str {
    let content_type = content_type.unwrap_or("").to_ascii_lowercase();
    let path = url_path(url).to_ascii_lowercase();

    if content_type.contains("video") || path.ends_with(".mp4") || path.ends_with(".webm") {
        "mp4"
    } else if content_type.contains("png") || path.ends_with(".png") {
        "png"
    } else if content_type.contains("webp") || path.ends_with(".webp") {
        "webp"
    } else {
        "jpg"
    }
}

/// Extension of a local file name, lowercased, or `jpg` when it has none
#[must_use]
pub fn file_extension_or_default(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "jpg".to_string())
}

// Path component of a URL without query string or fragment
fn url_path(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_get_unique_path_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.png");
        fs::write(&file_path, "content").unwrap();

        let result = get_unique_path(&file_path, FileCollisionAction::Overwrite).unwrap();
        assert_eq!(result, file_path);
    }

    #[test]
    fn test_get_unique_path_skip_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.png");
        fs::write(&file_path, "content").unwrap();

        let result = get_unique_path(&file_path, FileCollisionAction::Skip);
        assert!(matches!(
            result,
            Err(Error::Export(ExportError::FileCollision { .. }))
        ));
    }

    #[test]
    fn test_get_unique_path_rename_increments() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.png");
        fs::write(&file_path, "content").unwrap();
        fs::write(temp_dir.path().join("test (1).png"), "content").unwrap();

        let result = get_unique_path(&file_path, FileCollisionAction::Rename).unwrap();
        assert_eq!(result, temp_dir.path().join("test (2).png"));
    }

    #[test]
    fn test_get_unique_path_rename_free_name_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("fresh.mp4");

        let result = get_unique_path(&file_path, FileCollisionAction::Rename).unwrap();
        assert_eq!(result, file_path);
    }

    #[test]
    fn generated_ids_have_requested_length_and_alphabet() {
        let id = generate_id(21);
        assert_eq!(id.len(), 21);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
        assert_ne!(generate_id(21), id, "two ids should practically never collide");
    }

    #[test]
    fn extension_inference_prefers_video() {
        assert_eq!(infer_extension(Some("video/webm"), "https://x/a.png"), "mp4");
        assert_eq!(infer_extension(None, "https://x/a.WEBM"), "mp4");
    }

    #[test]
    fn extension_inference_ignores_query_string() {
        assert_eq!(infer_extension(None, "https://x/a.webp?token=abc.png"), "webp");
        assert_eq!(infer_extension(Some("image/png"), "https://x/a"), "png");
        assert_eq!(infer_extension(None, "not a url"), "jpg");
    }

    #[test]
    fn local_extension_defaults_to_jpg() {
        assert_eq!(file_extension_or_default(Path::new("face.PNG")), "png");
        assert_eq!(file_extension_or_default(Path::new("face")), "jpg");
    }
}
