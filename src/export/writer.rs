//! Writing exported bytes to the download directory

use crate::config::{ExportConfig, FileCollisionAction};
use crate::error::{ExportError, Result};
use crate::utils::{generate_id, get_unique_path};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Fresh file name for exported media, e.g. `mugshot_Ab3dE9xQ.png`
pub(crate) fn export_file_name(config: &ExportConfig, extension: &str) -> String {
    format!(
        "{}{}.{}",
        config.filename_prefix,
        generate_id(config.filename_id_length),
        extension
    )
}

/// Write `bytes` under a generated name in the download directory
///
/// Data goes to `<name>.part` first and is renamed into place once complete,
/// so a reader never sees a truncated file under the final name. Unless the
/// collision mode is `Overwrite`, the final name is reserved with an exclusive
/// create first, so a file appearing after the collision check is never
/// replaced.
pub(crate) async fn write_export(
    config: &ExportConfig,
    extension: &str,
    bytes: &[u8],
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(&config.download_dir).await?;

    let desired = config
        .download_dir
        .join(export_file_name(config, extension));
    let path = get_unique_path(&desired, config.collision)?;
    let reserved = config.collision != FileCollisionAction::Overwrite;
    if reserved {
        reserve(&path).await?;
    }
    let part = part_path(&path);

    if let Err(e) = write_and_rename(&part, &path, bytes).await {
        tokio::fs::remove_file(&part).await.ok();
        if reserved {
            tokio::fs::remove_file(&path).await.ok();
        }
        return Err(e.into());
    }

    tracing::debug!(path = %path.display(), size = bytes.len(), "export written");
    Ok(path)
}

/// Claim `path` with an empty placeholder, failing if it already exists
async fn reserve(path: &Path) -> Result<()> {
    match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(ExportError::FileCollision {
                path: path.to_path_buf(),
            }
            .into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_and_rename(part: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(part, bytes).await?;
    tokio::fs::rename(part, path).await
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}
