//! Local materialization of a colorized result.

use crate::model::{ResultArtifact, DOWNLOAD_FILENAME};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// The user's download folder, falling back to the working directory.
pub(crate) fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Write the result under the fixed filename, replacing any earlier download.
pub(crate) async fn save_result(dir: &Path, result: &ResultArtifact) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create download directory {}", dir.display()))?;
    let path = dir.join(DOWNLOAD_FILENAME);
    tokio::fs::write(&path, &result.bytes)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn artifact(bytes: &'static [u8]) -> ResultArtifact {
        ResultArtifact {
            bytes: Bytes::from_static(bytes),
            media_type: "image/png".into(),
            thumbnail: None,
        }
    }

    #[tokio::test]
    async fn saved_file_is_byte_identical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("nested").join("downloads");

        let path = save_result(&target, &artifact(b"\x89PNG\r\n\x1a\npayload"))
            .await
            .expect("save");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(DOWNLOAD_FILENAME));
        assert_eq!(std::fs::read(&path).expect("read"), b"\x89PNG\r\n\x1a\npayload");
    }

    #[tokio::test]
    async fn second_download_overwrites_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        save_result(dir.path(), &artifact(b"first")).await.expect("save");
        let path = save_result(dir.path(), &artifact(b"second")).await.expect("save");
        assert_eq!(std::fs::read(path).expect("read"), b"second");
    }
}
